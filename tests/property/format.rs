// Property tests for bounded rendering.
//
// Verifies the depth counter's call/return symmetry and the
// elide-the-middle arithmetic over arbitrary lengths and limits.

use proptest::prelude::*;
use strand::{Executable, Heap, OutputFormatParameters, RenderMode, Value, ValueTracer};

fn nested_array(heap: &mut Heap, levels: usize) -> Value {
    let mut v = heap.alloc_array(vec![Value::Int(1)]);
    for _ in 1..levels {
        v = heap.alloc_array(vec![v]);
    }
    v
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =========================================================================
    // Depth accounting
    // =========================================================================

    #[test]
    fn depth_counter_balances_for_any_nesting(levels in 1usize..12, max_depth in 0i64..8) {
        let mut heap = Heap::new();
        let exe = Executable::new();
        let v = nested_array(&mut heap, levels);
        let tracer = ValueTracer::new(&heap, &exe, None, RenderMode::Watch);
        let mut fmt = OutputFormatParameters::new(-1, max_depth);

        tracer.string_value(v, &mut fmt).unwrap();
        prop_assert_eq!(fmt.current_depth(), max_depth,
            "depth counter unbalanced for {} levels, budget {}", levels, max_depth);
    }

    #[test]
    fn unbounded_depth_renders_every_level(levels in 1usize..12) {
        let mut heap = Heap::new();
        let exe = Executable::new();
        let v = nested_array(&mut heap, levels);
        let tracer = ValueTracer::new(&heap, &exe, None, RenderMode::Watch);
        let mut fmt = OutputFormatParameters::unbounded();

        let rendered = tracer.string_value(v, &mut fmt).unwrap();
        prop_assert_eq!(rendered.matches('{').count(), levels);
        prop_assert!(!rendered.contains("..."));
    }

    #[test]
    fn truncated_rendering_never_errors(levels in 1usize..12, max_depth in 0i64..4) {
        let mut heap = Heap::new();
        let exe = Executable::new();
        let v = nested_array(&mut heap, levels);
        let tracer = ValueTracer::new(&heap, &exe, None, RenderMode::Watch);
        let mut fmt = OutputFormatParameters::new(-1, max_depth);
        prop_assert!(tracer.string_value(v, &mut fmt).is_ok());
    }

    // =========================================================================
    // Middle elision
    // =========================================================================

    #[test]
    fn elision_keeps_head_and_tail(len in 0usize..40, max in 2i64..20) {
        let mut heap = Heap::new();
        let exe = Executable::new();
        let v = heap.alloc_array((0..len as i64).map(Value::Int).collect());
        let tracer = ValueTracer::new(&heap, &exe, None, RenderMode::Watch);
        let mut fmt = OutputFormatParameters::new(max, -1);

        let rendered = tracer.string_value(v, &mut fmt).unwrap();
        let half = (max / 2) as usize;

        if (len as i64) > max {
            // shown: indices [0, half), the marker, then [len - half, len)
            prop_assert!(rendered.contains("..."));
            let shown = rendered.matches(", ").count(); // separators
            prop_assert_eq!(shown, 2 * half, "wrong element count in {}", rendered);
            if half > 0 {
                prop_assert!(rendered.starts_with("{ 0,"), "rendered did not start with open brace");
                prop_assert!(rendered.ends_with(&format!("{} }}", len - 1)), "rendered did not end with last index");
            }
        } else {
            prop_assert!(!rendered.contains("..."));
            if len > 0 {
                prop_assert_eq!(rendered.matches(", ").count(), len - 1);
            }
        }
    }

    #[test]
    fn unbounded_array_size_shows_everything(len in 0usize..60) {
        let mut heap = Heap::new();
        let exe = Executable::new();
        let v = heap.alloc_array((0..len as i64).map(Value::Int).collect());
        let tracer = ValueTracer::new(&heap, &exe, None, RenderMode::Watch);
        let mut fmt = OutputFormatParameters::new(-1, -1);

        let rendered = tracer.string_value(v, &mut fmt).unwrap();
        prop_assert!(!rendered.contains("..."));
        if len > 0 {
            prop_assert_eq!(rendered.matches(", ").count(), len - 1);
        }
    }
}
