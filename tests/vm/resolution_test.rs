// Multi-scope name resolution against the live frame and the static
// block chain. These pin the precedence rules per nesting depth instead
// of assuming them.
use strand::{
    BlockId, BlockKind, ClassScope, ExecutionMirror, Executive, FunctionScope, StackFrame,
    StrandError, SymbolLocation, SymbolNode, Value,
};

/// A class with a field `x`, a method `scale` owning a local `x`, and a
/// sibling method `norm` with no local.
fn class_fixture(exec: &mut Executive) -> (ClassScope, FunctionScope, BlockId, FunctionScope, BlockId) {
    let class = exec.executable.add_class("Counter");
    let scale_block = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Function);
    let norm_block = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Function);
    let scale = FunctionScope(0);
    let norm = FunctionScope(1);
    {
        let table = &mut exec.executable.class_mut(class).unwrap().symbols;
        table.append(SymbolNode::member("x", class, BlockId::TOP_LEVEL));
        table.append(SymbolNode::local("x", class, scale, scale_block));
    }
    (class, scale, scale_block, norm, norm_block)
}

#[test]
fn test_method_local_shadows_field() {
    let mut exec = Executive::new();
    let (class, scale, scale_block, _, _) = class_fixture(&mut exec);
    exec.set_frame(StackFrame {
        class_scope: class,
        function_scope: scale,
        function_block: scale_block,
    });

    let mirror = ExecutionMirror::new(&mut exec);
    let resolved = mirror.resolve("x").unwrap();
    // storage index 1 is the method-local
    assert_eq!(resolved.location, SymbolLocation::Class(class, 1));
    assert_eq!(resolved.node.function_scope, scale);
}

#[test]
fn test_sibling_method_sees_field() {
    let mut exec = Executive::new();
    let (class, _, _, norm, norm_block) = class_fixture(&mut exec);
    exec.set_frame(StackFrame {
        class_scope: class,
        function_scope: norm,
        function_block: norm_block,
    });

    let mirror = ExecutionMirror::new(&mut exec);
    let resolved = mirror.resolve("x").unwrap();
    // storage index 0 is the field
    assert_eq!(resolved.location, SymbolLocation::Class(class, 0));
    assert!(resolved.node.function_scope.is_global());
}

#[test]
fn test_class_path_does_not_reach_globals() {
    let mut exec = Executive::new();
    exec.define_global(BlockId::TOP_LEVEL, "g", Value::Int(1)).unwrap();
    let (class, scale, scale_block, _, _) = class_fixture(&mut exec);
    exec.set_frame(StackFrame {
        class_scope: class,
        function_scope: scale,
        function_block: scale_block,
    });

    let mirror = ExecutionMirror::new(&mut exec);
    let err = mirror.resolve("g").unwrap_err();
    assert_eq!(err, StrandError::name_not_found("g"));
}

#[test]
fn test_top_level_resolution() {
    let mut exec = Executive::new();
    exec.define_global(BlockId::TOP_LEVEL, "x", Value::Int(7)).unwrap();
    let mirror = ExecutionMirror::new(&mut exec);
    let resolved = mirror.resolve("x").unwrap();
    assert_eq!(resolved.location, SymbolLocation::Block(BlockId::TOP_LEVEL, 0));
}

#[test]
fn test_inner_block_shadows_outer() {
    let mut exec = Executive::new();
    exec.define_global(BlockId::TOP_LEVEL, "x", Value::Int(1)).unwrap();
    let b1 = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Language);
    exec.define_global(b1, "x", Value::Int(2)).unwrap();
    exec.set_current_block(b1);

    let mirror = ExecutionMirror::new(&mut exec);
    let resolved = mirror.resolve("x").unwrap();
    assert_eq!(resolved.location, SymbolLocation::Block(b1, 0));
    assert_eq!(mirror.get_value("x").unwrap().as_int(), Some(2));
}

#[test]
fn test_two_level_walk_reaches_top() {
    let mut exec = Executive::new();
    exec.define_global(BlockId::TOP_LEVEL, "x", Value::Int(1)).unwrap();
    let b1 = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Language);
    let b2 = exec.executable.add_block(b1, BlockKind::Language);
    exec.set_current_block(b2);

    let mirror = ExecutionMirror::new(&mut exec);
    let resolved = mirror.resolve("x").unwrap();
    assert_eq!(resolved.location, SymbolLocation::Block(BlockId::TOP_LEVEL, 0));
}

#[test]
fn test_three_level_walk_picks_innermost_declaration() {
    let mut exec = Executive::new();
    exec.define_global(BlockId::TOP_LEVEL, "x", Value::Int(1)).unwrap();
    let b1 = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Language);
    let b2 = exec.executable.add_block(b1, BlockKind::Language);
    let b3 = exec.executable.add_block(b2, BlockKind::Language);
    exec.define_global(b2, "x", Value::Int(3)).unwrap();
    exec.set_current_block(b3);

    let mirror = ExecutionMirror::new(&mut exec);
    let resolved = mirror.resolve("x").unwrap();
    assert_eq!(resolved.location, SymbolLocation::Block(b2, 0));
}

#[test]
fn test_function_local_shadows_global_on_global_path() {
    let mut exec = Executive::new();
    exec.define_global(BlockId::TOP_LEVEL, "x", Value::Int(1)).unwrap();
    let body = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Function);
    let f = FunctionScope(0);
    exec.executable
        .block_mut(body)
        .unwrap()
        .symbols
        .append(SymbolNode::local("x", ClassScope::GLOBAL, f, body));
    exec.set_frame(StackFrame {
        class_scope: ClassScope::GLOBAL,
        function_scope: f,
        function_block: body,
    });

    let mirror = ExecutionMirror::new(&mut exec);
    let resolved = mirror.resolve("x").unwrap();
    assert_eq!(resolved.location, SymbolLocation::Block(body, 0));
    assert_eq!(resolved.node.function_scope, f);
}

#[test]
fn test_frame_without_local_falls_back_to_global() {
    let mut exec = Executive::new();
    exec.define_global(BlockId::TOP_LEVEL, "x", Value::Int(1)).unwrap();
    let body = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Function);
    exec.set_frame(StackFrame {
        class_scope: ClassScope::GLOBAL,
        function_scope: FunctionScope(0),
        function_block: body,
    });

    let mirror = ExecutionMirror::new(&mut exec);
    let resolved = mirror.resolve("x").unwrap();
    assert_eq!(resolved.location, SymbolLocation::Block(BlockId::TOP_LEVEL, 0));
}

#[test]
fn test_sibling_block_is_unreachable() {
    let mut exec = Executive::new();
    let b_decl = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Language);
    let b_other = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Language);
    exec.define_global(b_decl, "hidden", Value::Int(1)).unwrap();
    exec.set_current_block(b_other);

    let mirror = ExecutionMirror::new(&mut exec);
    let err = mirror.resolve("hidden").unwrap_err();
    assert_eq!(err.symbol_name(), Some("hidden"));
}

#[test]
fn test_fixed_size_array_symbol_is_rejected() {
    let mut exec = Executive::new();
    exec.executable
        .block_mut(BlockId::TOP_LEVEL)
        .unwrap()
        .symbols
        .append(SymbolNode::global("grid", BlockId::TOP_LEVEL).with_static_array_sizes(vec![3, 3]));

    let mirror = ExecutionMirror::new(&mut exec);
    match mirror.resolve("grid") {
        Err(StrandError::Unsupported { what }) => assert!(what.contains("grid")),
        other => panic!("expected Unsupported, got {:?}", other),
    }
}

#[test]
fn test_get_value_scoped_pins_the_block() {
    let mut exec = Executive::new();
    exec.define_global(BlockId::TOP_LEVEL, "x", Value::Int(1)).unwrap();
    let b1 = exec.executable.add_block(BlockId::TOP_LEVEL, BlockKind::Language);
    exec.define_global(b1, "x", Value::Int(2)).unwrap();
    // current block stays top-level; the consumer pins b1 explicitly
    let mirror = ExecutionMirror::new(&mut exec);
    let inner = mirror
        .get_value_scoped("x", b1, ClassScope::GLOBAL)
        .unwrap();
    assert_eq!(inner.as_int(), Some(2));
    let outer = mirror
        .get_value_scoped("x", BlockId::TOP_LEVEL, ClassScope::GLOBAL)
        .unwrap();
    assert_eq!(outer.as_int(), Some(1));
}
