//! Bounded textual rendering of runtime values.
//!
//! One shared traversal produces both render modes: `Print` (terse, for
//! print statements) and `Watch` (verbose, for watch windows and dumps).
//! The modes may differ only in formatting, never in which values are
//! shown.
//!
//! All recursion is bounded by [`OutputFormatParameters`]: a depth budget
//! that refuses descent with a literal `"..."`, and an array size limit
//! that elides the middle of long arrays. A visited-handle set makes
//! self-referential arrays render `"{ ... }"` instead of looping.
//! Truncation is designed output, never an error; this module only fails
//! on heap corruption (a handle that does not address what it claims).

use rustc_hash::FxHashSet;

use crate::error::StrandError;
use crate::executable::Executable;
use crate::mirror::filter::PropertyFilter;
use crate::value::{Heap, HeapHandle, Value};

/// Sentinel meaning "no limit" for either traversal bound.
pub const UNBOUNDED: i64 = -1;

pub const DEFAULT_MAX_ARRAY_SIZE: i64 = 4;
pub const DEFAULT_MAX_OUTPUT_DEPTH: i64 = 8;

/// Literal emitted when the depth budget refuses further descent.
const ELLIPSIS: &str = "...";

/// Per-render-call traversal budget.
///
/// The depth counter decrements on entry and increments on exit of each
/// recursive render; it must return to its pre-call value after any
/// render call, whichever branch was taken.
#[derive(Debug, Clone)]
pub struct OutputFormatParameters {
    max_array_size: i64,
    max_output_depth: i64,
    current_depth: i64,
}

impl OutputFormatParameters {
    pub fn new(max_array_size: i64, max_output_depth: i64) -> Self {
        OutputFormatParameters {
            max_array_size,
            max_output_depth,
            current_depth: max_output_depth,
        }
    }

    /// No limits on either axis.
    pub fn unbounded() -> Self {
        Self::new(UNBOUNDED, UNBOUNDED)
    }

    /// Enter one nesting level. Returns false when the depth budget is
    /// exhausted; the caller renders `"..."` and must still restore.
    pub fn continue_output_trace(&mut self) -> bool {
        if self.max_output_depth == UNBOUNDED {
            return true;
        }
        self.current_depth -= 1;
        self.current_depth >= 0
    }

    /// Leave one nesting level. Paired with every
    /// [`OutputFormatParameters::continue_output_trace`] call.
    pub fn restore_output_trace_depth(&mut self) {
        if self.max_output_depth != UNBOUNDED {
            self.current_depth += 1;
        }
    }

    pub fn max_array_size(&self) -> i64 {
        self.max_array_size
    }

    pub fn current_depth(&self) -> i64 {
        self.current_depth
    }
}

impl Default for OutputFormatParameters {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ARRAY_SIZE, DEFAULT_MAX_OUTPUT_DEPTH)
    }
}

/// Output flavor of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Terse: bare strings and chars, `ClassName(..)` wrapping.
    Print,
    /// Verbose: quoted strings and chars, `ClassName{..}` wrapping.
    Watch,
}

/// Renders values to bounded strings against one executive's heap and
/// executable. Holds no traversal state; the visited set and depth budget
/// are per-call.
pub struct ValueTracer<'e> {
    heap: &'e Heap,
    exe: &'e Executable,
    filter: Option<&'e PropertyFilter>,
    mode: RenderMode,
}

impl<'e> ValueTracer<'e> {
    pub fn new(
        heap: &'e Heap,
        exe: &'e Executable,
        filter: Option<&'e PropertyFilter>,
        mode: RenderMode,
    ) -> Self {
        ValueTracer {
            heap,
            exe,
            filter,
            mode,
        }
    }

    /// Render one value. The visited set is fresh per top-level call.
    pub fn string_value(
        &self,
        value: Value,
        fmt: &mut OutputFormatParameters,
    ) -> Result<String, StrandError> {
        let mut visited = FxHashSet::default();
        self.trace_value(value, fmt, &mut visited)
    }

    fn trace_value(
        &self,
        value: Value,
        fmt: &mut OutputFormatParameters,
        visited: &mut FxHashSet<HeapHandle>,
    ) -> Result<String, StrandError> {
        match value {
            Value::Null => Ok("null".to_string()),
            Value::Invalid => Ok("invalid".to_string()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Double(d) => Ok(format!("{:?}", d)),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Char(c) => Ok(match self.mode {
                RenderMode::Print => c.to_string(),
                RenderMode::Watch => format!("'{}'", c),
            }),
            Value::Str(h) => {
                let s = self
                    .heap
                    .get_str(h)
                    .ok_or_else(|| StrandError::invalid_handle(h.0))?;
                Ok(match self.mode {
                    RenderMode::Print => s.to_string(),
                    RenderMode::Watch => format!("\"{}\"", s),
                })
            }
            Value::Array(h) => self.array_trace(h, fmt, visited),
            Value::Pointer(h) => self.class_trace(h, fmt, visited),
            Value::Function(p) => {
                let name = self
                    .exe
                    .procedure(p)
                    .map(|proc| proc.name.as_str())
                    .unwrap_or("?");
                Ok(format!("<function {}>", name))
            }
        }
    }

    /// Render one array level. Depth accounting balances on every path,
    /// including truncation and cycle hits.
    fn array_trace(
        &self,
        handle: HeapHandle,
        fmt: &mut OutputFormatParameters,
        visited: &mut FxHashSet<HeapHandle>,
    ) -> Result<String, StrandError> {
        if !fmt.continue_output_trace() {
            fmt.restore_output_trace_depth();
            return Ok(ELLIPSIS.to_string());
        }
        if !visited.insert(handle) {
            // already rendering this array somewhere up the chain
            fmt.restore_output_trace_depth();
            return Ok("{ ... }".to_string());
        }
        let result = self.array_body(handle, fmt, visited);
        visited.remove(&handle);
        fmt.restore_output_trace_depth();
        result
    }

    fn array_body(
        &self,
        handle: HeapHandle,
        fmt: &mut OutputFormatParameters,
        visited: &mut FxHashSet<HeapHandle>,
    ) -> Result<String, StrandError> {
        let elements = self
            .heap
            .get_array(handle)
            .ok_or_else(|| StrandError::invalid_handle(handle.0))?;
        let count = elements.len();
        let max = fmt.max_array_size();

        let mut parts = Vec::new();
        if max != UNBOUNDED && (count as i64) > max {
            // elide the middle: first half, a marker, then the tail
            let half = (max / 2) as usize;
            for &v in &elements[..half] {
                parts.push(self.trace_value(v, fmt, visited)?);
            }
            parts.push(ELLIPSIS.to_string());
            for &v in &elements[count - half..] {
                parts.push(self.trace_value(v, fmt, visited)?);
            }
        } else {
            for &v in elements {
                parts.push(self.trace_value(v, fmt, visited)?);
            }
        }

        if parts.is_empty() {
            Ok("{ }".to_string())
        } else {
            Ok(format!("{{ {} }}", parts.join(", ")))
        }
    }

    /// Render a class instance. Field selection (declared order, filter
    /// membership) is mode-independent; only the wrapping differs.
    fn class_trace(
        &self,
        handle: HeapHandle,
        fmt: &mut OutputFormatParameters,
        visited: &mut FxHashSet<HeapHandle>,
    ) -> Result<String, StrandError> {
        if !fmt.continue_output_trace() {
            fmt.restore_output_trace_depth();
            return Ok(ELLIPSIS.to_string());
        }
        let result = self.class_body(handle, fmt, visited);
        fmt.restore_output_trace_depth();
        result
    }

    fn class_body(
        &self,
        handle: HeapHandle,
        fmt: &mut OutputFormatParameters,
        visited: &mut FxHashSet<HeapHandle>,
    ) -> Result<String, StrandError> {
        let instance = self
            .heap
            .get_instance(handle)
            .ok_or_else(|| StrandError::invalid_handle(handle.0))?;
        let class = self
            .exe
            .class(instance.class)
            .ok_or_else(|| StrandError::invalid_handle(handle.0))?;

        let (open, close) = match self.mode {
            RenderMode::Print => ('(', ')'),
            RenderMode::Watch => ('{', '}'),
        };

        let mut parts = Vec::new();
        if class.symbols.is_empty() {
            // primitive/native wrapper: positional values, no name prefix
            for &v in &instance.fields {
                parts.push(self.trace_value(v, fmt, visited)?);
            }
        } else {
            let restricted = self
                .filter
                .map(|f| f.has_class(&class.name))
                .unwrap_or(false);
            for (position, sym) in class
                .symbols
                .iter()
                .filter(|s| !s.is_static && s.function_scope.is_global())
                .enumerate()
            {
                if restricted
                    && !self
                        .filter
                        .map(|f| f.allows(&class.name, &sym.name))
                        .unwrap_or(true)
                {
                    continue;
                }
                let v = instance
                    .fields
                    .get(position)
                    .copied()
                    .unwrap_or(Value::Invalid);
                parts.push(format!("{} = {}", sym.name, self.trace_value(v, fmt, visited)?));
            }
        }

        Ok(format!("{}{}{}{}", class.name, open, parts.join(", "), close))
    }
}
