//! The reflective inspection layer.
//!
//! An [`ExecutionMirror`] binds to exactly one executive's memory and
//! heap for its lifetime and reflects live values back to consumers (the
//! REPL, watch windows, core dumps): it resolves bare names to storage
//! through the executive's scope metadata, unpacks raw values into
//! structured [`MirrorObject`] trees, renders bounded strings, and
//! supports mutating a single variable followed by dependency-driven
//! re-execution.
//!
//! Every operation runs synchronously against a quiescent executive;
//! nothing here is designed for concurrent calls against one executive.

pub mod filter;
pub mod trace;
pub mod unpack;

pub use filter::PropertyFilter;
pub use trace::{OutputFormatParameters, RenderMode, ValueTracer};
pub use unpack::{repack, unpack_value, MirrorArray, MirrorObject, Payload};

use tracing::{debug, trace as trace_log};

use crate::error::StrandError;
use crate::reader::Expr;
use crate::symbols::{BlockId, ClassScope, FunctionScope, SymbolNode};
use crate::value::Value;
use crate::vm::Executive;

/// Where a resolved symbol's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolLocation {
    /// Slot `index` of a code block's global memory segment.
    Block(BlockId, usize),
    /// Slot `index` of a class's member table (instance field position).
    Class(ClassScope, usize),
}

/// A successful name resolution: the storage location plus a copy of the
/// symbol node it resolved to.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub location: SymbolLocation,
    pub node: SymbolNode,
}

/// Result of a variable mutation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetStatus {
    /// Written, and the dependent subgraph marked for re-execution.
    Set,
    /// The name resolved to something without a dependency-graph node
    /// (imperative local, builder global, class member); nothing was
    /// written. A no-op by design, not an error.
    NotSet,
}

/// Per-debug-session watch state: the names being watched. Explicitly
/// passed into watch calls so separate sessions (or tests) never share
/// state through the mirror.
#[derive(Debug, Default)]
pub struct WatchSession {
    names: Vec<String>,
}

impl WatchSession {
    pub fn new() -> Self {
        WatchSession { names: Vec::new() }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn add(&mut self, name: &str) {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.names.retain(|n| n != name);
    }
}

/// Hard-wrap width of one core dump line.
const DUMP_WRAP_WIDTH: usize = 1020;

/// The reflective front end over one executive.
pub struct ExecutionMirror<'a> {
    exec: &'a mut Executive,
}

impl<'a> ExecutionMirror<'a> {
    pub fn new(exec: &'a mut Executive) -> Self {
        ExecutionMirror { exec }
    }

    // =========================================================================
    // Name resolution
    // =========================================================================

    /// Resolve a bare name against the current execution context: the
    /// live stack frame's scopes when the executive is inside a method
    /// dispatch, the current block's lexical chain otherwise.
    pub fn resolve(&self, name: &str) -> Result<Resolved, StrandError> {
        self.resolve_in(name, self.exec.current_block())
    }

    fn resolve_in(&self, name: &str, static_block: BlockId) -> Result<Resolved, StrandError> {
        match self.exec.frame() {
            Some(f) if !f.class_scope.is_global() => self.resolve_class_scoped(
                name,
                f.class_scope,
                f.function_scope,
                f.function_block,
            ),
            Some(f) => self.resolve_global_chain(name, f.function_block, f.function_scope),
            None => self.resolve_global_chain(name, static_block, FunctionScope::GLOBAL),
        }
    }

    /// Resolution inside a method of `class`. Locals of the dispatched
    /// function are consulted through the exact lookup whenever the
    /// function's body block is not the currently running block (which
    /// covers ordinary dispatch from another block, and nested language
    /// blocks inside the method); otherwise fields take over via the
    /// class-member precedence lookup.
    fn resolve_class_scoped(
        &self,
        name: &str,
        class: ClassScope,
        function: FunctionScope,
        function_block: BlockId,
    ) -> Result<Resolved, StrandError> {
        let class_node = self
            .exec
            .executable
            .class(class)
            .ok_or_else(|| StrandError::from(format!("unknown class scope {}", class)))?;
        let table = &class_node.symbols;

        let mut found = None;
        if function_block != self.exec.current_block() {
            found = table.index_of_exact(name, class, function);
            if found.is_some() {
                trace_log!(name, class = %class, "resolved via exact method-local lookup");
            }
        }
        if found.is_none() {
            found = table.index_of_class_member(name, class, function);
            if found.is_some() {
                trace_log!(name, class = %class, "resolved via class-member precedence");
            }
        }

        match found {
            Some(index) => self.checked(Resolved {
                location: SymbolLocation::Class(class, index),
                node: table.get(index).cloned().expect("index from lookup"),
            }),
            None => Err(StrandError::name_not_found(name)),
        }
    }

    /// Global-path resolution: walk the lexical chain from `start`
    /// outward, trying a function-scoped match then a global match at
    /// each level. If the whole chain misses, restart from the parent of
    /// `start` with global-scope lookups only: local shadowing no longer
    /// applies once the function's own block chain is exhausted.
    fn resolve_global_chain(
        &self,
        name: &str,
        start: BlockId,
        function: FunctionScope,
    ) -> Result<Resolved, StrandError> {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let block = self
                .exec
                .executable
                .block(id)
                .ok_or_else(|| StrandError::from(format!("unknown block {}", id)))?;
            if let Some(index) = block
                .symbols
                .index_of_exact(name, ClassScope::GLOBAL, function)
            {
                trace_log!(name, block = id.0, "resolved function-scoped");
                return self.resolved_in_block(id, index);
            }
            if let Some(index) =
                block
                    .symbols
                    .index_of_exact(name, ClassScope::GLOBAL, FunctionScope::GLOBAL)
            {
                trace_log!(name, block = id.0, "resolved global-scoped");
                return self.resolved_in_block(id, index);
            }
            cursor = block.parent;
        }

        let mut cursor = self.exec.executable.parent_of(start);
        while let Some(id) = cursor {
            let block = self
                .exec
                .executable
                .block(id)
                .ok_or_else(|| StrandError::from(format!("unknown block {}", id)))?;
            if let Some(index) =
                block
                    .symbols
                    .index_of_exact(name, ClassScope::GLOBAL, FunctionScope::GLOBAL)
            {
                trace_log!(name, block = id.0, "resolved on global fallback pass");
                return self.resolved_in_block(id, index);
            }
            cursor = block.parent;
        }

        Err(StrandError::name_not_found(name))
    }

    fn resolved_in_block(&self, block: BlockId, index: usize) -> Result<Resolved, StrandError> {
        let node = self
            .exec
            .executable
            .block(block)
            .and_then(|b| b.symbols.get(index))
            .cloned()
            .expect("index from lookup");
        self.checked(Resolved {
            location: SymbolLocation::Block(block, index),
            node,
        })
    }

    /// Fixed-size array declarations are rejected by every resolution
    /// path: the mirror does not model them, and silently misreading one
    /// would mask the gap.
    fn checked(&self, resolved: Resolved) -> Result<Resolved, StrandError> {
        if resolved.node.static_array_sizes.is_some() {
            return Err(StrandError::unsupported(format!(
                "fixed-size array symbol '{}'",
                resolved.node.name
            )));
        }
        Ok(resolved)
    }

    // =========================================================================
    // Value fetch
    // =========================================================================

    /// Resolve and unpack a variable's current value.
    pub fn get_value(&self, name: &str) -> Result<MirrorObject, StrandError> {
        let resolved = self.resolve(name)?;
        self.fetch(name, &resolved)
    }

    /// Like [`ExecutionMirror::get_value`] with the block and class scope
    /// pinned by the consumer (debugger stepping into nested blocks).
    pub fn get_value_scoped(
        &self,
        name: &str,
        block: BlockId,
        class: ClassScope,
    ) -> Result<MirrorObject, StrandError> {
        let resolved = if class.is_global() {
            self.resolve_global_chain(name, block, FunctionScope::GLOBAL)?
        } else {
            let table = &self
                .exec
                .executable
                .class(class)
                .ok_or_else(|| StrandError::from(format!("unknown class scope {}", class)))?
                .symbols;
            match table.index_of_class_member(name, class, FunctionScope::GLOBAL) {
                Some(index) => self.checked(Resolved {
                    location: SymbolLocation::Class(class, index),
                    node: table.get(index).cloned().expect("index from lookup"),
                })?,
                None => return Err(StrandError::name_not_found(name)),
            }
        };
        self.fetch(name, &resolved)
    }

    fn fetch(&self, name: &str, resolved: &Resolved) -> Result<MirrorObject, StrandError> {
        match resolved.location {
            SymbolLocation::Block(block, index) => {
                if !resolved.node.function_scope.is_global() {
                    return Err(StrandError::unsupported(format!(
                        "fetch of function-local '{}' outside a live frame",
                        name
                    )));
                }
                let value = self.exec.read_slot(block, index);
                if value.is_invalid() {
                    return Err(StrandError::uninitialized(name));
                }
                self.unpack(value)
            }
            SymbolLocation::Class(..) => Err(StrandError::unsupported(format!(
                "fetch of class member '{}' requires an instance",
                name
            ))),
        }
    }

    /// Dynamic type name of a variable's current value; class instances
    /// report their class name.
    pub fn get_type(&self, name: &str) -> Result<String, StrandError> {
        let resolved = self.resolve(name)?;
        match resolved.location {
            SymbolLocation::Block(block, index) => {
                let value = self.exec.read_slot(block, index);
                Ok(match value {
                    Value::Pointer(h) => self
                        .exec
                        .heap
                        .get_instance(h)
                        .and_then(|i| self.exec.executable.class_name(i.class))
                        .unwrap_or("pointer")
                        .to_string(),
                    other => other.type_name().to_string(),
                })
            }
            SymbolLocation::Class(..) => Ok(resolved.node.declared_type.name().to_string()),
        }
    }

    // =========================================================================
    // Structured access
    // =========================================================================

    /// Unpack a raw value against this executive's heap.
    pub fn unpack(&self, value: Value) -> Result<MirrorObject, StrandError> {
        unpack_value(value, &self.exec.heap)
    }

    /// Rebuild a raw value from a mirror tree into this executive's heap.
    pub fn repack(&mut self, obj: &MirrorObject) -> Result<Value, StrandError> {
        repack(obj, &mut self.exec.heap)
    }

    /// Named instance fields of an unpacked class instance, in declared
    /// order.
    pub fn get_properties(
        &self,
        obj: &MirrorObject,
    ) -> Result<Vec<(String, MirrorObject)>, StrandError> {
        let handle = match obj.type_tag {
            crate::symbols::TypeTag::Pointer(_) => obj
                .handle()
                .ok_or_else(|| StrandError::type_mismatch("instance handle", "empty payload"))?,
            other => return Err(StrandError::type_mismatch("pointer", other.name())),
        };
        let instance = self
            .exec
            .heap
            .get_instance(handle)
            .ok_or_else(|| StrandError::invalid_handle(handle.0))?;
        let class = self
            .exec
            .executable
            .class(instance.class)
            .ok_or_else(|| StrandError::invalid_handle(handle.0))?;

        let mut props = Vec::new();
        for (position, sym) in class
            .symbols
            .iter()
            .filter(|s| !s.is_static && s.function_scope.is_global())
            .enumerate()
        {
            let value = instance
                .fields
                .get(position)
                .copied()
                .unwrap_or(Value::Invalid);
            props.push((sym.name.to_string(), self.unpack(value)?));
        }
        Ok(props)
    }

    /// Members of an unpacked array.
    pub fn get_array_elements(
        &self,
        obj: &MirrorObject,
    ) -> Result<Vec<MirrorObject>, StrandError> {
        match &obj.payload {
            Some(Payload::Array(arr)) => Ok(arr.members.clone()),
            Some(Payload::Handle(h)) if obj.type_tag == crate::symbols::TypeTag::Array => {
                let unpacked = self.unpack(Value::Array(*h))?;
                match unpacked.payload {
                    Some(Payload::Array(arr)) => Ok(arr.members),
                    _ => Ok(Vec::new()),
                }
            }
            _ => Err(StrandError::type_mismatch("array", obj.type_tag.name())),
        }
    }

    // =========================================================================
    // Textual rendering
    // =========================================================================

    /// Bounded string form of a variable's current value, using the
    /// executive's configured default bounds.
    pub fn get_string_value(&self, name: &str, mode: RenderMode) -> Result<String, StrandError> {
        let resolved = self.resolve(name)?;
        let value = match resolved.location {
            SymbolLocation::Block(block, index) => self.exec.read_slot(block, index),
            SymbolLocation::Class(..) => {
                return Err(StrandError::unsupported(format!(
                    "rendering of class member '{}' requires an instance",
                    name
                )))
            }
        };
        let mut fmt = self.default_format();
        self.tracer(mode).string_value(value, &mut fmt)
    }

    /// Bounded string form of a raw value.
    pub fn string_of(
        &self,
        value: Value,
        mode: RenderMode,
        fmt: &mut OutputFormatParameters,
    ) -> Result<String, StrandError> {
        self.tracer(mode).string_value(value, fmt)
    }

    /// Dump every non-temporary global of the top-level block as
    /// `name = value`, one per line, hard-wrapped at 1020 characters
    /// with continuation lines.
    pub fn get_core_dump(&self) -> Result<String, StrandError> {
        let block = self
            .exec
            .executable
            .block(BlockId::TOP_LEVEL)
            .expect("top-level block always exists");
        let tracer = self.tracer(RenderMode::Watch);

        let mut lines = Vec::new();
        for sym in block
            .symbols
            .iter()
            .filter(|s| !s.is_temporary && s.function_scope.is_global())
        {
            let value = self.exec.read_slot(BlockId::TOP_LEVEL, sym.storage_index);
            let mut fmt = self.default_format();
            let text = tracer.string_value(value, &mut fmt)?;
            lines.push(wrap_hard(
                &format!("{} = {}", sym.name, text),
                DUMP_WRAP_WIDTH,
            ));
        }
        Ok(lines.join("\n"))
    }

    fn tracer(&self, mode: RenderMode) -> ValueTracer<'_> {
        ValueTracer::new(
            &self.exec.heap,
            &self.exec.executable,
            self.exec.property_filter(),
            mode,
        )
    }

    fn default_format(&self) -> OutputFormatParameters {
        OutputFormatParameters::new(
            self.exec.options.max_array_size,
            self.exec.options.max_output_depth,
        )
    }

    // =========================================================================
    // Mutation and re-execution
    // =========================================================================

    /// Write a new value into an associative variable's slot and mark
    /// its dependency subgraph dirty. Names without a graph node are a
    /// no-op returning [`SetStatus::NotSet`]: they have no dependency
    /// tracking to propagate through.
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<SetStatus, StrandError> {
        let resolved = self.resolve(name)?;
        let (block, index) = match resolved.location {
            SymbolLocation::Block(b, i) if resolved.node.function_scope.is_global() => (b, i),
            _ => return Ok(SetStatus::NotSet),
        };
        let node_id = match self.exec.graph.node_for_slot(block, index) {
            Some(id) => id,
            None => return Ok(SetStatus::NotSet),
        };

        let literal = match value {
            Value::Int(n) => Expr::IntLit(n),
            Value::Double(d) => Expr::DoubleLit(d),
            Value::Bool(b) => Expr::BoolLit(b),
            Value::Char(c) => Expr::CharLit(c),
            Value::Null => Expr::NullLit,
            other => {
                return Err(StrandError::unsupported(format!(
                    "mutation with a {} value",
                    other.type_name()
                )))
            }
        };

        debug!(name, node = node_id, "writing value and dirtying dependents");
        self.exec.write_slot(block, index, value);
        // delta execution must reproduce the written value, not the
        // variable's original expression
        self.exec.rewrite_stmt_expr(node_id, literal);
        self.exec.graph.mark_dirty_from(node_id);
        Ok(SetStatus::Set)
    }

    /// [`ExecutionMirror::set_value`] followed by delta re-execution of
    /// the program. Re-execution failures propagate uncaught so the
    /// interactive surface sees crashes instead of hiding them.
    pub fn set_value_and_execute(
        &mut self,
        name: &str,
        value: Value,
    ) -> Result<SetStatus, StrandError> {
        let status = self.set_value(name, value)?;
        if status == SetStatus::Set {
            self.exec.execute_delta()?;
        }
        Ok(status)
    }

    // =========================================================================
    // Watch sessions
    // =========================================================================

    /// Register a name in the session and return its current rendering.
    pub fn watch(
        &self,
        session: &mut WatchSession,
        name: &str,
    ) -> Result<String, StrandError> {
        let text = self.get_string_value(name, RenderMode::Watch)?;
        session.add(name);
        Ok(text)
    }

    /// Re-render every watched name. Failures render as their error
    /// description: a watch window shows "value unavailable" rather than
    /// tearing down the session.
    pub fn refresh(&self, session: &WatchSession) -> Vec<(String, String)> {
        session
            .names()
            .iter()
            .map(|name| {
                let text = self
                    .get_string_value(name, RenderMode::Watch)
                    .unwrap_or_else(|e| format!("<{}>", e.description()));
                (name.clone(), text)
            })
            .collect()
    }
}

/// Hard-wrap a line at `width` characters, continuation on fresh lines.
fn wrap_hard(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(width)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
