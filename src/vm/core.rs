//! The executive: the minimal associative evaluator the mirror binds to.
//!
//! Owns the compiled executable, per-block global memory segments, the
//! heap, the dependency graph, and the record of the currently dispatched
//! stack frame. Statements execute synchronously; delta execution
//! re-evaluates only dirty graph nodes, in declaration order.

use once_cell::unsync::OnceCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, trace};

use crate::error::StrandError;
use crate::executable::Executable;
use crate::mirror::filter::PropertyFilter;
use crate::mirror::trace::{DEFAULT_MAX_ARRAY_SIZE, DEFAULT_MAX_OUTPUT_DEPTH};
use crate::reader::{self, BinOp, Expr, Stmt};
use crate::symbols::{BlockId, ClassScope, FunctionScope, SymbolNode};
use crate::value::{Heap, Value};
use crate::vm::graph::DependencyGraph;

/// Runtime options. Read-only after construction.
#[derive(Debug, Clone)]
pub struct Options {
    /// Optional path to the property filter file restricting which class
    /// fields are rendered. Absent file means no filtering.
    pub property_filter_path: Option<PathBuf>,
    pub max_array_size: i64,
    pub max_output_depth: i64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            property_filter_path: None,
            max_array_size: DEFAULT_MAX_ARRAY_SIZE,
            max_output_depth: DEFAULT_MAX_OUTPUT_DEPTH,
        }
    }
}

/// The live record of the currently dispatched method: which class,
/// function, and body block the executive is inside. Name resolution
/// consults this instead of statically passed-in scopes whenever present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFrame {
    pub class_scope: ClassScope,
    pub function_scope: FunctionScope,
    pub function_block: BlockId,
}

/// One compiled statement; its index equals its graph node id.
#[derive(Debug, Clone)]
struct CompiledStmt {
    target: Rc<str>,
    block: BlockId,
    storage_index: usize,
    expr: Rc<Expr>,
}

/// The execution engine the mirror binds to.
pub struct Executive {
    pub executable: Executable,
    pub heap: Heap,
    pub graph: DependencyGraph,
    pub options: Options,
    memory: Vec<Vec<Value>>,
    stmts: Vec<CompiledStmt>,
    frame: Option<StackFrame>,
    current_block: BlockId,
    filter: OnceCell<Option<PropertyFilter>>,
}

impl Executive {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Executive {
            executable: Executable::new(),
            heap: Heap::new(),
            graph: DependencyGraph::new(),
            options,
            memory: Vec::new(),
            stmts: Vec::new(),
            frame: None,
            current_block: BlockId::TOP_LEVEL,
            filter: OnceCell::new(),
        }
    }

    // =========================================================================
    // Program assembly and execution
    // =========================================================================

    /// Parse, bind, and execute a source fragment against the top-level
    /// block. Repeated calls accumulate: redefinition of an existing
    /// target tombstones the old symbol and re-propagates through the
    /// dependency graph.
    pub fn run(&mut self, src: &str) -> Result<(), StrandError> {
        let stmts = reader::parse_program(src)?;
        debug!(count = stmts.len(), "binding statements");
        for stmt in stmts {
            self.bind_stmt(BlockId::TOP_LEVEL, stmt)?;
        }
        self.execute_delta()
    }

    /// Bind one statement into `block`, creating or rebinding its graph
    /// node, and mark the affected subgraph dirty.
    pub fn bind_stmt(&mut self, block: BlockId, stmt: Stmt) -> Result<usize, StrandError> {
        let mut deps = Vec::new();
        for name in stmt.expr.free_names() {
            let (dep_block, dep_index) = self
                .resolve_global(block, &name)
                .ok_or_else(|| StrandError::name_not_found(&name))?;
            if let Some(node) = self.graph.node_for_slot(dep_block, dep_index) {
                if !deps.contains(&node) {
                    deps.push(node);
                }
            }
        }

        let table = &mut self
            .executable
            .block_mut(block)
            .ok_or_else(|| StrandError::from(format!("no such block {}", block)))?
            .symbols;

        let existing = table.index_of_exact(&stmt.target, ClassScope::GLOBAL, FunctionScope::GLOBAL);
        let node_id = match existing {
            Some(old_index) => {
                // Interactive redefinition: tombstone, re-append, keep the
                // graph node identity so dependents stay wired.
                let old = table.get(old_index).cloned().expect("index from lookup");
                table.undefine(&old);
                let new_index = table.append(SymbolNode::global(&stmt.target, block)).index();
                self.ensure_slot(block, new_index);
                match self.graph.node_for_slot(block, old_index) {
                    Some(id) => {
                        self.graph.rebind(id, new_index, deps);
                        self.stmts[id] = CompiledStmt {
                            target: Rc::from(stmt.target.as_str()),
                            block,
                            storage_index: new_index,
                            expr: Rc::new(stmt.expr),
                        };
                        self.graph.mark_dirty_from(id);
                        id
                    }
                    None => self.push_stmt(block, new_index, stmt, deps),
                }
            }
            None => {
                let index = table.append(SymbolNode::global(&stmt.target, block)).index();
                self.ensure_slot(block, index);
                self.push_stmt(block, index, stmt, deps)
            }
        };
        Ok(node_id)
    }

    fn push_stmt(&mut self, block: BlockId, storage_index: usize, stmt: Stmt, deps: Vec<usize>) -> usize {
        let id = self.graph.bind(block, storage_index, deps);
        debug_assert_eq!(id, self.stmts.len());
        self.stmts.push(CompiledStmt {
            target: Rc::from(stmt.target.as_str()),
            block,
            storage_index,
            expr: Rc::new(stmt.expr),
        });
        id
    }

    /// Re-evaluate every dirty graph node in declaration order, clearing
    /// dirtiness as each settles. Evaluation failures propagate.
    pub fn execute_delta(&mut self) -> Result<(), StrandError> {
        let dirty = self.graph.dirty_ids();
        debug!(dirty = dirty.len(), "delta execution");
        for id in dirty {
            let stmt = self.stmts[id].clone();
            trace!(target = %stmt.target, node = id, "re-evaluating");
            let value = self.eval_in(stmt.block, &stmt.expr)?;
            self.write_slot(stmt.block, stmt.storage_index, value);
            self.graph.clear_dirty(id);
        }
        Ok(())
    }

    /// Replace the expression a graph node re-evaluates. Used by the
    /// mirror's variable mutation so delta execution reproduces the
    /// written value instead of reverting to the original expression.
    pub(crate) fn rewrite_stmt_expr(&mut self, node_id: usize, expr: Expr) {
        if let Some(stmt) = self.stmts.get_mut(node_id) {
            stmt.expr = Rc::new(expr);
        }
    }

    // =========================================================================
    // Expression evaluation
    // =========================================================================

    fn eval_in(&mut self, block: BlockId, expr: &Expr) -> Result<Value, StrandError> {
        match expr {
            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::DoubleLit(d) => Ok(Value::Double(*d)),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::CharLit(c) => Ok(Value::Char(*c)),
            Expr::StrLit(s) => Ok(self.heap.alloc_str(s)),
            Expr::NullLit => Ok(Value::Null),
            Expr::Ident(name) => {
                let (b, i) = self
                    .resolve_global(block, name)
                    .ok_or_else(|| StrandError::name_not_found(name))?;
                let v = self.read_slot(b, i);
                if v.is_invalid() {
                    return Err(StrandError::uninitialized(name));
                }
                Ok(v)
            }
            Expr::Neg(inner) => match self.eval_in(block, inner)? {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Double(d) => Ok(Value::Double(-d)),
                other => Err(StrandError::type_mismatch("number", other.type_name())),
            },
            Expr::Binary(op, lhs, rhs) => {
                let l = self.eval_in(block, lhs)?;
                let r = self.eval_in(block, rhs)?;
                self.apply_binop(*op, l, r)
            }
            Expr::ArrayLit(elems) => {
                let mut values = Vec::with_capacity(elems.len());
                for e in elems {
                    values.push(self.eval_in(block, e)?);
                }
                Ok(self.heap.alloc_array(values))
            }
        }
    }

    fn apply_binop(&self, op: BinOp, l: Value, r: Value) -> Result<Value, StrandError> {
        if let (Value::Int(a), Value::Int(b)) = (l, r) {
            return match op {
                BinOp::Add => Ok(Value::Int(a + b)),
                BinOp::Sub => Ok(Value::Int(a - b)),
                BinOp::Mul => Ok(Value::Int(a * b)),
                BinOp::Div => {
                    if b == 0 {
                        Err(StrandError::DivisionByZero)
                    } else {
                        Ok(Value::Int(a / b))
                    }
                }
            };
        }
        let a = l
            .as_number()
            .ok_or_else(|| StrandError::type_mismatch("number", l.type_name()))?;
        let b = r
            .as_number()
            .ok_or_else(|| StrandError::type_mismatch("number", r.type_name()))?;
        Ok(Value::Double(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
        }))
    }

    /// Resolve a global name starting at `block` and walking the static
    /// parent chain. Executive-side resolution: globals only.
    fn resolve_global(&self, block: BlockId, name: &str) -> Option<(BlockId, usize)> {
        let mut cursor = Some(block);
        while let Some(id) = cursor {
            let b = self.executable.block(id)?;
            if let Some(i) = b
                .symbols
                .index_of_exact(name, ClassScope::GLOBAL, FunctionScope::GLOBAL)
            {
                return Some((id, i));
            }
            cursor = b.parent;
        }
        None
    }

    // =========================================================================
    // Memory segments
    // =========================================================================

    fn ensure_slot(&mut self, block: BlockId, index: usize) {
        let b = block.0 as usize;
        if self.memory.len() <= b {
            self.memory.resize_with(b + 1, Vec::new);
        }
        let segment = &mut self.memory[b];
        if segment.len() <= index {
            segment.resize(index + 1, Value::Invalid);
        }
    }

    /// Raw slot read; `Invalid` for never-written slots.
    pub fn read_slot(&self, block: BlockId, index: usize) -> Value {
        self.memory
            .get(block.0 as usize)
            .and_then(|seg| seg.get(index))
            .copied()
            .unwrap_or(Value::Invalid)
    }

    /// Raw slot write. Must only happen while execution is quiescent.
    pub fn write_slot(&mut self, block: BlockId, index: usize, value: Value) {
        self.ensure_slot(block, index);
        self.memory[block.0 as usize][index] = value;
    }

    // =========================================================================
    // Frame and block context
    // =========================================================================

    pub fn frame(&self) -> Option<&StackFrame> {
        self.frame.as_ref()
    }

    /// Enter a method-dispatch frame. Name resolution will use the
    /// frame's scopes until [`Executive::clear_frame`].
    pub fn set_frame(&mut self, frame: StackFrame) {
        self.frame = Some(frame);
    }

    pub fn clear_frame(&mut self) {
        self.frame = None;
    }

    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    pub fn set_current_block(&mut self, block: BlockId) {
        self.current_block = block;
    }

    // =========================================================================
    // Helpers for program assembly outside the reader
    // =========================================================================

    /// Declare a global in `block` and give it a value. Used by hosts and
    /// tests assembling programs without the reader; such globals have no
    /// dependency-graph node.
    pub fn define_global(&mut self, block: BlockId, name: &str, value: Value) -> Result<usize, StrandError> {
        let table = &mut self
            .executable
            .block_mut(block)
            .ok_or_else(|| StrandError::from(format!("no such block {}", block)))?
            .symbols;
        let index = table.append(SymbolNode::global(name, block)).index();
        self.write_slot(block, index, value);
        Ok(index)
    }

    /// The lazily-loaded property filter, shared by every render call.
    /// Load failures are swallowed: the filter is cosmetic.
    pub fn property_filter(&self) -> Option<&PropertyFilter> {
        self.filter
            .get_or_init(|| {
                self.options
                    .property_filter_path
                    .as_deref()
                    .and_then(PropertyFilter::load)
            })
            .as_ref()
    }
}

impl Default for Executive {
    fn default() -> Self {
        Self::new()
    }
}
