//! # Strand - An Associative Scripting Runtime with a Reflective Mirror
//!
//! Strand is a small associative (dataflow) scripting runtime written in
//! Rust. Its core is the symbol resolution layer that maps names to
//! storage across nested lexical, function, and class scopes, and the
//! "mirror": the reflective value-inspection API behind the REPL, watch
//! windows, and print/trace output.
//!
//! ## Quick Start
//!
//! ```
//! use strand::{Executive, ExecutionMirror, RenderMode, Value};
//!
//! let mut exec = Executive::new();
//! exec.run("a = 5; b = a + 1;").unwrap();
//!
//! let mut mirror = ExecutionMirror::new(&mut exec);
//! assert_eq!(mirror.get_string_value("b", RenderMode::Watch).unwrap(), "6");
//!
//! // mutate `a` and replay the dependent subgraph
//! mirror.set_value_and_execute("a", Value::Int(10)).unwrap();
//! assert_eq!(mirror.get_value("b").unwrap().as_int(), Some(11));
//! ```
//!
//! ## Architecture
//!
//! A program moves through three layers:
//!
//! 1. **Reader** - Parse assignment statements from text
//! 2. **Executive** - Bind statements into symbol tables and the
//!    dependency graph, then evaluate (fully or delta-wise)
//! 3. **Mirror** - Resolve names against the live scope context and
//!    reflect values back as structured objects or bounded strings
//!
//! Rendering is always bounded: a depth budget refuses descent with an
//! ellipsis, long arrays elide their middle, and a visited-handle guard
//! keeps self-referential arrays from recursing forever.

pub mod error;
pub mod executable;
pub mod mirror;
pub mod reader;
pub mod repl;
pub mod symbols;
pub mod value;
pub mod vm;

pub use error::StrandError;
pub use executable::{BlockKind, ClassNode, CodeBlock, Executable, ProcNode};
pub use mirror::{
    ExecutionMirror, MirrorArray, MirrorObject, OutputFormatParameters, Payload, PropertyFilter,
    RenderMode, Resolved, SetStatus, SymbolLocation, ValueTracer, WatchSession,
};
pub use reader::parse_program;
pub use symbols::{Append, BlockId, ClassScope, FunctionScope, SymbolNode, SymbolTable, TypeTag};
pub use value::{Heap, HeapHandle, HeapObject, ProcId, Value};
pub use vm::{Executive, Options, StackFrame};
