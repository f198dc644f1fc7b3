//! Compiled-program metadata: the code block tree, class and procedure
//! tables, and their symbol tables.
//!
//! One [`SymbolTable`] exists per code block and per class, created when
//! the program is assembled and logically append-only afterward (aside
//! from tombstoning for interactive redefinition). The block tree's
//! parent links are static metadata recorded here; name resolution walks
//! them without any compiler-maintained scope stack.

use crate::symbols::{BlockId, ClassScope, SymbolTable};
use crate::value::ProcId;

/// What kind of lexical region a code block is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// The top-level program block (block 0).
    TopLevel,
    /// An inline nested language block.
    Language,
    /// A function body.
    Function,
}

/// One lexical region of compiled code.
#[derive(Debug)]
pub struct CodeBlock {
    pub id: BlockId,
    pub parent: Option<BlockId>,
    pub kind: BlockKind,
    pub symbols: SymbolTable,
}

/// A class: its member symbol table (fields and statics, distinguished by
/// `is_static`) and the procedures it owns.
#[derive(Debug)]
pub struct ClassNode {
    pub id: ClassScope,
    pub name: String,
    pub symbols: SymbolTable,
    pub procedures: Vec<ProcId>,
}

/// A method or free function and the block its body executes in.
#[derive(Debug)]
pub struct ProcNode {
    pub id: ProcId,
    pub name: String,
    pub class: ClassScope,
    pub block: BlockId,
}

/// The compiled program: block tree, class table, procedure table.
#[derive(Debug)]
pub struct Executable {
    blocks: Vec<CodeBlock>,
    classes: Vec<ClassNode>,
    procedures: Vec<ProcNode>,
}

impl Executable {
    /// An executable with just the top-level block.
    pub fn new() -> Self {
        Executable {
            blocks: vec![CodeBlock {
                id: BlockId::TOP_LEVEL,
                parent: None,
                kind: BlockKind::TopLevel,
                symbols: SymbolTable::new(),
            }],
            classes: Vec::new(),
            procedures: Vec::new(),
        }
    }

    /// Add a nested block under `parent`.
    pub fn add_block(&mut self, parent: BlockId, kind: BlockKind) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(CodeBlock {
            id,
            parent: Some(parent),
            kind,
            symbols: SymbolTable::new(),
        });
        id
    }

    pub fn block(&self, id: BlockId) -> Option<&CodeBlock> {
        self.blocks.get(id.0 as usize)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut CodeBlock> {
        self.blocks.get_mut(id.0 as usize)
    }

    /// Static parent of a block, if any.
    pub fn parent_of(&self, id: BlockId) -> Option<BlockId> {
        self.block(id).and_then(|b| b.parent)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.blocks.iter()
    }

    pub fn add_class(&mut self, name: &str) -> ClassScope {
        let id = ClassScope(self.classes.len() as u32);
        self.classes.push(ClassNode {
            id,
            name: name.to_string(),
            symbols: SymbolTable::new(),
            procedures: Vec::new(),
        });
        id
    }

    pub fn class(&self, id: ClassScope) -> Option<&ClassNode> {
        if id.is_global() {
            return None;
        }
        self.classes.get(id.0 as usize)
    }

    pub fn class_mut(&mut self, id: ClassScope) -> Option<&mut ClassNode> {
        if id.is_global() {
            return None;
        }
        self.classes.get_mut(id.0 as usize)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&ClassNode> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn class_name(&self, id: ClassScope) -> Option<&str> {
        self.class(id).map(|c| c.name.as_str())
    }

    /// Register a procedure; `class` is `ClassScope::GLOBAL` for free
    /// functions. The procedure is also recorded on its owning class.
    pub fn add_procedure(&mut self, name: &str, class: ClassScope, block: BlockId) -> ProcId {
        let id = ProcId(self.procedures.len() as u32);
        self.procedures.push(ProcNode {
            id,
            name: name.to_string(),
            class,
            block,
        });
        if let Some(c) = self.class_mut(class) {
            c.procedures.push(id);
        }
        id
    }

    pub fn procedure(&self, id: ProcId) -> Option<&ProcNode> {
        self.procedures.get(id.0 as usize)
    }
}

impl Default for Executable {
    fn default() -> Self {
        Self::new()
    }
}
