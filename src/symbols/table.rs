//! Per-scope symbol table with disambiguated lookup.
//!
//! One table owns the symbols of exactly one lexical scope: one code
//! block, or one class's members. The table keeps two indices:
//!
//! - a primary ordered store (`Vec`), where position == storage index and
//!   iteration order == declaration order; growth is append-only, and
//!   `undefine` tombstones slots in place so indices held elsewhere stay
//!   valid
//! - a secondary name index (`FxHashMap<Rc<str>, SmallVec<usize>>`) for
//!   O(1)-average lookup disambiguated by class and function scope

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::rc::Rc;

use crate::symbols::node::{ClassScope, FunctionScope, SymbolNode};

/// Outcome of [`SymbolTable::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    /// Node was added; carries its storage index.
    Added(usize),
    /// An equal declaration (name+class+function+block) already exists;
    /// carries the existing node's storage index. Nothing was modified.
    Exists(usize),
}

impl Append {
    /// Storage index regardless of outcome.
    pub fn index(self) -> usize {
        match self {
            Append::Added(i) | Append::Exists(i) => i,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Append::Added(_))
    }
}

/// Symbol collection for one lexical scope.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolNode>,
    by_name: FxHashMap<Rc<str>, SmallVec<[usize; 2]>>,
    global_size: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: Vec::new(),
            by_name: FxHashMap::default(),
            global_size: 0,
        }
    }

    /// Append a node, assigning its storage index.
    ///
    /// A node equal by declaration to an existing one is a no-op returning
    /// [`Append::Exists`]: never panics, never silently duplicates.
    pub fn append(&mut self, mut node: SymbolNode) -> Append {
        if let Some(indices) = self.by_name.get(&node.name) {
            for &i in indices {
                if self.symbols[i].same_declaration(&node) {
                    return Append::Exists(i);
                }
            }
        }

        let index = self.symbols.len();
        node.storage_index = index;
        if node.function_scope.is_global() {
            self.global_size += node.size;
        }
        self.by_name
            .entry(node.name.clone())
            .or_default()
            .push(index);
        self.symbols.push(node);
        Append::Added(index)
    }

    /// First node (in declaration order) whose name matches, ignoring
    /// scope. Only for call sites where scope is already known not to
    /// matter; with shadowing present this can pick the wrong symbol.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.symbols
            .iter()
            .find(|s| !s.is_tombstone() && &*s.name == name)
            .map(|s| s.storage_index)
    }

    /// First match on name+class, function ignored. Field lookups.
    pub fn index_of_in_class(&self, name: &str, class: ClassScope) -> Option<usize> {
        self.symbols
            .iter()
            .find(|s| !s.is_tombstone() && &*s.name == name && s.class_scope == class)
            .map(|s| s.storage_index)
    }

    /// Exact match on name+class+function via the secondary index.
    pub fn index_of_exact(
        &self,
        name: &str,
        class: ClassScope,
        function: FunctionScope,
    ) -> Option<usize> {
        let indices = self.by_name.get(name)?;
        indices
            .iter()
            .map(|&i| &self.symbols[i])
            .find(|s| s.class_scope == class && s.function_scope == function)
            .map(|s| s.storage_index)
    }

    /// Class-member precedence lookup: a symbol whose function scope is
    /// global (a field, visible from any method of the class) matches
    /// regardless of the caller's function; only if no such symbol exists
    /// does this fall back to an exact class+function match.
    pub fn index_of_class_member(
        &self,
        name: &str,
        class: ClassScope,
        function: FunctionScope,
    ) -> Option<usize> {
        let indices = self.by_name.get(name)?;
        if let Some(s) = indices
            .iter()
            .map(|&i| &self.symbols[i])
            .find(|s| s.class_scope == class && s.function_scope.is_global())
        {
            return Some(s.storage_index);
        }
        indices
            .iter()
            .map(|&i| &self.symbols[i])
            .find(|s| s.class_scope == class && s.function_scope == function)
            .map(|s| s.storage_index)
    }

    /// Tombstone the slot at the node's storage index and scrub the
    /// secondary-index entry. Every other node's index stays valid, so
    /// this is the removal used by interactive redefinition.
    pub fn undefine(&mut self, node: &SymbolNode) {
        let index = node.storage_index;
        if index >= self.symbols.len() || self.symbols[index].is_tombstone() {
            return;
        }
        self.scrub_name_index(index);
        let old = &self.symbols[index];
        if old.function_scope.is_global() {
            self.global_size -= old.size;
        }
        self.symbols[index] = SymbolNode::tombstone(index);
    }

    /// Erase a node outright, shifting every later storage index down by
    /// one. Compile-time table surgery only: indices captured before this
    /// call are invalidated, so it must never be reachable from
    /// interactive flows (those go through [`SymbolTable::undefine`]).
    #[allow(dead_code)]
    pub(crate) fn remove(&mut self, node: &SymbolNode) {
        let index = node.storage_index;
        if index >= self.symbols.len() {
            return;
        }
        self.scrub_name_index(index);
        let old = self.symbols.remove(index);
        if old.function_scope.is_global() && !old.is_tombstone() {
            self.global_size -= old.size;
        }
        for s in self.symbols.iter_mut().skip(index) {
            s.storage_index -= 1;
        }
        for indices in self.by_name.values_mut() {
            for i in indices.iter_mut() {
                if *i > index {
                    *i -= 1;
                }
            }
        }
    }

    fn scrub_name_index(&mut self, index: usize) {
        let name = self.symbols[index].name.clone();
        if let Some(indices) = self.by_name.get_mut(&name) {
            indices.retain(|&mut i| i != index);
            if indices.is_empty() {
                self.by_name.remove(&name);
            }
        }
    }

    /// Aggregate slot count of global-scope (non-function-local) symbols.
    /// Drives memory-segment allocation sizing; exact across
    /// append/undefine.
    pub fn global_size(&self) -> usize {
        self.global_size
    }

    /// Node at a storage index. Tombstones are returned as-is; callers
    /// that care check [`SymbolNode::is_tombstone`].
    pub fn get(&self, index: usize) -> Option<&SymbolNode> {
        self.symbols.get(index)
    }

    /// Total slot count including tombstones.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Live nodes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SymbolNode> {
        self.symbols.iter().filter(|s| !s.is_tombstone())
    }
}
