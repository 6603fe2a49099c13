//! Symbol interning.
//!
//! Selectors and constant names are interned once and compared by index
//! afterwards, so the dispatch fast path never touches string contents.
//! The table is owned by the VM state and threaded explicitly; there is no
//! process-global interner.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// An interned name. Equality is index equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// The raw interner index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The interner index as a usize.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Dense symbol table: name → index and index → name.
#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Vec<Arc<str>>,
    ids: FxHashMap<Arc<str>, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the existing symbol if already present.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.ids.get(name) {
            return sym;
        }
        let sym = Symbol(self.names.len() as u32);
        let shared: Arc<str> = name.into();
        self.names.push(Arc::clone(&shared));
        self.ids.insert(shared, sym);
        sym
    }

    /// The name a symbol was interned from.
    ///
    /// # Panics
    ///
    /// Panics if the symbol did not come from this table.
    #[inline]
    pub fn name(&self, sym: Symbol) -> &Arc<str> {
        &self.names[sym.index()]
    }

    /// Look up a symbol without interning.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.ids.get(name).copied()
    }

    /// Number of interned symbols.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
