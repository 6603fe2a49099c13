//! Module and class objects.
//!
//! A class is a module with [`ModuleFlags::CLASS`] set and (usually) a
//! superclass. Method and constant tables are selector-keyed hash maps;
//! all mutation flows through the registry, which hands out `&mut Module`
//! under the single-writer execution model.

use crate::object::executable::Executable;
use bitflags::bitflags;
use garnet_core::{ModuleId, Symbol, Value};
use rustc_hash::FxHashMap;

bitflags! {
    /// Flags describing a module's role.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModuleFlags: u32 {
        /// The module is a class (participates in instantiation and has a
        /// meaningful superclass).
        const CLASS = 1 << 0;
    }
}

/// A module or class.
#[derive(Debug)]
pub struct Module {
    /// Qualified name, set when the module is bound into a namespace.
    pub name: Option<Symbol>,
    /// Superclass link; `None` terminates the hierarchy walk.
    pub superclass: Option<ModuleId>,
    flags: ModuleFlags,
    methods: FxHashMap<Symbol, Executable>,
    constants: FxHashMap<Symbol, Value>,
}

impl Module {
    pub fn new(flags: ModuleFlags) -> Self {
        Self {
            name: None,
            superclass: None,
            flags,
            methods: FxHashMap::default(),
            constants: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn is_class(&self) -> bool {
        self.flags.contains(ModuleFlags::CLASS)
    }

    // =========================================================================
    // Method table
    // =========================================================================

    /// Look up a selector in this module's own table (no hierarchy walk).
    #[inline]
    pub fn method(&self, name: Symbol) -> Option<&Executable> {
        self.methods.get(&name)
    }

    /// Define or redefine a method.
    #[inline]
    pub fn store_method(&mut self, name: Symbol, method: Executable) {
        self.methods.insert(name, method);
    }

    /// Remove a method, returning the previous entry.
    #[inline]
    pub fn remove_method(&mut self, name: Symbol) -> Option<Executable> {
        self.methods.remove(&name)
    }

    /// Number of methods defined directly on this module.
    #[inline]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    // =========================================================================
    // Constant table
    // =========================================================================

    /// Look up a constant in this module's own table (no hierarchy walk).
    #[inline]
    pub fn get_const(&self, name: Symbol) -> Option<Value> {
        self.constants.get(&name).cloned()
    }

    /// Bind or rebind a constant.
    #[inline]
    pub fn set_const(&mut self, name: Symbol, value: Value) {
        self.constants.insert(name, value);
    }

    #[inline]
    pub fn has_const(&self, name: Symbol) -> bool {
        self.constants.contains_key(&name)
    }
}
