//! The module registry.
//!
//! Modules reference each other freely (superclass chains, lexical nests,
//! constants holding classes), so they live in a dense arena and everything
//! else holds [`ModuleId`] handles. The registry stands in for the object
//! memory as far as the execution core is concerned.

use crate::object::module::{Module, ModuleFlags};
use garnet_core::{ModuleId, Symbol, SymbolTable};

/// Arena of all live modules, indexed by [`ModuleId`].
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, module: Module) -> ModuleId {
        let id = ModuleId::from_raw(self.modules.len() as u32);
        self.modules.push(module);
        id
    }

    /// Create an anonymous module.
    pub fn new_module(&mut self) -> ModuleId {
        self.alloc(Module::new(ModuleFlags::empty()))
    }

    /// Create an anonymous class inheriting from `superclass`.
    pub fn new_class(&mut self, superclass: Option<ModuleId>) -> ModuleId {
        let mut module = Module::new(ModuleFlags::CLASS);
        module.superclass = superclass;
        self.alloc(module)
    }

    #[inline]
    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    #[inline]
    pub fn superclass(&self, id: ModuleId) -> Option<ModuleId> {
        self.get(id).superclass
    }

    /// Iterate `start` and its superclass chain, in lookup order.
    pub fn hierarchy(&self, start: ModuleId) -> Hierarchy<'_> {
        Hierarchy {
            registry: self,
            next: Some(start),
        }
    }

    /// Name `module` as bound under `under`: the bare symbol at the root,
    /// `Outer::Name` elsewhere.
    pub fn set_name(
        &mut self,
        symbols: &mut SymbolTable,
        root: ModuleId,
        under: ModuleId,
        module: ModuleId,
        name: Symbol,
    ) {
        let qualified = if under == root {
            name
        } else {
            match self.get(under).name {
                Some(outer) => {
                    let joined = format!("{}::{}", symbols.name(outer), symbols.name(name));
                    symbols.intern(&joined)
                }
                None => name,
            }
        };
        self.get_mut(module).name = Some(qualified);
    }

    /// Number of live modules.
    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Iterator over a superclass chain.
pub struct Hierarchy<'a> {
    registry: &'a ModuleRegistry,
    next: Option<ModuleId>,
}

impl<'a> Iterator for Hierarchy<'a> {
    type Item = ModuleId;

    fn next(&mut self) -> Option<ModuleId> {
        let current = self.next?;
        self.next = self.registry.superclass(current);
        Some(current)
    }
}
