//! Static lexical scopes.
//!
//! Each compiled method carries the chain of modules it was compiled
//! inside. Constant lookup walks this chain before it consults the
//! superclass hierarchy; `const_set` without an explicit module writes the
//! innermost entry.

use garnet_core::ModuleId;
use std::sync::Arc;

/// One link in a lexical scope chain. The outermost scope has no parent.
#[derive(Debug, Clone)]
pub struct StaticScope {
    pub module: ModuleId,
    pub parent: Option<Arc<StaticScope>>,
}

impl StaticScope {
    /// A root scope for `module`.
    pub fn root(module: ModuleId) -> Arc<StaticScope> {
        Arc::new(StaticScope {
            module,
            parent: None,
        })
    }

    /// Nest a new scope for `module` inside `parent`.
    pub fn nested(module: ModuleId, parent: Arc<StaticScope>) -> Arc<StaticScope> {
        Arc::new(StaticScope {
            module,
            parent: Some(parent),
        })
    }

    /// Iterate from the innermost scope outwards.
    pub fn chain(&self) -> ScopeChain<'_> {
        ScopeChain { next: Some(self) }
    }
}

/// Iterator over a lexical scope chain, innermost first.
pub struct ScopeChain<'a> {
    next: Option<&'a StaticScope>,
}

impl<'a> Iterator for ScopeChain<'a> {
    type Item = &'a StaticScope;

    fn next(&mut self) -> Option<&'a StaticScope> {
        let current = self.next.take()?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}
