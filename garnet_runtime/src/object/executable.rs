//! Executable method-table entries.
//!
//! A method table maps selectors to executables. The executable is a sum
//! over the three things a table can hold: a compiled method, a visibility
//! wrapper around another executable, and a native primitive. Keeping the
//! discrimination in the type makes cache retention and reflection total;
//! there is no downcast that can fail at dispatch time.

use crate::code::CompiledMethod;
use garnet_core::Value;
use std::sync::Arc;

/// Native primitive: receiver plus evaluated arguments, result value.
///
/// Natives are state-free; anything needing the VM state is a compiled
/// method.
pub type NativeFn = fn(Value, &[Value]) -> Value;

/// Method visibility recorded by a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

impl Visibility {
    /// Strictly public. Protected entries are visible to lookup but still
    /// carry `false` here (the cache records the distinction even though
    /// resolution does not enforce it).
    #[inline]
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }

    /// Hidden from lookup unless the caller asserts privacy. Only
    /// `Private` hides; the public/protected distinction is not enforced
    /// at resolution.
    #[inline]
    pub fn hidden_without_privacy(self) -> bool {
        matches!(self, Visibility::Private)
    }
}

/// A visibility tag around another executable.
#[derive(Debug, Clone)]
pub struct VisibilityWrapper {
    pub visibility: Visibility,
    pub method: Executable,
}

/// An entry in a method table.
#[derive(Debug, Clone)]
pub enum Executable {
    /// Bytecode method.
    Compiled(Arc<CompiledMethod>),
    /// Visibility wrapper around another executable.
    Visibility(Box<VisibilityWrapper>),
    /// Native primitive.
    Native(NativeFn),
}

impl Executable {
    /// Wrap an executable with a visibility tag.
    pub fn with_visibility(self, visibility: Visibility) -> Executable {
        Executable::Visibility(Box::new(VisibilityWrapper {
            visibility,
            method: self,
        }))
    }

    /// Strip visibility wrappers down to the underlying executable.
    pub fn unwrap_visibility(&self) -> &Executable {
        let mut exe = self;
        while let Executable::Visibility(wrapper) = exe {
            exe = &wrapper.method;
        }
        exe
    }

    /// The visibility of this entry (`Public` when unwrapped).
    pub fn visibility(&self) -> Visibility {
        match self {
            Executable::Visibility(wrapper) => wrapper.visibility,
            _ => Visibility::Public,
        }
    }

    /// The compiled method beneath any wrappers, if there is one.
    pub fn as_compiled(&self) -> Option<&Arc<CompiledMethod>> {
        match self.unwrap_visibility() {
            Executable::Compiled(cm) => Some(cm),
            _ => None,
        }
    }

    /// Identity comparison on the underlying executable.
    pub fn same_method(&self, other: &Executable) -> bool {
        match (self.unwrap_visibility(), other.unwrap_visibility()) {
            (Executable::Compiled(a), Executable::Compiled(b)) => Arc::ptr_eq(a, b),
            (Executable::Native(a), Executable::Native(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

impl From<Arc<CompiledMethod>> for Executable {
    fn from(cm: Arc<CompiledMethod>) -> Self {
        Executable::Compiled(cm)
    }
}
