//! The module/class object model.

pub mod executable;
pub mod module;
pub mod registry;

pub use executable::{Executable, NativeFn, Visibility, VisibilityWrapper};
pub use module::{Module, ModuleFlags};
pub use registry::ModuleRegistry;
