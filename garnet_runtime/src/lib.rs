//! Object model and compiled-code containers for the Garnet runtime.
//!
//! This crate holds everything the execution core treats as read-mostly
//! data:
//!
//! - **Modules and classes** ([`object::Module`]) with their method and
//!   constant tables, owned by the [`object::ModuleRegistry`] arena.
//! - **Executables** ([`object::Executable`]): the sum of compiled
//!   methods, visibility wrappers, and native primitives stored in method
//!   tables.
//! - **Compiled methods** ([`code::CompiledMethod`]): immutable bytecode
//!   plus metadata as delivered by the compiler, together with the
//!   instruction set and lexical [`code::StaticScope`] chains.

pub mod code;
pub mod object;

pub use code::{CompiledMethod, HandlerEntry, Instruction, StaticScope};
pub use object::{
    Executable, Module, ModuleFlags, ModuleRegistry, NativeFn, Visibility, VisibilityWrapper,
};
