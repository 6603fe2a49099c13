//! Compiled methods.
//!
//! A compiled method is immutable once the compiler hands it over; the VM
//! shares it by `Arc` between method tables, contexts, and caches.

use crate::code::instruction::Instruction;
use crate::code::scope::StaticScope;
use garnet_core::{Symbol, Value};
use std::sync::Arc;

/// One entry in a method's exception-handler table.
///
/// A handler covers instruction offsets `[start, end)`; control resumes at
/// `handler` with the raised value on the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerEntry {
    pub start: u32,
    pub end: u32,
    pub handler: u32,
}

impl HandlerEntry {
    /// Whether this entry covers the given instruction offset.
    #[inline]
    pub fn covers(&self, ip: usize) -> bool {
        (self.start as usize) <= ip && ip < (self.end as usize)
    }
}

/// Immutable bytecode plus metadata for one callable.
///
/// `stack` in the activation frame serves both locals and operand stack:
/// locals occupy `[0, local_count)` and operands grow above them, so
/// `stack_size >= local_count` always.
#[derive(Debug, Clone)]
pub struct CompiledMethod {
    /// Name the method was defined under, if any.
    pub name: Option<Symbol>,
    /// Instruction vector.
    pub ops: Arc<[Instruction]>,
    /// Literal pool.
    pub literals: Arc<[Value]>,
    /// Arguments the caller must supply.
    pub required_args: u16,
    /// Required plus optional arguments.
    pub total_args: u16,
    /// Local slots, including argument slots.
    pub local_count: u16,
    /// Frame tuple size (locals plus operand stack headroom).
    pub stack_size: u16,
    /// Local slot receiving trailing arguments, when variadic.
    pub splat: Option<u16>,
    /// Static lexical scope captured at compile time.
    pub scope: Option<Arc<StaticScope>>,
    /// Identity bumped on redefinition; inline caches compare it.
    pub serial: i64,
    /// Exception-handler ranges, innermost first.
    pub handlers: Arc<[HandlerEntry]>,
}

impl CompiledMethod {
    /// A method with the given body and literal pool and no arguments.
    pub fn new(ops: Vec<Instruction>, literals: Vec<Value>) -> Self {
        Self {
            ops: ops.into(),
            literals: literals.into(),
            ..Self::default()
        }
    }

    /// Innermost handler entry covering `ip`, if any.
    pub fn handler_for(&self, ip: usize) -> Option<&HandlerEntry> {
        self.handlers.iter().find(|entry| entry.covers(ip))
    }
}

impl Default for CompiledMethod {
    fn default() -> Self {
        Self {
            name: None,
            ops: Vec::new().into(),
            literals: Vec::new().into(),
            required_args: 0,
            total_args: 0,
            local_count: 0,
            stack_size: 0,
            splat: None,
            scope: None,
            serial: 0,
            handlers: Vec::new().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shape() {
        let cm = CompiledMethod::default();
        assert_eq!(cm.required_args, 0);
        assert_eq!(cm.total_args, 0);
        assert!(cm.splat.is_none());
        assert!(cm.scope.is_none());
        assert!(cm.ops.is_empty());
    }

    #[test]
    fn test_handler_lookup() {
        let cm = CompiledMethod {
            handlers: vec![
                HandlerEntry { start: 2, end: 5, handler: 9 },
                HandlerEntry { start: 0, end: 10, handler: 12 },
            ]
            .into(),
            ..CompiledMethod::default()
        };

        assert_eq!(cm.handler_for(3).unwrap().handler, 9);
        assert_eq!(cm.handler_for(7).unwrap().handler, 12);
        assert!(cm.handler_for(10).is_none());
    }

    #[test]
    fn test_shared_ops() {
        let cm = Arc::new(CompiledMethod::new(vec![Instruction::Ret], vec![]));
        let code = Arc::clone(&cm.ops);
        assert!(Arc::ptr_eq(&code, &cm.ops));
        assert_eq!(code.len(), 1);
    }
}
