//! Method contexts and the context arena.
//!
//! A context chain (`ctx.sender → … → bottom`) would be a self-referential
//! ownership cycle if contexts held each other directly, so contexts live
//! in a slot arena and link by [`ContextId`]. Slots freed on return are
//! recycled through a free list.

use crate::error::{RuntimeError, VmResult};
use garnet_core::{ModuleId, Value};
use garnet_runtime::{CompiledMethod, Instruction};
use std::sync::Arc;

/// Handle naming a context in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextId(u32);

impl ContextId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One activation frame.
///
/// `stack` is a fixed tuple serving both locals and operand stack: locals
/// occupy `[0, cm.local_count)` and operands grow above them. On entry
/// `sp == local_count - 1`, so the first push lands just above the locals.
///
/// While a context is active its `stack` has been moved into the Task's
/// hot register file and is empty here; it moves back at the next
/// suspension point.
#[derive(Debug)]
pub struct MethodContext {
    /// Previous context; `None` at the bottom of the chain.
    pub sender: Option<ContextId>,
    /// The receiver.
    pub self_value: Value,
    /// The compiled method being executed.
    pub cm: Arc<CompiledMethod>,
    /// Decoded instruction vector (shared with `cm`).
    pub code: Arc<[Instruction]>,
    /// Lexical owner at call time.
    pub module: ModuleId,
    /// Locals and operand stack.
    pub stack: Vec<Value>,
    /// Instruction pointer.
    pub ip: usize,
    /// Operand stack pointer; `-1` means empty above the locals.
    pub sp: isize,
    /// Arguments actually passed by the caller.
    pub args: usize,
    /// Optional callable passed alongside the arguments.
    pub block: Option<Value>,
}

impl MethodContext {
    /// Fresh frame for `cm` with `recv` as self, ready to run from the
    /// first instruction.
    pub fn new(recv: Value, cm: Arc<CompiledMethod>, module: ModuleId) -> Self {
        let code = Arc::clone(&cm.ops);
        let stack = vec![Value::Nil; cm.stack_size as usize];
        let sp = cm.local_count as isize - 1;
        Self {
            sender: None,
            self_value: recv,
            cm,
            code,
            module,
            stack,
            ip: 0,
            sp,
            args: 0,
            block: None,
        }
    }
}

/// Slot arena of contexts with free-list recycling.
#[derive(Debug, Default)]
pub struct Contexts {
    slots: Vec<Option<MethodContext>>,
    free: Vec<u32>,
}

impl Contexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a context, reusing a free slot when one is available.
    pub fn alloc(&mut self, ctx: MethodContext) -> ContextId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(ctx);
                ContextId(index)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Some(ctx));
                ContextId(index)
            }
        }
    }

    /// Borrow a live context.
    ///
    /// # Panics
    ///
    /// Panics when the handle refers to a recycled slot: that is context
    /// chain corruption, which has no recovery.
    #[inline]
    pub fn get(&self, id: ContextId) -> &MethodContext {
        self.slots[id.index()]
            .as_ref()
            .expect("dangling context handle")
    }

    /// Mutably borrow a live context. Panics as [`get`](Self::get).
    #[inline]
    pub fn get_mut(&mut self, id: ContextId) -> &mut MethodContext {
        self.slots[id.index()]
            .as_mut()
            .expect("dangling context handle")
    }

    /// Checked borrow, for callers that can surface the corruption.
    pub fn try_get(&self, id: ContextId) -> VmResult<&MethodContext> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| RuntimeError::fatal("dangling context handle"))
    }

    /// Free a slot for reuse. The handle must not be used afterwards.
    pub fn recycle(&mut self, id: ContextId) {
        if self.slots[id.index()].take().is_some() {
            self.free.push(id.0);
        }
    }

    /// Number of live contexts.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> MethodContext {
        let cm = Arc::new(CompiledMethod {
            local_count: 2,
            stack_size: 4,
            ..CompiledMethod::default()
        });
        MethodContext::new(Value::Nil, cm, ModuleId::from_raw(0))
    }

    #[test]
    fn test_fresh_frame_shape() {
        let ctx = context();
        assert_eq!(ctx.stack.len(), 4);
        assert_eq!(ctx.sp, 1); // just below the operand area
        assert_eq!(ctx.ip, 0);
        assert!(ctx.sender.is_none());
        assert!(ctx.stack.iter().all(Value::is_nil));
    }

    #[test]
    fn test_alloc_and_recycle_reuses_slots() {
        let mut arena = Contexts::new();
        let a = arena.alloc(context());
        let b = arena.alloc(context());
        assert_ne!(a, b);
        assert_eq!(arena.live(), 2);

        arena.recycle(a);
        assert_eq!(arena.live(), 1);

        let c = arena.alloc(context());
        assert_eq!(c, a); // slot reused
        assert_eq!(arena.live(), 2);
    }

    #[test]
    fn test_try_get_dangling() {
        let mut arena = Contexts::new();
        let id = arena.alloc(context());
        arena.recycle(id);
        assert!(arena.try_get(id).is_err());
    }

    #[test]
    #[should_panic(expected = "dangling context handle")]
    fn test_get_dangling_panics() {
        let mut arena = Contexts::new();
        let id = arena.alloc(context());
        arena.recycle(id);
        let _ = arena.get(id);
    }
}
