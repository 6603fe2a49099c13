//! Tasks: executing fibres of control.
//!
//! A Task owns one activation chain and a hot register file: shadow
//! copies of the active context's instruction pointer, stack pointer,
//! receiver, literal pool, and operand stack. The shadows keep the inner
//! loop off the arena; they are reconciled with the active context at
//! every suspension point (send, return, interrupt check). The operand
//! stack is *moved* between the Task and the context rather than copied,
//! so exactly one owner holds it at any time.
//!
//! Invariant: ip/sp on the Task are meaningful iff the Task is executing;
//! every operation that mutates the context chain re-establishes
//! `active.ip == task.ip && active.sp == task.sp` before control can
//! leave.

use crate::context::{ContextId, MethodContext};
use crate::error::{RuntimeError, VmResult};
use crate::message::{Arguments, Message};
use crate::resolve::Resolver;
use crate::state::VmState;
use garnet_core::{ModuleId, Symbol, Value};
use garnet_runtime::{CompiledMethod, Executable, Instruction};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace};

/// Why `execute` returned.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    /// The bottom context returned; the value is the Task's result.
    Complete(Value),
    /// A pending interrupt was observed between instructions. Hot state
    /// is written back; `execute` may be called again to resume.
    Interrupted,
}

/// An executing fibre: one activation chain plus the hot register file.
pub struct Task {
    /// The current context; `None` once the Task has terminated.
    pub active: Option<ContextId>,
    /// Hot instruction pointer.
    pub ip: usize,
    /// Hot operand stack pointer; `-1` means empty above the locals.
    pub sp: isize,
    /// Hot receiver.
    pub self_value: Value,
    /// Hot literal pool.
    pub literals: Arc<[Value]>,
    /// Hot instruction vector.
    pub code: Arc<[Instruction]>,
    /// Hot locals + operand stack, moved out of the active context.
    pub stack: Vec<Value>,
    result: Option<Value>,
    depth: usize,
}

impl Task {
    /// A Task with no activation chain yet.
    pub fn new() -> Task {
        Task {
            active: None,
            ip: 0,
            sp: -1,
            self_value: Value::Nil,
            literals: Vec::new().into(),
            code: Vec::new().into(),
            stack: Vec::new(),
            result: None,
            depth: 0,
        }
    }

    /// A Task bootstrapped with a bottom context running `cm` on `recv`.
    pub fn with_method(state: &mut VmState, recv: Value, cm: Arc<CompiledMethod>) -> Task {
        let mut task = Task::new();
        let ctx = MethodContext::new(recv, cm, state.globals.object);
        let id = state.contexts.alloc(ctx);
        task.make_active(state, id);
        task.depth = 1;
        task
    }

    /// Whether the Task has returned past its bottom context.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.active.is_none()
    }

    /// The value the bottom context returned, once complete.
    #[inline]
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Current context-chain depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    // =========================================================================
    // Hot register file
    // =========================================================================

    /// Load `id`'s registers into the hot file and make it the active
    /// context. The context's stack moves into the Task.
    pub fn make_active(&mut self, state: &mut VmState, id: ContextId) {
        let ctx = state.contexts.get_mut(id);
        self.ip = ctx.ip;
        self.sp = ctx.sp;
        self.self_value = ctx.self_value.clone();
        self.literals = Arc::clone(&ctx.cm.literals);
        self.code = Arc::clone(&ctx.code);
        self.stack = std::mem::take(&mut ctx.stack);
        self.active = Some(id);
    }

    /// Write the hot ip/sp back into the active context.
    fn save_registers(&mut self, state: &mut VmState) {
        if let Some(id) = self.active {
            let ctx = state.contexts.get_mut(id);
            ctx.ip = self.ip;
            ctx.sp = self.sp;
        }
    }

    /// Write the hot ip back into the active context.
    pub fn cache_ip(&mut self, state: &mut VmState) {
        if let Some(id) = self.active {
            state.contexts.get_mut(id).ip = self.ip;
        }
    }

    fn push(&mut self, value: Value) -> VmResult<()> {
        let next = self.sp + 1;
        if next < 0 || next as usize >= self.stack.len() {
            return Err(RuntimeError::fatal("operand stack overflow"));
        }
        self.stack[next as usize] = value;
        self.sp = next;
        Ok(())
    }

    fn pop(&mut self) -> VmResult<Value> {
        if self.sp < 0 {
            return Err(RuntimeError::fatal("operand stack underflow"));
        }
        let value = std::mem::replace(&mut self.stack[self.sp as usize], Value::Nil);
        self.sp -= 1;
        Ok(value)
    }

    fn literal(&self, index: u16) -> VmResult<Value> {
        self.literals
            .get(index as usize)
            .cloned()
            .ok_or_else(|| RuntimeError::fatal("literal index out of range"))
    }

    // =========================================================================
    // Message send
    // =========================================================================

    /// Dispatch `msg` through its send site (falling back to the resolver
    /// when the site is absent) and activate the located method.
    pub fn send_message(&mut self, state: &mut VmState, msg: &mut Message<'_>) -> VmResult<()> {
        let located = match msg.send_site.take() {
            Some(site) => site.locate(state, msg),
            None => Resolver::resolve(state, msg),
        };
        if !located {
            return self.send_method_missing(state, msg);
        }
        self.activate(state, msg)
    }

    /// Dispatch `msg` through the resolver directly, bypassing any send
    /// site. Used when the call site is absent or invalidated.
    pub fn send_message_slowly(
        &mut self,
        state: &mut VmState,
        msg: &mut Message<'_>,
    ) -> VmResult<()> {
        if !Resolver::resolve(state, msg) {
            return self.send_method_missing(state, msg);
        }
        self.activate(state, msg)
    }

    /// Activate a message whose method is already resolved, with no
    /// lookup of any kind.
    pub fn activate_method(&mut self, state: &mut VmState, msg: &mut Message<'_>) -> VmResult<()> {
        if msg.method.is_none() {
            return Err(RuntimeError::fatal("activating an unresolved message"));
        }
        self.activate(state, msg)
    }

    /// Resolution failed: re-dispatch as `method_missing` on the same
    /// receiver, privacy asserted, with the original selector prepended
    /// to the arguments.
    fn send_method_missing(&mut self, state: &mut VmState, msg: &Message<'_>) -> VmResult<()> {
        let missing = state.globals.sym_method_missing;
        if msg.name == missing {
            return Err(RuntimeError::method_missing(&state.symbol_name(msg.name)));
        }

        let mut args: SmallVec<[Value; 8]> = SmallVec::with_capacity(msg.argc() + 1);
        args.push(Value::Symbol(msg.name));
        for index in 0..msg.argc() {
            args.push(self.argument(msg, index));
        }

        let mut fallback = Message::new(msg.recv.clone(), msg.lookup_from, missing);
        fallback.priv_send = true;
        fallback.block = msg.block.clone();
        fallback.with_arguments(args);

        if !Resolver::resolve(state, &mut fallback) {
            return Err(RuntimeError::method_missing(&state.symbol_name(msg.name)));
        }
        trace!(selector = msg.name.raw(), "dispatching method_missing");
        self.activate(state, &mut fallback)
    }

    fn activate(&mut self, state: &mut VmState, msg: &mut Message<'_>) -> VmResult<()> {
        let Some(method) = msg.method.clone() else {
            return Err(RuntimeError::fatal("activating an unresolved message"));
        };

        if let Some(cm) = method.as_compiled() {
            let cm = Arc::clone(cm);
            return self.activate_compiled(state, msg, cm);
        }
        if let Executable::Native(native) = method.unwrap_visibility() {
            let native = *native;
            let mut argv: SmallVec<[Value; 8]> = SmallVec::with_capacity(msg.argc());
            for index in 0..msg.argc() {
                argv.push(self.argument(msg, index));
            }
            let result = native(msg.recv.clone(), &argv);
            return self.push(result);
        }
        Err(RuntimeError::fatal("unexecutable method-table entry"))
    }

    fn activate_compiled(
        &mut self,
        state: &mut VmState,
        msg: &Message<'_>,
        cm: Arc<CompiledMethod>,
    ) -> VmResult<()> {
        let given = msg.argc();
        let required = cm.required_args as usize;
        let total = cm.total_args as usize;
        if given < required || (given > total && cm.splat.is_none()) {
            return Err(RuntimeError::argument_error(required, total, given));
        }
        if self.depth >= state.config.max_context_depth {
            return Err(RuntimeError::fatal("context depth limit exceeded"));
        }

        let mut ctx = MethodContext::new(msg.recv.clone(), cm, state.globals.object);
        ctx.block = msg.block.clone();
        self.bind_arguments(&mut ctx, msg);

        let id = state.contexts.alloc(ctx);
        if let Some(outgoing_id) = self.active {
            let outgoing = state.contexts.get_mut(outgoing_id);
            outgoing.ip = self.ip;
            outgoing.sp = self.sp;
            outgoing.stack = std::mem::take(&mut self.stack);
            state.contexts.get_mut(id).sender = Some(outgoing_id);
        }
        self.make_active(state, id);
        self.depth += 1;
        Ok(())
    }

    // =========================================================================
    // Argument binding
    // =========================================================================

    /// Copy fixed arguments into the new context's locals and collect any
    /// splat tail.
    fn bind_arguments(&self, ctx: &mut MethodContext, msg: &Message<'_>) {
        let given = msg.argc();
        ctx.args = given;

        let total = ctx.cm.total_args as usize;
        let fixed = given.min(total);
        for index in 0..fixed {
            ctx.stack[index] = self.argument(msg, index);
        }

        if let Some(slot) = ctx.cm.splat {
            let rest: Vec<Value> = (total..given).map(|i| self.argument(msg, i)).collect();
            ctx.stack[slot as usize] = Value::Array(rest.into());
        }
    }

    /// Fetch one argument of `msg`, reading through to the hot operand
    /// stack for stack-sourced sends. Only valid before the context
    /// switch.
    fn argument(&self, msg: &Message<'_>, index: usize) -> Value {
        match msg.arguments() {
            Arguments::Explicit(values) => values[index].clone(),
            Arguments::FromStack { count } => {
                let base = self.sp - *count as isize + 1;
                self.stack[(base + index as isize) as usize].clone()
            }
        }
    }

    /// Whether the caller passed at least `pos` arguments to the active
    /// method.
    pub fn passed_arg_p(&self, state: &VmState, pos: usize) -> bool {
        match self.active {
            Some(id) => state.contexts.get(id).args >= pos,
            None => false,
        }
    }

    // =========================================================================
    // Return
    // =========================================================================

    /// Return `value` to the sender: reload its registers and push the
    /// value onto its operand stack. Returning past the bottom context
    /// terminates the Task and records the value as its result.
    pub fn simple_return(&mut self, state: &mut VmState, value: Value) -> VmResult<()> {
        let Some(returning) = self.active else {
            return Err(RuntimeError::fatal("return without an active context"));
        };
        let sender = state.contexts.get(returning).sender;

        if state.config.recycle_contexts {
            state.contexts.recycle(returning);
        } else {
            // Retained for post-mortem inspection: leave the final frame
            // state behind.
            let ctx = state.contexts.get_mut(returning);
            ctx.ip = self.ip;
            ctx.sp = self.sp;
            ctx.stack = std::mem::take(&mut self.stack);
        }

        match sender {
            Some(target) => {
                self.depth = self.depth.saturating_sub(1);
                self.make_active(state, target);
                self.push(value)
            }
            None => {
                self.active = None;
                self.result = Some(value);
                self.stack = Vec::new();
                self.sp = -1;
                self.depth = 0;
                Ok(())
            }
        }
    }

    // =========================================================================
    // Reflection
    // =========================================================================

    /// Resolve `selector` on `recv` without dispatching. Visibility
    /// wrappers are stripped; private methods yield `None` unless
    /// `privacy` is asserted.
    pub fn locate_method_on(
        &self,
        state: &mut VmState,
        recv: &Value,
        selector: Symbol,
        privacy: bool,
    ) -> Option<Executable> {
        let mut msg = Message::new(recv.clone(), state.lookup_begin(recv), selector);
        msg.priv_send = privacy;
        if !Resolver::resolve(state, &mut msg) {
            return None;
        }
        msg.method
    }

    /// Compare the resolved method's serial against `serial`. A missing
    /// method counts as a match, so a purged call site does not force
    /// recompilation; a native never matches.
    pub fn check_serial(
        &self,
        state: &mut VmState,
        recv: &Value,
        selector: Symbol,
        serial: i64,
    ) -> bool {
        match self.locate_method_on(state, recv, selector, true) {
            None => true,
            Some(exe) => exe
                .as_compiled()
                .map(|cm| cm.serial == serial)
                .unwrap_or(false),
        }
    }

    /// Define `method` on the module where lookup for `recv` begins.
    pub fn attach_method(
        &self,
        state: &mut VmState,
        recv: &Value,
        name: Symbol,
        method: Executable,
    ) {
        let target = state.lookup_begin(recv);
        self.add_method(state, target, name, method);
    }

    /// Define `method` directly in `module`'s method table.
    pub fn add_method(
        &self,
        state: &mut VmState,
        module: ModuleId,
        name: Symbol,
        method: Executable,
    ) {
        debug!(selector = name.raw(), module = module.raw(), "define method");
        state.registry.get_mut(module).store_method(name, method);
    }

    /// Dispatch `hook` on `recv` with `arg` when the receiver responds to
    /// it (privacy asserted). Returns whether a hook was activated.
    pub fn perform_hook(
        &mut self,
        state: &mut VmState,
        recv: Value,
        hook: Symbol,
        arg: Value,
    ) -> VmResult<bool> {
        let Some(method) = self.locate_method_on(state, &recv, hook, true) else {
            return Ok(false);
        };
        let lookup_from = state.lookup_begin(&recv);
        let mut msg = Message::new(recv, lookup_from, hook);
        msg.priv_send = true;
        msg.method = Some(method);
        msg.with_arguments(SmallVec::from_iter([arg]));
        self.activate(state, &mut msg)?;
        Ok(true)
    }

    // =========================================================================
    // Constant lookup
    // =========================================================================

    /// Find `name` in `module` or its superclass chain, stopping at the
    /// object root.
    pub fn const_get_from(
        &self,
        state: &VmState,
        module: ModuleId,
        name: Symbol,
    ) -> Option<Value> {
        let mut current = Some(module);
        while let Some(id) = current {
            if let Some(value) = state.registry.get(id).get_const(name) {
                return Some(value);
            }
            if id == state.globals.object {
                break;
            }
            current = state.registry.superclass(id);
        }
        None
    }

    /// Contextual lookup: the lexical scope chain, then the superclass
    /// chain of the innermost lexical module, then the object root once.
    /// Lexical beats inherited.
    pub fn const_get(&self, state: &VmState, name: Symbol) -> Option<Value> {
        let scope = self
            .active
            .and_then(|id| state.contexts.get(id).cm.scope.clone());

        if let Some(scope) = &scope {
            for link in scope.chain() {
                if let Some(value) = state.registry.get(link.module).get_const(name) {
                    return Some(value);
                }
                if link.module == state.globals.object {
                    break;
                }
            }

            let mut current = Some(scope.module);
            while let Some(id) = current {
                if let Some(value) = state.registry.get(id).get_const(name) {
                    return Some(value);
                }
                current = state.registry.superclass(id);
            }
        }

        state.registry.get(state.globals.object).get_const(name)
    }

    /// Bind `name` in `module`.
    pub fn const_set_in(&self, state: &mut VmState, module: ModuleId, name: Symbol, value: Value) {
        state.registry.get_mut(module).set_const(name, value);
    }

    /// Bind `name` in the current lexical module.
    pub fn const_set(&self, state: &mut VmState, name: Symbol, value: Value) {
        let module = self.current_module(state);
        self.const_set_in(state, module, name, value);
    }

    /// The innermost lexical module of the active method; the object root
    /// when there is no scope.
    pub fn current_module(&self, state: &VmState) -> ModuleId {
        self.active
            .and_then(|id| state.contexts.get(id).cm.scope.as_ref().map(|s| s.module))
            .unwrap_or(state.globals.object)
    }

    // =========================================================================
    // Class / module opening
    // =========================================================================

    /// Open or create class `name` under `under`.
    ///
    /// A found constant must be a class whose superclass matches `super_`
    /// when one is given; otherwise the open fails with a `TypeError`.
    pub fn open_class_under(
        &self,
        state: &mut VmState,
        under: ModuleId,
        super_: Option<ModuleId>,
        name: Symbol,
    ) -> VmResult<(ModuleId, bool)> {
        if let Some(existing) = self.const_get_from(state, under, name) {
            let cls = Self::check_class(state, &existing, name)?;
            return Self::check_superclass(state, cls, super_).map(|id| (id, false));
        }
        Ok((self.add_class(state, under, super_, name), true))
    }

    /// Open or create class `name` contextually: lookup is the contextual
    /// constant walk, creation lands in the current lexical module.
    pub fn open_class(
        &self,
        state: &mut VmState,
        super_: Option<ModuleId>,
        name: Symbol,
    ) -> VmResult<(ModuleId, bool)> {
        if let Some(existing) = self.const_get(state, name) {
            let cls = Self::check_class(state, &existing, name)?;
            return Self::check_superclass(state, cls, super_).map(|id| (id, false));
        }
        let under = self.current_module(state);
        Ok((self.add_class(state, under, super_, name), true))
    }

    /// Open or create module `name` under `under`.
    pub fn open_module_under(
        &self,
        state: &mut VmState,
        under: ModuleId,
        name: Symbol,
    ) -> VmResult<ModuleId> {
        if let Some(existing) = self.const_get_from(state, under, name) {
            return Self::check_module(state, &existing, name);
        }
        Ok(self.add_module(state, under, name))
    }

    /// Open or create module `name` contextually.
    pub fn open_module(&self, state: &mut VmState, name: Symbol) -> VmResult<ModuleId> {
        if let Some(existing) = self.const_get(state, name) {
            return Self::check_module(state, &existing, name);
        }
        let under = self.current_module(state);
        Ok(self.add_module(state, under, name))
    }

    fn check_class(state: &VmState, value: &Value, name: Symbol) -> VmResult<ModuleId> {
        match value.as_module() {
            Some(id) if state.registry.get(id).is_class() => Ok(id),
            _ => Err(RuntimeError::type_error(format!(
                "{} is not a class",
                state.symbols.name(name)
            ))),
        }
    }

    fn check_module(state: &VmState, value: &Value, name: Symbol) -> VmResult<ModuleId> {
        value.as_module().ok_or_else(|| {
            RuntimeError::type_error(format!("{} is not a module", state.symbols.name(name)))
        })
    }

    fn check_superclass(
        state: &VmState,
        cls: ModuleId,
        super_: Option<ModuleId>,
    ) -> VmResult<ModuleId> {
        if let Some(expected) = super_ {
            if state.registry.get(cls).superclass != Some(expected) {
                return Err(RuntimeError::type_error("superclass mismatch"));
            }
        }
        Ok(cls)
    }

    fn add_class(
        &self,
        state: &mut VmState,
        under: ModuleId,
        super_: Option<ModuleId>,
        name: Symbol,
    ) -> ModuleId {
        let superclass = super_.unwrap_or(state.globals.object);
        let cls = state.registry.new_class(Some(superclass));
        let root = state.globals.object;
        state
            .registry
            .set_name(&mut state.symbols, root, under, cls, name);
        state
            .registry
            .get_mut(under)
            .set_const(name, Value::Module(cls));
        debug!(class = name.raw(), "opened new class");
        cls
    }

    fn add_module(&self, state: &mut VmState, under: ModuleId, name: Symbol) -> ModuleId {
        let module = state.registry.new_module();
        let root = state.globals.object;
        state
            .registry
            .set_name(&mut state.symbols, root, under, module, name);
        state
            .registry
            .get_mut(under)
            .set_const(name, Value::Module(module));
        debug!(module = name.raw(), "opened new module");
        module
    }

    // =========================================================================
    // Exceptions
    // =========================================================================

    /// Unwind towards the innermost context whose method advertises a
    /// handler range covering its current ip. On a hit the Task resumes
    /// at the handler with `exc` on the operand stack and `true` is
    /// returned; with no handler anywhere the Task terminates.
    pub fn raise_exception(&mut self, state: &mut VmState, exc: Value) -> VmResult<bool> {
        let mut current = self.active;
        let mut target = None;
        while let Some(id) = current {
            let ctx = state.contexts.try_get(id)?;
            let ip = if Some(id) == self.active { self.ip } else { ctx.ip };
            if let Some(entry) = ctx.cm.handler_for(ip) {
                target = Some((id, entry.handler as usize));
                break;
            }
            current = ctx.sender;
        }

        let Some((target_id, handler_ip)) = target else {
            self.active = None;
            self.result = None;
            self.stack = Vec::new();
            self.sp = -1;
            self.depth = 0;
            return Ok(false);
        };

        // Pop everything above the handler frame.
        let originally_active = self.active;
        while let Some(id) = self.active {
            if id == target_id {
                break;
            }
            let sender = state.contexts.get(id).sender;
            if state.config.recycle_contexts {
                state.contexts.recycle(id);
            }
            self.active = sender;
            self.depth = self.depth.saturating_sub(1);
        }

        if originally_active != Some(target_id) {
            self.make_active(state, target_id);
        }
        let local_count = state.contexts.get(target_id).cm.local_count;
        self.ip = handler_ip;
        self.sp = local_count as isize - 1;
        self.push(exc)?;
        self.save_registers(state);
        Ok(true)
    }

    // =========================================================================
    // Interrupts & debugging
    // =========================================================================

    /// Poll for a pending interrupt. When one is consumed the hot
    /// registers are written back and the caller must stop executing.
    pub fn check_interrupts(&mut self, state: &mut VmState) -> bool {
        if !state.take_interrupt() {
            return false;
        }
        self.save_registers(state);
        true
    }

    /// Raise the debugger signal to the current process. A debugger
    /// collaborator is expected to have installed a handler.
    #[cfg(unix)]
    pub fn yield_debugger(&self) {
        // SAFETY: signalling our own pid.
        unsafe {
            libc::kill(libc::getpid(), DEBUGGER_SIGNAL);
        }
    }

    /// No debugger signal off unix.
    #[cfg(not(unix))]
    pub fn yield_debugger(&self) {}

    // =========================================================================
    // Execute loop
    // =========================================================================

    /// Run until the Task completes or an interrupt is observed.
    ///
    /// Reads go to the hot registers, writes go to the hot registers, and
    /// the active context is reconciled at every suspension point.
    pub fn execute(&mut self, state: &mut VmState) -> VmResult<TaskStatus> {
        loop {
            if self.active.is_none() {
                let value = self.result.clone().unwrap_or(Value::Nil);
                return Ok(TaskStatus::Complete(value));
            }
            let Some(&op) = self.code.get(self.ip) else {
                return Err(RuntimeError::fatal("instruction pointer overran method body"));
            };
            self.ip += 1;

            match op {
                Instruction::PushNil => self.push(Value::Nil)?,
                Instruction::PushTrue => self.push(Value::True)?,
                Instruction::PushFalse => self.push(Value::False)?,
                Instruction::PushSelf => {
                    let receiver = self.self_value.clone();
                    self.push(receiver)?
                }
                Instruction::PushLiteral(index) => {
                    let value = self.literal(index)?;
                    self.push(value)?
                }
                Instruction::PushLocal(index) => {
                    let value = self
                        .stack
                        .get(index as usize)
                        .cloned()
                        .ok_or_else(|| RuntimeError::fatal("local index out of range"))?;
                    self.push(value)?
                }
                Instruction::SetLocal(index) => {
                    let value = self.pop()?;
                    let slot = self
                        .stack
                        .get_mut(index as usize)
                        .ok_or_else(|| RuntimeError::fatal("local index out of range"))?;
                    *slot = value;
                }
                Instruction::Pop => {
                    self.pop()?;
                }
                Instruction::PushConst(index) => {
                    let name = self
                        .literal(index)?
                        .as_symbol()
                        .ok_or_else(|| RuntimeError::fatal("constant literal is not a symbol"))?;
                    match self.const_get(state, name) {
                        Some(value) => self.push(value)?,
                        None => {
                            return Err(RuntimeError::type_error(format!(
                                "uninitialized constant {}",
                                state.symbol_name(name)
                            )));
                        }
                    }
                }
                Instruction::Send { selector, argc } => {
                    self.dispatch_send(state, selector, argc as usize, false)?
                }
                Instruction::SendPrivate { selector, argc } => {
                    self.dispatch_send(state, selector, argc as usize, true)?
                }
                Instruction::Goto(target) => self.ip = target as usize,
                Instruction::GotoIfFalse(target) => {
                    let value = self.pop()?;
                    if !value.is_truthy() {
                        self.ip = target as usize;
                    }
                }
                Instruction::Ret => {
                    let value = self.pop()?;
                    self.simple_return(state, value)?;
                }
            }

            if self.check_interrupts(state) {
                return Ok(TaskStatus::Interrupted);
            }
        }
    }

    /// Build and dispatch a message for a send instruction. The receiver
    /// sits below `argc` arguments on the operand stack; all of them are
    /// popped before the send.
    fn dispatch_send(
        &mut self,
        state: &mut VmState,
        selector_index: u16,
        argc: usize,
        priv_send: bool,
    ) -> VmResult<()> {
        let selector = self
            .literal(selector_index)?
            .as_symbol()
            .ok_or_else(|| RuntimeError::fatal("send selector literal is not a symbol"))?;

        let recv_index = self.sp - argc as isize;
        if recv_index < 0 {
            return Err(RuntimeError::fatal("operand stack underflow in send"));
        }
        let mut argv: SmallVec<[Value; 8]> = SmallVec::with_capacity(argc);
        for index in 0..argc {
            argv.push(self.stack[(recv_index + 1 + index as isize) as usize].clone());
        }
        let recv = std::mem::replace(&mut self.stack[recv_index as usize], Value::Nil);
        self.sp = recv_index - 1;

        let lookup_from = state.lookup_begin(&recv);
        let mut msg = Message::new(recv, lookup_from, selector);
        msg.priv_send = priv_send;
        msg.with_arguments(argv);
        self.send_message_slowly(state, &mut msg)
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
const DEBUGGER_SIGNAL: libc::c_int = libc::SIGEMT;

#[cfg(all(
    unix,
    not(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))
))]
const DEBUGGER_SIGNAL: libc::c_int = libc::SIGTRAP;
