//! The VM state.
//!
//! Everything process-wide (the globally addressable classes, the method
//! cache, the symbol table) lives on [`VmState`], which is passed
//! explicitly to every core operation. There is no global and no
//! thread-local; one `&mut VmState` is the single-writer token the
//! concurrency model relies on.

use crate::cache::GlobalCache;
use crate::config::VmConfig;
use crate::context::Contexts;
use garnet_core::{ModuleId, Symbol, SymbolTable, Value};
use garnet_runtime::ModuleRegistry;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Number of scheduler run queues (one per priority level / run state; the
/// external scheduler defines their semantics).
pub const SCHEDULER_QUEUES: usize = 7;

/// Identifier the external scheduler uses for a Task it owns.
pub type TaskId = usize;

/// Handles to the well-known modules created at bootstrap.
#[derive(Debug, Clone)]
pub struct Globals {
    /// The universal base class; superclass walks stop here.
    pub object: ModuleId,
    /// Class of plain modules.
    pub module_class: ModuleId,
    /// Class of classes.
    pub class_class: ModuleId,
    pub nil_class: ModuleId,
    pub true_class: ModuleId,
    pub false_class: ModuleId,
    pub fixnum_class: ModuleId,
    pub symbol_class: ModuleId,
    pub string_class: ModuleId,
    pub array_class: ModuleId,
    /// Class of Tasks themselves.
    pub task_class: ModuleId,
    /// Selector dispatched when resolution fails.
    pub sym_method_missing: Symbol,
}

/// The explicit state threaded through every core operation.
pub struct VmState {
    pub config: VmConfig,
    pub symbols: SymbolTable,
    pub registry: ModuleRegistry,
    pub globals: Globals,
    pub cache: GlobalCache,
    pub contexts: Contexts,
    /// Seven ordered run queues exposed to the external scheduler.
    pub scheduled_threads: [VecDeque<TaskId>; SCHEDULER_QUEUES],
    interrupt: bool,
}

impl VmState {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        let mut symbols = SymbolTable::new();
        let mut registry = ModuleRegistry::new();

        // The object root first; everything else hangs beneath it.
        let object = registry.new_class(None);
        let object_name = symbols.intern("Object");
        registry.get_mut(object).name = Some(object_name);
        registry
            .get_mut(object)
            .set_const(object_name, Value::Module(object));

        fn bootstrap(
            registry: &mut ModuleRegistry,
            symbols: &mut SymbolTable,
            object: ModuleId,
            name: &str,
        ) -> ModuleId {
            let id = registry.new_class(Some(object));
            let sym = symbols.intern(name);
            registry.get_mut(id).name = Some(sym);
            registry.get_mut(object).set_const(sym, Value::Module(id));
            id
        }

        let module_class = bootstrap(&mut registry, &mut symbols, object, "Module");
        let class_class = bootstrap(&mut registry, &mut symbols, object, "Class");
        let nil_class = bootstrap(&mut registry, &mut symbols, object, "NilClass");
        let true_class = bootstrap(&mut registry, &mut symbols, object, "TrueClass");
        let false_class = bootstrap(&mut registry, &mut symbols, object, "FalseClass");
        let fixnum_class = bootstrap(&mut registry, &mut symbols, object, "Fixnum");
        let symbol_class = bootstrap(&mut registry, &mut symbols, object, "Symbol");
        let string_class = bootstrap(&mut registry, &mut symbols, object, "String");
        let array_class = bootstrap(&mut registry, &mut symbols, object, "Array");
        let task_class = bootstrap(&mut registry, &mut symbols, object, "Task");

        let globals = Globals {
            object,
            module_class,
            class_class,
            nil_class,
            true_class,
            false_class,
            fixnum_class,
            symbol_class,
            string_class,
            array_class,
            task_class,
            sym_method_missing: symbols.intern("method_missing"),
        };

        Self {
            config,
            symbols,
            registry,
            globals,
            cache: GlobalCache::new(),
            contexts: Contexts::new(),
            scheduled_threads: std::array::from_fn(|_| VecDeque::new()),
            interrupt: false,
        }
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// Intern a selector or constant name.
    #[inline]
    pub fn symbol(&mut self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    /// The name a symbol was interned from.
    #[inline]
    pub fn symbol_name(&self, sym: Symbol) -> Arc<str> {
        Arc::clone(self.symbols.name(sym))
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// The class of a value.
    pub fn class_of(&self, value: &Value) -> ModuleId {
        match value {
            Value::Nil => self.globals.nil_class,
            Value::False => self.globals.false_class,
            Value::True => self.globals.true_class,
            Value::Fixnum(_) => self.globals.fixnum_class,
            Value::Symbol(_) => self.globals.symbol_class,
            Value::Str(_) => self.globals.string_class,
            Value::Array(_) => self.globals.array_class,
            Value::Module(id) => {
                if self.registry.get(*id).is_class() {
                    self.globals.class_class
                } else {
                    self.globals.module_class
                }
            }
        }
    }

    /// Module at which method lookup for `value` begins.
    ///
    /// The metaclass tower is an external collaborator; lookup begins at
    /// the value's class.
    #[inline]
    pub fn lookup_begin(&self, value: &Value) -> ModuleId {
        self.class_of(value)
    }

    /// Create a module named and bound as a constant under the object
    /// root.
    pub fn new_module(&mut self, name: &str) -> ModuleId {
        let id = self.registry.new_module();
        let sym = self.symbols.intern(name);
        self.registry.get_mut(id).name = Some(sym);
        self.registry
            .get_mut(self.globals.object)
            .set_const(sym, Value::Module(id));
        debug!(module = name, "created module");
        id
    }

    /// Create a class named and bound as a constant under the object
    /// root. Inherits from the object root by default.
    pub fn new_class(&mut self, name: &str, superclass: Option<ModuleId>) -> ModuleId {
        let superclass = superclass.unwrap_or(self.globals.object);
        let id = self.registry.new_class(Some(superclass));
        let sym = self.symbols.intern(name);
        self.registry.get_mut(id).name = Some(sym);
        self.registry
            .get_mut(self.globals.object)
            .set_const(sym, Value::Module(id));
        debug!(class = name, "created class");
        id
    }

    // =========================================================================
    // Interrupts & scheduling
    // =========================================================================

    /// Request that the running Task yield at its next interrupt check.
    pub fn set_interrupt(&mut self) {
        self.interrupt = true;
    }

    /// Consume a pending interrupt request.
    pub fn take_interrupt(&mut self) -> bool {
        std::mem::take(&mut self.interrupt)
    }

    #[inline]
    pub fn interrupt_pending(&self) -> bool {
        self.interrupt
    }

    /// Append a task to one of the run queues.
    ///
    /// # Panics
    ///
    /// Panics if `queue >= SCHEDULER_QUEUES`.
    pub fn enqueue_task(&mut self, queue: usize, task: TaskId) {
        self.scheduled_threads[queue].push_back(task);
    }

    /// Pop the first task from the highest-priority non-empty queue.
    pub fn dequeue_task(&mut self) -> Option<TaskId> {
        self.scheduled_threads
            .iter_mut()
            .find_map(|queue| queue.pop_front())
    }
}

impl Default for VmState {
    fn default() -> Self {
        Self::new()
    }
}
