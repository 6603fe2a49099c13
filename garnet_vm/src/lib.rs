//! The Garnet execution core: Tasks, dispatch, and the global method
//! cache.
//!
//! A Task is an executing fibre: one activation chain of method contexts
//! plus a hot register file that shadows the active context. Dispatch is
//! late-bound: send instructions build a [`Message`], resolution walks the
//! receiver's class hierarchy, and two cache tiers keep the walk off the
//! hot path.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                         Task                           │
//! │  hot: ip  sp  self  literals  code  stack              │
//! │  active ──► MethodContext ──sender──► … ──► bottom     │
//! │                  (slot arena, integer handles)         │
//! ├────────────────────────────────────────────────────────┤
//! │                        VmState                         │
//! │  ┌────────────┐ ┌─────────────┐ ┌───────────────────┐  │
//! │  │ GlobalCache│ │ModuleRegistry│ │ SymbolTable       │  │
//! │  │ 4096 slots │ │ (arena)      │ │ (interner)        │  │
//! │  └────────────┘ └─────────────┘ └───────────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Dispatch probes, fastest first: the call site's own entry
//! ([`SendSite`]), the [`GlobalCache`], then the [`Resolver`]'s hierarchy
//! walk, which repopulates both caches. The caches accelerate; the walk is
//! authoritative.
//!
//! Scheduling is cooperative and single-threaded per Task: the external
//! scheduler may preempt only at the interrupt checks between
//! instructions, and the hot register file is reconciled with the active
//! context at every suspension point.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod resolve;
pub mod state;
pub mod task;

pub use cache::{CacheEntry, GlobalCache, CACHE_SIZE};
pub use config::VmConfig;
pub use context::{ContextId, Contexts, MethodContext};
pub use error::{RuntimeError, RuntimeErrorKind, VmResult};
pub use message::{Arguments, Message};
pub use resolve::{Resolver, SendSite};
pub use state::{Globals, TaskId, VmState, SCHEDULER_QUEUES};
pub use task::{Task, TaskStatus};
