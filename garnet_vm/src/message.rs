//! Pending sends.
//!
//! A [`Message`] is the transient description of one dispatch: who is
//! receiving, which selector, where lookup begins, and where the arguments
//! come from. It lives for exactly one send and never escapes it; the
//! send-site reference inside is a plain mutable borrow.

use crate::resolve::SendSite;
use garnet_core::{ModuleId, Symbol, Value};
use garnet_runtime::Executable;
use smallvec::SmallVec;

/// Where a message's arguments come from.
#[derive(Debug, Clone)]
pub enum Arguments {
    /// The topmost `count` values of the caller's operand stack, in push
    /// order.
    FromStack { count: usize },
    /// An explicit tuple.
    Explicit(SmallVec<[Value; 8]>),
}

impl Arguments {
    #[inline]
    pub fn count(&self) -> usize {
        match self {
            Arguments::FromStack { count } => *count,
            Arguments::Explicit(values) => values.len(),
        }
    }
}

/// A pending send.
pub struct Message<'site> {
    /// The receiver.
    pub recv: Value,
    /// Module at which method lookup begins: normally the receiver's
    /// class, a superclass for `super` sends.
    pub lookup_from: ModuleId,
    /// The selector.
    pub name: Symbol,
    /// Privacy asserted: private methods are visible to this send.
    pub priv_send: bool,
    /// Per-call-site inline cache, when the call site has one.
    pub send_site: Option<&'site mut SendSite>,
    /// Filled in by resolution: the executable, wrappers stripped.
    pub method: Option<Executable>,
    /// Filled in by resolution: the module the method was found in.
    pub module: Option<ModuleId>,
    /// Filled in by resolution: whether the entry was wrapped public.
    pub public: bool,
    /// Optional callable passed alongside the arguments.
    pub block: Option<Value>,
    args: Arguments,
}

impl<'site> Message<'site> {
    pub fn new(recv: Value, lookup_from: ModuleId, name: Symbol) -> Message<'site> {
        Message {
            recv,
            lookup_from,
            name,
            priv_send: false,
            send_site: None,
            method: None,
            module: None,
            public: true,
            block: None,
            args: Arguments::FromStack { count: 0 },
        }
    }

    /// Source the arguments from the caller's operand stack.
    pub fn use_from_stack(&mut self, count: usize) {
        self.args = Arguments::FromStack { count };
    }

    /// Source the arguments from an explicit tuple.
    pub fn with_arguments(&mut self, values: SmallVec<[Value; 8]>) {
        self.args = Arguments::Explicit(values);
    }

    /// Number of arguments this send carries.
    #[inline]
    pub fn argc(&self) -> usize {
        self.args.count()
    }

    #[inline]
    pub(crate) fn arguments(&self) -> &Arguments {
        &self.args
    }
}

impl std::fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("name", &self.name)
            .field("lookup_from", &self.lookup_from)
            .field("priv_send", &self.priv_send)
            .field("argc", &self.argc())
            .field("resolved", &self.method.is_some())
            .finish()
    }
}
