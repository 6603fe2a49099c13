//! VM configuration parameters.

/// Tunables for a VM instance.
///
/// # Example
///
/// ```ignore
/// use garnet_vm::VmConfig;
///
/// // Deep recursion, contexts kept for post-mortem inspection
/// let config = VmConfig {
///     max_context_depth: 4096,
///     recycle_contexts: false,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Context-chain depth limit before a send fails with a fatal
    /// recursion error.
    ///
    /// Default: 1024
    pub max_context_depth: usize,

    /// Recycle context slots through the arena free list on return.
    ///
    /// Disable to retain popped contexts for debugger inspection; the
    /// arena then grows monotonically.
    ///
    /// Default: true
    pub recycle_contexts: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_context_depth: 1024,
            recycle_contexts: true,
        }
    }
}
