//! Runtime error types for the execution core.

use std::fmt;

/// Result alias used throughout the VM.
pub type VmResult<T> = Result<T, RuntimeError>;

/// Classification of a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// A selector resolved nowhere, and `method_missing` did not either.
    MethodMissing,
    /// A value had the wrong kind for the operation (non-class constant,
    /// superclass mismatch).
    TypeError,
    /// Argument count outside the method's accepted range.
    ArgumentError,
    /// Internal corruption: context chain, operand stack, or literal pool
    /// out of shape. Aborts the Task.
    Fatal,
}

impl RuntimeErrorKind {
    fn label(self) -> &'static str {
        match self {
            RuntimeErrorKind::MethodMissing => "MethodMissing",
            RuntimeErrorKind::TypeError => "TypeError",
            RuntimeErrorKind::ArgumentError => "ArgumentError",
            RuntimeErrorKind::Fatal => "Fatal",
        }
    }
}

/// A runtime error surfaced by the execution core.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    kind: RuntimeErrorKind,
    message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// No method and no `method_missing` for the selector.
    pub fn method_missing(selector: &str) -> Self {
        Self::new(
            RuntimeErrorKind::MethodMissing,
            format!("undefined method '{}'", selector),
        )
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::TypeError, message)
    }

    /// Argument count mismatch with no splat to absorb it.
    pub fn argument_error(required: usize, total: usize, given: usize) -> Self {
        let expected = if required == total {
            format!("{}", required)
        } else {
            format!("{}..{}", required, total)
        };
        Self::new(
            RuntimeErrorKind::ArgumentError,
            format!("wrong number of arguments (given {}, expected {})", given, expected),
        )
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Fatal, message)
    }

    #[inline]
    pub fn kind(&self) -> RuntimeErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for RuntimeError {}
