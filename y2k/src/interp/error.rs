//! Runtime errors for the interpreter
//!
//! Almost nothing in a digit stream is an error: unknown opcodes are skipped,
//! missing variables read as empty and bad numbers read as zero. What is left
//! here stops the whole run.

use std::fmt;

/// Fatal error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Absolute digit offset the error points at
    pub offset: usize,
    /// Number of digits covered
    pub len: usize,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Print instruction with no usable type selected
    UnknownPrintKind,
    /// Writing a printed line failed
    Output,
}

impl RuntimeError {
    pub fn unknown_print_kind(kind: u64, offset: usize, len: usize) -> Self {
        let message = if kind == 0 {
            "print instruction has no type selected".to_string()
        } else {
            format!("unknown print type: {kind}")
        };
        RuntimeError {
            kind: ErrorKind::UnknownPrintKind,
            message,
            offset,
            len,
        }
    }

    pub fn output(err: &std::io::Error, offset: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::Output,
            message: format!("failed to write output: {err}"),
            offset,
            len: 0,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error at digit {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
