//! Digit-stream interpreter
//!
//! Reads `window`-wide digit groups as opcodes and operands and executes
//! them against a per-run variable store.

pub mod alphabet;
mod env;
mod error;
mod eval;
pub mod record;
mod stream;
pub mod table;
mod value;

pub use env::VariableStore;
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{ConditionPlan, IF_TERMINATOR, Interpreter, LOOP_TERMINATOR};
pub use stream::DigitStream;
pub use value::{Operand, VarKind, Variable};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Decoding configuration in effect for a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Context {
    /// Digits per group, at least 1
    pub window: usize,
    /// Emit a step trace
    pub debug: bool,
}

impl Context {
    pub fn new(window: usize, debug: bool) -> Self {
        Context {
            window: window.max(1),
            debug,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(1, false)
    }
}

/// How nested bodies are executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecMode {
    /// Re-enter the dispatch loop for each body, growing the stack as needed
    #[default]
    Recursive,
    /// Keep pending bodies on an explicit frame stack
    Iterative,
}

impl FromStr for ExecMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recursive" => Ok(ExecMode::Recursive),
            "iterative" => Ok(ExecMode::Iterative),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecMode::Recursive => write!(f, "recursive"),
            ExecMode::Iterative => write!(f, "iterative"),
        }
    }
}

/// Options that do not change what a program means
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: ExecMode,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The stream ran out
    Finished,
    /// CONTINUE was read somewhere in the program
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_window_at_least_one() {
        assert_eq!(Context::new(0, false).window, 1);
        assert_eq!(Context::default(), Context::new(1, false));
    }

    #[test]
    fn test_exec_mode_parse() {
        assert_eq!("iterative".parse::<ExecMode>(), Ok(ExecMode::Iterative));
        assert_eq!("recursive".parse::<ExecMode>(), Ok(ExecMode::Recursive));
        assert!("sideways".parse::<ExecMode>().is_err());
        assert_eq!(ExecMode::Iterative.to_string(), "iterative");
    }
}
