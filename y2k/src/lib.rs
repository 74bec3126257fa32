//! Y2K Interpreter Library
//!
//! A programming language written in file timestamps: programs are digit
//! streams read in fixed-width groups.

pub mod error;
pub mod interp;
pub mod repl;
pub mod source;

pub use error::{Error, Result};
pub use interp::{Context, ExecMode, Interpreter, Outcome, RunOptions};
