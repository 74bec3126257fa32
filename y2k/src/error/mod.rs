//! Error types and reporting

use crate::interp::RuntimeError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Anything that stops a run
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("REPL error: {0}")]
    Repl(#[from] rustyline::error::ReadlineError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }
}

/// Report a fatal runtime error with ariadne, pointing at its digits.
pub fn report_runtime_error(filename: &str, digits: &str, error: &RuntimeError) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let start = error.offset.min(digits.len());
    let end = (error.offset + error.len).min(digits.len()).max(start);

    let printed = Report::build(ReportKind::Error, (filename, start..end))
        .with_message(format!("{:?} error", error.kind))
        .with_label(
            Label::new((filename, start..end))
                .with_message(&error.message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(digits)));

    if printed.is_err() {
        eprintln!("Error: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_is_transparent() {
        let err: Error = RuntimeError::unknown_print_kind(0, 1, 1).into();
        assert!(err.to_string().contains("no type selected"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = Error::io(
            "missing/dir",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("missing/dir"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_export_error() {
        assert_eq!(Error::export("bad").to_string(), "Export error: bad");
    }
}
