//! Centralised error hierarchy for the interpreter.
//!
//! Every subsystem (scanner, parser, runtime, CLI) converts its failure modes
//! into one of the variants defined here, so the crate can share a single
//! `Result<T>` alias and still hand `anyhow` something with full detail.
//!
//! The module **does not** print diagnostics itself. Printing is the job of a
//! [`Reporter`], the sink every phase reports `(line, message)` pairs into.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LangError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Runtime evaluation error. Aborts the current top-level run.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent). Enables `?` on I/O ops,
    /// including writes performed by `print`.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LangError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LangError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LangError::Parse { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LangError::Runtime { message, line }
    }

    /// Source line the error points at, if it came from a script.
    pub fn line(&self) -> Option<usize> {
        match self {
            LangError::Lex { line, .. }
            | LangError::Parse { line, .. }
            | LangError::Runtime { line, .. } => Some(*line),
            LangError::Io(_) | LangError::Utf8(_) => None,
        }
    }

    /// The bare message, without the line decoration added by `Display`.
    pub fn message(&self) -> String {
        match self {
            LangError::Lex { message, .. }
            | LangError::Parse { message, .. }
            | LangError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, LangError::Runtime { .. })
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LangError>;

/// Sink for diagnostics. The core only ever hands it a line and a message;
/// how those are rendered is up to the implementation.
pub trait Reporter {
    fn report(&mut self, line: usize, message: &str);

    /// Forward a [`LangError`] to [`Reporter::report`]. Errors that carry no
    /// source line (I/O) are reported against line 0.
    fn report_error(&mut self, error: &LangError) {
        self.report(error.line().unwrap_or(0), &error.message());
    }
}

/// Writes `[line N] Error: message` to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, line: usize, message: &str) {
        eprintln!("[line {}] Error: {}", line, message);
    }
}

/// Collects diagnostics in memory; used by tests and embedders.
impl Reporter for Vec<(usize, String)> {
    fn report(&mut self, line: usize, message: &str) {
        self.push((line, message.to_owned()));
    }
}
