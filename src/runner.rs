//! Source text in, [`Status`] out: scan, parse, then execute.

use log::{debug, info};

use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,

    /// Lexical or syntax errors; nothing was executed.
    StaticError,

    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

impl Status {
    /// Process exit code, following the `sysexits.h` convention
    /// (`EX_DATAERR` for bad input, `EX_SOFTWARE` for runtime failures).
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::StaticError => 65,
            Status::RuntimeError => 70,
        }
    }
}

/// Run `source` on `interpreter`, sending every diagnostic to `reporter`.
///
/// Lexical errors do not stop parsing (so syntax errors are reported in the
/// same pass), but any static error keeps the program from running.
pub fn run(interpreter: &mut Interpreter, source: &str, reporter: &mut dyn Reporter) -> Status {
    let mut lex_errors: Vec<(usize, String)> = Vec::new();
    let tokens = scanner::scan(source, &mut lex_errors);

    for (line, message) in &lex_errors {
        reporter.report(*line, message);
    }

    let statements = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,
        Err(errors) => {
            for e in &errors {
                debug!("Parse debug: {}", e);
                reporter.report_error(e);
            }
            return Status::StaticError;
        }
    };

    if !lex_errors.is_empty() {
        return Status::StaticError;
    }

    info!("Parsed {} statements", statements.len());

    match interpreter.interpret(&statements) {
        Ok(()) => Status::Success,
        Err(e) => {
            debug!("Runtime debug: {}", e);
            reporter.report_error(&e);
            Status::RuntimeError
        }
    }
}
