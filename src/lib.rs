pub mod ast;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod runner;
pub mod scanner;
pub mod stack;
pub mod token;
pub mod value;

pub use error::{LangError, Reporter, Result};
pub use interpreter::Interpreter;
pub use runner::{run, Status};
pub use value::Value;
