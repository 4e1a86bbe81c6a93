pub mod ast;
mod error;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;

pub use ast::{Command, OpenMode};
pub use error::ParseError;
pub use parser::{parse, DEFAULT_MAX_LINE};
