mod commands;
mod executor;
mod job_manager;
mod parser;
mod readline;
#[allow(clippy::module_inception)]
mod shell;
mod signals;

pub use parser::DEFAULT_MAX_LINE;
pub use shell::Shell;
