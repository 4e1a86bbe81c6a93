mod error;
#[allow(clippy::module_inception)]
mod executor;
mod process;
mod redirect;

pub use error::ExecError;
pub use process::{spawn, status_code, wait_child};
