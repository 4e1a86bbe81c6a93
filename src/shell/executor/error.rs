use nix::errno::Errno;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{path}: {source}")]
    Open {
        path: String,
        #[source]
        source: Errno,
    },

    #[error("pipe() failed: {0}")]
    Pipe(#[source] Errno),

    #[error("fork() failed: {0}")]
    Fork(#[source] Errno),

    #[error("cannot set up fd {fd}: {source}")]
    Dup {
        fd: i32,
        #[source]
        source: Errno,
    },

    #[error("waitpid() failed: {0}")]
    Wait(#[source] Errno),

    #[error("{program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: Errno,
    },

    #[error("{0}: argument contains a NUL byte")]
    InvalidArgument(String),
}

impl ExecError {
    /// Status the failing process terminates with.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::Exec {
                source: Errno::ENOENT,
                ..
            } => 127,
            ExecError::Exec { .. } | ExecError::InvalidArgument(_) => 126,
            _ => 1,
        }
    }
}
