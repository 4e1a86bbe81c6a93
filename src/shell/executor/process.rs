use std::io::Write;

use log::{debug, error};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};

use super::error::ExecError;
use super::executor::run;
use crate::shell::parser::Command;
use crate::shell::signals;

/// `fork()` for the executor. The child starts with default signal
/// dispositions and must end in [`run`], [`fail`] or [`terminate`].
pub fn fork_process() -> Result<ForkResult, ExecError> {
    flush_std_streams();
    // SAFETY: the shell is single-threaded, and the child only walks the tree
    // and then execs or exits.
    let result = unsafe { fork() }.map_err(ExecError::Fork)?;
    if result.is_child() {
        signals::restore_default();
    }
    Ok(result)
}

/// Forks a child that runs `command` to completion and never returns into the
/// caller. The parent gets the child's pid back.
pub fn spawn(command: &Command) -> Result<Pid, ExecError> {
    match fork_process()? {
        ForkResult::Child => run(command),
        ForkResult::Parent { child } => {
            debug!("fork {}: {}", child, command);
            Ok(child)
        }
    }
}

/// Blocks until `pid` terminates and returns its exit status.
pub fn wait_child(pid: Pid) -> Result<i32, ExecError> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(code) = status_code(status) {
                    debug!("进程 {} 结束: {:?}", pid, status);
                    return Ok(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(ExecError::Wait(err)),
        }
    }
}

/// Exit status of a terminated child; `None` for stop/continue reports.
pub fn status_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + signal as i32),
        _ => None,
    }
}

/// Flushes the std streams and ends the current process without running
/// exit handlers.
pub fn terminate(code: i32) -> ! {
    flush_std_streams();
    // SAFETY: `_exit` is async-signal-safe and always sound to call.
    unsafe { libc::_exit(code) }
}

/// Reports `err` on stderr and terminates with its status.
pub fn fail(err: ExecError) -> ! {
    error!("{}", err);
    eprintln!("forksh: {}", err);
    terminate(err.exit_code())
}

fn flush_std_streams() {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}
