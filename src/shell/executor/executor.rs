use std::convert::Infallible;
use std::ffi::CString;

use log::{debug, info};
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{execvp, pipe, ForkResult};

use super::error::ExecError;
use super::process::{fail, fork_process, spawn, terminate, wait_child};
use super::redirect::{attach, open_redirect};
use crate::shell::parser::ast::Exec;
use crate::shell::parser::Command;

/// Carries out `command` in the current process and terminates it.
///
/// This is what every forked child runs. The exit status is 0 when the tree
/// reduces to an empty command, otherwise the failure's status; a successful
/// `exec` replaces the process before either happens.
pub fn run(command: &Command) -> ! {
    match execute(command) {
        Ok(()) => terminate(0),
        Err(err) => fail(err),
    }
}

/// Walks `command` inside the current process.
///
/// Structural nodes rewire descriptors or fork and then continue with exactly
/// one child node; an `Exec` with words replaces the process image. The only
/// `Ok` return is reaching an empty `Exec`. The caller owns the process this
/// runs in: call it from a fresh child, never from the interactive shell.
pub fn execute(command: &Command) -> Result<(), ExecError> {
    match command {
        Command::Exec(exec) => {
            if exec.is_empty() {
                return Ok(());
            }
            match exec_program(exec)? {}
        }

        Command::Redirect {
            command,
            file,
            mode,
            fd,
        } => {
            let opened = open_redirect(file, *mode)?;
            attach(opened, *fd)?;
            debug!("重定向 {} {} (fd {})", mode.symbol(), file, fd);
            execute(command)
        }

        Command::Pipe { left, right } => {
            let (read_end, write_end) = pipe().map_err(ExecError::Pipe)?;
            match fork_process()? {
                ForkResult::Child => {
                    drop(read_end);
                    if let Err(err) = attach(write_end, STDOUT_FILENO) {
                        fail(err);
                    }
                    run(left)
                }
                ForkResult::Parent { child } => {
                    debug!("管道左侧进程 {}: {}", child, left);
                    drop(write_end);
                    attach(read_end, STDIN_FILENO)?;
                    execute(right)
                }
            }
        }

        Command::Sequence {
            first,
            rest,
            background,
        } => {
            let child = spawn(first)?;
            if *background {
                info!("[{}] 后台运行: {}", child, first);
            } else {
                let status = wait_child(child)?;
                debug!("前台进程 {} 退出码 {}", child, status);
            }
            execute(rest)
        }
    }
}

/// Replaces the process image with `exec`'s program. Only returns on failure.
fn exec_program(exec: &Exec) -> Result<Infallible, ExecError> {
    let program = exec.program().unwrap_or_default();
    let argv = exec
        .argv()
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ExecError::InvalidArgument(program.to_string()))?;

    debug!("execvp: {:?}", exec.argv());
    execvp(&argv[0], &argv).map_err(|source| ExecError::Exec {
        program: program.to_string(),
        source,
    })
}
