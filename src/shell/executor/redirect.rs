use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use log::debug;
use nix::fcntl::{fcntl, open, FcntlArg, FdFlag, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::dup2;

use super::error::ExecError;
use crate::shell::parser::OpenMode;

fn open_flags(mode: OpenMode) -> OFlag {
    let flags = match mode {
        OpenMode::Read => OFlag::O_RDONLY,
        OpenMode::Truncate => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
        OpenMode::Append => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
    };
    // dup2 clears close-on-exec on the slot; `attach` clears it when the
    // descriptor already is the slot.
    flags | OFlag::O_CLOEXEC
}

/// Opens `path` for a redirection. Created files get mode 0644.
pub fn open_redirect(path: &str, mode: OpenMode) -> Result<OwnedFd, ExecError> {
    let permissions = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH;
    let fd = open(path, open_flags(mode), permissions).map_err(|source| ExecError::Open {
        path: path.to_string(),
        source,
    })?;
    // SAFETY: `open` just returned this descriptor and nothing else owns it.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// Makes `slot` refer to the same file as `fd`, consuming `fd`.
///
/// `dup2` closes whatever `slot` held before. The original descriptor is
/// closed afterwards unless it already was `slot`, in which case it is kept
/// open as the slot itself with close-on-exec cleared.
pub fn attach(fd: OwnedFd, slot: RawFd) -> Result<(), ExecError> {
    if fd.as_raw_fd() == slot {
        fcntl(slot, FcntlArg::F_SETFD(FdFlag::empty()))
            .map_err(|source| ExecError::Dup { fd: slot, source })?;
        let _ = fd.into_raw_fd();
        return Ok(());
    }
    dup2(fd.as_raw_fd(), slot).map_err(|source| ExecError::Dup { fd: slot, source })?;
    debug!("fd {} -> fd {}", fd.as_raw_fd(), slot);
    drop(fd);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_open_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let path = path.to_str().unwrap();

        fs::write(path, "old contents\n").unwrap();
        let fd = open_redirect(path, OpenMode::Truncate).unwrap();
        nix::unistd::write(&fd, b"new\n").unwrap();
        drop(fd);
        assert_eq!(fs::read_to_string(path).unwrap(), "new\n");

        let fd = open_redirect(path, OpenMode::Append).unwrap();
        nix::unistd::write(&fd, b"more\n").unwrap();
        drop(fd);
        assert_eq!(fs::read_to_string(path).unwrap(), "new\nmore\n");

        let fd = open_redirect(path, OpenMode::Read).unwrap();
        assert!(nix::unistd::write(&fd, b"x").is_err());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_attach_to_own_slot_survives_exec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.txt");
        let fd = open_redirect(path.to_str().unwrap(), OpenMode::Truncate).unwrap();
        let slot = fd.as_raw_fd();

        let flags = fcntl(slot, FcntlArg::F_GETFD).unwrap();
        assert!(FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC));

        attach(fd, slot).unwrap();
        let flags = fcntl(slot, FcntlArg::F_GETFD).unwrap();
        assert!(!FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC));

        // SAFETY: `attach` left `slot` open and nothing else owns it.
        drop(unsafe { OwnedFd::from_raw_fd(slot) });
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_open_missing_file_for_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = open_redirect(path.to_str().unwrap(), OpenMode::Read).unwrap_err();
        assert!(matches!(
            err,
            ExecError::Open {
                source: nix::errno::Errno::ENOENT,
                ..
            }
        ));
    }
}
