use std::fmt;
use std::os::fd::RawFd;

use super::error::ParseError;
use super::lexer::RedirectOp;

/// Most words a single `Exec` may hold, program name included.
pub const MAX_ARGS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exec(Exec),
    Redirect {
        command: Box<Command>,
        file: String,
        mode: OpenMode,
        fd: RawFd,
    },
    Pipe {
        left: Box<Command>,
        right: Box<Command>,
    },
    Sequence {
        first: Box<Command>,
        rest: Box<Command>,
        background: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Truncate,
    Append,
}

impl From<RedirectOp> for OpenMode {
    fn from(op: RedirectOp) -> Self {
        match op {
            RedirectOp::Input => OpenMode::Read,
            RedirectOp::Output => OpenMode::Truncate,
            RedirectOp::Append => OpenMode::Append,
        }
    }
}

impl OpenMode {
    /// The descriptor slot the redirection replaces.
    pub fn fd(self) -> RawFd {
        match self {
            OpenMode::Read => 0,
            OpenMode::Truncate | OpenMode::Append => 1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OpenMode::Read => "<",
            OpenMode::Truncate => ">",
            OpenMode::Append => ">>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Exec {
    argv: Vec<String>,
}

impl Exec {
    pub fn new() -> Self {
        Self {
            argv: Vec::with_capacity(MAX_ARGS),
        }
    }

    pub fn push(&mut self, word: &str) -> Result<(), ParseError> {
        if self.argv.len() >= MAX_ARGS {
            return Err(ParseError::TooManyArguments {
                program: self.argv.first().cloned().unwrap_or_default(),
                max: MAX_ARGS,
            });
        }
        self.argv.push(word.to_owned());
        Ok(())
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }
}

impl Command {
    #[cfg(test)]
    pub fn exec<I, S>(words: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exec = Exec::new();
        for word in words {
            exec.push(word.as_ref())?;
        }
        Ok(Command::Exec(exec))
    }

    pub fn redirect(command: Command, file: impl Into<String>, mode: OpenMode) -> Self {
        Command::Redirect {
            command: Box::new(command),
            file: file.into(),
            mode,
            fd: mode.fd(),
        }
    }

    pub fn pipe(left: Command, right: Command) -> Self {
        Command::Pipe {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn sequence(first: Command, rest: Command, background: bool) -> Self {
        Command::Sequence {
            first: Box::new(first),
            rest: Box::new(rest),
            background,
        }
    }

    /// An `Exec` with no words: running it does nothing and succeeds.
    pub fn is_empty(&self) -> bool {
        matches!(self, Command::Exec(exec) if exec.is_empty())
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, grouped: bool) -> fmt::Result {
        if grouped {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

// Renders source text that parses back to the same tree. Groups are added
// wherever the right-leaning grammar would otherwise re-associate.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Exec(exec) => write!(f, "{}", exec.argv.join(" ")),
            Command::Redirect {
                command,
                file,
                mode,
                ..
            } => {
                let grouped = !matches!(**command, Command::Exec(_) | Command::Redirect { .. });
                command.fmt_operand(f, grouped)?;
                write!(f, " {} {}", mode.symbol(), file)
            }
            Command::Pipe { left, right } => {
                let grouped = matches!(**left, Command::Pipe { .. } | Command::Sequence { .. });
                left.fmt_operand(f, grouped)?;
                f.write_str(" | ")?;
                right.fmt_operand(f, matches!(**right, Command::Sequence { .. }))
            }
            Command::Sequence {
                first,
                rest,
                background,
            } => {
                first.fmt_operand(f, matches!(**first, Command::Sequence { .. }))?;
                f.write_str(if *background { " & " } else { " ; " })?;
                write!(f, "{}", rest)
            }
        }
    }
}
