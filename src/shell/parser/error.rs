use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error: missing ')'")]
    MissingCloseParen,

    #[error("missing file for redirection '{0}'")]
    MissingRedirectTarget(&'static str),

    #[error("too many args: '{program}' accepts at most {max} words")]
    TooManyArguments { program: String, max: usize },

    #[error("syntax error near '{0}'")]
    UnexpectedToken(String),

    #[error("leftovers: {0}")]
    Leftovers(String),

    #[error("line too long: {len} bytes (max {max})")]
    LineTooLong { len: usize, max: usize },
}
