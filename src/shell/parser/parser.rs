use log::trace;

use super::ast::{Command, Exec, OpenMode};
use super::error::ParseError;
use super::lexer::{Lexer, TokenKind};

/// Default bound on the length of one input line, in bytes.
pub const DEFAULT_MAX_LINE: usize = 100;

pub struct Parser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    max_line: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            input,
            lexer: Lexer::new(input),
            max_line: DEFAULT_MAX_LINE,
        }
    }

    pub fn max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// Parses the whole input. Anything left after a complete `line` is an
    /// error, so a successful result always accounts for every byte.
    pub fn parse_command(&mut self) -> Result<Command, ParseError> {
        let len = self.input.trim_end_matches(['\n', '\r']).len();
        if len > self.max_line {
            return Err(ParseError::LineTooLong {
                len,
                max: self.max_line,
            });
        }

        let command = self.parse_line()?;
        if !self.lexer.is_at_end() {
            return Err(ParseError::Leftovers(self.lexer.rest().trim_end().to_string()));
        }
        trace!("解析结果: {:?}", command);
        Ok(command)
    }

    // line := pipeline ( (';' | '&') line )?
    fn parse_line(&mut self) -> Result<Command, ParseError> {
        let command = self.parse_pipeline()?;
        if self.lexer.peek(";&") {
            let token = self.lexer.next_token();
            let rest = self.parse_line()?;
            return Ok(Command::sequence(
                command,
                rest,
                token.kind == TokenKind::Background,
            ));
        }
        Ok(command)
    }

    // pipeline := simple ( '|' pipeline )?
    fn parse_pipeline(&mut self) -> Result<Command, ParseError> {
        let command = self.parse_exec()?;
        if self.lexer.peek("|") {
            self.lexer.next_token();
            let right = self.parse_pipeline()?;
            return Ok(Command::pipe(command, right));
        }
        Ok(command)
    }

    // simple := '(' line ')' redirs | redirs ( word redirs )*
    fn parse_exec(&mut self) -> Result<Command, ParseError> {
        if self.lexer.peek("(") {
            return self.parse_block();
        }

        let mut exec = Exec::new();
        let mut redirections = Vec::new();

        self.parse_redirections(&mut redirections)?;
        while !self.lexer.peek("|;&()") {
            let token = self.lexer.next_token();
            match token.kind {
                TokenKind::EOF => break,
                TokenKind::Word => exec.push(self.lexer.text(token))?,
                _ => {
                    return Err(ParseError::UnexpectedToken(
                        self.lexer.text(token).to_string(),
                    ))
                }
            }
            self.parse_redirections(&mut redirections)?;
        }

        Ok(wrap_redirections(Command::Exec(exec), redirections))
    }

    fn parse_block(&mut self) -> Result<Command, ParseError> {
        self.lexer.next_token(); // 跳过 '('
        let command = self.parse_line()?;
        if !self.lexer.peek(")") {
            return Err(ParseError::MissingCloseParen);
        }
        self.lexer.next_token();

        let mut redirections = Vec::new();
        self.parse_redirections(&mut redirections)?;
        Ok(wrap_redirections(command, redirections))
    }

    // redirs := ( ('<' | '>' | '>>') word )*
    fn parse_redirections(
        &mut self,
        redirections: &mut Vec<(String, OpenMode)>,
    ) -> Result<(), ParseError> {
        while self.lexer.peek("<>") {
            let token = self.lexer.next_token();
            let TokenKind::Redirect(operator) = token.kind else {
                return Err(ParseError::UnexpectedToken(self.lexer.text(token).to_string()));
            };

            let target = self.lexer.next_token();
            if target.kind != TokenKind::Word {
                return Err(ParseError::MissingRedirectTarget(operator.symbol()));
            }
            redirections.push((self.lexer.text(target).to_string(), operator.into()));
        }
        Ok(())
    }
}

/// Wraps `command` in one `Redirect` per entry, first entry innermost.
fn wrap_redirections(command: Command, redirections: Vec<(String, OpenMode)>) -> Command {
    redirections
        .into_iter()
        .fold(command, |inner, (file, mode)| Command::redirect(inner, file, mode))
}

pub fn parse(line: &str, max_line: usize) -> Result<Command, ParseError> {
    Parser::new(line).max_line(max_line).parse_command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn parse_ok(input: &str) -> Command {
        Parser::new(input).parse_command().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn exec(words: &[&str]) -> Command {
        Command::exec(words.iter().copied()).unwrap()
    }

    #[test]
    fn test_simple_command() {
        match parse_ok("ls -l") {
            Command::Exec(exec) => {
                assert_eq!(exec.program(), Some("ls"));
                assert_eq!(exec.argv(), ["ls", "-l"]);
            }
            other => panic!("Expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_line_is_empty_exec() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("  \t\n").is_empty());
    }

    #[test]
    fn test_sequence_and_background() {
        assert_eq!(
            parse_ok("a ; b"),
            Command::sequence(exec(&["a"]), exec(&["b"]), false)
        );
        assert_eq!(
            parse_ok("a & b"),
            Command::sequence(exec(&["a"]), exec(&["b"]), true)
        );
    }

    #[test]
    fn test_sequence_is_right_associative() {
        assert_eq!(
            parse_ok("a & b ; c"),
            Command::sequence(
                exec(&["a"]),
                Command::sequence(exec(&["b"]), exec(&["c"]), false),
                true
            )
        );
    }

    #[test]
    fn test_trailing_background() {
        assert_eq!(
            parse_ok("sleep 10 &"),
            Command::sequence(exec(&["sleep", "10"]), exec(&[]), true)
        );
    }

    #[test]
    fn test_pipeline_is_right_associative() {
        assert_eq!(
            parse_ok("a | b | c"),
            Command::pipe(
                exec(&["a"]),
                Command::pipe(exec(&["b"]), exec(&["c"]))
            )
        );
    }

    #[test]
    fn test_pipe_binds_tighter_than_sequence() {
        assert_eq!(
            parse_ok("a | b ; c"),
            Command::sequence(
                Command::pipe(exec(&["a"]), exec(&["b"])),
                exec(&["c"]),
                false
            )
        );
    }

    #[test]
    fn test_redirection_modes() {
        assert_eq!(
            parse_ok("a > out.txt"),
            Command::redirect(exec(&["a"]), "out.txt", OpenMode::Truncate)
        );
        assert_eq!(
            parse_ok("a >> out.txt"),
            Command::redirect(exec(&["a"]), "out.txt", OpenMode::Append)
        );
        match parse_ok("a < in.txt") {
            Command::Redirect { file, mode, fd, .. } => {
                assert_eq!(file, "in.txt");
                assert_eq!(mode, OpenMode::Read);
                assert_eq!(fd, 0);
            }
            other => panic!("Expected redirection, got {:?}", other),
        }
    }

    #[test]
    fn test_redirection_before_words() {
        assert_eq!(
            parse_ok("echo > out hi"),
            Command::redirect(exec(&["echo", "hi"]), "out", OpenMode::Truncate)
        );
        assert_eq!(
            parse_ok("< in cat"),
            Command::redirect(exec(&["cat"]), "in", OpenMode::Read)
        );
    }

    #[test]
    fn test_first_redirection_is_innermost() {
        assert_eq!(
            parse_ok("sort < in > out"),
            Command::redirect(
                Command::redirect(exec(&["sort"]), "in", OpenMode::Read),
                "out",
                OpenMode::Truncate
            )
        );
    }

    #[test]
    fn test_group_before_pipe() {
        assert_eq!(
            parse_ok("(a ; b) | c"),
            Command::pipe(
                Command::sequence(exec(&["a"]), exec(&["b"]), false),
                exec(&["c"])
            )
        );
    }

    #[test]
    fn test_group_redirection_applies_to_group() {
        assert_eq!(
            parse_ok("(a | b) >> log"),
            Command::redirect(
                Command::pipe(exec(&["a"]), exec(&["b"])),
                "log",
                OpenMode::Append
            )
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let err = Parser::new("a b c d e f g h i j k").parse_command();
        assert_eq!(
            err,
            Err(ParseError::TooManyArguments {
                program: "a".to_string(),
                max: 10
            })
        );
        assert!(Parser::new("a b c d e f g h i j").parse_command().is_ok());
    }

    #[test]
    fn test_unmatched_paren() {
        assert_eq!(
            Parser::new("(echo hi").parse_command(),
            Err(ParseError::MissingCloseParen)
        );
    }

    #[test]
    fn test_redirection_without_file() {
        assert_eq!(
            Parser::new("echo hi >").parse_command(),
            Err(ParseError::MissingRedirectTarget(">"))
        );
        assert_eq!(
            Parser::new("cat < | wc").parse_command(),
            Err(ParseError::MissingRedirectTarget("<"))
        );
    }

    #[test]
    fn test_leftovers() {
        assert_eq!(
            Parser::new("echo hi ) more").parse_command(),
            Err(ParseError::Leftovers(") more".to_string()))
        );
    }

    #[test]
    fn test_line_too_long() {
        let line = "echo 0123456789";
        assert_eq!(
            parse(line, 10),
            Err(ParseError::LineTooLong { len: 15, max: 10 })
        );
        assert!(parse("echo hi\n", 7).is_ok());
    }

    #[test]
    fn test_display_round_trip() {
        for line in [
            "ls -l",
            "a ; b & c",
            "a | b | c",
            "(a ; b) | c",
            "echo > out hi",
            "(a | b) >> log ; cat < log",
            "sleep 1 &",
            "((a | b) | c) > out",
        ] {
            let tree = parse_ok(line);
            assert_eq!(parse_ok(&tree.to_string()), tree, "round trip of {:?}", line);
        }
    }
}
