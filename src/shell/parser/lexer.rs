const WHITESPACE: &[u8] = b" \t\r\n\x0b";
const SYMBOLS: &[u8] = b"<|>;()&";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectOp {
    Input,  // <
    Output, // >
    Append, // >>
}

impl RedirectOp {
    pub fn symbol(self) -> &'static str {
        match self {
            RedirectOp::Input => "<",
            RedirectOp::Output => ">",
            RedirectOp::Append => ">>",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Word,
    Pipe,
    Redirect(RedirectOp),
    Background,
    Semi,
    OpenParen,
    CloseParen,
    EOF,
}

/// A token is only a kind and a byte span into the lexer's input; the text is
/// borrowed back out with [`Lexer::text`] when the parser decides to keep it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;
        let kind = match self.peek_byte() {
            None => TokenKind::EOF,
            Some(c) => match c {
                b'|' => self.single(TokenKind::Pipe),
                b';' => self.single(TokenKind::Semi),
                b'&' => self.single(TokenKind::Background),
                b'(' => self.single(TokenKind::OpenParen),
                b')' => self.single(TokenKind::CloseParen),
                b'<' => self.single(TokenKind::Redirect(RedirectOp::Input)),
                b'>' => {
                    self.pos += 1;
                    if self.peek_byte() == Some(b'>') {
                        self.pos += 1;
                        TokenKind::Redirect(RedirectOp::Append)
                    } else {
                        TokenKind::Redirect(RedirectOp::Output)
                    }
                }
                _ => self.read_word(),
            },
        };
        let end = self.pos;

        self.skip_whitespace();
        Token { kind, start, end }
    }

    /// Skips whitespace and reports whether the next character is one of
    /// `symbols`. Nothing is consumed beyond the whitespace.
    pub fn peek(&mut self, symbols: &str) -> bool {
        self.skip_whitespace();
        match self.peek_byte() {
            Some(c) => symbols.as_bytes().contains(&c),
            None => false,
        }
    }

    pub fn text(&self, token: Token) -> &'a str {
        &self.input[token.start..token.end]
    }

    /// Unconsumed input, starting at the cursor.
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.input.len()
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_byte() {
            if !WHITESPACE.contains(&c) {
                break;
            }
            self.pos += 1;
        }
    }

    // Whitespace and symbols are ASCII, so stopping on one of them always
    // lands on a char boundary.
    fn read_word(&mut self) -> TokenKind {
        while let Some(c) = self.peek_byte() {
            if WHITESPACE.contains(&c) || SYMBOLS.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        TokenKind::Word
    }
}
