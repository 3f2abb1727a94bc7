use super::types::{ParseError, SrcLoc};
use logos::{self, Logos};

//===========================================================================//

struct LexerState {
    line: u32,
    start_of_line: usize,
    last_break: SrcLoc,
}

impl Default for LexerState {
    fn default() -> LexerState {
        LexerState { line: 1, start_of_line: 0, last_break: SrcLoc::default() }
    }
}

//===========================================================================//

fn newline_callback(lexer: &mut logos::Lexer<TokenKind>) -> logos::Filter<()> {
    lexer.extras.last_break = TokenKind::lexer_location(lexer);
    lexer.extras.line += 1;
    lexer.extras.start_of_line = lexer.span().end;
    logos::Filter::Emit(())
}

#[derive(Debug, Eq, Logos, PartialEq)]
#[logos(extras = LexerState)]
#[logos(skip r"[ \t]+")] // whitespace
enum TokenKind {
    #[token(":")]
    Colon,
    #[regex(r"[0-9A-Fa-f]+")]
    HexDigits,
    #[regex(r"\r?\n", newline_callback)]
    Linebreak,
}

impl TokenKind {
    fn lexer_location(lexer: &logos::Lexer<TokenKind>) -> SrcLoc {
        SrcLoc {
            line: lexer.extras.line,
            column: lexer.span().start - lexer.extras.start_of_line,
        }
    }

    fn into_token(self, lexer: &logos::Lexer<TokenKind>) -> Token {
        match self {
            TokenKind::Colon => Token {
                start: TokenKind::lexer_location(lexer),
                value: TokenValue::Colon,
            },
            TokenKind::HexDigits => Token {
                start: TokenKind::lexer_location(lexer),
                value: TokenValue::HexDigits(lexer.slice().to_string()),
            },
            TokenKind::Linebreak => Token {
                start: lexer.extras.last_break,
                value: TokenValue::Linebreak,
            },
        }
    }
}

//===========================================================================//

/// The contents of a single lexical token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenValue {
    /// The "`:`" start code of a record.
    Colon,
    /// A run of hexadecimal digits.
    HexDigits(String),
    /// A linebreak.
    Linebreak,
}

impl TokenValue {
    /// Returns the human-readable name for this kind of token.
    pub fn name(&self) -> &'static str {
        match &self {
            TokenValue::Colon => "colon",
            TokenValue::HexDigits(_) => "hex digits",
            TokenValue::Linebreak => "linebreak",
        }
    }
}

//===========================================================================//

/// A single lexical token, including location information.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// The location in the file of the start of the token.
    pub start: SrcLoc,
    /// The contents of the token.
    pub value: TokenValue,
}

//===========================================================================//

/// A lexer for tokenizing a HEX file.
pub struct TokenLexer<'a> {
    lexer: logos::Lexer<'a, TokenKind>,
}

impl<'a> TokenLexer<'a> {
    /// Constructs a new lexer in its initial state.
    pub fn new(input: &'a str) -> TokenLexer<'a> {
        TokenLexer { lexer: TokenKind::lexer(input) }
    }

    /// Returns the location just past the last token read so far.
    pub fn end_location(&self) -> SrcLoc {
        SrcLoc {
            line: self.lexer.extras.line,
            column: self.lexer.span().end - self.lexer.extras.start_of_line,
        }
    }
}

impl Iterator for TokenLexer<'_> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Result<Token, ParseError>> {
        match self.lexer.next()? {
            Ok(kind) => Some(Ok(kind.into_token(&self.lexer))),
            Err(()) => {
                let location = TokenKind::lexer_location(&self.lexer);
                let message = format!(
                    "invalid character: {}",
                    self.lexer.slice().escape_debug()
                );
                Some(Err(ParseError { location, message }))
            }
        }
    }
}

//===========================================================================//


//===========================================================================//
