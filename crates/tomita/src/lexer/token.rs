use crate::grammar::TokenId;
use compact_str::CompactString;
use std::fmt;

/// A location in the source text.
///
/// `line` and `column` are 1-based; `column` counts characters, `offset`
/// counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// The beginning of a text.
    #[must_use]
    pub const fn start() -> Self {
        Self::new(0, 1, 1)
    }

    /// The position right after `text`, when `text` starts at `self`.
    #[must_use]
    pub fn advanced_by(self, text: &str) -> Self {
        let mut next = self;
        for c in text.chars() {
            next.offset += c.len_utf8();
            if c == '\n' {
                next.line += 1;
                next.column = 1;
            } else {
                next.column += 1;
            }
        }
        next
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token handed to the parser.
///
/// `kind` is the interned descriptor id from the configuration's token table;
/// `text` is the source text, kept as the terminal payload of the output tree.
///
/// # Example
///
/// ```rust
/// use tomita::grammar::TokenId;
/// use tomita::lexer::{Position, Token};
///
/// let eof = Token::eof(Position::start());
/// assert!(eof.is_eof());
/// assert_eq!(eof.kind, TokenId::EOF);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenId,
    pub text: CompactString,
    pub position: Position,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenId, text: impl Into<CompactString>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    /// The end-of-file token at `position`.
    #[must_use]
    pub fn eof(position: Position) -> Self {
        Self::new(TokenId::EOF, "", position)
    }

    #[inline]
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenId::EOF
    }

    /// Position right after this token.
    #[must_use]
    pub fn end(&self) -> Position {
        self.position.advanced_by(&self.text)
    }
}
