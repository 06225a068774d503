use crate::error::LexError;
use crate::grammar::{TokenDescriptor, TokenId, TokenTable};
use crate::lexer::{Position, Token, TokenStream};

/// Tokenizer driven by a configuration's [`TokenTable`].
///
/// Only the token kinds the grammar uses are produced:
///
/// - words become keywords when the table has them, identifiers otherwise
/// - integers (`42`) and floats (`1.5`, `2e10`, `3.0E-2`)
/// - double-quoted strings with backslash escapes
/// - the longest key-character sequence matching at the current position
///
/// Whitespace and `//` line comments are skipped.
///
/// # Example
///
/// ```rust
/// use tomita::grammar::{TokenDescriptor, TokenTable};
/// use tomita::lexer::Scanner;
///
/// let mut table = TokenTable::new();
/// let let_kw = table.intern(TokenDescriptor::literal("let"));
/// let ident = table.intern(TokenDescriptor::Identifier);
/// table.intern(TokenDescriptor::literal("="));
/// table.intern(TokenDescriptor::Integer);
///
/// let tokens = Scanner::new("let x = 1 // set x", &table).tokenize()?;
/// assert_eq!(tokens[0].kind, let_kw);
/// assert_eq!(tokens[1].kind, ident);
/// assert_eq!(tokens.len(), 5);
/// # Ok::<(), tomita::error::LexError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    position: Position,
    tokens: &'a TokenTable,
    key_chars: Vec<(&'a str, TokenId)>,
    line_comments: bool,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(text: &'a str, tokens: &'a TokenTable) -> Self {
        let key_chars = tokens.key_chars();
        let line_comments = !key_chars.iter().any(|(text, _)| text.starts_with("//"));
        Self {
            text,
            position: Position::start(),
            tokens,
            key_chars,
            line_comments,
        }
    }

    /// Tokenize the remaining input, ending with the end-of-file token.
    ///
    /// # Errors
    ///
    /// Returns the first [`LexError`] encountered.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Position of the next unread character.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    fn rest(&self) -> &'a str {
        &self.text[self.position.offset..]
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.position = self.position.advanced_by(&rest[..rest.len() - trimmed.len()]);
            if !(self.line_comments && trimmed.starts_with("//")) {
                return;
            }
            let end = trimmed.find('\n').unwrap_or(trimmed.len());
            self.position = self.position.advanced_by(&trimmed[..end]);
        }
    }

    fn take(&mut self, len: usize, kind: TokenId) -> Token {
        let start = self.position;
        let text = &self.rest()[..len];
        self.position = start.advanced_by(text);
        Token::new(kind, text, start)
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let rest = self.rest();
        let Some(first) = rest.chars().next() else {
            return Ok(Token::eof(self.position));
        };

        if first.is_alphabetic() || first == '_' {
            return self.word(rest);
        }
        if first.is_ascii_digit() {
            let (len, kind) = self.number(rest);
            return match (self.key_char(rest), kind) {
                // Declared digit literals win unless the number runs longer
                (Some((text, key)), number) if number.is_none() || text.len() >= len => {
                    Ok(self.take(text.len(), key))
                }
                (_, Some(kind)) => Ok(self.take(len, kind)),
                (_, None) => Err(self.unknown(&rest[..len])),
            };
        }
        if first == '"'
            && let Some(kind) = self.tokens.get(&TokenDescriptor::String)
        {
            return self.string(rest, kind);
        }

        match self.key_char(rest) {
            Some((text, kind)) => Ok(self.take(text.len(), kind)),
            None => Err(LexError::UnexpectedChar {
                ch: first,
                position: self.position,
            }),
        }
    }

    fn word(&mut self, rest: &str) -> Result<Token, LexError> {
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let word = &rest[..len];
        let kind = self
            .tokens
            .keyword(word)
            .or_else(|| self.tokens.get(&TokenDescriptor::Identifier));
        match kind {
            Some(kind) => Ok(self.take(len, kind)),
            None => Err(self.unknown(word)),
        }
    }

    /// Longest key-character sequence at the start of `rest`.
    fn key_char(&self, rest: &str) -> Option<(&'a str, TokenId)> {
        self.key_chars
            .iter()
            .find(|(text, _)| rest.starts_with(text))
            .copied()
    }

    /// Length of the number at the start of `rest` and the token class it
    /// scans as, if the grammar has one.
    fn number(&self, rest: &str) -> (usize, Option<TokenId>) {
        fn digits(bytes: &[u8], from: usize) -> usize {
            from + bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
        }

        let bytes = rest.as_bytes();
        let mut end = digits(bytes, 0);
        let mut float = false;
        if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
            end = digits(bytes, end + 1);
            float = true;
        }
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exponent = end + 1;
            if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
                exponent += 1;
            }
            if bytes.get(exponent).is_some_and(u8::is_ascii_digit) {
                end = digits(bytes, exponent);
                float = true;
            }
        }

        let integer = self.tokens.get(&TokenDescriptor::Integer);
        let floating = self.tokens.get(&TokenDescriptor::Float);
        let kind = if float { floating } else { integer.or(floating) };
        (end, kind)
    }

    fn string(&mut self, rest: &str, kind: TokenId) -> Result<Token, LexError> {
        let mut escaped = false;
        for (index, c) in rest.char_indices().skip(1) {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '"' => return Ok(self.take(index + 1, kind)),
                _ => {}
            }
        }
        Err(LexError::UnterminatedString {
            position: self.position,
        })
    }

    fn unknown(&self, word: &str) -> LexError {
        LexError::UnknownWord {
            word: word.to_string(),
            position: self.position,
        }
    }
}

impl TokenStream for Scanner<'_> {
    fn next_token(&mut self) -> Result<Token, LexError> {
        self.scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(descriptors: &[TokenDescriptor]) -> TokenTable {
        let mut table = TokenTable::new();
        for descriptor in descriptors {
            table.intern(descriptor.clone());
        }
        table
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|token| token.text.as_str()).collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        let table = table(&[TokenDescriptor::literal("if"), TokenDescriptor::Identifier]);
        let tokens = Scanner::new("if iffy _x1", &table).tokenize().unwrap();
        assert_eq!(texts(&tokens), vec!["if", "iffy", "_x1", ""]);
        assert_eq!(tokens[0].kind, table.keyword("if").unwrap());
        assert_eq!(
            tokens[1].kind,
            table.get(&TokenDescriptor::Identifier).unwrap()
        );
    }

    #[test]
    fn unknown_word_without_identifiers() {
        let table = table(&[TokenDescriptor::literal("E")]);
        let error = Scanner::new("E F", &table).tokenize().unwrap_err();
        assert_eq!(
            error,
            LexError::UnknownWord {
                word: "F".into(),
                position: Position::new(2, 1, 3),
            }
        );
    }

    #[test]
    fn numbers_and_strings() {
        let table = table(&[
            TokenDescriptor::Integer,
            TokenDescriptor::Float,
            TokenDescriptor::String,
            TokenDescriptor::literal("."),
        ]);
        let tokens = Scanner::new(r#"12 1.5 2e10 3.0E-2 7. "a\"b""#, &table)
            .tokenize()
            .unwrap();
        assert_eq!(
            texts(&tokens),
            vec!["12", "1.5", "2e10", "3.0E-2", "7", ".", r#""a\"b""#, ""]
        );
        let float = table.get(&TokenDescriptor::Float).unwrap();
        assert_eq!(tokens[0].kind, table.get(&TokenDescriptor::Integer).unwrap());
        assert!(tokens[1..4].iter().all(|token| token.kind == float));
    }

    #[test]
    fn key_chars_use_longest_match_and_comments_are_skipped() {
        let table = table(&[TokenDescriptor::literal("="), TokenDescriptor::literal("==")]);
        let tokens = Scanner::new("== = // trailing\n===", &table)
            .tokenize()
            .unwrap();
        assert_eq!(texts(&tokens), vec!["==", "=", "==", "=", ""]);
        assert_eq!(tokens[2].position, Position::new(17, 2, 1));
        assert_eq!(tokens[4].position, Position::new(20, 2, 4));
    }

    #[test]
    fn digit_literals_are_key_chars() {
        let only_literals = table(&[TokenDescriptor::literal("x"), TokenDescriptor::literal("1")]);
        let tokens = Scanner::new("x 1 1", &only_literals).tokenize().unwrap();
        assert_eq!(texts(&tokens), vec!["x", "1", "1", ""]);
        let one = only_literals.get(&TokenDescriptor::literal("1")).unwrap();
        assert!(tokens[1..3].iter().all(|token| token.kind == one));

        let mixed = table(&[TokenDescriptor::literal("1"), TokenDescriptor::Integer]);
        let tokens = Scanner::new("1 12 1", &mixed).tokenize().unwrap();
        assert_eq!(texts(&tokens), vec!["1", "12", "1", ""]);
        let one = mixed.get(&TokenDescriptor::literal("1")).unwrap();
        let integer = mixed.get(&TokenDescriptor::Integer).unwrap();
        let kinds: Vec<_> = tokens[..3].iter().map(|token| token.kind).collect();
        assert_eq!(kinds, vec![one, integer, one]);
    }

    #[test]
    fn lexical_errors_carry_positions() {
        let table = table(&[TokenDescriptor::String]);
        assert_eq!(
            Scanner::new("  \"open", &table).tokenize().unwrap_err(),
            LexError::UnterminatedString {
                position: Position::new(2, 1, 3),
            }
        );
        assert_eq!(
            Scanner::new("\n$", &table).tokenize().unwrap_err(),
            LexError::UnexpectedChar {
                ch: '$',
                position: Position::new(1, 2, 1),
            }
        );
    }
}
