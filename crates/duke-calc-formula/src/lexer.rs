//! Formula lexer
//!
//! Turns formula text into a flat token stream. Scanning never fails:
//! characters that start no token are dropped, and the stream always ends
//! with a single [`TokenKind::Eof`].

use std::fmt;

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    String,
    Function,
    Operator,
    CellRef,
    Parenthesis,
    Comma,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Function => "FUNCTION",
            TokenKind::Operator => "OPERATOR",
            TokenKind::CellRef => "CELL_REF",
            TokenKind::Parenthesis => "PARENTHESIS",
            TokenKind::Comma => "COMMA",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// A lexed token
///
/// `position` is the byte offset of the token in the formula text after the
/// leading `=` has been stripped. String tokens carry their contents without
/// the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Check kind and text at once, e.g. `token.is(TokenKind::Operator, "+")`
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

/// Tokenize a formula
///
/// # Example
/// ```rust
/// use duke_calc_formula::lexer::{tokenize, TokenKind};
///
/// let tokens = tokenize("=SUM(A1:A3)*2");
/// let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         TokenKind::Function,
///         TokenKind::Parenthesis,
///         TokenKind::CellRef,
///         TokenKind::Parenthesis,
///         TokenKind::Operator,
///         TokenKind::Number,
///         TokenKind::Eof,
///     ]
/// );
/// assert_eq!(tokens[2].text, "A1:A3");
/// ```
pub fn tokenize(formula: &str) -> Vec<Token> {
    let input = formula.strip_prefix('=').unwrap_or(formula);
    Lexer::new(input).run()
}

/// Text of every cell reference token in a formula, in order
///
/// Range references such as `A1:B3` are returned as a single entry.
pub fn cell_references(formula: &str) -> Vec<String> {
    tokenize(formula)
        .into_iter()
        .filter(|t| t.kind == TokenKind::CellRef)
        .map(|t| t.text)
        .collect()
}

/// Check whether an identifier has the shape of a cell reference (`^[A-Z]+\d+$`)
pub fn is_cell_reference(text: &str) -> bool {
    let letters = text.bytes().take_while(|b| b.is_ascii_uppercase()).count();
    let rest = &text.as_bytes()[letters..];
    letters > 0 && !rest.is_empty() && rest.iter().all(|b| b.is_ascii_digit())
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.peek_char() {
            let start = self.pos;

            if c.is_whitespace() {
                self.advance();
            } else if c.is_ascii_digit() || c == '.' {
                self.scan_number(start);
            } else if c == '"' {
                self.scan_string(start);
            } else if c.is_ascii_uppercase() {
                self.scan_identifier(start);
            } else {
                self.advance();
                let kind = match c {
                    '+' | '-' | '*' | '/' | '^' | '%' => TokenKind::Operator,
                    '(' | ')' => TokenKind::Parenthesis,
                    ',' => TokenKind::Comma,
                    // Unknown characters are dropped
                    _ => continue,
                };
                self.push(kind, start);
            }
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.input.len()));
        self.tokens
    }

    fn scan_number(&mut self, start: usize) {
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_digit() || c == '.')
        {
            self.advance();
        }
        self.push(TokenKind::Number, start);
    }

    fn scan_string(&mut self, start: usize) {
        self.advance(); // Skip opening quote

        let content_start = self.pos;
        while self.peek_char().map_or(false, |c| c != '"') {
            self.advance();
        }
        let content = &self.input[content_start..self.pos];

        // Skip closing quote, if any
        if self.peek_char() == Some('"') {
            self.advance();
        }

        self.tokens
            .push(Token::new(TokenKind::String, content, start));
    }

    fn scan_identifier(&mut self, start: usize) {
        self.pos = Self::identifier_end(self.input, start);
        let ident = &self.input[start..self.pos];

        if !is_cell_reference(ident) {
            self.push(TokenKind::Function, start);
            return;
        }

        // A1:B3 - look past the colon for a second reference
        if self.peek_char() == Some(':') {
            let second_start = self.pos + 1;
            let starts_upper = self.input[second_start..]
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_uppercase());
            if starts_upper {
                let second_end = Self::identifier_end(self.input, second_start);
                if is_cell_reference(&self.input[second_start..second_end]) {
                    self.pos = second_end;
                }
            }
        }

        self.push(TokenKind::CellRef, start);
    }

    fn identifier_end(input: &str, start: usize) -> usize {
        input[start..]
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map_or(input.len(), |(i, _)| start + i)
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let text = &self.input[start..self.pos];
        self.tokens.push(Token::new(kind, text, start));
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }
}
