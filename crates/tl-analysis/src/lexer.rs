//! Lexical analysis (tokenization)
//!
//! TL is line oriented: every physical line is tokenized exactly once into a
//! flat token stream. String and comment contents never produce code tokens,
//! so no rule downstream can fire inside them. String literals never span
//! lines; a missing closing quote is recorded, not reported here.

use crate::document::Document;
use crate::token::{Keyword, Token, TokenKind};

/// A string literal found on a line, with the interpolation markers inside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringLiteral {
    /// Column of the opening quote
    pub start: usize,
    /// Column after the closing quote (or end of line when unterminated)
    pub end: usize,
    pub terminated: bool,
    /// `#{expr}` segments: column of the `#` and the expression text
    pub interpolations: Vec<(usize, String)>,
    /// Columns of `${` sequences
    pub dollar_braces: Vec<usize>,
    /// Columns of `#` not followed by `{`
    pub bare_hashes: Vec<usize>,
}

/// A trailing `//` comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub start: usize,
    /// Comment text without the leading slashes
    pub text: String,
}

/// Tokens of one physical line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LexedLine {
    pub tokens: Vec<Token>,
    pub strings: Vec<StringLiteral>,
    pub comment: Option<Comment>,
}

impl LexedLine {
    pub fn first(&self) -> Option<&Token> {
        self.tokens.first()
    }

    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// First token is the given keyword
    pub fn starts_with(&self, keyword: Keyword) -> bool {
        self.first().is_some_and(|t| t.is_keyword(keyword))
    }

    pub fn is_code(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Only a comment on this line
    pub fn is_comment_only(&self) -> bool {
        self.tokens.is_empty() && self.comment.is_some()
    }
}

/// Tokenize every line of a document
pub fn lex_document(document: &Document) -> Vec<LexedLine> {
    document
        .lines()
        .iter()
        .map(|line| lex_line(line.text()))
        .collect()
}

/// Tokenize a single line (or an expression fragment)
pub fn lex_line(text: &str) -> LexedLine {
    LineLexer::new(text).run()
}

/// Lexer state for one line
struct LineLexer {
    chars: Vec<char>,
    current: usize,
    out: LexedLine,
}

impl LineLexer {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            current: 0,
            out: LexedLine::default(),
        }
    }

    fn run(mut self) -> LexedLine {
        while let Some(c) = self.peek(0) {
            if c.is_whitespace() {
                self.current += 1;
                continue;
            }

            let start = self.current;

            if c == '/' && self.peek(1) == Some('/') {
                let text: String = self.chars[start + 2..].iter().collect();
                self.out.comment = Some(Comment { start, text });
                break;
            }

            if c == '"' {
                self.string(start);
                continue;
            }

            if c.is_ascii_digit() {
                self.number(start);
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                self.identifier(start);
                continue;
            }

            self.punctuation(start, c);
        }

        self.out
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.current + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let text: String = self.chars[start..end].iter().collect();
        self.out.tokens.push(Token::new(kind, text, start, end));
    }

    fn identifier(&mut self, start: usize) {
        while self
            .peek(0)
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.current += 1;
        }
        let word: String = self.chars[start..self.current].iter().collect();
        let kind = match Keyword::from_word(&word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };
        self.out
            .tokens
            .push(Token::new(kind, word, start, self.current));
    }

    fn number(&mut self, start: usize) {
        self.digits();
        let mut kind = TokenKind::Int;
        // `1.5` is a float; `1..5` and `1...5` keep the dots as operators
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
            self.digits();
            kind = TokenKind::Float;
        }
        self.push(kind, start, self.current);
    }

    fn digits(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.current += 1;
        }
    }

    fn string(&mut self, start: usize) {
        let mut literal = StringLiteral {
            start,
            ..Default::default()
        };
        self.current += 1;

        loop {
            let Some(c) = self.peek(0) else {
                literal.end = self.current;
                break;
            };
            match c {
                '\\' => self.current += 2,
                '"' => {
                    self.current += 1;
                    literal.terminated = true;
                    literal.end = self.current;
                    break;
                }
                '#' if self.peek(1) == Some('{') => {
                    let hash = self.current;
                    self.current += 2;
                    let body_start = self.current;
                    self.skip_interpolation();
                    let body_end = self.current.min(self.chars.len());
                    let expr: String = self.chars[body_start..body_end].iter().collect();
                    literal.interpolations.push((hash, expr));
                    if self.peek(0) == Some('}') {
                        self.current += 1;
                    }
                }
                '#' => {
                    literal.bare_hashes.push(self.current);
                    self.current += 1;
                }
                '$' if self.peek(1) == Some('{') => {
                    literal.dollar_braces.push(self.current);
                    self.current += 2;
                }
                _ => self.current += 1,
            }
        }

        let end = literal.end.min(self.chars.len());
        literal.end = end;
        self.current = self.current.min(self.chars.len());
        self.push(TokenKind::Str, start, end);
        self.out.strings.push(literal);
    }

    /// Advance to the `}` closing an interpolation, stepping over nested
    /// braces and quoted text inside it.
    fn skip_interpolation(&mut self) {
        let mut depth = 0usize;
        while let Some(c) = self.peek(0) {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return,
                '}' => depth -= 1,
                '"' => {
                    self.current += 1;
                    while let Some(inner) = self.peek(0) {
                        if inner == '\\' {
                            self.current += 1;
                        } else if inner == '"' {
                            break;
                        }
                        self.current += 1;
                    }
                }
                _ => {}
            }
            self.current += 1;
        }
    }

    fn punctuation(&mut self, start: usize, c: char) {
        let next = self.peek(1);
        let (kind, width) = match (c, next) {
            ('.', Some('.')) if self.peek(2) == Some('.') => (TokenKind::Ellipsis, 3),
            ('.', Some('.')) => (TokenKind::DotDot, 2),
            ('.', _) => (TokenKind::Dot, 1),
            ('-', Some('>')) => (TokenKind::Arrow, 2),
            ('=', Some('=')) => (TokenKind::EqualEqual, 2),
            ('!', Some('=')) => (TokenKind::BangEqual, 2),
            ('<', Some('=')) => (TokenKind::LessEqual, 2),
            ('>', Some('=')) => (TokenKind::GreaterEqual, 2),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('+' | '-' | '*' | '/' | '%', Some('=')) => (TokenKind::CompoundAssign, 2),
            ('(', _) => (TokenKind::LeftParen, 1),
            (')', _) => (TokenKind::RightParen, 1),
            ('[', _) => (TokenKind::LeftBracket, 1),
            (']', _) => (TokenKind::RightBracket, 1),
            ('{', _) => (TokenKind::LeftBrace, 1),
            ('}', _) => (TokenKind::RightBrace, 1),
            (',', _) => (TokenKind::Comma, 1),
            (':', _) => (TokenKind::Colon, 1),
            ('=', _) => (TokenKind::Assign, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('<', _) => (TokenKind::Less, 1),
            ('>', _) => (TokenKind::Greater, 1),
            ('!', _) => (TokenKind::Bang, 1),
            ('|', _) => (TokenKind::Pipe, 1),
            ('?', _) => (TokenKind::Question, 1),
            _ => (TokenKind::Unknown, 1),
        };
        self.current += width;
        self.push(kind, start, self.current);
    }
}

/// Index of the token closing the bracket opened at `open`, if any.
pub fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.kind.is_open() {
            depth += 1;
        } else if token.kind.is_close() {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Index of the token opening the bracket closed at `close`, if any.
pub fn matching_open(tokens: &[Token], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for i in (0..=close.min(tokens.len().checked_sub(1)?)).rev() {
        let kind = tokens[i].kind;
        if kind.is_close() {
            depth += 1;
        } else if kind.is_open() {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split tokens on a separator at bracket depth zero.
pub fn split_top_level(tokens: &[Token], separator: TokenKind) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind.is_open() {
            depth += 1;
        } else if token.kind.is_close() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.kind == separator {
            parts.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    parts.push(&tokens[start..]);
    parts
}

/// Split tokens on a separator outside brackets and generic argument lists.
///
/// `<` opens a generic list only when it touches the identifier before it,
/// so `Map<K, V>` nests while `a < b, c` does not.
pub fn split_type_level(tokens: &[Token], separator: TokenKind) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut angles = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Less if i > 0 && touches_ident(&tokens[i - 1], token) => angles += 1,
            TokenKind::Greater if angles > 0 => angles -= 1,
            kind if kind.is_open() => depth += 1,
            kind if kind.is_close() => depth = depth.saturating_sub(1),
            kind if kind == separator && depth == 0 && angles == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

fn touches_ident(prev: &Token, token: &Token) -> bool {
    prev.is(TokenKind::Ident) && prev.end == token.start
}

/// Positions of tokens matching `pred` at bracket depth zero.
pub fn top_level_positions(tokens: &[Token], pred: impl Fn(&Token) -> bool) -> Vec<usize> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind.is_open() {
            depth += 1;
        } else if token.kind.is_close() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && pred(token) {
            found.push(i);
        }
    }
    found
}
