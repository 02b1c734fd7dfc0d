//! Token types for lexical analysis
//!
//! Defines the tokens recognized by the TL line lexer. Columns are character
//! offsets within the physical line.

use serde::{Deserialize, Serialize};

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text of this token
    pub text: String,
    /// Start column (inclusive)
    pub start: usize,
    /// End column (exclusive)
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            start,
            end,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    /// Identifier text, if this token is an identifier
    pub fn ident(&self) -> Option<&str> {
        self.is_ident().then_some(self.text.as_str())
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Identifier
    Ident,
    /// Reserved word
    Keyword(Keyword),
    /// Integer literal (42)
    Int,
    /// Decimal literal (3.14)
    Float,
    /// String literal, quotes included
    Str,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    /// `:` (also the block-continuation marker at end of a header)
    Colon,
    Dot,
    /// `..` (not a TL operator)
    DotDot,
    /// `...` range
    Ellipsis,
    /// `->`
    Arrow,

    // Operators
    /// `=`
    Assign,
    /// `+=`, `-=`, `*=`, `/=`, `%=`
    CompoundAssign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `|` (union types)
    Pipe,
    Question,

    /// Anything the lexer does not recognize
    Unknown,
}

impl TokenKind {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenKind::EqualEqual
                | TokenKind::BangEqual
                | TokenKind::Less
                | TokenKind::Greater
                | TokenKind::LessEqual
                | TokenKind::GreaterEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, TokenKind::AndAnd | TokenKind::OrOr)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash | TokenKind::Percent
        )
    }

    pub fn is_open(self) -> bool {
        matches!(
            self,
            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace
        )
    }

    pub fn is_close(self) -> bool {
        matches!(
            self,
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace
        )
    }
}

/// TL reserved words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Var,
    Let,
    Const,
    Final,
    Func,
    Init,
    Class,
    Enum,
    Record,
    Interface,
    Extends,
    If,
    Elif,
    Else,
    Match,
    For,
    In,
    While,
    Try,
    Catch,
    Finally,
    End,
    Return,
    Break,
    Continue,
    Throw,
    Import,
    From,
    As,
    This,
    True,
    False,
    Null,
}

impl Keyword {
    pub const ALL: &'static [Keyword] = &[
        Keyword::Var,
        Keyword::Let,
        Keyword::Const,
        Keyword::Final,
        Keyword::Func,
        Keyword::Init,
        Keyword::Class,
        Keyword::Enum,
        Keyword::Record,
        Keyword::Interface,
        Keyword::Extends,
        Keyword::If,
        Keyword::Elif,
        Keyword::Else,
        Keyword::Match,
        Keyword::For,
        Keyword::In,
        Keyword::While,
        Keyword::Try,
        Keyword::Catch,
        Keyword::Finally,
        Keyword::End,
        Keyword::Return,
        Keyword::Break,
        Keyword::Continue,
        Keyword::Throw,
        Keyword::Import,
        Keyword::From,
        Keyword::As,
        Keyword::This,
        Keyword::True,
        Keyword::False,
        Keyword::Null,
    ];

    /// Look up a reserved word. `nil` is accepted as a spelling of `null`.
    pub fn from_word(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "var" => Keyword::Var,
            "let" => Keyword::Let,
            "const" => Keyword::Const,
            "final" => Keyword::Final,
            "func" => Keyword::Func,
            "init" => Keyword::Init,
            "class" => Keyword::Class,
            "enum" => Keyword::Enum,
            "record" => Keyword::Record,
            "interface" => Keyword::Interface,
            "extends" => Keyword::Extends,
            "if" => Keyword::If,
            "elif" => Keyword::Elif,
            "else" => Keyword::Else,
            "match" => Keyword::Match,
            "for" => Keyword::For,
            "in" => Keyword::In,
            "while" => Keyword::While,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "finally" => Keyword::Finally,
            "end" => Keyword::End,
            "return" => Keyword::Return,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "throw" => Keyword::Throw,
            "import" => Keyword::Import,
            "from" => Keyword::From,
            "as" => Keyword::As,
            "this" => Keyword::This,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" | "nil" => Keyword::Null,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Var => "var",
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Final => "final",
            Keyword::Func => "func",
            Keyword::Init => "init",
            Keyword::Class => "class",
            Keyword::Enum => "enum",
            Keyword::Record => "record",
            Keyword::Interface => "interface",
            Keyword::Extends => "extends",
            Keyword::If => "if",
            Keyword::Elif => "elif",
            Keyword::Else => "else",
            Keyword::Match => "match",
            Keyword::For => "for",
            Keyword::In => "in",
            Keyword::While => "while",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
            Keyword::Finally => "finally",
            Keyword::End => "end",
            Keyword::Return => "return",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Throw => "throw",
            Keyword::Import => "import",
            Keyword::From => "from",
            Keyword::As => "as",
            Keyword::This => "this",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
        }
    }

    /// `var`, `let`, `const` or `final`
    pub fn is_declarator(self) -> bool {
        matches!(
            self,
            Keyword::Var | Keyword::Let | Keyword::Const | Keyword::Final
        )
    }

    /// Statements after which control never falls through
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Keyword::Return | Keyword::Break | Keyword::Continue | Keyword::Throw
        )
    }
}
