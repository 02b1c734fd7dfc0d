//! Line shapes and lightweight header parsers
//!
//! There is no expression grammar. Each lexed line is classified into a
//! [`LineShape`], and the few constructs the engine needs to read back
//! (function headers, class headers, variable declarations, assignments,
//! imports, loop headers) are parsed straight off the token stream.

use crate::lexer::{matching_close, split_top_level, split_type_level, LexedLine};
use crate::token::{Keyword, Token, TokenKind};

/// Class-like declaration flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Enum,
    Record,
    Interface,
}

impl ClassKind {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Class => Some(ClassKind::Class),
            Keyword::Enum => Some(ClassKind::Enum),
            Keyword::Record => Some(ClassKind::Record),
            Keyword::Interface => Some(ClassKind::Interface),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Enum => "enum",
            ClassKind::Record => "record",
            ClassKind::Interface => "interface",
        }
    }
}

/// Kind of block a header line opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Function,
    Constructor,
    Loop,
    Conditional,
    Handler,
    ClassLike(ClassKind),
}

impl BlockKind {
    pub fn is_function(self) -> bool {
        matches!(self, BlockKind::Function | BlockKind::Constructor)
    }

    pub fn is_class_like(self) -> bool {
        matches!(self, BlockKind::ClassLike(_))
    }

    /// Blocks that can be continued by `elif`/`else`/`catch`/`finally`
    pub fn is_branching(self) -> bool {
        matches!(self, BlockKind::Conditional | BlockKind::Handler)
    }
}

/// Structural classification of one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineShape {
    /// Whitespace or comment only
    Blank,
    /// Header ending in `:` that opens a block
    Opener { kind: BlockKind, name: Option<String> },
    /// `elif`, `else`, `catch` or `finally` header
    Continuation { keyword: Keyword },
    /// `end`
    Terminator,
    /// Anything else
    Statement,
}

impl LineShape {
    pub fn is_opener(&self) -> bool {
        matches!(self, LineShape::Opener { .. })
    }

    pub fn block_kind(&self) -> Option<BlockKind> {
        match self {
            LineShape::Opener { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Classify a lexed line
pub fn classify(line: &LexedLine) -> LineShape {
    let Some(first) = line.first() else {
        return LineShape::Blank;
    };
    let ends_with_colon = line.last().is_some_and(|t| t.is(TokenKind::Colon));

    let TokenKind::Keyword(keyword) = first.kind else {
        return LineShape::Statement;
    };

    if keyword == Keyword::End && line.tokens.len() == 1 {
        return LineShape::Terminator;
    }

    if !ends_with_colon {
        return LineShape::Statement;
    }

    let name = || line.tokens.get(1).and_then(|t| t.ident()).map(str::to_string);

    let kind = match keyword {
        Keyword::Func => BlockKind::Function,
        Keyword::Init => BlockKind::Constructor,
        Keyword::For | Keyword::While => BlockKind::Loop,
        Keyword::If | Keyword::Match => BlockKind::Conditional,
        Keyword::Try => BlockKind::Handler,
        Keyword::Elif | Keyword::Else | Keyword::Catch | Keyword::Finally => {
            return LineShape::Continuation { keyword };
        }
        other => match ClassKind::from_keyword(other) {
            Some(class) => BlockKind::ClassLike(class),
            None => return LineShape::Statement,
        },
    };

    let name = match kind {
        BlockKind::Function | BlockKind::ClassLike(_) => name(),
        BlockKind::Constructor => Some("init".to_string()),
        _ => None,
    };

    LineShape::Opener { kind, name }
}

/// Kind of block a continuation keyword opens
pub fn continuation_kind(keyword: Keyword) -> BlockKind {
    match keyword {
        Keyword::Catch | Keyword::Finally => BlockKind::Handler,
        _ => BlockKind::Conditional,
    }
}

/// Source text spanned by a token slice
pub fn span_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut last_end: Option<usize> = None;
    for token in tokens {
        if let Some(end) = last_end {
            if token.start > end {
                out.push(' ');
            }
        }
        out.push_str(&token.text);
        last_end = Some(token.end);
    }
    out
}

/// Variable mutability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Var,
    Let,
    Const,
    Final,
}

impl Mutability {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Var => Some(Mutability::Var),
            Keyword::Let => Some(Mutability::Let),
            Keyword::Const => Some(Mutability::Const),
            Keyword::Final => Some(Mutability::Final),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mutability::Var => "var",
            Mutability::Let => "let",
            Mutability::Const => "const",
            Mutability::Final => "final",
        }
    }

    /// `const` and `final` bindings cannot be reassigned
    pub fn is_immutable(self) -> bool {
        matches!(self, Mutability::Const | Mutability::Final)
    }
}

/// A function or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub column: usize,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

/// Parsed `func name(params) -> T:` or `init(params):` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionHeader {
    pub name: String,
    pub name_column: usize,
    pub is_constructor: bool,
    pub params: Vec<Param>,
    pub return_annotation: Option<String>,
}

impl FunctionHeader {
    pub fn parse(line: &LexedLine) -> Option<Self> {
        let tokens = &line.tokens;
        let first = tokens.first()?;
        let (name, name_column, open) = if first.is_keyword(Keyword::Func) {
            let name = tokens.get(1)?;
            (name.ident()?.to_string(), name.start, 2)
        } else if first.is_keyword(Keyword::Init) {
            ("init".to_string(), first.start, 1)
        } else {
            return None;
        };

        if !tokens.get(open)?.is(TokenKind::LeftParen) {
            return None;
        }
        let close = matching_close(tokens, open)?;

        let params = if close > open + 1 {
            split_type_level(&tokens[open + 1..close], TokenKind::Comma)
                .into_iter()
                .filter_map(Param::parse)
                .collect()
        } else {
            Vec::new()
        };

        let rest = &tokens[close + 1..];
        let rest = match rest.last() {
            Some(t) if t.is(TokenKind::Colon) => &rest[..rest.len() - 1],
            _ => rest,
        };
        let return_annotation = match rest.split_first() {
            Some((arrow, ty)) if arrow.is(TokenKind::Arrow) && !ty.is_empty() => {
                Some(span_text(ty))
            }
            _ => None,
        };

        Some(Self {
            is_constructor: first.is_keyword(Keyword::Init),
            name,
            name_column,
            params,
            return_annotation,
        })
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// `func name(a: Int, b) -> T`
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(Param::render)
            .collect::<Vec<_>>()
            .join(", ");
        let head = if self.is_constructor {
            format!("init({})", params)
        } else {
            format!("func {}({})", self.name, params)
        };
        match &self.return_annotation {
            Some(ret) => format!("{} -> {}", head, ret),
            None => head,
        }
    }
}

impl Param {
    fn parse(tokens: &[Token]) -> Option<Self> {
        // `...rest` variadic marker is skipped
        let tokens = match tokens.first() {
            Some(t) if t.is(TokenKind::Ellipsis) => &tokens[1..],
            _ => tokens,
        };
        let name_token = tokens.first()?;
        let name = name_token.ident()?.to_string();

        let parts = split_top_level(&tokens[1..], TokenKind::Assign);
        let (head, default) = match parts.as_slice() {
            [head, default, ..] => (*head, Some(span_text(default))),
            [head] => (*head, None),
            [] => (&tokens[1..1], None),
        };
        let annotation = match head.split_first() {
            Some((colon, ty)) if colon.is(TokenKind::Colon) && !ty.is_empty() => {
                Some(span_text(ty))
            }
            _ => None,
        };

        Some(Self {
            name,
            column: name_token.start,
            annotation,
            default: default.filter(|d| !d.is_empty()),
        })
    }

    pub fn render(&self) -> String {
        let mut out = self.name.clone();
        if let Some(ty) = &self.annotation {
            out.push_str(": ");
            out.push_str(ty);
        }
        if let Some(default) = &self.default {
            out.push_str(" = ");
            out.push_str(default);
        }
        out
    }
}

/// Parsed `class Name<T> extends Base:` style header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub kind: ClassKind,
    pub keyword_column: usize,
    pub name: String,
    pub name_column: usize,
    pub generics: Vec<String>,
    pub base: Option<String>,
}

impl ClassHeader {
    pub fn parse(line: &LexedLine) -> Option<Self> {
        let tokens = &line.tokens;
        let first = tokens.first()?;
        let TokenKind::Keyword(keyword) = first.kind else {
            return None;
        };
        let kind = ClassKind::from_keyword(keyword)?;
        let name_token = tokens.get(1)?;
        let name = name_token.ident()?.to_string();

        let mut index = 2;
        let mut generics = Vec::new();
        if tokens.get(index).is_some_and(|t| t.is(TokenKind::Less)) {
            index += 1;
            while let Some(token) = tokens.get(index) {
                index += 1;
                match token.kind {
                    TokenKind::Greater => break,
                    TokenKind::Ident => generics.push(token.text.clone()),
                    _ => {}
                }
            }
        }

        let base = match (tokens.get(index), tokens.get(index + 1)) {
            (Some(kw), Some(base)) if kw.is_keyword(Keyword::Extends) => {
                base.ident().map(str::to_string)
            }
            _ => None,
        };

        Some(Self {
            kind,
            keyword_column: first.start,
            name,
            name_column: name_token.start,
            generics,
            base,
        })
    }

    pub fn signature(&self) -> String {
        let mut out = format!("{} {}", self.kind.as_str(), self.name);
        if !self.generics.is_empty() {
            out.push('<');
            out.push_str(&self.generics.join(", "));
            out.push('>');
        }
        if let Some(base) = &self.base {
            out.push_str(" extends ");
            out.push_str(base);
        }
        out
    }
}

/// Parsed variable declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    /// Every declarator keyword on the line, with its column
    pub declarators: Vec<(Mutability, usize)>,
    pub name: String,
    pub name_column: usize,
    pub annotation: Option<String>,
    pub initializer: Option<String>,
}

impl VarDecl {
    pub fn parse(line: &LexedLine) -> Option<Self> {
        let tokens = &line.tokens;
        let mut declarators = Vec::new();
        let mut index = 0;
        while let Some(token) = tokens.get(index) {
            let TokenKind::Keyword(keyword) = token.kind else {
                break;
            };
            let Some(mutability) = Mutability::from_keyword(keyword) else {
                break;
            };
            declarators.push((mutability, token.start));
            index += 1;
        }
        if declarators.is_empty() {
            return None;
        }

        let name_token = tokens.get(index)?;
        let name = name_token.ident()?.to_string();
        let rest = &tokens[index + 1..];

        let parts = split_top_level(rest, TokenKind::Assign);
        let (head, initializer) = match parts.as_slice() {
            [head, init, ..] => (*head, Some(span_text(init))),
            [head] => (*head, None),
            [] => (rest, None),
        };
        let annotation = match head.split_first() {
            Some((colon, ty)) if colon.is(TokenKind::Colon) && !ty.is_empty() => {
                Some(span_text(ty))
            }
            _ => None,
        };

        Some(Self {
            declarators,
            name,
            name_column: name_token.start,
            annotation,
            initializer: initializer.filter(|i| !i.is_empty()),
        })
    }

    /// The effective mutability (first declarator)
    pub fn mutability(&self) -> Mutability {
        self.declarators[0].0
    }

    pub fn is_stacked(&self) -> bool {
        self.declarators.len() > 1
    }
}

/// Plain or compound assignment to a bare name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub target: String,
    pub target_column: usize,
    pub compound: bool,
    pub value: String,
}

impl Assignment {
    pub fn parse(line: &LexedLine) -> Option<Self> {
        let tokens = &line.tokens;
        let target = tokens.first()?;
        let op = tokens.get(1)?;
        let compound = match op.kind {
            TokenKind::Assign => false,
            TokenKind::CompoundAssign => true,
            _ => return None,
        };
        Some(Self {
            target: target.ident()?.to_string(),
            target_column: target.start,
            compound,
            value: span_text(&tokens[2..]),
        })
    }
}

/// Parsed `for a[, b] in expr:` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForHeader {
    pub bindings: Vec<(String, usize)>,
    pub iterable: String,
}

impl ForHeader {
    pub fn parse(line: &LexedLine) -> Option<Self> {
        let tokens = &line.tokens;
        if !tokens.first()?.is_keyword(Keyword::For) {
            return None;
        }
        let in_pos = tokens.iter().position(|t| t.is_keyword(Keyword::In))?;
        let bindings = tokens[1..in_pos]
            .iter()
            .filter_map(|t| t.ident().map(|name| (name.to_string(), t.start)))
            .collect();
        let end = match tokens.last() {
            Some(t) if t.is(TokenKind::Colon) => tokens.len() - 1,
            _ => tokens.len(),
        };
        let iterable = if end > in_pos + 1 {
            span_text(&tokens[in_pos + 1..end])
        } else {
            String::new()
        };
        Some(Self { bindings, iterable })
    }
}

/// One name bound by an import line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Name visible in this document
    pub local: String,
    pub column: usize,
    /// Name in the imported module (None for a whole-module import)
    pub member: Option<String>,
}

/// Parsed `import a.b.c [as q]` or `from a.b import x, y as z`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub bindings: Vec<ImportBinding>,
}

impl Import {
    pub fn parse(line: &LexedLine) -> Option<Self> {
        let tokens = &line.tokens;
        let first = tokens.first()?;

        if first.is_keyword(Keyword::Import) {
            let (path, path_tokens, rest) = dotted_path(&tokens[1..])?;
            let last = path_tokens.last()?;
            let binding = match rest {
                [kw, alias, ..] if kw.is_keyword(Keyword::As) => ImportBinding {
                    local: alias.ident()?.to_string(),
                    column: alias.start,
                    member: None,
                },
                _ => ImportBinding {
                    local: last.text.clone(),
                    column: last.start,
                    member: None,
                },
            };
            return Some(Self {
                module: path,
                bindings: vec![binding],
            });
        }

        if first.is_keyword(Keyword::From) {
            let (path, _, rest) = dotted_path(&tokens[1..])?;
            let (import_kw, names) = rest.split_first()?;
            if !import_kw.is_keyword(Keyword::Import) {
                return None;
            }
            let bindings = split_top_level(names, TokenKind::Comma)
                .into_iter()
                .filter_map(|part| match part {
                    [name, kw, alias, ..] if kw.is_keyword(Keyword::As) => Some(ImportBinding {
                        local: alias.ident()?.to_string(),
                        column: alias.start,
                        member: Some(name.ident()?.to_string()),
                    }),
                    [name, ..] => Some(ImportBinding {
                        local: name.ident()?.to_string(),
                        column: name.start,
                        member: Some(name.text.clone()),
                    }),
                    [] => None,
                })
                .collect();
            return Some(Self {
                module: path,
                bindings,
            });
        }

        None
    }
}

/// Read `a.b.c` off the front of a token slice
fn dotted_path(tokens: &[Token]) -> Option<(String, &[Token], &[Token])> {
    let mut end = 0;
    let mut path = String::new();
    loop {
        let segment = tokens.get(end)?;
        path.push_str(segment.ident()?);
        end += 1;
        match tokens.get(end) {
            Some(dot) if dot.is(TokenKind::Dot) => {
                path.push('.');
                end += 1;
            }
            _ => break,
        }
    }
    Some((path, &tokens[..end], &tokens[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_line;

    fn shape(text: &str) -> LineShape {
        classify(&lex_line(text))
    }

    #[test]
    fn test_classify_openers() {
        assert_eq!(
            shape("func add(a: Int, b: Int) -> Int:"),
            LineShape::Opener {
                kind: BlockKind::Function,
                name: Some("add".into())
            }
        );
        assert_eq!(shape("  for x in items:").block_kind(), Some(BlockKind::Loop));
        assert_eq!(shape("while true:").block_kind(), Some(BlockKind::Loop));
        assert_eq!(shape("if a > b:").block_kind(), Some(BlockKind::Conditional));
        assert_eq!(shape("try:").block_kind(), Some(BlockKind::Handler));
        assert_eq!(
            shape("record Point:").block_kind(),
            Some(BlockKind::ClassLike(ClassKind::Record))
        );
        assert_eq!(shape("init(x: Int):").block_kind(), Some(BlockKind::Constructor));
    }

    #[test]
    fn test_classify_other_shapes() {
        assert_eq!(shape("end"), LineShape::Terminator);
        assert_eq!(shape("  end // done"), LineShape::Terminator);
        assert_eq!(shape("// only a comment"), LineShape::Blank);
        assert_eq!(shape(""), LineShape::Blank);
        assert_eq!(
            shape("else:"),
            LineShape::Continuation {
                keyword: Keyword::Else
            }
        );
        assert_eq!(shape("func area() -> Float"), LineShape::Statement);
        assert_eq!(shape("return x"), LineShape::Statement);
        assert_eq!(shape("end = 3"), LineShape::Statement);
    }

    #[test]
    fn test_function_header() {
        let header =
            FunctionHeader::parse(&lex_line("func get(key: String, fallback = 0) -> Int | Null:"))
                .unwrap();
        assert_eq!(header.name, "get");
        assert_eq!(header.name_column, 5);
        assert_eq!(header.params.len(), 2);
        assert_eq!(header.params[0].annotation.as_deref(), Some("String"));
        assert_eq!(header.params[1].annotation, None);
        assert_eq!(header.params[1].default.as_deref(), Some("0"));
        assert_eq!(header.return_annotation.as_deref(), Some("Int | Null"));
        assert_eq!(
            header.signature(),
            "func get(key: String, fallback = 0) -> Int | Null"
        );
    }

    #[test]
    fn test_generic_param_annotation() {
        let header = FunctionHeader::parse(&lex_line("func f(m: Map<String, Int>):")).unwrap();
        assert_eq!(header.params.len(), 1);
        assert_eq!(header.params[0].annotation.as_deref(), Some("Map<String, Int>"));
    }

    #[test]
    fn test_constructor_header() {
        let header = FunctionHeader::parse(&lex_line("init(name):")).unwrap();
        assert!(header.is_constructor);
        assert_eq!(header.signature(), "init(name)");
    }

    #[test]
    fn test_class_header() {
        let header = ClassHeader::parse(&lex_line("class Box<T> extends Base:")).unwrap();
        assert_eq!(header.name, "Box");
        assert_eq!(header.generics, vec!["T".to_string()]);
        assert_eq!(header.base.as_deref(), Some("Base"));
        assert_eq!(header.signature(), "class Box<T> extends Base");
    }

    #[test]
    fn test_var_decl() {
        let decl = VarDecl::parse(&lex_line("const limit: Int = max(1, 2)")).unwrap();
        assert_eq!(decl.mutability(), Mutability::Const);
        assert_eq!(decl.name, "limit");
        assert_eq!(decl.annotation.as_deref(), Some("Int"));
        assert_eq!(decl.initializer.as_deref(), Some("max(1, 2)"));
        assert!(!decl.is_stacked());

        let stacked = VarDecl::parse(&lex_line("var const x = 1")).unwrap();
        assert!(stacked.is_stacked());
    }

    #[test]
    fn test_assignment() {
        let assign = Assignment::parse(&lex_line("  total += 2")).unwrap();
        assert_eq!(assign.target, "total");
        assert!(assign.compound);
        assert!(Assignment::parse(&lex_line("a == b")).is_none());
        assert!(Assignment::parse(&lex_line("this.x = 1")).is_none());
    }

    #[test]
    fn test_imports() {
        let import = Import::parse(&lex_line("import net.http as web")).unwrap();
        assert_eq!(import.module, "net.http");
        assert_eq!(import.bindings[0].local, "web");

        let plain = Import::parse(&lex_line("import net.http")).unwrap();
        assert_eq!(plain.bindings[0].local, "http");

        let from = Import::parse(&lex_line("from util.text import pad, trim as strip")).unwrap();
        assert_eq!(from.module, "util.text");
        let locals: Vec<_> = from.bindings.iter().map(|b| b.local.as_str()).collect();
        assert_eq!(locals, vec!["pad", "strip"]);
        assert_eq!(from.bindings[1].member.as_deref(), Some("trim"));
    }

    #[test]
    fn test_for_header() {
        let header = ForHeader::parse(&lex_line("for k, v in table:")).unwrap();
        assert_eq!(header.bindings.len(), 2);
        assert_eq!(header.iterable, "table");
    }
}
