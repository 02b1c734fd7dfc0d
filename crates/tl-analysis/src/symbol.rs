//! Declaration collector and symbol table
//!
//! One forward pass over the lexed lines records every class-like, function
//! and variable declaration together with the scope frame it lives in. The
//! first declaration of a name wins in `by_name`; duplicates are kept in
//! `all` so the rule set can flag them per frame.

use std::collections::HashMap;

use crate::lexer::LexedLine;
use crate::scope::{FrameId, ScopeTree};
use crate::syntax::{ClassHeader, ClassKind, ForHeader, FunctionHeader, Mutability, VarDecl};
use crate::token::{Keyword, TokenKind};

/// Kind of declared symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Enum,
    Record,
    Interface,
    Function,
    Variable,
}

impl DeclKind {
    pub fn from_class(kind: ClassKind) -> Self {
        match kind {
            ClassKind::Class => DeclKind::Class,
            ClassKind::Enum => DeclKind::Enum,
            ClassKind::Record => DeclKind::Record,
            ClassKind::Interface => DeclKind::Interface,
        }
    }

    pub fn is_type(self) -> bool {
        !matches!(self, DeclKind::Function | DeclKind::Variable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Class => "class",
            DeclKind::Enum => "enum",
            DeclKind::Record => "record",
            DeclKind::Interface => "interface",
            DeclKind::Function => "function",
            DeclKind::Variable => "variable",
        }
    }
}

/// How a variable got bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// `var`/`let`/`const`/`final` statement (also class-like headers and functions)
    Declared,
    /// `for x in <iterable>:`
    Loop { iterable: String },
    /// `catch e:`
    Catch,
}

/// A declaration site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// Variables declared by statement only
    pub mutability: Option<Mutability>,
    /// Variable type annotation, or function return annotation
    pub annotation: Option<String>,
    pub initializer: Option<String>,
    pub binding: Binding,
    pub line: usize,
    pub column: usize,
    /// Frame the name is declared in (`None` for file scope)
    pub frame: Option<FrameId>,
    /// Frame a function or class-like declaration opens
    pub body: Option<FrameId>,
}

impl Declaration {
    pub fn is_variable(&self) -> bool {
        self.kind == DeclKind::Variable
    }

    /// Functions and types are visible throughout their frame; variables
    /// only from their declaration line on.
    pub fn is_hoisted(&self) -> bool {
        !self.is_variable()
    }
}

/// Output of the declaration collector
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    all: Vec<Declaration>,
    by_name: HashMap<String, usize>,
    constants: HashMap<String, usize>,
    finals: HashMap<String, usize>,
    stacked: Vec<usize>,
}

impl SymbolTable {
    pub fn collect(lexed: &[LexedLine], tree: &ScopeTree) -> Self {
        let mut table = SymbolTable::default();

        for (line, lexed_line) in lexed.iter().enumerate() {
            let Some(first) = lexed_line.first() else {
                continue;
            };
            let TokenKind::Keyword(keyword) = first.kind else {
                continue;
            };
            let frame = tree.innermost(line);

            match keyword {
                Keyword::Var | Keyword::Let | Keyword::Const | Keyword::Final => {
                    let Some(decl) = VarDecl::parse(lexed_line) else {
                        continue;
                    };
                    if decl.is_stacked() {
                        table.stacked.push(line);
                        continue;
                    }
                    table.add(Declaration {
                        mutability: Some(decl.mutability()),
                        annotation: decl.annotation,
                        initializer: decl.initializer,
                        binding: Binding::Declared,
                        line,
                        column: decl.name_column,
                        frame,
                        body: None,
                        kind: DeclKind::Variable,
                        name: decl.name,
                    });
                }
                Keyword::Func => {
                    let Some(header) = FunctionHeader::parse(lexed_line) else {
                        continue;
                    };
                    table.add(Declaration {
                        name: header.name,
                        kind: DeclKind::Function,
                        mutability: None,
                        annotation: header.return_annotation,
                        initializer: None,
                        binding: Binding::Declared,
                        line,
                        column: header.name_column,
                        frame,
                        body: tree.frame_opened_at(line),
                    });
                }
                Keyword::Class | Keyword::Enum | Keyword::Record | Keyword::Interface => {
                    let Some(header) = ClassHeader::parse(lexed_line) else {
                        continue;
                    };
                    table.add(Declaration {
                        name: header.name,
                        kind: DeclKind::from_class(header.kind),
                        mutability: None,
                        annotation: None,
                        initializer: None,
                        binding: Binding::Declared,
                        line,
                        column: header.name_column,
                        frame,
                        body: tree.frame_opened_at(line),
                    });
                }
                Keyword::For => {
                    let Some(header) = ForHeader::parse(lexed_line) else {
                        continue;
                    };
                    let loop_frame = tree.frame_opened_at(line);
                    for (name, column) in header.bindings {
                        table.add(Declaration {
                            name,
                            kind: DeclKind::Variable,
                            mutability: None,
                            annotation: None,
                            initializer: None,
                            binding: Binding::Loop {
                                iterable: header.iterable.clone(),
                            },
                            line,
                            column,
                            frame: loop_frame,
                            body: None,
                        });
                    }
                }
                Keyword::Catch => {
                    let Some(name) = lexed_line.tokens.get(1).filter(|t| t.is_ident()) else {
                        continue;
                    };
                    table.add(Declaration {
                        name: name.text.clone(),
                        kind: DeclKind::Variable,
                        mutability: None,
                        annotation: None,
                        initializer: None,
                        binding: Binding::Catch,
                        line,
                        column: name.start,
                        frame: tree.frame_opened_at(line),
                        body: None,
                    });
                }
                _ => {}
            }
        }

        table
    }

    fn add(&mut self, decl: Declaration) {
        let index = self.all.len();
        self.by_name.entry(decl.name.clone()).or_insert(index);
        match decl.mutability {
            Some(Mutability::Const) => {
                self.constants.entry(decl.name.clone()).or_insert(decl.line);
            }
            Some(Mutability::Final) => {
                self.finals.entry(decl.name.clone()).or_insert(decl.line);
            }
            _ => {}
        }
        self.all.push(decl);
    }

    /// Every declaration site in source order
    pub fn all(&self) -> &[Declaration] {
        &self.all
    }

    /// First declaration of a name anywhere in the document
    pub fn lookup(&self, name: &str) -> Option<&Declaration> {
        self.by_name.get(name).map(|i| &self.all[*i])
    }

    /// Line of the first `const` declaration of a name
    pub fn constant_line(&self, name: &str) -> Option<usize> {
        self.constants.get(name).copied()
    }

    /// Line of the first `final` declaration of a name
    pub fn final_line(&self, name: &str) -> Option<usize> {
        self.finals.get(name).copied()
    }

    /// Lines declaring two or more mutability keywords
    pub fn stacked_lines(&self) -> &[usize] {
        &self.stacked
    }

    /// First declaration of `name` made directly in `frame` and visible at `line`
    pub fn find_in(&self, frame: Option<FrameId>, name: &str, line: usize) -> Option<&Declaration> {
        self.all
            .iter()
            .find(|d| d.frame == frame && d.name == name && (d.is_hoisted() || d.line <= line))
    }

    /// Resolve a name at a line through the enclosing frames, innermost first
    pub fn resolve(&self, name: &str, line: usize, tree: &ScopeTree) -> Option<&Declaration> {
        let start = tree.innermost(line);
        tree.ancestors(start)
            .map(Some)
            .chain(std::iter::once(None))
            .find_map(|frame| self.find_in(frame, name, line))
    }

    /// Declarations visible at a line, innermost frames first, one per name
    pub fn visible_at(&self, line: usize, tree: &ScopeTree) -> Vec<&Declaration> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        let frames = tree
            .ancestors(tree.innermost(line))
            .map(Some)
            .chain(std::iter::once(None));
        for frame in frames {
            for decl in &self.all {
                if decl.frame == frame
                    && (decl.is_hoisted() || decl.line <= line)
                    && seen.insert(decl.name.as_str())
                {
                    out.push(decl);
                }
            }
        }
        out
    }

    /// Fields and methods declared directly in a class-like body
    pub fn members_of(&self, class_frame: FrameId) -> impl Iterator<Item = &Declaration> {
        self.all
            .iter()
            .filter(move |d| d.frame == Some(class_frame))
    }

    /// The class-like declaration with this name
    pub fn class_named(&self, name: &str) -> Option<&Declaration> {
        self.all.iter().find(|d| d.kind.is_type() && d.name == name)
    }
}
