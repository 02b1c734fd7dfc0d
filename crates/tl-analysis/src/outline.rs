//! Document outline

use serde::{Deserialize, Serialize};

use crate::document::Range;
use crate::infer::TypeInference;
use crate::query::declaration_signature;
use crate::symbol::{DeclKind, Declaration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Enum,
    Record,
    Interface,
    Function,
    Method,
    Field,
    Variable,
    Constant,
}

/// One outline entry; class-likes nest their members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub detail: String,
    /// Declaration line
    pub line: usize,
    /// Line of the closing `end`; equals `line` for variables and for
    /// blocks left open
    pub end_line: usize,
    /// The declared name
    pub selection_range: Range,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<DocumentSymbol>,
}

/// Class-likes with their fields and methods, top-level functions and
/// top-level variables, in source order
pub(crate) fn document_symbols(inference: &TypeInference<'_, '_>) -> Vec<DocumentSymbol> {
    let symbols = &inference.model().symbols;
    symbols
        .all()
        .iter()
        .filter(|decl| decl.frame.is_none())
        .map(|decl| {
            let mut symbol = entry(inference, decl, false);
            if let (true, Some(frame)) = (decl.kind.is_type(), decl.body) {
                symbol.children = symbols
                    .members_of(frame)
                    .map(|member| entry(inference, member, true))
                    .collect();
            }
            symbol
        })
        .collect()
}

fn entry(inference: &TypeInference<'_, '_>, decl: &Declaration, member: bool) -> DocumentSymbol {
    let tree = &inference.model().tree;
    let kind = match decl.kind {
        DeclKind::Class => SymbolKind::Class,
        DeclKind::Enum => SymbolKind::Enum,
        DeclKind::Record => SymbolKind::Record,
        DeclKind::Interface => SymbolKind::Interface,
        DeclKind::Function if member => SymbolKind::Method,
        DeclKind::Function => SymbolKind::Function,
        DeclKind::Variable if member => SymbolKind::Field,
        DeclKind::Variable if decl.mutability.is_some_and(|m| m.is_immutable()) => SymbolKind::Constant,
        DeclKind::Variable => SymbolKind::Variable,
    };
    let end_line = decl
        .body
        .and_then(|frame| tree.frame(frame).end_line)
        .unwrap_or(decl.line);
    DocumentSymbol {
        name: decl.name.clone(),
        kind,
        detail: declaration_signature(inference, decl),
        line: decl.line,
        end_line,
        selection_range: Range::new(decl.line, decl.column, decl.column + decl.name.chars().count()),
        children: Vec::new(),
    }
}
