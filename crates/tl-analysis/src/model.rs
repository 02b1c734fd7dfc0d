//! Per-run source model
//!
//! Everything derived from a document in one pass: tokens, line shapes, the
//! scope tree and the symbol table. Built once per analysis or query and
//! dropped afterwards.

use crate::document::Document;
use crate::lexer::{lex_document, LexedLine};
use crate::scope::{BackwardScan, ScopeResolver, ScopeStrategy, ScopeTree};
use crate::symbol::SymbolTable;
use crate::syntax::{classify, LineShape};

pub struct SourceModel<'d> {
    pub document: &'d Document,
    pub lexed: Vec<LexedLine>,
    pub shapes: Vec<LineShape>,
    pub tree: ScopeTree,
    pub symbols: SymbolTable,
}

impl<'d> SourceModel<'d> {
    pub fn build(document: &'d Document) -> Self {
        let lexed = lex_document(document);
        let shapes: Vec<LineShape> = lexed.iter().map(classify).collect();
        let tree = ScopeTree::build(&shapes);
        let symbols = SymbolTable::collect(&lexed, &tree);
        Self {
            document,
            lexed,
            shapes,
            tree,
            symbols,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lexed.len()
    }

    pub fn lexed(&self, line: usize) -> Option<&LexedLine> {
        self.lexed.get(line)
    }

    /// Containment oracle for the configured strategy
    pub fn resolver(&self, strategy: ScopeStrategy) -> Box<dyn ScopeResolver + '_> {
        match strategy {
            ScopeStrategy::Tree => Box::new(&self.tree),
            ScopeStrategy::BackwardScan => Box::new(BackwardScan::new(&self.shapes)),
        }
    }

    /// Contiguous `//` lines directly above a line, joined with newlines
    pub fn doc_comment(&self, line: usize) -> Option<String> {
        let mut lines = Vec::new();
        for index in (0..line).rev() {
            let lexed = &self.lexed[index];
            match &lexed.comment {
                Some(comment) if lexed.is_comment_only() => {
                    lines.push(comment.text.trim_start_matches('/').trim().to_string());
                }
                _ => break,
            }
        }
        if lines.is_empty() {
            return None;
        }
        lines.reverse();
        Some(lines.join("\n"))
    }
}
