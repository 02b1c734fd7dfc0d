//! Analysis entry point
//!
//! [`Analyzer`] owns the immutable inputs of every run (the catalog and the
//! options) and rebuilds the per-document model on each call. Nothing is
//! cached between calls, so one analyzer can serve many documents.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::completion::{self, CompletionItem};
use crate::diagnostic::{sort_diagnostics, Diagnostic};
use crate::document::{Document, Position};
use crate::infer::TypeInference;
use crate::model::SourceModel;
use crate::outline::{self, DocumentSymbol};
use crate::query::{Location, Query, QueryResult};
use crate::resolver::ModuleResolver;
use crate::rules::{Rule, RuleContext, RULES};
use crate::scope::ScopeStrategy;
use crate::types::Type;

/// Diagnostics returned per document unless configured otherwise
pub const DEFAULT_MAX_DIAGNOSTICS: usize = 500;

/// Per-run switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Rule codes (`TL5001`) or names (`untyped-parameter`) to skip
    pub disabled_rules: BTreeSet<String>,
    pub scope_strategy: ScopeStrategy,
    pub max_diagnostics: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            disabled_rules: BTreeSet::new(),
            scope_strategy: ScopeStrategy::default(),
            max_diagnostics: DEFAULT_MAX_DIAGNOSTICS,
        }
    }
}

impl AnalysisOptions {
    pub fn disable(mut self, rule: impl Into<String>) -> Self {
        self.disabled_rules.insert(rule.into());
        self
    }

    pub fn is_enabled(&self, rule: &Rule) -> bool {
        !self.disabled_rules.contains(rule.code) && !self.disabled_rules.contains(rule.name)
    }
}

/// TL static analyzer
///
/// # Examples
///
/// ```
/// use tl_analysis::Analyzer;
///
/// let analyzer = Analyzer::new();
/// let diagnostics = analyzer.analyze("const x = 1\nx = 2");
/// assert_eq!(diagnostics[0].code, "TL3003");
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    catalog: Arc<Catalog>,
    options: AnalysisOptions,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Analyzer over the built-in catalog with default options
    pub fn new() -> Self {
        Self::with_catalog(Catalog::builtin())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Diagnostics for a whole document, ordered by position then code
    pub fn analyze(&self, text: &str) -> Vec<Diagnostic> {
        self.analyze_document(&Document::new(text))
    }

    pub fn analyze_document(&self, document: &Document) -> Vec<Diagnostic> {
        let started = Instant::now();
        let model = SourceModel::build(document);
        let inference = TypeInference::new(&model, &self.catalog);
        let scopes = model.resolver(self.options.scope_strategy);
        let ctx = RuleContext {
            model: &model,
            inference: &inference,
            scopes: scopes.as_ref(),
            catalog: &self.catalog,
        };

        let mut diagnostics: Vec<Diagnostic> = RULES
            .iter()
            .filter(|rule| self.options.is_enabled(rule))
            .flat_map(|rule| (rule.check)(&ctx))
            .collect();
        sort_diagnostics(&mut diagnostics);
        diagnostics.dedup();
        diagnostics.truncate(self.options.max_diagnostics);

        debug!(
            uri = document.uri().unwrap_or("<memory>"),
            lines = model.line_count(),
            diagnostics = diagnostics.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "analysis complete"
        );
        diagnostics
    }

    /// Signature and documentation of `word` as it appears at `position`
    pub fn query(
        &self,
        document: &Document,
        position: Position,
        word: &str,
        resolver: &dyn ModuleResolver,
    ) -> Option<QueryResult> {
        let model = SourceModel::build(document);
        let inference = TypeInference::new(&model, &self.catalog);
        let result = Query::new(&inference, resolver).run(position, word);
        debug!(word, line = position.line, found = result.is_some(), "query");
        result
    }

    /// [`Analyzer::query`] for the word under the cursor
    pub fn hover(
        &self,
        document: &Document,
        position: Position,
        resolver: &dyn ModuleResolver,
    ) -> Option<QueryResult> {
        let (word, _) = document.word_at(position)?;
        self.query(document, position, &word, resolver)
    }

    pub fn definition(
        &self,
        document: &Document,
        position: Position,
        word: &str,
        resolver: &dyn ModuleResolver,
    ) -> Option<Location> {
        self.query(document, position, word, resolver)?.location
    }

    pub fn completions(
        &self,
        document: &Document,
        position: Position,
        resolver: &dyn ModuleResolver,
    ) -> Vec<CompletionItem> {
        let model = SourceModel::build(document);
        let inference = TypeInference::new(&model, &self.catalog);
        completion::completions(&inference, resolver, position)
    }

    pub fn document_symbols(&self, document: &Document) -> Vec<DocumentSymbol> {
        let model = SourceModel::build(document);
        let inference = TypeInference::new(&model, &self.catalog);
        outline::document_symbols(&inference)
    }

    /// Type of an expression evaluated on `line` of a document
    pub fn infer_type(&self, document: &Document, expr: &str, line: usize) -> Type {
        let model = SourceModel::build(document);
        let inference = TypeInference::new(&model, &self.catalog);
        inference.infer_type(expr, line)
    }
}
