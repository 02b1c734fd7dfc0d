//! TL Analysis - static analysis for the TL scripting language
//!
//! Works line by line from raw, possibly half-typed source text:
//! - Tokenization, line shapes and the block scope tree
//! - Declaration collection and type inference
//! - The diagnostic rule set
//! - Hover, definition, completion and outline queries

/// TL analysis version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analyzer;
pub mod catalog;
pub mod completion;
pub mod diagnostic;
pub mod document;
pub mod infer;
pub mod lexer;
pub mod model;
pub mod outline;
pub mod query;
pub mod resolver;
pub mod rules;
pub mod scope;
pub mod symbol;
pub mod syntax;
pub mod token;
pub mod types;

pub use analyzer::{AnalysisOptions, Analyzer, DEFAULT_MAX_DIAGNOSTICS};
pub use catalog::{Catalog, CatalogError};
pub use completion::{CompletionItem, CompletionKind};
pub use diagnostic::{error_codes, sort_diagnostics, Diagnostic, Severity};
pub use document::{Document, Position, Range};
pub use outline::{DocumentSymbol, SymbolKind};
pub use query::{Location, QueryResult};
pub use resolver::{MemoryResolver, ModuleResolver, NoopResolver, ResolvedModule};
pub use scope::{ScopeKind, ScopeStrategy};
pub use types::Type;
