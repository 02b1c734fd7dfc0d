//! Typing and import hints

use std::collections::HashSet;

use super::RuleContext;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::document::Range;
use crate::lexer::lex_line;
use crate::syntax::{FunctionHeader, Import};

/// TL5001: every function and constructor parameter carries a type
pub fn untyped_parameter(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let Some(header) = FunctionHeader::parse(lexed) else {
            continue;
        };
        for param in header.params.iter().filter(|p| p.annotation.is_none()) {
            diagnostics.push(
                Diagnostic::warning(
                    error_codes::UNTYPED_PARAMETER,
                    format!("Parameter '{}' has no type annotation", param.name),
                    Range::new(line, param.column, param.column + param.name.chars().count()),
                )
                .with_help(format!("annotate it: '{}: Type'", param.name)),
            );
        }
    }
    diagnostics
}

/// TL5002: an imported name that never appears again
pub fn unused_import(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let Some(import) = Import::parse(lexed) else {
            continue;
        };
        let used = identifiers_after(ctx, line);
        for binding in &import.bindings {
            if used.contains(binding.local.as_str()) {
                continue;
            }
            diagnostics.push(
                Diagnostic::hint(
                    error_codes::UNUSED_IMPORT,
                    format!("'{}' is imported but never used", binding.local),
                    Range::new(
                        line,
                        binding.column,
                        binding.column + binding.local.chars().count(),
                    ),
                )
                .with_help("remove the import"),
            );
        }
    }
    diagnostics
}

/// Identifier text used in code or interpolations after a line
fn identifiers_after(ctx: &RuleContext<'_>, line: usize) -> HashSet<String> {
    let mut used = HashSet::new();
    for lexed in ctx.model.lexed.iter().skip(line + 1) {
        used.extend(lexed.tokens.iter().filter_map(|t| t.ident()).map(str::to_string));
        for literal in &lexed.strings {
            for (_, expr) in &literal.interpolations {
                used.extend(
                    lex_line(expr)
                        .tokens
                        .iter()
                        .filter_map(|t| t.ident())
                        .map(str::to_string),
                );
            }
        }
    }
    used
}
