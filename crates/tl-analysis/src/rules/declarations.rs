//! Declaration misuse

use std::collections::HashMap;

use super::RuleContext;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::document::Range;
use crate::infer::Value;
use crate::syntax::{Assignment, VarDecl};

/// TL3001: `var const x = 1`
pub fn stacked_declarators(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.model
        .symbols
        .stacked_lines()
        .iter()
        .filter_map(|&line| {
            let decl = VarDecl::parse(&ctx.model.lexed[line])?;
            let (_, start) = decl.declarators.first()?;
            let end = ctx.model.lexed[line]
                .tokens
                .get(decl.declarators.len() - 1)
                .map(|t| t.end)?;
            let spelled = decl
                .declarators
                .iter()
                .map(|(m, _)| m.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Some(
                Diagnostic::error(
                    error_codes::STACKED_DECLARATORS,
                    format!("'{}' declares '{}' more than once", spelled, decl.name),
                    Range::new(line, *start, end),
                )
                .with_help("keep exactly one of 'var', 'let', 'const' or 'final'"),
            )
        })
        .collect()
}

/// TL3002: the same name declared twice directly in one scope frame
pub fn duplicate_declaration(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut first_seen: HashMap<(Option<usize>, &str), usize> = HashMap::new();
    let mut diagnostics = Vec::new();

    for decl in ctx.model.symbols.all() {
        let key = (decl.frame, decl.name.as_str());
        match first_seen.get(&key) {
            Some(&original) => diagnostics.push(Diagnostic::error(
                error_codes::DUPLICATE_DECLARATION,
                format!(
                    "'{}' is already declared in this scope on line {}",
                    decl.name,
                    original + 1
                ),
                Range::new(decl.line, decl.column, decl.column + decl.name.chars().count()),
            )),
            None => {
                first_seen.insert(key, decl.line);
            }
        }
    }

    diagnostics
}

/// TL3003: assignment to a name whose visible declaration is const or final
pub fn immutable_reassignment(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let symbols = &ctx.model.symbols;
    let mut diagnostics = Vec::new();

    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let Some(assignment) = Assignment::parse(lexed) else {
            continue;
        };
        let name = assignment.target.as_str();
        if symbols.constant_line(name).is_none() && symbols.final_line(name).is_none() {
            continue;
        }

        let Some(Value::Decl(decl)) = ctx.inference.value_of(name, line) else {
            continue;
        };
        let Some(mutability) = decl.mutability.filter(|m| m.is_immutable()) else {
            continue;
        };
        if decl.line >= line {
            continue;
        }

        diagnostics.push(
            Diagnostic::error(
                error_codes::IMMUTABLE_REASSIGNMENT,
                format!(
                    "Cannot reassign {} '{}' (declared on line {})",
                    mutability.as_str(),
                    name,
                    decl.line + 1
                ),
                Range::new(
                    line,
                    assignment.target_column,
                    assignment.target_column + name.chars().count(),
                ),
            )
            .with_help(format!("declare '{}' with 'var' if it needs to change", name)),
        );
    }

    diagnostics
}
