//! Context legality: `this`, `return`, `break` and `continue`

use super::{token_range, RuleContext};
use crate::diagnostic::{error_codes, Diagnostic};
use crate::scope::ScopeKind;
use crate::token::Keyword;

/// TL4001: `this` needs an enclosing function or method
pub fn this_outside_class(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let Some(token) = lexed.tokens.iter().find(|t| t.is_keyword(Keyword::This)) else {
            continue;
        };
        if ctx.scopes.contains(line, ScopeKind::Function)
            || ctx.scopes.contains(line, ScopeKind::ClassLike)
        {
            continue;
        }
        diagnostics.push(Diagnostic::error(
            error_codes::THIS_OUTSIDE_CLASS,
            "'this' can only be used inside a function or class method",
            token_range(line, token),
        ));
    }
    diagnostics
}

/// TL4002: `return` needs an enclosing function
pub fn return_outside_function(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let Some(token) = lexed.first().filter(|t| t.is_keyword(Keyword::Return)) else {
            continue;
        };
        if !ctx.scopes.contains(line, ScopeKind::Function) {
            diagnostics.push(Diagnostic::error(
                error_codes::RETURN_OUTSIDE_FUNCTION,
                "'return' outside of a function",
                token_range(line, token),
            ));
        }
    }
    diagnostics
}

/// TL4003: `break` / `continue` need an enclosing loop in the same function
pub fn jump_outside_loop(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let Some(token) = lexed
            .first()
            .filter(|t| t.is_keyword(Keyword::Break) || t.is_keyword(Keyword::Continue))
        else {
            continue;
        };
        if !ctx.scopes.contains(line, ScopeKind::Loop) {
            diagnostics.push(Diagnostic::error(
                error_codes::JUMP_OUTSIDE_LOOP,
                format!("'{}' outside of a loop", token.text),
                token_range(line, token),
            ));
        }
    }
    diagnostics
}
