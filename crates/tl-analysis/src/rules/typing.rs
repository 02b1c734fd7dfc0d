//! Type-driven checks

use super::{token_range, RuleContext};
use crate::diagnostic::{error_codes, Diagnostic};
use crate::document::Range;
use crate::infer::Value;
use crate::syntax::{Assignment, VarDecl};
use crate::token::{Keyword, Token, TokenKind};
use crate::types::Type;

/// TL7001: a value whose inferred type cannot be stored in the target
pub fn assignment_type_mismatch(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let (name, column, target, value) = if let Some(decl) = VarDecl::parse(lexed) {
            let (Some(annotation), Some(init)) = (&decl.annotation, &decl.initializer) else {
                continue;
            };
            (decl.name.clone(), decl.name_column, Type::parse(annotation), init.clone())
        } else if let Some(assignment) = Assignment::parse(lexed) {
            if assignment.compound {
                continue;
            }
            let Some(target) = target_type(ctx, &assignment.target, line) else {
                continue;
            };
            (assignment.target, assignment.target_column, target, assignment.value)
        } else {
            continue;
        };

        if target.is_any() {
            continue;
        }
        let source = ctx.inference.infer_type(&value, line);
        if source.is_any() || source.is_assignable_to(&target) {
            continue;
        }

        diagnostics.push(Diagnostic::warning(
            error_codes::ASSIGNMENT_TYPE_MISMATCH,
            format!("Cannot assign {} to '{}' of type {}", source, name, target),
            Range::new(line, column, column + name.chars().count()),
        ));
    }

    diagnostics
}

/// Declared or inferred type of the variable or parameter named on a line
fn target_type(ctx: &RuleContext<'_>, name: &str, line: usize) -> Option<Type> {
    match ctx.inference.value_of(name, line)? {
        Value::Decl(decl) if decl.is_variable() => {
            Some(ctx.inference.declaration_type(decl, 0))
        }
        Value::Decl(_) => None,
        Value::Param { param, line } => Some(ctx.inference.param_type(&param, line, 0)),
    }
}

/// TL7002: `a == b` where neither variable's type fits the other
pub fn comparison_type_mismatch(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let tokens = &lexed.tokens;
        if tokens.first().is_some_and(|t| {
            matches!(
                t.kind,
                TokenKind::Keyword(
                    Keyword::Func
                        | Keyword::Init
                        | Keyword::Class
                        | Keyword::Enum
                        | Keyword::Record
                        | Keyword::Interface
                )
            )
        }) {
            continue;
        }

        for (i, op) in tokens.iter().enumerate() {
            if !op.kind.is_comparison() || i == 0 {
                continue;
            }
            let (Some(left), Some(right)) = (bare_operand(tokens, i - 1), bare_operand(tokens, i + 1))
            else {
                continue;
            };
            let (Some(left_ty), Some(right_ty)) =
                (variable_type(ctx, left, line), variable_type(ctx, right, line))
            else {
                continue;
            };
            if left_ty.is_assignable_to(&right_ty) || right_ty.is_assignable_to(&left_ty) {
                continue;
            }
            diagnostics.push(Diagnostic::warning(
                error_codes::COMPARISON_TYPE_MISMATCH,
                format!(
                    "Comparing '{}' of type {} with '{}' of type {}",
                    left.text, left_ty, right.text, right_ty
                ),
                Range::new(line, left.start, right.end),
            ));
        }
    }

    diagnostics
}

/// An identifier at `index` that is not part of a member access, call or
/// index expression
fn bare_operand(tokens: &[Token], index: usize) -> Option<&Token> {
    let token = tokens.get(index)?;
    token.ident()?;
    let before = index.checked_sub(1).and_then(|i| tokens.get(i));
    if before.is_some_and(|t| t.is(TokenKind::Dot)) {
        return None;
    }
    let after = tokens.get(index + 1);
    if after.is_some_and(|t| {
        matches!(
            t.kind,
            TokenKind::Dot | TokenKind::LeftParen | TokenKind::LeftBracket
        )
    }) {
        return None;
    }
    Some(token)
}

fn variable_type(ctx: &RuleContext<'_>, token: &Token, line: usize) -> Option<Type> {
    target_type(ctx, &token.text, line).filter(|t| !t.is_any())
}

/// TL7003: `/ 0`, `% 0.0`, `/= 0`
pub fn division_by_zero(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        for pair in lexed.tokens.windows(2) {
            let [op, divisor] = pair else {
                continue;
            };
            let divides = match op.kind {
                TokenKind::Slash | TokenKind::Percent => true,
                TokenKind::CompoundAssign => op.text == "/=" || op.text == "%=",
                _ => false,
            };
            if !divides || !is_zero_literal(divisor) {
                continue;
            }
            let range = token_range(line, op);
            diagnostics.push(
                Diagnostic::error(
                    error_codes::DIVISION_BY_ZERO,
                    "Division by zero",
                    Range::new(line, range.start, divisor.end),
                )
                .with_help("check the divisor before dividing"),
            );
        }
    }

    diagnostics
}

fn is_zero_literal(token: &Token) -> bool {
    if !matches!(token.kind, TokenKind::Int | TokenKind::Float) {
        return false;
    }
    let digits: String = token.text.chars().filter(|c| *c != '_').collect();
    digits.parse::<f64>().is_ok_and(|v| v == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{lines, run};

    #[test]
    fn test_annotated_declaration() {
        let diags = run(
            assignment_type_mismatch,
            "var x: Int = \"a\"\nvar y: Float = 1\nvar z: Int | String = \"s\"",
        );
        assert_eq!(lines(&diags), vec![0]);
        assert_eq!(diags[0].message, "Cannot assign String to 'x' of type Int");
        assert_eq!(diags[0].range, Range::new(0, 4, 5));
    }

    #[test]
    fn test_reassignment_uses_inferred_type() {
        let src = "\
var count = 0
count = \"many\"
var data = load()
data = 1
func f(n: Int):
    n = [1]
end";
        let diags = run(assignment_type_mismatch, src);
        assert_eq!(lines(&diags), vec![1, 5]);
        assert_eq!(diags[1].message, "Cannot assign Array<Int> to 'n' of type Int");
    }

    #[test]
    fn test_compound_assignment_skipped() {
        assert!(run(assignment_type_mismatch, "var s = \"a\"\ns += 1").is_empty());
    }

    #[test]
    fn test_comparison() {
        let src = "\
var a = 1
var b = \"s\"
var c = 2.5
if a == b:
end
print(a < c)
print(b.len() == a)";
        let diags = run(comparison_type_mismatch, src);
        assert_eq!(lines(&diags), vec![3]);
        assert_eq!(
            diags[0].message,
            "Comparing 'a' of type Int with 'b' of type String"
        );
        assert_eq!(diags[0].range, Range::new(3, 3, 9));
    }

    #[test]
    fn test_comparison_of_unknowns_is_silent() {
        let src = "var a = f()\nvar b = 1\nif a != b:\nend";
        assert!(run(comparison_type_mismatch, src).is_empty());
    }

    #[test]
    fn test_division_by_zero() {
        let src = "x = 10 / 0\ny %= 0\nz = 1 / 0.0\nw = 1 / 0.5\nv = 10 / n";
        let diags = run(division_by_zero, src);
        assert_eq!(lines(&diags), vec![0, 1, 2]);
        assert_eq!(diags[0].range, Range::new(0, 7, 10));
    }

    #[test]
    fn test_division_in_string_ignored() {
        assert!(run(division_by_zero, "print(\"1 / 0\")").is_empty());
    }
}
