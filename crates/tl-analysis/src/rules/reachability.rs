//! Code after an unconditional jump

use super::{line_range, RuleContext};
use crate::diagnostic::{error_codes, Diagnostic};
use crate::syntax::LineShape;

/// TL6001: statements after `return`, `break`, `continue` or `throw` in the
/// same block, up to the block's `end` or next continuation. Nested blocks
/// are reported once, at their header.
pub fn unreachable_code(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let tree = &ctx.model.tree;
    let mut diagnostics = Vec::new();
    let mut reported = vec![false; ctx.line_count()];

    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let Some(jump) = lexed.first().and_then(|t| match t.kind {
            crate::token::TokenKind::Keyword(k) if k.is_jump() => Some(k),
            _ => None,
        }) else {
            continue;
        };
        if reported[line] {
            continue;
        }

        // `None` is file scope, which runs to the last line
        let frame = tree.innermost(line);
        let end = frame
            .and_then(|f| tree.frame(f).end_line)
            .unwrap_or(ctx.line_count());
        for next in line + 1..end {
            if tree.innermost(next) != frame || reported[next] {
                continue;
            }
            if !matches!(
                ctx.model.shapes[next],
                LineShape::Statement | LineShape::Opener { .. }
            ) {
                continue;
            }
            reported[next] = true;
            diagnostics.push(
                Diagnostic::warning(
                    error_codes::UNREACHABLE_CODE,
                    format!("Unreachable code after '{}'", jump.as_str()),
                    line_range(ctx, next),
                )
                .with_help("remove it or move it before the jump"),
            );
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{lines, run};

    #[test]
    fn test_after_return() {
        let src = "\
func f():
    return 1
    print(2)
    if x:
        print(3)
    end

    var y = 4
end
print(5)";
        let diags = run(unreachable_code, src);
        assert_eq!(lines(&diags), vec![2, 3, 7]);
        assert_eq!(diags[0].message, "Unreachable code after 'return'");
    }

    #[test]
    fn test_branch_ends_block() {
        let src = "\
func f(x: Int):
    if x > 0:
        return 1
    else:
        throw Error()
    end
    return 0
end";
        assert!(run(unreachable_code, src).is_empty());
    }

    #[test]
    fn test_loop_jumps() {
        let src = "while true:\n    break\n    x = 1\nend\nfor i in xs:\n    continue\nend";
        let diags = run(unreachable_code, src);
        assert_eq!(lines(&diags), vec![2]);
        assert_eq!(diags[0].message, "Unreachable code after 'break'");
    }

    #[test]
    fn test_throw_at_file_scope() {
        let src = "throw Error()\nprint(1)\nif ready:\n    go()\nend";
        let diags = run(unreachable_code, src);
        assert_eq!(lines(&diags), vec![1, 2]);
        assert_eq!(diags[0].message, "Unreachable code after 'throw'");
    }

    #[test]
    fn test_jump_inside_comment_or_string_ignored() {
        let src = "func f():\n    // return\n    print(\"return\")\n    return 1\nend";
        assert!(run(unreachable_code, src).is_empty());
    }
}
