//! Strings, braces and block terminators

use super::{token_range, RuleContext};
use crate::diagnostic::{error_codes, Diagnostic};
use crate::document::Range;
use crate::syntax::LineShape;
use crate::token::TokenKind;

/// TL1001: a string literal still open at end of line
pub fn unterminated_string(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        for literal in lexed.strings.iter().filter(|s| !s.terminated) {
            diagnostics.push(
                Diagnostic::error(
                    error_codes::UNTERMINATED_STRING,
                    "Unterminated string literal",
                    Range::new(line, literal.start, literal.end.max(literal.start + 1)),
                )
                .with_help("close the string with '\"' on the same line"),
            );
        }
    }
    diagnostics
}

/// TL1002: `{` / `}` pairs matched across the whole document
pub fn unbalanced_braces(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut open: Vec<Range> = Vec::new();

    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        for token in &lexed.tokens {
            match token.kind {
                TokenKind::LeftBrace => open.push(token_range(line, token)),
                TokenKind::RightBrace => {
                    if open.pop().is_none() {
                        diagnostics.push(Diagnostic::warning(
                            error_codes::UNBALANCED_BRACES,
                            "Unmatched '}'",
                            token_range(line, token),
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    diagnostics.extend(open.into_iter().map(|range| {
        Diagnostic::warning(error_codes::UNBALANCED_BRACES, "Unclosed '{'", range)
    }));
    diagnostics
}

/// TL1003: a block header with no `end`.
///
/// Only runs when the scope tree has an unclosed frame. Each header then
/// searches forward for an `end` at equal or lesser indentation before
/// another line at that level; continuations at the header's own level
/// extend the search, so a broken `if/else` chain is reported at its `if`.
pub fn missing_terminator(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let tree = &ctx.model.tree;
    if !tree.has_unclosed() {
        return Vec::new();
    }

    let mut culprits: Vec<usize> = (0..ctx.line_count())
        .filter(|&line| ctx.model.shapes[line].is_opener() && lacks_terminator(ctx, line))
        .collect();

    if culprits.is_empty() {
        // indentation too irregular to point at a header; fall back to the tree
        culprits = tree
            .unclosed()
            .map(|id| chain_head(ctx, tree.frame(id).header_line))
            .collect();
        culprits.sort_unstable();
        culprits.dedup();
    }

    culprits
        .into_iter()
        .filter_map(|line| {
            let keyword = ctx.model.lexed[line].first()?;
            Some(
                Diagnostic::warning(
                    error_codes::MISSING_TERMINATOR,
                    format!("'{}' block is never closed with 'end'", keyword.text),
                    token_range(line, keyword),
                )
                .with_help("add 'end' at the indentation of the block header"),
            )
        })
        .collect()
}

fn lacks_terminator(ctx: &RuleContext<'_>, header: usize) -> bool {
    let lines = ctx.model.document.lines();
    let indent = lines[header].indent();

    for line in header + 1..ctx.line_count() {
        let shape = &ctx.model.shapes[line];
        if *shape == LineShape::Blank || lines[line].indent() > indent {
            continue;
        }
        return match shape {
            LineShape::Terminator => false,
            LineShape::Continuation { .. } if lines[line].indent() == indent => continue,
            _ => true,
        };
    }
    true
}

/// First header of the `if/elif/else` or `try/catch` chain a line belongs to
fn chain_head(ctx: &RuleContext<'_>, line: usize) -> usize {
    if !matches!(ctx.model.shapes[line], LineShape::Continuation { .. }) {
        return line;
    }
    let tree = &ctx.model.tree;
    let parent = tree.innermost(line);
    (0..line)
        .rev()
        .find(|&candidate| {
            ctx.model.shapes[candidate].is_opener()
                && tree.innermost(candidate) == parent
                && tree
                    .frame_opened_at(candidate)
                    .is_some_and(|id| tree.frame(id).kind.is_branching())
        })
        .unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{lines, run};

    #[test]
    fn test_unterminated_string() {
        let diags = run(unterminated_string, "var a = \"ok\"\nvar b = \"broken\nvar c = 1");
        assert_eq!(lines(&diags), vec![1]);
        assert_eq!(diags[0].range.start, 8);
    }

    #[test]
    fn test_quote_in_comment_is_ignored() {
        assert!(run(unterminated_string, "x = 1 // it's \"fine").is_empty());
    }

    #[test]
    fn test_multi_line_map_is_balanced() {
        let src = "var m = {\n    \"a\": 1,\n    \"b\": {\"c\": 2}\n}";
        assert!(run(unbalanced_braces, src).is_empty());
    }

    #[test]
    fn test_unbalanced_braces() {
        let diags = run(unbalanced_braces, "var m = {\n}\n}\nvar n = {");
        assert_eq!(lines(&diags), vec![2, 3]);
        assert_eq!(diags[0].message, "Unmatched '}'");
        assert_eq!(diags[1].message, "Unclosed '{'");
    }

    #[test]
    fn test_braces_in_strings_ignored() {
        assert!(run(unbalanced_braces, "print(\"{ #{x} \")").is_empty());
    }

    #[test]
    fn test_missing_terminator() {
        let src = "\
func ok():
    return 1
end
func broken():
    var x = 1
func next():
    return 2
end";
        let diags = run(missing_terminator, src);
        assert_eq!(lines(&diags), vec![3]);
        assert_eq!(diags[0].message, "'func' block is never closed with 'end'");
    }

    #[test]
    fn test_closed_document_is_quiet() {
        let src = "if a:\n    x\nelse:\n    y\nend";
        assert!(run(missing_terminator, src).is_empty());
    }

    #[test]
    fn test_broken_chain_reported_at_head() {
        let src = "if a:\n    x\nelse:\n    y\nfunc g():\n    return 1\nend";
        let diags = run(missing_terminator, src);
        assert_eq!(lines(&diags), vec![0]);
        assert_eq!(diags[0].message, "'if' block is never closed with 'end'");
    }

    #[test]
    fn test_irregular_indentation_falls_back_to_tree() {
        let src = "func f():\n    if a:\n        x\n    else:\n        y\nend";
        let diags = run(missing_terminator, src);
        assert_eq!(lines(&diags), vec![0]);
    }
}
