//! Spellings borrowed from other languages

use super::{token_range, RuleContext};
use crate::diagnostic::{error_codes, Diagnostic};
use crate::document::Range;
use crate::token::{Keyword, Token, TokenKind};

/// TL8001: `and`, `or`, `not` written where `&&`, `||`, `!` belong
pub fn word_operator(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        let tokens = &lexed.tokens;
        for (i, token) in tokens.iter().enumerate() {
            let replacement = match token.ident() {
                Some("and") => "&&",
                Some("or") => "||",
                Some("not") => "!",
                _ => continue,
            };
            if !used_as_operator(tokens, i) {
                continue;
            }
            diagnostics.push(
                Diagnostic::error(
                    error_codes::WORD_OPERATOR,
                    format!("'{}' is not an operator in TL", token.text),
                    token_range(line, token),
                )
                .with_help(format!("use '{}'", replacement)),
            );
        }
    }
    diagnostics
}

/// The word is not a member name, callee, assignment target, declared name
/// or parameter
fn used_as_operator(tokens: &[Token], index: usize) -> bool {
    let before = index.checked_sub(1).and_then(|i| tokens.get(i));
    let after = tokens.get(index + 1);

    if let Some(prev) = before {
        let names_something = match prev.kind {
            TokenKind::Dot => true,
            TokenKind::Keyword(k) => {
                k.is_declarator()
                    || matches!(
                        k,
                        Keyword::Func
                            | Keyword::Class
                            | Keyword::Enum
                            | Keyword::Record
                            | Keyword::Interface
                            | Keyword::For
                            | Keyword::Catch
                            | Keyword::As
                            | Keyword::Import
                    )
            }
            _ => false,
        };
        if names_something {
            return false;
        }
    }

    match after {
        None => false,
        Some(next) => !matches!(
            next.kind,
            TokenKind::LeftParen
                | TokenKind::Assign
                | TokenKind::CompoundAssign
                | TokenKind::Colon
                | TokenKind::Dot
                | TokenKind::Comma
                | TokenKind::RightParen
        ),
    }
}

/// TL8002: `1..5`
pub fn two_dot_range(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        for token in lexed.tokens.iter().filter(|t| t.is(TokenKind::DotDot)) {
            diagnostics.push(
                Diagnostic::error(
                    error_codes::TWO_DOT_RANGE,
                    "'..' is not a range operator in TL",
                    token_range(line, token),
                )
                .with_help("use '...'"),
            );
        }
    }
    diagnostics
}

/// TL8003: `"${name}"`
pub fn dollar_interpolation(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        for &column in lexed.strings.iter().flat_map(|s| &s.dollar_braces) {
            diagnostics.push(
                Diagnostic::error(
                    error_codes::DOLLAR_INTERPOLATION,
                    "'${' does not interpolate in TL strings",
                    Range::new(line, column, column + 2),
                )
                .with_help("use '#{'"),
            );
        }
    }
    diagnostics
}

/// TL8004: a `#` in a string that starts no interpolation
pub fn bare_hash(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line, lexed) in ctx.model.lexed.iter().enumerate() {
        for &column in lexed.strings.iter().flat_map(|s| &s.bare_hashes) {
            diagnostics.push(
                Diagnostic::hint(
                    error_codes::BARE_HASH,
                    "'#' without '{' is literal text",
                    Range::new(line, column, column + 1),
                )
                .with_help("write '#{expr}' to interpolate"),
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
    fn test_word_operators() {
        let src = "\
if a and b:
end
while not done or x:
end
var ok = a && b";
        let diags = run(word_operator, src);
        assert_eq!(lines(&diags), vec![0, 2, 2]);
        assert_eq!(diags[0].message, "'and' is not an operator in TL");
        assert_eq!(diags[0].help.as_deref(), Some("use '&&'"));
        assert_eq!(diags[0].range, Range::new(0, 5, 8));
        assert_eq!(diags[1].help.as_deref(), Some("use '!'"));
        assert_eq!(diags[2].help.as_deref(), Some("use '||'"));
    }

    #[test]
    fn test_word_as_name_is_allowed() {
        let src = "\
var or = 1
or = 2
func not(x: Int):
end
print(query.and)
print(and)
logic.or(a, b)";
        assert!(run(word_operator, src).is_empty());
    }

    #[test]
    fn test_word_in_string_or_comment() {
        assert!(run(word_operator, "print(\"a and b\") // x or y").is_empty());
    }

    #[test]
    fn test_two_dot_range() {
        let diags = run(two_dot_range, "for i in 1..5:\nend\nfor j in 1...5:\nend");
        assert_eq!(lines(&diags), vec![0]);
        assert_eq!(diags[0].range, Range::new(0, 10, 12));
        assert_eq!(diags[0].help.as_deref(), Some("use '...'"));
    }

    #[test]
    fn test_dollar_interpolation() {
        let diags = run(dollar_interpolation, "print(\"hi ${name} and #{name}\")");
        assert_eq!(lines(&diags), vec![0]);
        assert_eq!(diags[0].range, Range::new(0, 10, 12));
    }

    #[test]
    fn test_bare_hash() {
        let diags = run(bare_hash, "print(\"item #3 of #{n}\")");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].range, Range::new(0, 12, 13));
        assert_eq!(diags[0].severity, crate::diagnostic::Severity::Hint);
    }
}
