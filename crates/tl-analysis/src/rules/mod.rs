//! Diagnostic rule set
//!
//! Each rule is a pure function from a [`RuleContext`] to the diagnostics it
//! finds. Rules never see each other's output, so they can run in any order
//! and be disabled individually by code.

mod context;
mod declarations;
mod lexical;
mod naming;
mod reachability;
mod structural;
mod style;
mod typing;

use crate::catalog::Catalog;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::document::Range;
use crate::infer::TypeInference;
use crate::model::SourceModel;
use crate::scope::ScopeResolver;
use crate::token::Token;

/// Inputs shared by every rule for one analysis run
pub struct RuleContext<'a> {
    pub model: &'a SourceModel<'a>,
    pub inference: &'a TypeInference<'a, 'a>,
    /// Containment oracle for the configured strategy
    pub scopes: &'a dyn ScopeResolver,
    pub catalog: &'a Catalog,
}

impl RuleContext<'_> {
    pub fn line_count(&self) -> usize {
        self.model.line_count()
    }
}

pub type RuleFn = fn(&RuleContext<'_>) -> Vec<Diagnostic>;

/// A registered rule
pub struct Rule {
    pub code: &'static str,
    pub name: &'static str,
    pub check: RuleFn,
}

pub static RULES: &[Rule] = &[
    Rule {
        code: error_codes::UNTERMINATED_STRING,
        name: "unterminated-string",
        check: structural::unterminated_string,
    },
    Rule {
        code: error_codes::UNBALANCED_BRACES,
        name: "unbalanced-braces",
        check: structural::unbalanced_braces,
    },
    Rule {
        code: error_codes::MISSING_TERMINATOR,
        name: "missing-terminator",
        check: structural::missing_terminator,
    },
    Rule {
        code: error_codes::CLASS_NAME_CASE,
        name: "class-name-case",
        check: naming::class_name_case,
    },
    Rule {
        code: error_codes::STACKED_DECLARATORS,
        name: "stacked-declarators",
        check: declarations::stacked_declarators,
    },
    Rule {
        code: error_codes::DUPLICATE_DECLARATION,
        name: "duplicate-declaration",
        check: declarations::duplicate_declaration,
    },
    Rule {
        code: error_codes::IMMUTABLE_REASSIGNMENT,
        name: "immutable-reassignment",
        check: declarations::immutable_reassignment,
    },
    Rule {
        code: error_codes::THIS_OUTSIDE_CLASS,
        name: "this-outside-class",
        check: context::this_outside_class,
    },
    Rule {
        code: error_codes::RETURN_OUTSIDE_FUNCTION,
        name: "return-outside-function",
        check: context::return_outside_function,
    },
    Rule {
        code: error_codes::JUMP_OUTSIDE_LOOP,
        name: "jump-outside-loop",
        check: context::jump_outside_loop,
    },
    Rule {
        code: error_codes::UNTYPED_PARAMETER,
        name: "untyped-parameter",
        check: style::untyped_parameter,
    },
    Rule {
        code: error_codes::UNUSED_IMPORT,
        name: "unused-import",
        check: style::unused_import,
    },
    Rule {
        code: error_codes::UNREACHABLE_CODE,
        name: "unreachable-code",
        check: reachability::unreachable_code,
    },
    Rule {
        code: error_codes::ASSIGNMENT_TYPE_MISMATCH,
        name: "assignment-type-mismatch",
        check: typing::assignment_type_mismatch,
    },
    Rule {
        code: error_codes::COMPARISON_TYPE_MISMATCH,
        name: "comparison-type-mismatch",
        check: typing::comparison_type_mismatch,
    },
    Rule {
        code: error_codes::DIVISION_BY_ZERO,
        name: "division-by-zero",
        check: typing::division_by_zero,
    },
    Rule {
        code: error_codes::WORD_OPERATOR,
        name: "word-operator",
        check: lexical::word_operator,
    },
    Rule {
        code: error_codes::TWO_DOT_RANGE,
        name: "two-dot-range",
        check: lexical::two_dot_range,
    },
    Rule {
        code: error_codes::DOLLAR_INTERPOLATION,
        name: "dollar-interpolation",
        check: lexical::dollar_interpolation,
    },
    Rule {
        code: error_codes::BARE_HASH,
        name: "bare-hash",
        check: lexical::bare_hash,
    },
];

/// Find a rule by code or name
pub fn rule(key: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.code == key || r.name == key)
}

/// Range covering a token on a line
pub(crate) fn token_range(line: usize, token: &Token) -> Range {
    Range::new(line, token.start, token.end)
}

/// Range covering the trimmed text of a line
pub(crate) fn line_range(ctx: &RuleContext<'_>, line: usize) -> Range {
    ctx.model
        .document
        .line(line)
        .map(|l| l.content_range())
        .unwrap_or(Range::new(line, 0, 0))
}
