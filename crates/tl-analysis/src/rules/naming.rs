//! Naming conventions

use super::RuleContext;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::document::Range;
use crate::infer::is_capitalized;
use crate::syntax::ClassHeader;

/// TL2001: class, enum, record and interface names start uppercase
pub fn class_name_case(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.model
        .lexed
        .iter()
        .enumerate()
        .filter_map(|(line, lexed)| {
            let header = ClassHeader::parse(lexed)?;
            if is_capitalized(&header.name) || header.name.starts_with('_') {
                return None;
            }
            let suggestion = capitalize(&header.name);
            Some(
                Diagnostic::warning(
                    error_codes::CLASS_NAME_CASE,
                    format!(
                        "{} name '{}' should start with an uppercase letter",
                        header.kind.as_str(),
                        header.name
                    ),
                    Range::new(
                        line,
                        header.name_column,
                        header.name_column + header.name.chars().count(),
                    ),
                )
                .with_help(format!("rename to '{}'", suggestion)),
            )
        })
        .collect()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
