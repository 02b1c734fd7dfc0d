//! Diagnostic system for errors, warnings and hints
//!
//! Every rule reports through [`Diagnostic`]. A diagnostic is immutable once
//! built; the analyzer replaces the whole set for a document on each run.

pub mod error_codes;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Range;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unconditionally invalid construct
    Error,
    /// Likely mistake
    Warning,
    /// Style or possible oversight
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Location (zero-based line, character columns)
    pub range: Range,
    /// Main diagnostic message
    pub message: String,
    pub severity: Severity,
    /// Rule code (e.g., "TL3003")
    pub code: String,
    /// Suggested fix (optional)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        range: Range,
    ) -> Self {
        Self {
            range,
            message: message.into(),
            severity,
            code: code.into(),
            help: None,
        }
    }

    /// Create a new error diagnostic with code
    pub fn error(code: impl Into<String>, message: impl Into<String>, range: Range) -> Self {
        Self::new(Severity::Error, code, message, range)
    }

    /// Create a new warning diagnostic with code
    pub fn warning(code: impl Into<String>, message: impl Into<String>, range: Range) -> Self {
        Self::new(Severity::Warning, code, message, range)
    }

    /// Create a new hint diagnostic with code
    pub fn hint(code: impl Into<String>, message: impl Into<String>, range: Range) -> Self {
        Self::new(Severity::Hint, code, message, range)
    }

    /// Add a help message
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn line(&self) -> usize {
        self.range.line
    }

    /// Format as a one-line human-readable string: `file:3:5: error[TL1001]: message`
    pub fn to_human_string(&self, file: &str) -> String {
        let mut out = format!(
            "{}:{}:{}: {}[{}]: {}",
            file,
            self.range.line + 1,
            self.range.start + 1,
            self.severity,
            self.code,
            self.message
        );
        if let Some(help) = &self.help {
            out.push_str(&format!("\n   = help: {}", help));
        }
        out
    }

    /// Format as JSON string
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format as compact JSON string
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Order by line, then column, then code (message breaks remaining ties)
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.range
            .line
            .cmp(&b.range.line)
            .then(a.range.start.cmp(&b.range.start))
            .then(a.range.end.cmp(&b.range.end))
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.message.cmp(&b.message))
    });
}
