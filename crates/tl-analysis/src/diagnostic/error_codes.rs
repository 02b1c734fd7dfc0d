//! Rule code registry with descriptions and help text
//!
//! Codes follow the TLxxxx scheme, grouped by rule family:
//! - TL1xxx: structure (strings, braces, block terminators)
//! - TL2xxx: naming conventions
//! - TL3xxx: declaration misuse
//! - TL4xxx: context legality (`this`, `return`, `break`/`continue`)
//! - TL5xxx: typing and import hints
//! - TL6xxx: reachability
//! - TL7xxx: type rules
//! - TL8xxx: lexical traps

// TL1xxx - Structure
pub const UNTERMINATED_STRING: &str = "TL1001";
pub const UNBALANCED_BRACES: &str = "TL1002";
pub const MISSING_TERMINATOR: &str = "TL1003";

// TL2xxx - Naming
pub const CLASS_NAME_CASE: &str = "TL2001";

// TL3xxx - Declarations
pub const STACKED_DECLARATORS: &str = "TL3001";
pub const DUPLICATE_DECLARATION: &str = "TL3002";
pub const IMMUTABLE_REASSIGNMENT: &str = "TL3003";

// TL4xxx - Context
pub const THIS_OUTSIDE_CLASS: &str = "TL4001";
pub const RETURN_OUTSIDE_FUNCTION: &str = "TL4002";
pub const JUMP_OUTSIDE_LOOP: &str = "TL4003";

// TL5xxx - Hints
pub const UNTYPED_PARAMETER: &str = "TL5001";
pub const UNUSED_IMPORT: &str = "TL5002";

// TL6xxx - Reachability
pub const UNREACHABLE_CODE: &str = "TL6001";

// TL7xxx - Types
pub const ASSIGNMENT_TYPE_MISMATCH: &str = "TL7001";
pub const COMPARISON_TYPE_MISMATCH: &str = "TL7002";
pub const DIVISION_BY_ZERO: &str = "TL7003";

// TL8xxx - Lexical traps
pub const WORD_OPERATOR: &str = "TL8001";
pub const TWO_DOT_RANGE: &str = "TL8002";
pub const DOLLAR_INTERPOLATION: &str = "TL8003";
pub const BARE_HASH: &str = "TL8004";

/// Rule code descriptor with code, description, and optional help text
#[derive(Debug, Clone)]
pub struct ErrorCodeInfo {
    /// The code string (e.g., "TL1001")
    pub code: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Optional contextual help text
    pub help: Option<&'static str>,
}

/// Look up a code in the registry
pub fn lookup(code: &str) -> Option<ErrorCodeInfo> {
    ERROR_CODES.iter().find(|e| e.code == code).cloned()
}

/// Get help text for a code
pub fn help_for(code: &str) -> Option<&'static str> {
    lookup(code).and_then(|e| e.help)
}

/// Get description for a code
pub fn description_for(code: &str) -> Option<&'static str> {
    lookup(code).map(|e| e.description)
}

/// Whether text has the shape of a rule code (`TL` and four digits)
pub fn is_well_formed(code: &str) -> bool {
    code.len() == 6
        && code.starts_with("TL")
        && code[2..].chars().all(|c| c.is_ascii_digit())
}

pub static ERROR_CODES: &[ErrorCodeInfo] = &[
    ErrorCodeInfo {
        code: UNTERMINATED_STRING,
        description: "Unterminated string literal",
        help: Some("Close the string with '\"' on the same line."),
    },
    ErrorCodeInfo {
        code: UNBALANCED_BRACES,
        description: "Unbalanced curly braces",
        help: Some("Every '{' needs a matching '}'."),
    },
    ErrorCodeInfo {
        code: MISSING_TERMINATOR,
        description: "Block is missing its 'end'",
        help: Some("Close the block with 'end' at the same indentation as its header."),
    },
    ErrorCodeInfo {
        code: CLASS_NAME_CASE,
        description: "Type name should start with an uppercase letter",
        help: None,
    },
    ErrorCodeInfo {
        code: STACKED_DECLARATORS,
        description: "More than one declarator on a declaration",
        help: Some("Keep exactly one of 'var', 'let', 'const' or 'final'."),
    },
    ErrorCodeInfo {
        code: DUPLICATE_DECLARATION,
        description: "Name declared twice in the same scope",
        help: Some("Rename one of the declarations or assign instead of redeclaring."),
    },
    ErrorCodeInfo {
        code: IMMUTABLE_REASSIGNMENT,
        description: "Reassignment of a const or final binding",
        help: Some("Declare the variable with 'var' if it needs to change."),
    },
    ErrorCodeInfo {
        code: THIS_OUTSIDE_CLASS,
        description: "'this' used outside a function or class method",
        help: None,
    },
    ErrorCodeInfo {
        code: RETURN_OUTSIDE_FUNCTION,
        description: "'return' used outside a function",
        help: None,
    },
    ErrorCodeInfo {
        code: JUMP_OUTSIDE_LOOP,
        description: "'break' or 'continue' used outside a loop",
        help: None,
    },
    ErrorCodeInfo {
        code: UNTYPED_PARAMETER,
        description: "Parameter without a type annotation",
        help: Some("Annotate the parameter: 'name: Type'."),
    },
    ErrorCodeInfo {
        code: UNUSED_IMPORT,
        description: "Imported name is never used",
        help: Some("Remove the import."),
    },
    ErrorCodeInfo {
        code: UNREACHABLE_CODE,
        description: "Unreachable code",
        help: Some("Remove the statement or move it before the jump."),
    },
    ErrorCodeInfo {
        code: ASSIGNMENT_TYPE_MISMATCH,
        description: "Assigned value does not match the variable's type",
        help: None,
    },
    ErrorCodeInfo {
        code: COMPARISON_TYPE_MISMATCH,
        description: "Comparison between incompatible types",
        help: None,
    },
    ErrorCodeInfo {
        code: DIVISION_BY_ZERO,
        description: "Division by zero",
        help: None,
    },
    ErrorCodeInfo {
        code: WORD_OPERATOR,
        description: "Word operator instead of '&&', '||' or '!'",
        help: None,
    },
    ErrorCodeInfo {
        code: TWO_DOT_RANGE,
        description: "'..' is not a range operator",
        help: Some("Use '...' for ranges."),
    },
    ErrorCodeInfo {
        code: DOLLAR_INTERPOLATION,
        description: "'${' is not string interpolation",
        help: Some("Use '#{expr}' to interpolate."),
    },
    ErrorCodeInfo {
        code: BARE_HASH,
        description: "'#' in a string without '{'",
        help: Some("Did you mean '#{expr}'?"),
    },
];
