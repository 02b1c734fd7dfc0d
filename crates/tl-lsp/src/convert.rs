//! Type conversions between tl-analysis and LSP types
//!
//! Analysis columns count Unicode scalar values; LSP characters count UTF-16
//! code units. Conversions that need the line text take the [`Document`].

use tl_analysis::{
    CompletionItem, CompletionKind, Diagnostic, Document, DocumentSymbol, Location, Position,
    QueryResult, Range, Severity, SymbolKind,
};
use tower_lsp::lsp_types::{
    self, CompletionItemKind, DiagnosticSeverity as LspSeverity, Documentation, Hover,
    HoverContents, MarkupContent, MarkupKind, NumberOrString, Position as LspPosition,
    Range as LspRange, SymbolKind as LspSymbolKind, Url,
};

fn line_text(doc: &Document, line: usize) -> &str {
    doc.line(line).map(|l| l.text()).unwrap_or("")
}

/// UTF-16 offset of a character column
pub fn column_to_utf16(line: &str, column: usize) -> u32 {
    line.chars()
        .take(column)
        .map(char::len_utf16)
        .sum::<usize>() as u32
}

/// Character column of a UTF-16 offset; offsets inside a surrogate pair
/// round down
pub fn utf16_to_column(line: &str, character: u32) -> usize {
    let target = character as usize;
    let mut units = 0;
    for (column, ch) in line.chars().enumerate() {
        units += ch.len_utf16();
        if units > target {
            return column;
        }
    }
    line.chars().count()
}

pub fn position_to_lsp(doc: &Document, pos: Position) -> LspPosition {
    LspPosition {
        line: pos.line as u32,
        character: column_to_utf16(line_text(doc, pos.line), pos.column),
    }
}

pub fn position_from_lsp(doc: &Document, pos: LspPosition) -> Position {
    let line = pos.line as usize;
    Position::new(line, utf16_to_column(line_text(doc, line), pos.character))
}

pub fn range_to_lsp(doc: &Document, range: &Range) -> LspRange {
    LspRange {
        start: position_to_lsp(doc, Position::new(range.line, range.start)),
        end: position_to_lsp(doc, Position::new(range.line, range.end)),
    }
}

/// Range of another document whose text is not at hand; columns pass through
fn foreign_range_to_lsp(range: &Range) -> LspRange {
    LspRange {
        start: LspPosition::new(range.line as u32, range.start as u32),
        end: LspPosition::new(range.line as u32, range.end as u32),
    }
}

pub fn severity_to_lsp(severity: Severity) -> LspSeverity {
    match severity {
        Severity::Error => LspSeverity::ERROR,
        Severity::Warning => LspSeverity::WARNING,
        Severity::Hint => LspSeverity::HINT,
    }
}

/// Convert a TL diagnostic to an LSP diagnostic; the help text follows the
/// message on its own line
pub fn diagnostic_to_lsp(doc: &Document, diag: &Diagnostic) -> lsp_types::Diagnostic {
    let message = match &diag.help {
        Some(help) => format!("{}\nhelp: {}", diag.message, help),
        None => diag.message.clone(),
    };
    lsp_types::Diagnostic {
        range: range_to_lsp(doc, &diag.range),
        severity: Some(severity_to_lsp(diag.severity)),
        code: Some(NumberOrString::String(diag.code.clone())),
        source: Some("tl".to_string()),
        message,
        ..Default::default()
    }
}

/// Signature as a `tl` code block, documentation below it
pub fn hover_markdown(result: &QueryResult) -> String {
    let mut value = format!("```tl\n{}\n```", result.signature);
    if let Some(doc) = &result.documentation {
        value.push_str("\n\n");
        value.push_str(doc);
    }
    value
}

pub fn hover_to_lsp(result: &QueryResult, range: Option<LspRange>) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover_markdown(result),
        }),
        range,
    }
}

/// Declaration location; `None` when the module URI does not parse
pub fn location_to_lsp(
    doc: &Document,
    current: &Url,
    location: &Location,
) -> Option<lsp_types::Location> {
    match &location.uri {
        None => Some(lsp_types::Location::new(
            current.clone(),
            range_to_lsp(doc, &location.range),
        )),
        Some(uri) if uri == current.as_str() => Some(lsp_types::Location::new(
            current.clone(),
            range_to_lsp(doc, &location.range),
        )),
        Some(uri) => {
            let uri = Url::parse(uri).ok()?;
            Some(lsp_types::Location::new(uri, foreign_range_to_lsp(&location.range)))
        }
    }
}

pub fn completion_kind_to_lsp(kind: CompletionKind) -> CompletionItemKind {
    match kind {
        CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        CompletionKind::Function => CompletionItemKind::FUNCTION,
        CompletionKind::Method => CompletionItemKind::METHOD,
        CompletionKind::Field => CompletionItemKind::FIELD,
        CompletionKind::Variable => CompletionItemKind::VARIABLE,
        CompletionKind::Constant => CompletionItemKind::CONSTANT,
        CompletionKind::Class => CompletionItemKind::CLASS,
        CompletionKind::Module => CompletionItemKind::MODULE,
    }
}

pub fn completion_to_lsp(item: &CompletionItem) -> lsp_types::CompletionItem {
    lsp_types::CompletionItem {
        label: item.label.clone(),
        kind: Some(completion_kind_to_lsp(item.kind)),
        detail: item.detail.clone(),
        documentation: item.documentation.as_ref().map(|doc| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: doc.clone(),
            })
        }),
        ..Default::default()
    }
}

pub fn symbol_kind_to_lsp(kind: SymbolKind) -> LspSymbolKind {
    match kind {
        SymbolKind::Class => LspSymbolKind::CLASS,
        SymbolKind::Enum => LspSymbolKind::ENUM,
        SymbolKind::Record => LspSymbolKind::STRUCT,
        SymbolKind::Interface => LspSymbolKind::INTERFACE,
        SymbolKind::Function => LspSymbolKind::FUNCTION,
        SymbolKind::Method => LspSymbolKind::METHOD,
        SymbolKind::Field => LspSymbolKind::FIELD,
        SymbolKind::Variable => LspSymbolKind::VARIABLE,
        SymbolKind::Constant => LspSymbolKind::CONSTANT,
    }
}

/// Full range spans from the declaration line to the end of its `end` line
pub fn symbol_to_lsp(doc: &Document, symbol: &DocumentSymbol) -> lsp_types::DocumentSymbol {
    let end_line = line_text(doc, symbol.end_line);
    let range = LspRange {
        start: LspPosition::new(symbol.line as u32, 0),
        end: LspPosition::new(
            symbol.end_line as u32,
            column_to_utf16(end_line, end_line.chars().count()),
        ),
    };

    #[allow(deprecated)]
    lsp_types::DocumentSymbol {
        name: symbol.name.clone(),
        detail: Some(symbol.detail.clone()),
        kind: symbol_kind_to_lsp(symbol.kind),
        tags: None,
        deprecated: None,
        range,
        selection_range: range_to_lsp(doc, &symbol.selection_range),
        children: if symbol.children.is_empty() {
            None
        } else {
            Some(symbol.children.iter().map(|c| symbol_to_lsp(doc, c)).collect())
        },
    }
}
