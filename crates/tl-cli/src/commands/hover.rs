//! Hover command - print what the analyzer knows about a position

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tl_analysis::{Document, Location, Position, QueryResult};
use tl_lsp::resolver::FsModuleResolver;
use tower_lsp::lsp_types::Url;

use crate::config::{self, AnalysisFlags};

/// Arguments for the hover command
#[derive(Debug, Clone)]
pub struct HoverArgs {
    pub file: PathBuf,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    pub json: bool,
    pub flags: AnalysisFlags,
}

/// Run the hover command; `Ok(false)` when nothing is known at the position
pub fn run(args: HoverArgs) -> Result<bool> {
    if args.line == 0 || args.column == 0 {
        bail!("Line and column are 1-based");
    }

    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read source file: {}", args.file.display()))?;
    let start_dir = match args.file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let config = config::load(&start_dir)?;
    let analyzer = config::analyzer(&config, &args.flags)?;
    let resolver = FsModuleResolver::new(config.module_search_paths(), config.module_extension());

    let document = Document::new(&source);
    let position = Position::new(args.line - 1, args.column - 1);
    let result = analyzer.hover(&document, position, &resolver);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &result {
            Some(result) => println!("{}", render(result, &args.file)),
            None => eprintln!("No information at {}:{}", args.line, args.column),
        }
    }

    Ok(result.is_some())
}

/// Signature, documentation and declaration site as plain text
fn render(result: &QueryResult, file: &Path) -> String {
    let mut out = result.signature.clone();
    if let Some(doc) = &result.documentation {
        out.push_str("\n\n");
        out.push_str(doc);
    }
    if let Some(location) = &result.location {
        out.push_str(&format!("\n\ndefined at {}", location_string(location, file)));
    }
    out
}

/// `path:line:column`, 1-based like diagnostics
fn location_string(location: &Location, file: &Path) -> String {
    let path = match &location.uri {
        None => file.display().to_string(),
        Some(uri) => Url::parse(uri)
            .ok()
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| uri.clone()),
    };
    format!(
        "{}:{}:{}",
        path,
        location.range.line + 1,
        location.range.start + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_analysis::Range;

    #[test]
    fn test_render_local_declaration() {
        let result = QueryResult::new("func area(r: Float) -> Float")
            .with_documentation("Area of a circle.")
            .at(Location {
                uri: None,
                range: Range::new(1, 5, 9),
            });
        assert_eq!(
            render(&result, Path::new("main.tl")),
            "func area(r: Float) -> Float\n\nArea of a circle.\n\ndefined at main.tl:2:6"
        );
    }

    #[test]
    fn test_render_keyword() {
        let result = QueryResult::new("while");
        assert_eq!(render(&result, Path::new("main.tl")), "while");
    }

    #[test]
    fn test_location_in_other_module() {
        let location = Location {
            uri: Some("memory:///geo/shapes.tl".to_string()),
            range: Range::new(0, 6, 12),
        };
        assert_eq!(
            location_string(&location, Path::new("main.tl")),
            "memory:///geo/shapes.tl:1:7"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_location_in_file_module() {
        let location = Location {
            uri: Some("file:///geo/shapes.tl".to_string()),
            range: Range::new(2, 4, 8),
        };
        assert_eq!(
            location_string(&location, Path::new("main.tl")),
            "/geo/shapes.tl:3:5"
        );
    }
}
