//! Check command - report diagnostics for TL source files

use anyhow::{bail, Context, Result};
use colored::*;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tl_analysis::{Analyzer, Diagnostic, Severity};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{self, AnalysisFlags};

/// Arguments for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    /// Files and directories; directories are walked for sources
    pub paths: Vec<PathBuf>,
    /// Output in JSON format
    pub json: bool,
    /// Fail on warnings as well as errors
    pub deny_warnings: bool,
    pub flags: AnalysisFlags,
}

/// Diagnostics of one file
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Run the check command; `Ok(false)` means problems were reported
pub fn run(args: CheckArgs) -> Result<bool> {
    let cwd = std::env::current_dir()?;
    let config = config::load(&cwd)?;
    let analyzer = config::analyzer(&config, &args.flags)?;

    let paths = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths.clone()
    };
    let files = discover(&paths, config.module_extension())?;
    debug!(files = files.len(), "checking");

    let reports = check_files(&analyzer, &files)?;

    let errors: usize = reports.iter().map(|r| r.count(Severity::Error)).sum();
    let warnings: usize = reports.iter().map(|r| r.count(Severity::Warning)).sum();
    let hints: usize = reports.iter().map(|r| r.count(Severity::Hint)).sum();

    if args.json {
        let output = serde_json::json!({
            "files": reports
                .iter()
                .map(|r| serde_json::json!({
                    "file": r.path.display().to_string(),
                    "diagnostics": r.diagnostics,
                }))
                .collect::<Vec<_>>(),
            "summary": {
                "files": reports.len(),
                "errors": errors,
                "warnings": warnings,
                "hints": hints,
            }
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for report in &reports {
            let file = report.path.display().to_string();
            for diag in &report.diagnostics {
                println!("{}", diag.to_human_string(&file));
            }
        }
        print_summary(reports.len(), errors, warnings);
    }

    Ok(errors == 0 && !(args.deny_warnings && warnings > 0))
}

/// Analyze files in parallel; reports keep the order of `files`
pub fn check_files(analyzer: &Analyzer, files: &[PathBuf]) -> Result<Vec<FileReport>> {
    files
        .par_iter()
        .map(|path| {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read source file: {}", path.display()))?;
            Ok(FileReport {
                path: path.clone(),
                diagnostics: analyzer.analyze(&source),
            })
        })
        .collect()
}

/// Expand directories into their sources, sorted and deduplicated.
///
/// Files named explicitly are kept whatever their extension.
pub fn discover(paths: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk(path, extension));
        } else {
            bail!("Path not found: {}", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk<'a>(root: &'a Path, extension: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(move |path| path.extension().is_some_and(|ext| ext == extension))
}

fn print_summary(files: usize, errors: usize, warnings: usize) {
    let checked = format!(
        "{} file{} checked",
        files,
        if files == 1 { "" } else { "s" }
    );
    if errors == 0 && warnings == 0 {
        println!("{} {}: no problems found", "✓".green(), checked);
        return;
    }

    let counts = format!(
        "{} error{}, {} warning{}",
        errors,
        if errors == 1 { "" } else { "s" },
        warnings,
        if warnings == 1 { "" } else { "s" }
    );
    if errors > 0 {
        println!("{} {}: {}", "✗".red(), checked, counts.red().bold());
    } else {
        println!("{} {}: {}", "!".yellow(), checked, counts.yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, text: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_discover_walks_directories() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.tl", "var a = 1");
        let b = write(dir.path(), "nested/b.tl", "var b = 2");
        write(dir.path(), "notes.txt", "not code");

        let files = discover(&[dir.path().to_path_buf()], "tl").unwrap();
        assert_eq!(files, vec![a, b]);
    }

    #[test]
    fn test_discover_keeps_explicit_files_once() {
        let dir = TempDir::new().unwrap();
        let script = write(dir.path(), "script.txt", "var a = 1");
        let files = discover(&[script.clone(), script.clone()], "tl").unwrap();
        assert_eq!(files, vec![script]);
    }

    #[test]
    fn test_discover_missing_path() {
        assert!(discover(&[PathBuf::from("/nonexistent/src")], "tl").is_err());
    }

    #[test]
    fn test_check_files_keeps_order() {
        let dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..8)
            .map(|i| write(dir.path(), &format!("f{}.tl", i), "var r = 1..5"))
            .collect();

        let reports = check_files(&Analyzer::new(), &files).unwrap();
        let paths: Vec<&PathBuf> = reports.iter().map(|r| &r.path).collect();
        assert_eq!(paths, files.iter().collect::<Vec<_>>());
        assert!(reports.iter().all(|r| r.count(Severity::Error) == 1));
    }
}
