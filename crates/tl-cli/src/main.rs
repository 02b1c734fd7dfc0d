use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;

/// Static analysis for TL scripts.
///
/// Reports diagnostics, answers hover queries and runs the language server.
///
/// EXAMPLES:
///     tl check src/                 Check every .tl file under src/
///     tl check main.tl --json       Output diagnostics as JSON
///     tl hover main.tl 4 13         Describe the symbol at line 4, column 13
///     tl lsp                        Start the language server on stdio
///
/// ENVIRONMENT VARIABLES:
///     TL_JSON            Set to 'true' for JSON output by default
///     TL_LOG             Log filter (default 'warn')
///     TL_DISABLED_RULES  Comma-separated rules to disable
///     TL_SCOPE_STRATEGY  'tree' or 'backward-scan'
///     NO_COLOR           Set to disable colored output
#[derive(Parser)]
#[command(name = "tl")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags layered over tl.toml and environment overrides
#[derive(Args, Debug, Clone, Default)]
struct AnalysisArgs {
    /// Disable a rule (code or name); may be repeated
    #[arg(long, short = 'd', value_name = "RULE")]
    disable: Vec<String>,
    /// How enclosing blocks are found
    #[arg(long, value_parser = ["tree", "backward-scan"])]
    scope_strategy: Option<String>,
}

impl From<AnalysisArgs> for config::AnalysisFlags {
    fn from(args: AnalysisArgs) -> Self {
        Self {
            disable: args.disable,
            scope_strategy: args.scope_strategy,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Report diagnostics for TL source files
    ///
    /// Directories are walked for files with the configured module
    /// extension. Exits with status 1 when any error is reported.
    ///
    /// EXAMPLES:
    ///     tl check                       Check the current directory
    ///     tl check a.tl lib/             Check a file and a directory
    ///     tl check . --deny-warnings     Fail on warnings too
    #[command(visible_alias = "c")]
    Check {
        /// Files or directories to check
        paths: Vec<PathBuf>,
        /// Output diagnostics in JSON format
        #[arg(long, env = "TL_JSON")]
        json: bool,
        /// Exit with status 1 on warnings as well as errors
        #[arg(long)]
        deny_warnings: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Describe the symbol at a position
    ///
    /// Prints the signature, documentation and declaration site of the word
    /// at LINE:COLUMN (both 1-based).
    ///
    /// EXAMPLES:
    ///     tl hover main.tl 4 13
    ///     tl hover main.tl 4 13 --json
    Hover {
        /// Path to the TL source file
        file: PathBuf,
        /// Line number (1-based)
        line: usize,
        /// Column number (1-based)
        column: usize,
        /// Output in JSON format
        #[arg(long, env = "TL_JSON")]
        json: bool,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Start the TL Language Server
    ///
    /// Serves diagnostics, hover, completion, go-to-definition and document
    /// symbols to editors. Uses stdio by default.
    ///
    /// EXAMPLES:
    ///     tl lsp                         Start in stdio mode
    ///     tl lsp --tcp --port 9257       Start in TCP mode
    Lsp {
        /// Use TCP mode instead of stdio
        #[arg(long)]
        tcp: bool,
        /// Port for TCP mode
        #[arg(long, default_value = "9257")]
        port: u16,
        /// Bind address for TCP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Report connections on stderr
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    tl_lsp::logging::init();

    let passed = match cli.command {
        Commands::Check {
            paths,
            json,
            deny_warnings,
            no_color,
            analysis,
        } => {
            if no_color {
                colored::control::set_override(false);
            }
            commands::check::run(commands::check::CheckArgs {
                paths,
                json,
                deny_warnings,
                flags: analysis.into(),
            })?
        }
        Commands::Hover {
            file,
            line,
            column,
            json,
            analysis,
        } => commands::hover::run(commands::hover::HoverArgs {
            file,
            line,
            column,
            json,
            flags: analysis.into(),
        })?,
        Commands::Lsp {
            tcp,
            port,
            host,
            verbose,
        } => {
            commands::lsp::run(commands::lsp::LspArgs {
                tcp,
                port,
                host,
                verbose,
            })?;
            true
        }
    };

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_flags() {
        let cli = Cli::parse_from([
            "tl",
            "check",
            "src",
            "main.tl",
            "--deny-warnings",
            "-d",
            "TL5001",
            "--disable",
            "bare-hash",
        ]);
        match cli.command {
            Commands::Check {
                paths,
                deny_warnings,
                analysis,
                ..
            } => {
                assert_eq!(paths, vec![PathBuf::from("src"), PathBuf::from("main.tl")]);
                assert!(deny_warnings);
                assert_eq!(analysis.disable, vec!["TL5001", "bare-hash"]);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_check_alias() {
        let cli = Cli::parse_from(["tl", "c", "main.tl"]);
        assert!(matches!(cli.command, Commands::Check { .. }));
    }

    #[test]
    fn test_hover_positions() {
        let cli = Cli::parse_from(["tl", "hover", "main.tl", "4", "13", "--json"]);
        match cli.command {
            Commands::Hover {
                line, column, json, ..
            } => {
                assert_eq!((line, column), (4, 13));
                assert!(json);
            }
            _ => panic!("Expected Hover command"),
        }
    }

    #[test]
    fn test_unknown_scope_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["tl", "check", "--scope-strategy", "sideways"]).is_err());
    }

    #[test]
    fn test_lsp_defaults() {
        let cli = Cli::parse_from(["tl", "lsp"]);
        match cli.command {
            Commands::Lsp {
                tcp, port, host, ..
            } => {
                assert!(!tcp);
                assert_eq!(port, 9257);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("Expected Lsp command"),
        }
    }
}
