use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::analysis::{analyze_sources, Analysis};
use crate::config::Config;
use crate::errors::Diagnostic;
use crate::parser::lexer;

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Weft - check and inspect workflow definitions", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse, resolve and lint files, reporting every problem
    Check {
        /// Files to check; they are analyzed together as one program
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Stop at the first syntax error
        #[arg(long)]
        fail_fast: bool,
    },

    /// Print the resolved AST and diagnostics as JSON
    Ast {
        /// Files to analyze together
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the token stream of a file
    Tokens {
        /// File to tokenize
        file: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI by parsing process arguments.
///
/// Returns `Ok(false)` when the input had errors; the caller picks the exit
/// code.
pub fn run_cli() -> Result<bool> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<bool> {
    let (fail_fast, pretty) = match &cli.command {
        Commands::Check { fail_fast, .. } => (fail_fast.then_some(true), None),
        Commands::Ast { compact, .. } => (None, compact.then_some(false)),
        Commands::Tokens { .. } | Commands::Config => (None, None),
    };

    // Load configuration before executing any command so config errors are
    // shown first
    let config = Config::builder()
        .config_path(cli.config)
        .fail_fast(fail_fast)
        .pretty(pretty)
        .build()?;
    init_tracing(&config.log_level);
    debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Check { files, .. } => {
            let sources = SourceSet::read(&files)?;
            let analysis = sources.analyze(&config);

            for diagnostic in &analysis.errors {
                eprintln!("{}", sources.describe_diagnostic(diagnostic));
            }
            for lint in &analysis.lints {
                let (path, line) = sources.locate(lint.position.line);
                eprintln!(
                    "{}:{}:{}: {}: {} [{}]",
                    path.display(),
                    line,
                    lint.position.column,
                    lint.severity,
                    lint.message,
                    lint.rule_id
                );
            }

            let ok = !analysis.has_errors();
            if ok {
                println!("✓ {} file(s) checked, no errors", files.len());
            } else {
                let errors = analysis.errors.len()
                    + analysis.lints.iter().filter(|l| l.is_error()).count();
                println!("✗ {} error(s) in {} file(s)", errors, files.len());
            }
            Ok(ok)
        }

        Commands::Ast { files, .. } => {
            let sources = SourceSet::read(&files)?;
            let analysis = sources.analyze(&config);
            let json = analysis
                .to_json(config.pretty)
                .context("Failed to serialize AST")?;
            println!("{}", json);
            Ok(!analysis.has_errors())
        }

        Commands::Tokens { file } => {
            let source = read_source(&file)?;
            match lexer::tokenize(&source) {
                Ok(tokens) => {
                    for token in tokens {
                        println!("{}", token);
                    }
                    Ok(true)
                }
                Err(err) => {
                    eprintln!("{}: {}", file.display(), Diagnostic::from(err));
                    Ok(false)
                }
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(true)
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Several files analyzed as one program. Keeps the first line of each file
/// in the joined text so diagnostics can point back at the right file.
struct SourceSet {
    sources: Vec<String>,
    starts: Vec<(PathBuf, usize)>,
}

impl SourceSet {
    fn read(files: &[PathBuf]) -> Result<Self> {
        let mut sources = Vec::with_capacity(files.len());
        let mut starts = Vec::with_capacity(files.len());
        let mut next_line = 1;
        for path in files {
            let source = read_source(path)?;
            starts.push((path.clone(), next_line));
            // joined with "\n", so every file starts on a fresh line
            next_line += source.split('\n').count();
            sources.push(source);
        }
        Ok(Self { sources, starts })
    }

    fn analyze(&self, config: &Config) -> Analysis {
        let mut analysis = analyze_sources(&self.sources, config.parse_mode());
        if !config.lints {
            analysis.lints.clear();
        }
        analysis
    }

    /// File and file-relative line for a line of the joined text
    fn locate(&self, line: usize) -> (&Path, usize) {
        match self.starts.iter().rev().find(|(_, start)| *start <= line) {
            Some((path, start)) => (path.as_path(), line - start + 1),
            None => (Path::new("<input>"), line),
        }
    }

    fn describe_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let (path, line) = self.locate(diagnostic.line);
        format!(
            "{}:{}:{}: {} error: {}",
            path.display(),
            line,
            diagnostic.column,
            diagnostic.phase,
            diagnostic.message
        )
    }
}
