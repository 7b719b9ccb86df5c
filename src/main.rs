use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ktsyn_parser::{parse_with, EntryPoint, Lexer, LineIndex, Parse, ParseOptions, SourceSpan};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

/// ktsyn - error-tolerant Kotlin syntax trees
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse files and print their syntax trees
    Parse {
        /// Source files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,

        /// Print diagnostics as JSON instead of trees
        #[arg(long)]
        json: bool,

        /// Print diagnostics only
        #[arg(short, long)]
        quiet: bool,
    },

    /// Dump the lexer token stream of a file
    Tokens {
        /// Source file
        file: PathBuf,
    },

    /// Parse files and fail if any has diagnostics
    Check {
        /// Source files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },
}

/// Parser options; flags win over the config file
#[derive(Args)]
struct OptionArgs {
    /// Entry point: file, script, type, expression, block or lambda
    #[arg(short, long)]
    entry: Option<String>,

    /// Options file with a [parser] table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Collapse function bodies into single BLOCK tokens
    #[arg(long)]
    collapse_blocks: bool,

    /// Report at most this many diagnostics per file
    #[arg(long)]
    max_errors: Option<usize>,
}

impl OptionArgs {
    fn resolve(&self) -> Result<ParseOptions> {
        let mut options = match &self.config {
            Some(path) => ParseOptions::from_path(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => ParseOptions::default(),
        };

        if let Some(entry) = &self.entry {
            options.entry = entry.parse::<EntryPoint>()?;
        }
        if self.collapse_blocks {
            options.collapse_blocks = true;
        }
        if self.max_errors.is_some() {
            options.max_errors = self.max_errors;
        }

        debug!(?options, "resolved parse options");
        Ok(options)
    }
}

/// One diagnostic as printed by `parse --json`
#[derive(Serialize)]
struct JsonDiagnostic {
    #[serde(flatten)]
    span: SourceSpan,
    message: String,
    kind: ktsyn_parser::ParseErrorKind,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Parse {
            files,
            options,
            json,
            quiet,
        } => {
            let options = options.resolve()?;
            parse_files(&files, &options, json, quiet)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Tokens { file } => {
            dump_tokens(&file)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Check { files, options } => {
            let options = options.resolve()?;
            check_files(&files, &options)
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_source(path: &Path, options: &ParseOptions) -> Result<(String, Parse)> {
    let source = read_source(path)?;
    info!("Parsing {} as {}", path.display(), options.entry);
    let parse = parse_with(&source, options.entry, options);
    Ok((source, parse))
}

/// Print each diagnostic as `file:line:col: message`
fn print_diagnostics(path: &Path, source: &str, parse: &Parse) {
    let index = LineIndex::new(source);
    for error in parse.errors() {
        let span = SourceSpan::from_range(error.range.clone(), &index).with_file(path);
        eprintln!("{}: error: {}", span, error.message);
    }
}

fn parse_files(files: &[PathBuf], options: &ParseOptions, json: bool, quiet: bool) -> Result<()> {
    let mut diagnostics = Vec::new();

    for path in files {
        let (source, parse) = parse_source(path, options)?;

        if json {
            let index = LineIndex::new(&source);
            diagnostics.extend(parse.errors().iter().map(|error| JsonDiagnostic {
                span: SourceSpan::from_range(error.range.clone(), &index).with_file(path),
                message: error.message.clone(),
                kind: error.kind,
            }));
            continue;
        }

        if !quiet {
            if files.len() > 1 {
                println!("// {}", path.display());
            }
            print!("{}", parse.debug_tree());
        }
        print_diagnostics(path, &source, &parse);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    }

    Ok(())
}

fn dump_tokens(path: &Path) -> Result<()> {
    let source = read_source(path)?;
    let index = LineIndex::new(&source);

    for token in Lexer::new(&source).tokenize() {
        let (line, column) = index.line_col(token.span.start);
        let text = &source[token.span.clone()];
        println!(
            "{:>4}:{:<3} {:?}@{}..{} {:?}",
            line,
            column,
            token.kind(),
            token.span.start,
            token.span.end,
            text
        );
    }

    Ok(())
}

fn check_files(files: &[PathBuf], options: &ParseOptions) -> Result<ExitCode> {
    let mut failed = 0;

    for path in files {
        let (source, parse) = parse_source(path, options)?;
        if parse.has_errors() {
            failed += 1;
            print_diagnostics(path, &source, &parse);
        }
    }

    if failed == 0 {
        info!("{} file(s) parsed without errors", files.len());
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} of {} file(s) have syntax errors", failed, files.len());
        Ok(ExitCode::FAILURE)
    }
}
