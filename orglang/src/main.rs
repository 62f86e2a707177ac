//! OrgLang command-line dispatcher.
//!
//! Every subcommand drives the lexer/parser; `version` aside, the ones
//! that would need the evaluator or code generator are stubs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser as ClapParser, Subcommand};
use orglang::source::Source;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "orglang", version, about = "The OrgLang language tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source file (stub).
    Build { file: PathBuf },
    /// Run a source file (stub).
    Run { file: PathBuf },
    /// Print the canonical form of a source file.
    Fmt { file: PathBuf },
    /// Parse a source file and report diagnostics.
    Check { file: PathBuf },
    /// Generate documentation (stub).
    Doc { file: PathBuf },
    /// Run the tests of a source file (stub).
    Test { file: PathBuf },
    /// Interactive read-parse-print loop.
    Repl,
    /// Print the tool version.
    Version,
    /// Remove build artifacts (stub).
    Clean,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Version => {
            println!("orglang {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Check { file } => check(&file),
        Command::Fmt { file } => fmt(&file),
        Command::Repl => repl(),
        Command::Build { file } => stub("build", &file),
        Command::Run { file } => stub("run", &file),
        Command::Doc { file } => stub("doc", &file),
        Command::Test { file } => stub("test", &file),
        Command::Clean => {
            println!("nothing to clean");
            Ok(())
        }
    }
}

fn check(path: &Path) -> Result<()> {
    let source = Source::read(path)?;
    let (_, errors) = source.parse();
    if errors.is_empty() {
        println!("{}: ok", source.name);
        return Ok(());
    }
    for error in &errors {
        eprintln!("{}:{error}", source.name);
    }
    bail!("{} error(s) in {}", errors.len(), source.name)
}

fn fmt(path: &Path) -> Result<()> {
    let source = Source::read(path)?;
    let (program, errors) = source.parse();
    for error in &errors {
        eprintln!("{}:{error}", source.name);
    }
    println!("{program}");
    Ok(())
}

fn stub(name: &str, path: &Path) -> Result<()> {
    let source = Source::read(path)?;
    let (_, errors) = source.parse();
    for error in &errors {
        eprintln!("{}:{error}", source.name);
    }
    bail!("`{name}` is not implemented yet")
}

/// Read-parse-print loop. The whole session is reparsed on every line so
/// operators registered by earlier lines stay in force.
fn repl() -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut session = String::new();
    let mut printed_statements = 0;
    let mut reported_errors = 0;

    loop {
        match editor.readline("org> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str())?;
                session.push_str(&line);
                if !line.trim_end().ends_with(';') {
                    session.push(';');
                }
                session.push('\n');

                let source = Source::from_string("<repl>", session.clone());
                let (program, errors) = source.parse();
                for error in errors.iter().skip(reported_errors) {
                    eprintln!("{error}");
                }
                reported_errors = errors.len();
                for statement in program.statements.iter().skip(printed_statements) {
                    println!("{statement}");
                }
                printed_statements = program.statements.len();
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
