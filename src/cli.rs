//! The pegma command-line interface.
//!
//! Thin orchestration over the library: read a grammar file, run the parser,
//! and present the outcome. Diagnostics are rendered compiler-style with a
//! source line and caret, colorized when the stream supports it.

use std::io::Write as _;
use std::{fs, path::Path, path::PathBuf, process};

use clap::{Parser, Subcommand};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{Cursor, Grammar, GrammarError, SyntaxError};

/// Exit code for malformed input.
const EXIT_SYNTAX: i32 = 1;
/// Exit code for an internal invariant violation.
const EXIT_INTERNAL: i32 = 2;

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "pegma",
    version,
    about = "Tools for the pegma grammar-definition language."
)]
pub struct PegmaArgs {
    #[command(subcommand)]
    pub command: ArgsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Parse a grammar file and report every syntax error found.
    Check {
        /// The grammar file to check.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Parse a grammar file and print its canonical rendering.
    Format {
        /// The grammar file to format.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Print the parsed rule tree as JSON.
    Ast {
        /// The grammar file to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = PegmaArgs::parse();

    match args.command {
        ArgsCommand::Check { file } => {
            let source = read_file_or_exit(&file);
            match Grammar::parse(&source) {
                Ok(_) => println!("{}: ok", file.display()),
                Err(error) => report_failure(&error, &source),
            }
        }

        ArgsCommand::Format { file } => {
            let source = read_file_or_exit(&file);
            match Grammar::parse(&source) {
                Ok(grammar) => print!("{grammar}"),
                Err(error) => report_failure(&error, &source),
            }
        }

        ArgsCommand::Ast { file } => {
            let source = read_file_or_exit(&file);
            match Grammar::parse(&source) {
                Ok(grammar) => match serde_json::to_string_pretty(&grammar) {
                    Ok(json) => println!("{json}"),
                    Err(error) => {
                        eprintln!("error: failed to serialize tree: {error}");
                        process::exit(EXIT_INTERNAL);
                    }
                },
                Err(error) => report_failure(&error, &source),
            }
        }
    }
}

fn read_file_or_exit(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|error| {
        eprintln!("error: could not read '{}': {}", path.display(), error);
        process::exit(EXIT_SYNTAX);
    })
}

fn report_failure(error: &GrammarError, source: &str) -> ! {
    match error {
        GrammarError::Syntax(diagnostics) => {
            let mut stderr = StandardStream::stderr(ColorChoice::Auto);
            let cursor = Cursor::new(source);
            for diagnostic in diagnostics {
                // Presentation only; a failed write to stderr is not worth
                // masking the exit code over.
                let _ = print_diagnostic(&mut stderr, diagnostic, &cursor);
            }
            eprintln!(
                "{} error{} found",
                diagnostics.len(),
                if diagnostics.len() == 1 { "" } else { "s" }
            );
            process::exit(EXIT_SYNTAX);
        }
        GrammarError::Internal(internal) => {
            eprintln!("{internal}");
            process::exit(EXIT_INTERNAL);
        }
    }
}

// ============================================================================
// DIAGNOSTIC PRESENTATION
// ============================================================================

/// Prints one diagnostic with the offending source line and a caret under
/// the reported column.
fn print_diagnostic(
    stderr: &mut StandardStream,
    diagnostic: &SyntaxError,
    cursor: &Cursor,
) -> std::io::Result<()> {
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(stderr, "error")?;
    stderr.reset()?;
    writeln!(
        stderr,
        ": {} [{}:{}]",
        diagnostic.message, diagnostic.line, diagnostic.column
    )?;

    let Some(line_text) = cursor.line_text(diagnostic.line) else {
        return Ok(());
    };
    let gutter = diagnostic.line.to_string().len().max(3);
    writeln!(stderr, "{:>gutter$} |", "")?;
    writeln!(stderr, "{:>gutter$} | {}", diagnostic.line, line_text)?;
    writeln!(
        stderr,
        "{:>gutter$} | {}^",
        "",
        " ".repeat(diagnostic.column.saturating_sub(1))
    )?;
    Ok(())
}
