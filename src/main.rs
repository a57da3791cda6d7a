//! ALF Edit CLI
//!
//! Usage:
//!   alf-edit [OPTIONS] <COMMAND>
//!
//! Reads a level file (or stdin), applies one edit and writes the result to
//! stdout.
//!
//! Options:
//!   -i, --input <FILE>   Level file (reads from stdin if not provided)
//!   -c, --config <FILE>  Edit configuration (TOML format)
//!   --no-simplify        Leave edited expressions unsimplified
//!   -h, --help           Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use alf_edit::{EditConfig, ExprError, TransformEdit, TransformError};

#[derive(Parser)]
#[command(name = "alf-edit")]
#[command(about = "Expression-aware transforms for ALF level files")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Edit configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Leave edited expressions unsimplified
    #[arg(long, global = true)]
    no_simplify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an expression to every x coordinate
    TranslateX {
        #[arg(allow_hyphen_values = true)]
        expr: String,
    },
    /// Add an expression to every y coordinate
    TranslateY {
        #[arg(allow_hyphen_values = true)]
        expr: String,
    },
    /// Add an expression to every z coordinate
    TranslateZ {
        #[arg(allow_hyphen_values = true)]
        expr: String,
    },
    /// Mirror across the line z = PIVOT
    MirrorX {
        #[arg(allow_hyphen_values = true)]
        pivot: Option<String>,
    },
    /// Mirror across the plane y = PIVOT
    MirrorY {
        #[arg(allow_hyphen_values = true)]
        pivot: Option<String>,
    },
    /// Mirror across the line x = PIVOT
    MirrorZ {
        #[arg(allow_hyphen_values = true)]
        pivot: Option<String>,
    },
    /// Rotate placed actors 90 degrees clockwise
    RotateCw {
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        x: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        z: String,
    },
    /// Rotate placed actors 90 degrees counterclockwise
    RotateCcw {
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        x: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        z: String,
    },
    /// Set an attribute to a value
    Set {
        attr: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
        /// Only touch elements with this name
        #[arg(long)]
        scope: Option<String>,
    },
    /// Set an attribute on the element with the given etag
    SetOnEtag {
        etag: String,
        attr: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Re-simplify every coordinate and dimension
    Simplify,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => match EditConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::from(1);
            }
        },
        None => EditConfig::default(),
    };
    let mut config = config.with_env_overrides();
    if cli.no_simplify {
        config = config.with_simplify_expressions(false);
    }

    // Read input
    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                return ExitCode::from(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    return ExitCode::from(1);
                }
            }
        }
    };

    match run(&cli.command, &source, config) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) if e.is_user_error() => {
            report_user_error(&e);
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!(error = %e, "internal error");
            ExitCode::from(2)
        }
    }
}

fn run(command: &Command, source: &str, config: EditConfig) -> Result<String, TransformError> {
    let edit = TransformEdit::new(config)?;
    match command {
        Command::TranslateX { expr } => edit.translate_x(source, expr),
        Command::TranslateY { expr } => edit.translate_y(source, expr),
        Command::TranslateZ { expr } => edit.translate_z(source, expr),
        Command::MirrorX { pivot } => edit.mirror_x(source, pivot.as_deref().unwrap_or("")),
        Command::MirrorY { pivot } => edit.mirror_y(source, pivot.as_deref().unwrap_or("")),
        Command::MirrorZ { pivot } => edit.mirror_z(source, pivot.as_deref().unwrap_or("")),
        Command::RotateCw { x, z } => edit.rotate_90_clockwise(source, x, z),
        Command::RotateCcw { x, z } => edit.rotate_90_counterclockwise(source, x, z),
        Command::Set { attr, value, scope } => edit.set(source, value, attr, scope.as_deref()),
        Command::SetOnEtag { etag, attr, value } => edit.set_on_etag(source, value, attr, etag),
        Command::Simplify => edit.simplify(source),
    }
}

fn report_user_error(err: &TransformError) {
    match err {
        TransformError::Simplify {
            expr,
            source: source @ ExprError::Syntax { span, .. },
        } if span.end <= expr.len() => {
            eprintln!("Error: cannot simplify expression");
            eprint!("{}", source.format(expr, "expression"));
        }
        _ => eprintln!("Error: {}", err),
    }
}
