use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use apiref::config::{load_config, save_config, ResolverConfig};
use apiref::loader::load_document;
use apiref::resolution::resolve_document;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve `$ref` pointers in API description documents.
#[derive(Parser)]
#[command(name = "apiref", about = "Resolve $ref pointers in API description documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration for a project
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
    },
    /// Resolve a document and report unresolved references
    Resolve {
        /// Path to a JSON document
        file: PathBuf,
        /// Project path holding the configuration (default: current directory)
        #[arg(short, long)]
        project: Option<String>,
        /// Also report external references
        #[arg(short, long)]
        strict: bool,
        /// Output diagnostics as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when the document has unresolved references.
fn run(cli: Cli) -> apiref::errors::Result<bool> {
    match cli.command {
        Commands::Init { path } => {
            let project_path = resolve_path(path);
            save_config(&project_path, &ResolverConfig::default())?;
            println!("Initialized apiref config at {}", project_path.display());
            Ok(true)
        }
        Commands::Resolve {
            file,
            project,
            strict,
            json,
        } => {
            let project_path = resolve_path(project);
            let mut config = load_config(&project_path)?;
            config.strict |= strict;

            let mut document = load_document(&file)?;
            let diagnostics = resolve_document(&mut document, &config);

            if json {
                println!("{}", serde_json::to_string_pretty(&diagnostics)?);
            } else if diagnostics.is_empty() {
                println!("{}: all references resolved", file.display());
            } else {
                for diagnostic in &diagnostics {
                    println!("{}", diagnostic);
                }
                println!(
                    "\n{} unresolved reference(s) in {}",
                    diagnostics.len(),
                    file.display()
                );
            }
            Ok(diagnostics.is_empty())
        }
    }
}

/// Resolves an optional path argument, defaulting to the current directory.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
