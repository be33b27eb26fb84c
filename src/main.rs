//! certtree - filesystem PKI tree export tool
//!
//! Walks a directory-structured certificate tree and exports certificate
//! chains, private keys, and CA certificates as portable bundles.

use certtree::cli::{Cli, Commands};
use certtree::error::{ExportError, Result, TreeError};
use certtree::export;
use clap::Parser;
use console::style;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Initialize logging; diagnostics go to stderr so stdout stays a clean
    // payload stream.
    let default_filter = if cli.debug { "certtree=debug" } else { "certtree=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export(args) => {
            // Resolve --output against the invocation directory before
            // changing into the tree root.
            let output = match &args.output {
                Some(path) if path.is_relative() => Some(std::env::current_dir()?.join(path)),
                other => other.clone(),
            };
            enter_root(&cli.root)?;
            let request = args.to_request();
            let sink = open_sink(output.as_deref())?;
            export::run(&request, sink)
        }
    }
}

/// Change into the tree root so node paths resolve relative to it.
fn enter_root(root: &Path) -> Result<()> {
    let root = root.canonicalize().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            certtree::CertTreeError::Tree(TreeError::NotFound {
                path: root.display().to_string(),
            })
        } else {
            certtree::CertTreeError::Io(e)
        }
    })?;
    std::env::set_current_dir(&root)?;
    debug!("using root directory {}", root.display());
    Ok(())
}

/// Open the export sink: the given file, or stdout.
fn open_sink(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| ExportError::Write {
                target: path.display().to_string(),
                message: e.to_string(),
            })?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(std::io::stdout())),
    }
}
