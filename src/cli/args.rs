//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "certtree")]
#[command(version)]
#[command(about = "Export certificate chains and keys from a filesystem PKI tree", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Certificate tree root directory
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Output extra debugging information
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a certificate chain, key, or CA bundle from the tree
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Path of the certificate or CA node to export
    #[arg(required = true, value_name = "PATH")]
    pub path: PathBuf,

    /// Export the certificate chain
    #[arg(long)]
    pub cert: bool,

    /// Export the private key
    #[arg(long)]
    pub key: bool,

    /// Include an external CA certificate (file or node directory)
    #[arg(long, value_name = "PATH")]
    pub ca: Option<PathBuf>,

    /// Shortcut for --cert --key, plus --ca with --all=PATH
    #[arg(long, value_name = "PATH", num_args = 0..=1, require_equals = true)]
    pub all: Option<Option<PathBuf>>,

    /// Output container format
    #[arg(long, value_enum, default_value = "pem", ignore_case = true)]
    pub format: ExportFormat,

    /// Existing private key password (required if the key is encrypted)
    #[arg(long, value_name = "PASSWORD")]
    pub pass_in: Option<String>,

    /// Password for the exported private key (required for p12)
    #[arg(long, value_name = "PASSWORD")]
    pub pass_out: Option<String>,

    /// Write the bundle to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    /// Build the export request, folding the --all shortcut into the
    /// individual artifact flags.
    pub fn to_request(&self) -> crate::export::ExportRequest {
        let mut request = crate::export::ExportRequest {
            path: self.path.clone(),
            certificates: self.cert,
            key: self.key,
            ca: self.ca.clone(),
            format: self.format,
            pass_in: self.pass_in.clone(),
            pass_out: self.pass_out.clone(),
        };
        if let Some(ca) = &self.all {
            request.certificates = true;
            request.key = true;
            if let Some(path) = ca {
                request.ca = Some(path.clone());
            }
        }
        request
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Gzipped tar archive of PEM entries
    Pem,
    /// Binary PKCS#12 container
    P12,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Pem => write!(f, "pem"),
            ExportFormat::P12 => write!(f, "p12"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shortcut_enables_cert_and_key() {
        let cli = Cli::parse_from(["certtree", "export", "--all", "ca/leaf"]);
        let Commands::Export(args) = cli.command;
        let request = args.to_request();
        assert!(request.certificates);
        assert!(request.key);
        assert!(request.ca.is_none());
    }

    #[test]
    fn test_all_shortcut_with_ca_path() {
        let cli = Cli::parse_from(["certtree", "export", "--all=other-ca", "ca/leaf"]);
        let Commands::Export(args) = cli.command;
        let request = args.to_request();
        assert!(request.certificates);
        assert!(request.key);
        assert_eq!(request.ca, Some(PathBuf::from("other-ca")));
    }

    #[test]
    fn test_format_is_case_insensitive() {
        let cli = Cli::parse_from(["certtree", "export", "--format", "P12", "ca/leaf"]);
        let Commands::Export(args) = cli.command;
        assert_eq!(args.format, ExportFormat::P12);
    }

    #[test]
    fn test_passwords_default_to_absent() {
        let cli = Cli::parse_from(["certtree", "export", "--cert", "ca/leaf"]);
        let Commands::Export(args) = cli.command;
        assert!(args.pass_in.is_none());
        assert!(args.pass_out.is_none());
    }
}
