//! certtree library
//!
//! Manages a filesystem-resident hierarchical PKI: a directory tree where
//! each directory is a CA or end-entity node named after its own identity,
//! holding `<name>.pem` and optionally `<name>-key.pem`. The library
//! provides:
//! - Tree path resolution and leaf-first chain walking
//! - Private key loading with PKCS#8 re-encryption under a new password
//! - Export bundling as a gzipped tar of PEM entries or a PKCS#12 container
//!
//! # Usage
//!
//! ```rust,ignore
//! use certtree::cli::ExportFormat;
//! use certtree::export::{self, ExportRequest};
//!
//! let request = ExportRequest {
//!     path: "root/intermediate/leaf".into(),
//!     certificates: true,
//!     key: false,
//!     ca: None,
//!     format: ExportFormat::Pem,
//!     pass_in: None,
//!     pass_out: None,
//! };
//! export::run(&request, Box::new(std::io::stdout()))?;
//! ```

pub mod certs;
pub mod cli;
pub mod error;
pub mod export;
pub mod keys;
pub mod tree;

// Re-export commonly used types
pub use cli::Cli;
pub use error::{CertTreeError, Result};
pub use export::ExportRequest;
