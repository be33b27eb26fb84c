//! Unified error types for certtree
//!
//! Every failure is a typed value propagated up the call chain with `?`;
//! only `main` terminates the process.

use thiserror::Error;

/// Top-level error type for certtree operations
#[derive(Error, Debug)]
pub enum CertTreeError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Certificate tree traversal and resolution errors
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("File or directory not found: {path}")]
    NotFound { path: String },

    #[error("Invalid tree structure: {message}")]
    InvalidStructure { message: String },

    #[error("Malformed certificate in {path}: {message}")]
    MalformedCertificate { path: String, message: String },
}

/// Private key loading and re-encryption errors
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Private key {path} is encrypted and no input password was supplied")]
    PasswordRequired { path: String },

    #[error("Failed to decrypt private key {path}: {message}")]
    Decryption { path: String, message: String },

    #[error("Unsupported private key in {path}: {message}")]
    Unsupported { path: String, message: String },

    #[error("Failed to encrypt private key for export: {message}")]
    Encryption { message: String },
}

/// Export orchestration and encoding errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("{program} invocation failed: {message}")]
    Subprocess { program: String, message: String },

    #[error("Failed to write {target}: {message}")]
    Write { target: String, message: String },
}

/// Result type alias using CertTreeError
pub type Result<T> = std::result::Result<T, CertTreeError>;
