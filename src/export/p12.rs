//! PKCS#12 encoder
//!
//! Packages the certificate chain and the node's private key into a single
//! password-protected PKCS#12 container by invoking the external `openssl`
//! toolchain. The chain is staged in an owner-only temporary file which is
//! removed on every exit path; a failed removal is escalated, never ignored.

use crate::error::{ExportError, Result};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Inputs for one PKCS#12 packaging run.
pub struct Pkcs12Request<'a> {
    /// Friendly name for the bundled key and certificate.
    pub name: &'a str,
    /// Path to the node's private key file.
    pub key_path: &'a Path,
    /// Leaf-first PEM chain, with the external CA certificate appended when
    /// one was requested.
    pub chain_pem: &'a [u8],
    /// Password of the on-disk key, passed through to the toolchain.
    pub pass_in: Option<&'a str>,
    /// Password protecting the produced container.
    pub pass_out: &'a str,
}

/// Capability seam for PKCS#12 packaging, so orchestration can be exercised
/// against a double and the toolchain swapped without touching callers.
pub trait Pkcs12Packager {
    fn package(&self, request: &Pkcs12Request<'_>) -> Result<Vec<u8>>;
}

/// [`Pkcs12Packager`] backed by the `openssl pkcs12` command.
pub struct OpensslPackager {
    program: String,
}

impl OpensslPackager {
    pub fn new(program: impl Into<String>) -> Self {
        OpensslPackager {
            program: program.into(),
        }
    }
}

impl Default for OpensslPackager {
    fn default() -> Self {
        OpensslPackager::new("openssl")
    }
}

impl Pkcs12Packager for OpensslPackager {
    fn package(&self, request: &Pkcs12Request<'_>) -> Result<Vec<u8>> {
        info!("running {} to create the p12 container", self.program);

        // NamedTempFile is created 0600, so the staged chain is only ever
        // readable by the invoking user.
        let write_err = |target: String| {
            move |e: std::io::Error| ExportError::Write {
                target,
                message: e.to_string(),
            }
        };
        let mut bundle = NamedTempFile::new()
            .map_err(write_err("temporary certificate bundle".to_string()))?;
        let bundle_path = bundle.path().display().to_string();
        bundle
            .write_all(request.chain_pem)
            .map_err(write_err(bundle_path.clone()))?;
        bundle.flush().map_err(write_err(bundle_path.clone()))?;
        debug!("staged certificate chain in {bundle_path}");

        let mut command = Command::new(&self.program);
        command
            .arg("pkcs12")
            .arg("-export")
            .arg("-name")
            .arg(request.name)
            .arg("-inkey")
            .arg(request.key_path);
        if let Some(pass_in) = request.pass_in {
            command.arg("-passin").arg(format!("pass:{pass_in}"));
        }
        command
            .arg("-aes256")
            .arg("-passout")
            .arg(format!("pass:{}", request.pass_out))
            .arg("-in")
            .arg(bundle.path());

        let outcome = command.output();

        // The staged chain must be gone before the outcome is inspected, so
        // the temp file never outlives this call even when the toolchain
        // fails. Removal failure is a key-material leak and therefore fatal.
        bundle.close().map_err(write_err(bundle_path))?;

        let output = outcome.map_err(|e| ExportError::Subprocess {
            program: self.program.clone(),
            message: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(ExportError::Subprocess {
                program: self.program.clone(),
                message: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }
            .into());
        }
        Ok(output.stdout)
    }
}
