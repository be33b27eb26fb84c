//! Certificate file reading
//!
//! Reads PEM certificate files from the tree and re-emits them in canonical
//! form. Every certificate must parse as DER X.509 before it is accepted.

use crate::error::{CertTreeError, Result, TreeError};
use ::pem::{EncodeConfig, LineEnding, Pem};
use std::path::Path;
use x509_parser::prelude::*;

fn encode_config() -> EncodeConfig {
    EncodeConfig::new().set_line_ending(LineEnding::LF)
}

/// Read a certificate file and return its CERTIFICATE block(s) as canonical
/// PEM bytes.
///
/// Non-certificate PEM blocks (e.g. a key sharing the file) are dropped. A
/// file with no CERTIFICATE block, or with contents that do not parse as
/// X.509, is malformed.
pub fn read_certificate(path: &Path) -> Result<Vec<u8>> {
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CertTreeError::Tree(TreeError::NotFound {
                path: path.display().to_string(),
            })
        } else {
            CertTreeError::Io(e)
        }
    })?;

    let blocks = ::pem::parse_many(&data).map_err(|e| TreeError::MalformedCertificate {
        path: path.display().to_string(),
        message: format!("failed to parse PEM: {e}"),
    })?;

    let certs: Vec<&Pem> = blocks.iter().filter(|p| p.tag() == "CERTIFICATE").collect();
    if certs.is_empty() {
        return Err(TreeError::MalformedCertificate {
            path: path.display().to_string(),
            message: "no CERTIFICATE block found".to_string(),
        }
        .into());
    }

    let mut out = Vec::new();
    for block in certs {
        X509Certificate::from_der(block.contents()).map_err(|e| {
            TreeError::MalformedCertificate {
                path: path.display().to_string(),
                message: format!("not a valid X.509 certificate: {e:?}"),
            }
        })?;
        out.extend_from_slice(::pem::encode_config(block, encode_config()).as_bytes());
    }
    Ok(out)
}
