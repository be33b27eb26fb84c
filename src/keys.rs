//! Private key loading and re-encryption
//!
//! Supports RSA, EC P-256, and EC P-384 keys in PKCS#8 (plain and PBES2
//! encrypted), PKCS#1, and SEC1 PEM encodings. Key bytes are never altered;
//! only the protective PKCS#8 wrapper changes when a key is re-emitted under
//! a different output password.

use crate::error::{CertTreeError, KeyError, Result};
use pkcs8::{DecodePrivateKey, EncodePrivateKey, EncryptedPrivateKeyInfo, LineEnding};
use rand_core::OsRng;
use std::path::Path;
use tracing::debug;

/// A loaded private key.
#[derive(Debug)]
pub enum PrivateKey {
    Rsa(rsa::RsaPrivateKey),
    EcP256(p256::SecretKey),
    EcP384(p384::SecretKey),
}

impl PrivateKey {
    pub fn key_type(&self) -> &'static str {
        match self {
            PrivateKey::Rsa(_) => "RSA",
            PrivateKey::EcP256(_) => "EC P-256",
            PrivateKey::EcP384(_) => "EC P-384",
        }
    }

    /// Serialize the key as PKCS#8 PEM, encrypted when an output password is
    /// supplied and unencrypted otherwise.
    pub fn to_pem(&self, password: Option<&str>) -> Result<Vec<u8>> {
        let pem = match password {
            Some(password) => match self {
                PrivateKey::Rsa(key) => {
                    key.to_pkcs8_encrypted_pem(OsRng, password.as_bytes(), LineEnding::LF)
                }
                PrivateKey::EcP256(key) => {
                    key.to_pkcs8_encrypted_pem(OsRng, password.as_bytes(), LineEnding::LF)
                }
                PrivateKey::EcP384(key) => {
                    key.to_pkcs8_encrypted_pem(OsRng, password.as_bytes(), LineEnding::LF)
                }
            },
            None => match self {
                PrivateKey::Rsa(key) => key.to_pkcs8_pem(LineEnding::LF),
                PrivateKey::EcP256(key) => key.to_pkcs8_pem(LineEnding::LF),
                PrivateKey::EcP384(key) => key.to_pkcs8_pem(LineEnding::LF),
            },
        }
        .map_err(|e| KeyError::Encryption {
            message: e.to_string(),
        })?;
        Ok(pem.as_bytes().to_vec())
    }
}

/// Load a private key from `path`, decrypting with `password` if the on-disk
/// key is encrypted.
pub fn load_key(path: &Path, password: Option<&str>) -> Result<PrivateKey> {
    let data = std::fs::read(path)?;
    let display = path.display().to_string();

    let blocks = pem::parse_many(&data).map_err(|e| KeyError::Unsupported {
        path: display.clone(),
        message: format!("failed to parse PEM: {e}"),
    })?;

    for block in &blocks {
        match block.tag() {
            "ENCRYPTED PRIVATE KEY" => {
                let password = password.ok_or_else(|| KeyError::PasswordRequired {
                    path: display.clone(),
                })?;
                return decrypt_pkcs8(block.contents(), password, &display);
            }
            "PRIVATE KEY" => {
                let key = parse_pkcs8_der(block.contents(), &display)?;
                if password.is_some() {
                    let path_str = display.as_str();
                    debug!("{path_str} is not encrypted, ignoring input password");
                }
                return Ok(key);
            }
            "RSA PRIVATE KEY" => {
                use rsa::pkcs1::DecodeRsaPrivateKey;
                let key = rsa::RsaPrivateKey::from_pkcs1_der(block.contents()).map_err(|e| {
                    KeyError::Unsupported {
                        path: display.clone(),
                        message: format!("failed to parse PKCS#1 RSA key: {e}"),
                    }
                })?;
                return Ok(PrivateKey::Rsa(key));
            }
            "EC PRIVATE KEY" => {
                return parse_sec1_der(block.contents(), &display);
            }
            _ => continue,
        }
    }

    Err(KeyError::Unsupported {
        path: display,
        message: "no recognized private key block found".to_string(),
    }
    .into())
}

/// Decrypt a PBES2-encrypted PKCS#8 container and parse the inner key.
fn decrypt_pkcs8(der: &[u8], password: &str, display: &str) -> Result<PrivateKey> {
    let info =
        EncryptedPrivateKeyInfo::try_from(der).map_err(|e| KeyError::Unsupported {
            path: display.to_string(),
            message: format!("invalid encrypted PKCS#8 structure: {e}"),
        })?;
    let document = info
        .decrypt(password)
        .map_err(|e| KeyError::Decryption {
            path: display.to_string(),
            message: e.to_string(),
        })?;
    parse_pkcs8_der(document.as_bytes(), display)
}

/// Parse a plain PKCS#8 DER key, trying RSA, then EC P-256, then EC P-384.
fn parse_pkcs8_der(der: &[u8], display: &str) -> Result<PrivateKey> {
    if let Ok(key) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
        return Ok(PrivateKey::Rsa(key));
    }
    if let Ok(key) = p256::SecretKey::from_pkcs8_der(der) {
        return Ok(PrivateKey::EcP256(key));
    }
    if let Ok(key) = p384::SecretKey::from_pkcs8_der(der) {
        return Ok(PrivateKey::EcP384(key));
    }
    Err(CertTreeError::Key(KeyError::Unsupported {
        path: display.to_string(),
        message: "unsupported key type in PKCS#8 container".to_string(),
    }))
}

/// Parse a SEC1 EC private key (P-256 or P-384).
fn parse_sec1_der(der: &[u8], display: &str) -> Result<PrivateKey> {
    if let Ok(key) = p256::SecretKey::from_sec1_der(der) {
        return Ok(PrivateKey::EcP256(key));
    }
    if let Ok(key) = p384::SecretKey::from_sec1_der(der) {
        return Ok(PrivateKey::EcP384(key));
    }
    Err(CertTreeError::Key(KeyError::Unsupported {
        path: display.to_string(),
        message: "unsupported EC curve (only P-256 and P-384 are supported)".to_string(),
    }))
}
