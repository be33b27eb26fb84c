//! PEM archive encoder
//!
//! Writes the collected artifacts as named entries under a top-level
//! directory named after the export target: `<name>/ca.pem`,
//! `<name>/cert.pem` (leaf-first chain), `<name>/key.pem`.

use crate::error::Result;
use crate::export::archive::TgzWriter;
use crate::export::Artifacts;
use std::io::Write;

pub(crate) fn write_archive(sink: Box<dyn Write>, name: &str, artifacts: &Artifacts) -> Result<()> {
    let mut writer = TgzWriter::new(sink);
    if let Some(ca) = &artifacts.ca_pem {
        writer.append(&format!("{name}/ca.pem"), ca, 0o644)?;
    }
    if let Some(chain) = &artifacts.chain_pem {
        writer.append(&format!("{name}/cert.pem"), chain, 0o644)?;
    }
    if let Some(key) = &artifacts.key_pem {
        writer.append(&format!("{name}/key.pem"), key, 0o600)?;
    }
    writer.finish()
}
