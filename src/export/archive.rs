//! Gzipped tar output
//!
//! Thin writer over `tar` + `flate2` for the archive export format. Entries
//! carry explicit mode bits; key material is written owner-read/write only.

use crate::error::{ExportError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use tar::{Builder, Header};

/// Streaming gzipped tar writer over an export sink.
pub struct TgzWriter<W: Write> {
    builder: Builder<GzEncoder<W>>,
}

impl<W: Write> TgzWriter<W> {
    pub fn new(sink: W) -> Self {
        let encoder = GzEncoder::new(sink, Compression::default());
        TgzWriter {
            builder: Builder::new(encoder),
        }
    }

    /// Append a regular-file entry with the given mode bits.
    pub fn append(&mut self, name: &str, data: &[u8], mode: u32) -> Result<()> {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        self.builder
            .append_data(&mut header, name, data)
            .map_err(|e| {
                ExportError::Write {
                    target: format!("archive entry {name}"),
                    message: e.to_string(),
                }
                .into()
            })
    }

    /// Finish the archive and the gzip stream, then flush the sink.
    pub fn finish(self) -> Result<()> {
        let write_err = |e: std::io::Error| ExportError::Write {
            target: "export archive".to_string(),
            message: e.to_string(),
        };
        let encoder = self.builder.into_inner().map_err(write_err)?;
        let mut sink = encoder.finish().map_err(write_err)?;
        sink.flush().map_err(write_err)?;
        Ok(())
    }
}
