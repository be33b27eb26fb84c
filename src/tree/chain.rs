//! Chain walking
//!
//! Produces the ordered certificate sequence for a node by walking parent
//! directories up to the tree-root sentinel. Ordering is leaf-first: the
//! end-entity certificate precedes its issuers, which downstream chain
//! validation depends on.

use crate::certs;
use crate::error::Result;
use crate::tree::node::Node;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compute the leaf-first list of certificate file paths for `path`.
///
/// Pure path computation: `<p>/<basename(p)>.pem` for `p`, `parent(p)`, …
/// until the component-less root sentinel is reached.
pub fn chain_cert_paths(path: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut node = Node::new(path);
    while let Some(cert_path) = node.certificate_path() {
        paths.push(cert_path);
        node = match node.parent() {
            Some(parent) => parent,
            None => break,
        };
    }
    paths
}

/// Read and concatenate the certificate chain for `path`, leaf-first.
///
/// Any unreadable or malformed certificate aborts the whole walk; a partial
/// chain is never returned.
pub fn collect_chain(path: &Path) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    for cert_path in chain_cert_paths(path) {
        debug!("adding {} to chain", cert_path.display());
        data.extend_from_slice(&certs::read_certificate(&cert_path)?);
    }
    Ok(data)
}
