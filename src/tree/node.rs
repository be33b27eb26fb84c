//! Tree nodes and conventional file resolution
//!
//! A node is identified by its path; the parent is recomputed from the path
//! on demand rather than held as a live reference. Filesystem lookups go
//! through the narrow [`PathProbe`] trait so resolution stays testable
//! without a real directory tree.

use crate::error::TreeError;
use std::fs;
use std::path::{Path, PathBuf};

/// What a path points at, as far as resolution is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

/// Minimal filesystem view used by path resolution.
pub trait PathProbe {
    /// Returns the kind of the entry at `path`, or `None` if nothing exists.
    fn kind(&self, path: &Path) -> Option<PathKind>;
}

/// [`PathProbe`] backed by the real filesystem.
pub struct RealFs;

impl PathProbe for RealFs {
    fn kind(&self, path: &Path) -> Option<PathKind> {
        fs::metadata(path).ok().map(|meta| {
            if meta.is_dir() {
                PathKind::Directory
            } else {
                PathKind::File
            }
        })
    }
}

/// A node of the certificate tree, identified by its canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    path: PathBuf,
}

impl Node {
    /// Create a node from a user-supplied path, dropping `.` components.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path: PathBuf = path
            .as_ref()
            .components()
            .filter(|c| !matches!(c, std::path::Component::CurDir))
            .collect();
        Node { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The node's identity: the final path component.
    ///
    /// `None` for the tree-root sentinel (a path with no final component,
    /// e.g. `/` or the empty relative path), which terminates chain walks.
    pub fn name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// The parent node, or `None` once the root sentinel is reached.
    pub fn parent(&self) -> Option<Node> {
        self.path.file_name()?;
        Some(Node::new(self.path.parent().unwrap_or_else(|| Path::new(""))))
    }

    /// Conventional certificate file path: `<path>/<name>.pem`.
    pub fn certificate_path(&self) -> Option<PathBuf> {
        self.name().map(|name| self.path.join(format!("{name}.pem")))
    }

    /// Conventional private key file path: `<path>/<name>-key.pem`.
    pub fn key_path(&self) -> Option<PathBuf> {
        self.name()
            .map(|name| self.path.join(format!("{name}-key.pem")))
    }
}

/// Resolve a certificate or key file from a path that may name either the
/// file itself or its node directory.
///
/// A regular-file `path` is returned unchanged. A directory `path` resolves
/// to `path/<basename>(path)<suffix>`, which must exist and must not itself
/// be a directory.
pub fn resolve_file(
    probe: &dyn PathProbe,
    path: &Path,
    suffix: &str,
) -> Result<PathBuf, TreeError> {
    let node = Node::new(path);
    match probe.kind(node.path()) {
        None => Err(TreeError::NotFound {
            path: node.path().display().to_string(),
        }),
        Some(PathKind::File) => Ok(node.path().to_path_buf()),
        Some(PathKind::Directory) => {
            let name = node.name().ok_or_else(|| TreeError::InvalidStructure {
                message: format!("{} has no name component", node.path().display()),
            })?;
            let composed = node.path().join(format!("{name}{suffix}"));
            match probe.kind(&composed) {
                None => Err(TreeError::NotFound {
                    path: composed.display().to_string(),
                }),
                Some(PathKind::Directory) => Err(TreeError::InvalidStructure {
                    message: format!("{} is a directory and not a file", composed.display()),
                }),
                Some(PathKind::File) => Ok(composed),
            }
        }
    }
}
