//! Certificate tree model
//!
//! A certificate tree is a directory hierarchy where each directory is a CA
//! or end-entity node named after its own identity. A node directory `X`
//! holds `X.pem` (certificate) and optionally `X-key.pem` (private key);
//! child directories are entities signed by `X`.

pub mod chain;
pub mod node;

pub use chain::{chain_cert_paths, collect_chain};
pub use node::{resolve_file, Node, PathKind, PathProbe, RealFs};
