//! Export orchestration
//!
//! Drives one export request end-to-end: validate the request, resolve the
//! external CA reference, collect the certificate chain and key material,
//! then hand everything to exactly one encoder. Validation and collection
//! failures abort before a single output byte is written.

pub mod archive;
pub mod p12;
mod pem;

use crate::cli::ExportFormat;
use crate::error::{ExportError, Result, TreeError};
use crate::keys;
use crate::tree::{self, resolve_file, Node, PathKind, PathProbe, RealFs};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use p12::{OpensslPackager, Pkcs12Packager, Pkcs12Request};

/// A resolved export request.
pub struct ExportRequest {
    /// Tree path of the certificate or CA to export.
    pub path: PathBuf,
    /// Include the leaf-first certificate chain.
    pub certificates: bool,
    /// Include the node's private key.
    pub key: bool,
    /// External CA certificate to include, as a file or node directory path.
    pub ca: Option<PathBuf>,
    /// Output container format.
    pub format: ExportFormat,
    /// Password of the on-disk private key, if it is encrypted.
    pub pass_in: Option<String>,
    /// Password for the exported private key; `None` exports unencrypted
    /// (archive format only).
    pub pass_out: Option<String>,
}

/// Artifacts gathered during the collecting phase.
#[derive(Default)]
pub(crate) struct Artifacts {
    pub ca_pem: Option<Vec<u8>>,
    pub chain_pem: Option<Vec<u8>>,
    pub key_pem: Option<Vec<u8>>,
}

/// Run an export request against the default toolchain, writing the bundle
/// to `sink`.
pub fn run(request: &ExportRequest, sink: Box<dyn Write>) -> Result<()> {
    run_with(request, sink, &OpensslPackager::default())
}

/// Run an export request with an explicit PKCS#12 packager.
pub fn run_with(
    request: &ExportRequest,
    sink: Box<dyn Write>,
    packager: &dyn Pkcs12Packager,
) -> Result<()> {
    info!("exporting {}", request.path.display());

    let node = Node::new(&request.path);
    let name = node.name().ok_or_else(|| TreeError::InvalidStructure {
        message: format!("{} has no name component", request.path.display()),
    })?;

    // Resolving: flag validation comes first so a misconfigured request is
    // rejected before any file I/O happens.
    if request.format == ExportFormat::P12 && request.pass_out.is_none() {
        return Err(ExportError::Configuration {
            message: "--pass-out is required for p12 exports".to_string(),
        }
        .into());
    }
    let ca_path = match &request.ca {
        Some(path) => Some(resolve_file(&RealFs, path, ".pem")?),
        None => None,
    };

    match request.format {
        ExportFormat::Pem => export_archive(request, &node, &name, ca_path.as_deref(), sink)?,
        ExportFormat::P12 => export_p12(request, &node, &name, ca_path.as_deref(), sink, packager)?,
    }

    info!("finished exporting {}", request.path.display());
    Ok(())
}

/// Collect and encode the archive-format bundle.
fn export_archive(
    request: &ExportRequest,
    node: &Node,
    name: &str,
    ca_path: Option<&Path>,
    sink: Box<dyn Write>,
) -> Result<()> {
    let mut artifacts = Artifacts::default();
    if let Some(ca_path) = ca_path {
        artifacts.ca_pem = Some(crate::certs::read_certificate(ca_path)?);
    }
    if request.certificates {
        artifacts.chain_pem = Some(tree::collect_chain(node.path())?);
    }
    if request.key {
        artifacts.key_pem = collect_key(node, request)?;
    }
    pem::write_archive(sink, name, &artifacts)
}

/// Load and re-encrypt the node's key, or skip when the node has no key file.
///
/// Intermediate CA nodes may legitimately hold only a certificate; the
/// archive encoder treats that as an expected absence rather than an error.
fn collect_key(node: &Node, request: &ExportRequest) -> Result<Option<Vec<u8>>> {
    let Some(key_path) = node.key_path() else {
        return Ok(None);
    };
    match RealFs.kind(&key_path) {
        None => {
            debug!("{} has no key file, skipping key export", node.path().display());
            Ok(None)
        }
        Some(PathKind::Directory) => Err(TreeError::InvalidStructure {
            message: format!("{} is a directory and not a file", key_path.display()),
        }
        .into()),
        Some(PathKind::File) => {
            let key = keys::load_key(&key_path, request.pass_in.as_deref())?;
            debug!("loaded {} key from {}", key.key_type(), key_path.display());
            Ok(Some(key.to_pem(request.pass_out.as_deref())?))
        }
    }
}

/// Collect the full chain and dispatch to the PKCS#12 packager.
fn export_p12(
    request: &ExportRequest,
    node: &Node,
    name: &str,
    ca_path: Option<&Path>,
    mut sink: Box<dyn Write>,
    packager: &dyn Pkcs12Packager,
) -> Result<()> {
    let pass_out = request.pass_out.as_deref().ok_or_else(|| {
        ExportError::Configuration {
            message: "--pass-out is required for p12 exports".to_string(),
        }
    })?;

    let mut chain_pem = tree::collect_chain(node.path())?;
    if let Some(ca_path) = ca_path {
        chain_pem.extend_from_slice(&crate::certs::read_certificate(ca_path)?);
    }
    let key_path = resolve_file(&RealFs, node.path(), "-key.pem")?;

    let data = packager.package(&Pkcs12Request {
        name,
        key_path: &key_path,
        chain_pem: &chain_pem,
        pass_in: request.pass_in.as_deref(),
        pass_out,
    })?;

    let write_err = |e: std::io::Error| ExportError::Write {
        target: "export sink".to_string(),
        message: e.to_string(),
    };
    sink.write_all(&data).map_err(write_err)?;
    sink.flush().map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CertTreeError;
    use rcgen::{CertificateParams, KeyPair};
    use std::cell::RefCell;
    use std::fs;
    use std::sync::{Mutex, MutexGuard};

    // Chain walking is relative to the tree root, so each test runs inside
    // its own tempdir; the lock keeps the shared process cwd consistent
    // across parallel tests.
    static CWD_LOCK: Mutex<()> = Mutex::new(());

    struct TreeRoot {
        _dir: tempfile::TempDir,
        _guard: MutexGuard<'static, ()>,
    }

    fn enter_tree_root() -> TreeRoot {
        let guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        TreeRoot {
            _dir: dir,
            _guard: guard,
        }
    }

    /// Packager double recording the requests it receives.
    struct RecordingPackager {
        calls: RefCell<Vec<(String, PathBuf, Vec<u8>, Option<String>, String)>>,
        response: Vec<u8>,
    }

    impl RecordingPackager {
        fn new(response: &[u8]) -> Self {
            RecordingPackager {
                calls: RefCell::new(Vec::new()),
                response: response.to_vec(),
            }
        }
    }

    impl Pkcs12Packager for RecordingPackager {
        fn package(&self, request: &Pkcs12Request<'_>) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push((
                request.name.to_string(),
                request.key_path.to_path_buf(),
                request.chain_pem.to_vec(),
                request.pass_in.map(str::to_string),
                request.pass_out.to_string(),
            ));
            Ok(self.response.clone())
        }
    }

    /// Shared writer so tests can inspect sink contents after `run_with`
    /// consumed the box.
    #[derive(Clone, Default)]
    struct SharedSink(std::rc::Rc<RefCell<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn write_node(tree_path: &str) -> PathBuf {
        let dir = PathBuf::from(tree_path);
        fs::create_dir_all(&dir).unwrap();
        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        let key = KeyPair::generate().unwrap();
        let cert = CertificateParams::new(vec![format!("{name}.example.com")])
            .unwrap()
            .self_signed(&key)
            .unwrap();
        fs::write(dir.join(format!("{name}.pem")), cert.pem()).unwrap();
        fs::write(dir.join(format!("{name}-key.pem")), key.serialize_pem()).unwrap();
        dir
    }

    fn request(path: PathBuf, format: ExportFormat) -> ExportRequest {
        ExportRequest {
            path,
            certificates: false,
            key: false,
            ca: None,
            format,
            pass_in: None,
            pass_out: None,
        }
    }

    #[test]
    fn test_p12_without_pass_out_is_rejected_before_packaging() {
        let _root = enter_tree_root();
        let leaf = write_node("root/leaf");
        let packager = RecordingPackager::new(b"p12");
        let sink = SharedSink::default();

        let mut req = request(leaf, ExportFormat::P12);
        req.key = true;
        let err = run_with(&req, Box::new(sink.clone()), &packager).unwrap_err();

        assert!(matches!(
            err,
            CertTreeError::Export(ExportError::Configuration { .. })
        ));
        assert!(packager.calls.borrow().is_empty());
        assert!(sink.0.borrow().is_empty());
    }

    #[test]
    fn test_p12_packages_chain_and_streams_result() {
        let _root = enter_tree_root();
        write_node("root");
        let leaf = write_node("root/leaf");
        let packager = RecordingPackager::new(b"p12 bytes");
        let sink = SharedSink::default();

        let mut req = request(leaf.clone(), ExportFormat::P12);
        req.pass_out = Some("secret".to_string());
        req.pass_in = Some("old".to_string());
        run_with(&req, Box::new(sink.clone()), &packager).unwrap();

        let calls = packager.calls.borrow();
        let (name, key_path, chain_pem, pass_in, pass_out) = &calls[0];
        assert_eq!(name, "leaf");
        assert_eq!(key_path, &leaf.join("leaf-key.pem"));
        assert_eq!(pass_in.as_deref(), Some("old"));
        assert_eq!(pass_out, "secret");

        // Chain is leaf-first: the leaf certificate bytes come before the
        // root certificate bytes.
        let leaf_pem = crate::certs::read_certificate(&leaf.join("leaf.pem")).unwrap();
        let root_pem = crate::certs::read_certificate(Path::new("root/root.pem")).unwrap();
        let mut expected = leaf_pem;
        expected.extend_from_slice(&root_pem);
        assert_eq!(chain_pem, &expected);

        assert_eq!(*sink.0.borrow(), b"p12 bytes");
    }

    #[test]
    fn test_p12_with_missing_key_file_fails() {
        let _root = enter_tree_root();
        let leaf = write_node("root/leaf");
        fs::remove_file(leaf.join("leaf-key.pem")).unwrap();
        let packager = RecordingPackager::new(b"p12");

        let mut req = request(leaf, ExportFormat::P12);
        req.pass_out = Some("secret".to_string());
        let err = run_with(&req, Box::new(SharedSink::default()), &packager).unwrap_err();

        assert!(matches!(err, CertTreeError::Tree(TreeError::NotFound { .. })));
        assert!(packager.calls.borrow().is_empty());
    }

    #[test]
    fn test_archive_skips_missing_key_file() {
        let _root = enter_tree_root();
        let leaf = write_node("root/leaf");
        fs::remove_file(leaf.join("leaf-key.pem")).unwrap();
        let sink = SharedSink::default();

        let mut req = request(leaf, ExportFormat::Pem);
        req.certificates = true;
        req.key = true;
        run_with(&req, Box::new(sink.clone()), &OpensslPackager::default()).unwrap();

        let bytes = sink.0.borrow().clone();
        let names = archive_entry_names(&bytes);
        assert_eq!(names, ["leaf/cert.pem"]);
    }

    #[test]
    fn test_archive_contains_requested_entries() {
        let _root = enter_tree_root();
        write_node("root");
        let leaf = write_node("root/leaf");
        let ca = write_node("other-ca");
        let sink = SharedSink::default();

        let mut req = request(leaf, ExportFormat::Pem);
        req.certificates = true;
        req.key = true;
        req.ca = Some(ca);
        run_with(&req, Box::new(sink.clone()), &OpensslPackager::default()).unwrap();

        let bytes = sink.0.borrow().clone();
        let names = archive_entry_names(&bytes);
        assert_eq!(names, ["leaf/ca.pem", "leaf/cert.pem", "leaf/key.pem"]);
    }

    #[test]
    fn test_missing_external_ca_aborts_before_output() {
        let _root = enter_tree_root();
        let leaf = write_node("root/leaf");
        let sink = SharedSink::default();

        let mut req = request(leaf, ExportFormat::Pem);
        req.certificates = true;
        req.ca = Some(PathBuf::from("no-such-ca"));
        let err =
            run_with(&req, Box::new(sink.clone()), &OpensslPackager::default()).unwrap_err();

        assert!(matches!(err, CertTreeError::Tree(TreeError::NotFound { .. })));
        assert!(sink.0.borrow().is_empty());
    }

    fn archive_entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(bytes));
        archive
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap().path().unwrap().display().to_string())
            .collect()
    }
}
