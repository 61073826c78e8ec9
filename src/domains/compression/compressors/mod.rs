//! Compression backends, one per `PdfMethod`

pub mod baseline;
pub mod ghostscript;
pub mod process;
pub mod qpdf;
pub mod structural;

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::domains::settings::types::{LevelSettings, ToolPaths};
use super::types::{BackendError, BackendErrorKind, BackendResult, BackendSuccess, CompressionLevel, PdfMethod};

pub use baseline::BaselineBackend;
pub use ghostscript::GhostscriptBackend;
pub use qpdf::QpdfBackend;
pub use structural::StructuralBackend;

/// Common contract of every compression backend
#[async_trait]
pub trait PdfBackend: Send + Sync {
    fn method(&self) -> PdfMethod;

    /// Compress `input` into `output`. On failure nothing is left at `output`.
    async fn apply(&self, input: &Path, output: &Path) -> BackendResult;
}

/// One backend per method, wired from configuration
pub fn default_backends(
    tools: &ToolPaths,
    level: CompressionLevel,
    settings: &LevelSettings,
) -> Vec<Box<dyn PdfBackend>> {
    vec![
        Box::new(GhostscriptBackend::new(Some(tools.ghostscript_path.clone()), level, settings.clone())),
        Box::new(QpdfBackend::new(Some(tools.qpdf_path.clone()))),
        Box::new(StructuralBackend::new()),
        Box::new(BaselineBackend::new()),
    ]
}

/// Create the output directory and a temporary file beside `output`.
/// The temporary file is removed when dropped without being persisted.
pub(crate) fn staging_file(method: PdfMethod, output: &Path) -> Result<NamedTempFile, BackendError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| {
        BackendError::new(
            method,
            BackendErrorKind::Io,
            format!("Failed to create output directory {}: {}", dir.display(), e),
        )
    })?;

    tempfile::Builder::new()
        .prefix(".pdf_squeeze_")
        .suffix(".pdf")
        .tempfile_in(&dir)
        .map_err(|e| BackendError::new(method, BackendErrorKind::Io, format!("Failed to create temp file: {}", e)))
}

/// Move a finished staging file onto `output`. Empty results are rejected.
pub(crate) fn persist_output(method: PdfMethod, staged: NamedTempFile, output: &Path) -> BackendResult {
    let size = std::fs::metadata(staged.path())
        .map_err(|e| BackendError::new(method, BackendErrorKind::Io, format!("Failed to stat result: {}", e)))?
        .len();
    if size == 0 {
        return Err(BackendError::new(method, BackendErrorKind::Io, "produced an empty file"));
    }

    staged.persist(output).map_err(|e| {
        BackendError::new(
            method,
            BackendErrorKind::Io,
            format!("Failed to move result to {}: {}", output.display(), e.error),
        )
    })?;
    Ok(BackendSuccess { method })
}

/// Run CPU-bound library work off the async runtime
pub(crate) async fn run_blocking<F>(method: PdfMethod, work: F) -> BackendResult
where
    F: FnOnce() -> BackendResult + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BackendError::new(method, BackendErrorKind::Library, format!("Task join error: {}", e)))?
}

/// Path argument for an external tool. Relative paths starting with '-'
/// would be read as options.
pub(crate) fn path_arg(path: &Path) -> OsString {
    if path.as_os_str().to_string_lossy().starts_with('-') {
        Path::new(".").join(path).into_os_string()
    } else {
        path.as_os_str().to_os_string()
    }
}
