use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use crate::domains::compression::types::{BackendError, BackendErrorKind, BackendResult, PdfMethod};
use super::process::{run_tool, ToolOutput, ToolRunError};
use super::{path_arg, persist_output, staging_file, PdfBackend};

pub const QPDF_TIMEOUT: Duration = Duration::from_secs(180);

/// qpdf exits with 3 when it wrote the file but reported warnings
const EXIT_WARNINGS: i32 = 3;
const WARNINGS_MARKER: &str = "operation succeeded with warnings";

/// Lossless structural rewrite: linearize and recompress every stream
pub struct QpdfBackend {
    qpdf_path: String,
}

impl QpdfBackend {
    pub fn new(qpdf_path: Option<String>) -> Self {
        Self {
            qpdf_path: qpdf_path.unwrap_or_else(|| "qpdf".to_string()),
        }
    }

    pub fn build_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "--linearize".into(),
            "--compress-streams=y".into(),
            "--recompress-flate".into(),
            "--compression-level=9".into(),
            path_arg(input),
            path_arg(output),
        ]
    }
}

fn succeeded(output: &ToolOutput) -> bool {
    output.success
        || output.status_code == Some(EXIT_WARNINGS)
        || output.stderr.contains(WARNINGS_MARKER)
}

#[async_trait]
impl PdfBackend for QpdfBackend {
    fn method(&self) -> PdfMethod {
        PdfMethod::Qpdf
    }

    async fn apply(&self, input: &Path, output: &Path) -> BackendResult {
        let method = self.method();
        let staged = staging_file(method, output)?;
        let args = self.build_args(input, staged.path());

        let result = run_tool(&self.qpdf_path, &args, QPDF_TIMEOUT)
            .await
            .map_err(|e| match e {
                ToolRunError::Timeout { .. } => BackendError::new(method, BackendErrorKind::Timeout, e.to_string()),
                _ => BackendError::new(method, BackendErrorKind::Spawn, e.to_string()),
            })?;

        if !succeeded(&result) {
            return Err(BackendError::new(
                method,
                BackendErrorKind::NonZeroExit,
                format!("QPDF error, {}", result.failure_summary()),
            ));
        }
        if !result.success {
            log::debug!("qpdf finished {} with warnings: {}", input.display(), result.stderr.trim());
        }

        persist_output(method, staged, output)
    }
}
