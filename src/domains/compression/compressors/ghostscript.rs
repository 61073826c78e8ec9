//! PDF compression through Ghostscript's pdfwrite device

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use crate::domains::compression::types::{BackendError, BackendErrorKind, BackendResult, CompressionLevel, PdfMethod};
use crate::domains::settings::types::LevelSettings;
use super::process::{run_tool, ToolRunError};
use super::{path_arg, persist_output, staging_file, PdfBackend};

pub const GHOSTSCRIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Re-renders the document, resampling images per the level's profile
pub struct GhostscriptBackend {
    ghostscript_path: String,
    level: CompressionLevel,
    settings: LevelSettings,
}

impl GhostscriptBackend {
    pub fn new(ghostscript_path: Option<String>, level: CompressionLevel, settings: LevelSettings) -> Self {
        Self {
            ghostscript_path: ghostscript_path.unwrap_or_else(|| "gs".to_string()),
            level,
            settings,
        }
    }

    pub fn build_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-sDEVICE=pdfwrite".into(),
            "-dCompatibilityLevel=1.4".into(),
            format!("-dPDFSETTINGS=/{}", self.settings.preset_name).into(),
            "-dNOPAUSE".into(),
            "-dQUIET".into(),
            "-dBATCH".into(),
        ];

        if self.level.overrides_image_settings() {
            let dpi = self.settings.image_resolution;
            args.extend(
                [
                    format!("-dColorImageResolution={}", dpi),
                    format!("-dGrayImageResolution={}", dpi),
                    format!("-dMonoImageResolution={}", dpi),
                    "-dColorImageDownsampleType=/Bicubic".to_string(),
                    "-dGrayImageDownsampleType=/Bicubic".to_string(),
                    "-dMonoImageDownsampleType=/Bicubic".to_string(),
                    "-dColorImageDownsampleThreshold=1.0".to_string(),
                    "-dGrayImageDownsampleThreshold=1.0".to_string(),
                    "-dOptimize=true".to_string(),
                    "-dEmbedAllFonts=true".to_string(),
                ]
                .into_iter()
                .map(OsString::from),
            );
        }

        args.push(output_file_arg(output));
        args.push(path_arg(input));
        args
    }
}

/// `%` in an output name is a page-number template to Ghostscript
fn output_file_arg(output: &Path) -> OsString {
    let mut arg = OsString::from("-sOutputFile=");
    match output.to_str() {
        Some(name) => arg.push(name.replace('%', "%%")),
        None => arg.push(output.as_os_str()),
    }
    arg
}

#[async_trait]
impl PdfBackend for GhostscriptBackend {
    fn method(&self) -> PdfMethod {
        PdfMethod::Ghostscript
    }

    async fn apply(&self, input: &Path, output: &Path) -> BackendResult {
        let method = self.method();
        let staged = staging_file(method, output)?;
        let args = self.build_args(input, staged.path());

        let result = run_tool(&self.ghostscript_path, &args, GHOSTSCRIPT_TIMEOUT)
            .await
            .map_err(|e| match e {
                ToolRunError::Timeout { .. } => BackendError::new(method, BackendErrorKind::Timeout, e.to_string()),
                _ => BackendError::new(method, BackendErrorKind::Spawn, e.to_string()),
            })?;

        if !result.success {
            return Err(BackendError::new(
                method,
                BackendErrorKind::NonZeroExit,
                format!("Ghostscript error, {}", result.failure_summary()),
            ));
        }

        persist_output(method, staged, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn backend(level: CompressionLevel) -> GhostscriptBackend {
        GhostscriptBackend::new(None, level, LevelSettings::defaults_for(level))
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_low_level_uses_preset_only() {
        let args = strings(&backend(CompressionLevel::Low).build_args(Path::new("in.pdf"), Path::new("out.pdf")));
        assert_eq!(
            args,
            vec![
                "-sDEVICE=pdfwrite",
                "-dCompatibilityLevel=1.4",
                "-dPDFSETTINGS=/printer",
                "-dNOPAUSE",
                "-dQUIET",
                "-dBATCH",
                "-sOutputFile=out.pdf",
                "in.pdf",
            ]
        );
    }

    #[test]
    fn test_high_level_overrides_images() {
        let args = strings(&backend(CompressionLevel::High).build_args(Path::new("in.pdf"), Path::new("out.pdf")));
        assert!(args.contains(&"-dPDFSETTINGS=/screen".to_string()));
        assert!(args.contains(&"-dColorImageResolution=72".to_string()));
        assert!(args.contains(&"-dMonoImageDownsampleType=/Bicubic".to_string()));
        assert!(args.contains(&"-dEmbedAllFonts=true".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("in.pdf"));
    }

    #[test]
    fn test_percent_in_output_name_is_escaped() {
        let args = strings(&backend(CompressionLevel::Low).build_args(Path::new("in.pdf"), Path::new("100%.pdf")));
        assert!(args.contains(&"-sOutputFile=100%%.pdf".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_failure() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let backend = GhostscriptBackend::new(
            Some("/nonexistent/gs".to_string()),
            CompressionLevel::Medium,
            LevelSettings::defaults_for(CompressionLevel::Medium),
        );

        let error = backend.apply(&dir.path().join("in.pdf"), &output).await.unwrap_err();
        assert_eq!(error.kind, BackendErrorKind::Spawn);
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
