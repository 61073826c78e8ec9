use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::domains::settings::types::{CompressorConfig, LevelSettings};
use crate::errors::{DomainError, DomainResult, ValidationError};
use super::analyzer::{analyze, check_integrity};
use super::compressors::{default_backends, PdfBackend};
use super::probe::probe;
use super::savings::{calculate_savings, SavingsReport};
use super::selector::{attempt_order, choose, SAFE_METHOD};
use super::types::{
    CompressionDisposition, CompressionLevel, CompressionReport, CompressionStage, CompressorInfo,
    LimitsInfo, PdfMethod, ToolAvailability,
};

const TOO_SMALL_MESSAGE: &str = "file too small to benefit from compression - copied unchanged";

/// Compresses single PDF files, falling back across methods until one works.
///
/// Configuration and tool availability are fixed at construction; `compress`
/// keeps no state between calls.
pub struct PdfCompressor {
    config: Arc<CompressorConfig>,
    level: CompressionLevel,
    settings: LevelSettings,
    availability: ToolAvailability,
    backends: Vec<Box<dyn PdfBackend>>,
}

impl PdfCompressor {
    /// Build a compressor for `level` (the configured default when `None`),
    /// probing the external tools once.
    pub async fn new(config: Arc<CompressorConfig>, level: Option<CompressionLevel>) -> DomainResult<Self> {
        let level = level.unwrap_or_else(|| config.default_level());
        let settings = config.level_settings(level)?.clone();
        let availability = probe(&config.tools).await;
        let backends = default_backends(&config.tools, level, &settings);
        if !availability.has_external_tools() {
            log::warn!("No external compression tool found, only in-process methods will run");
        }

        log::info!(
            "PDF compressor ready: level {} (preset {}), methods {:?}",
            level,
            settings.preset_name,
            availability.available_methods()
        );

        Ok(Self::with_backends(config, level, settings, availability, backends))
    }

    /// Build from explicit parts. Methods without a registered backend are
    /// marked unavailable.
    pub fn with_backends(
        config: Arc<CompressorConfig>,
        level: CompressionLevel,
        settings: LevelSettings,
        mut availability: ToolAvailability,
        backends: Vec<Box<dyn PdfBackend>>,
    ) -> Self {
        for method in PdfMethod::ALL {
            if !backends.iter().any(|backend| backend.method() == method) {
                availability.set(method, false);
            }
        }

        Self {
            config,
            level,
            settings,
            availability,
            backends,
        }
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    pub fn availability(&self) -> &ToolAvailability {
        &self.availability
    }

    fn backend(&self, method: PdfMethod) -> Option<&dyn PdfBackend> {
        self.backends
            .iter()
            .find(|backend| backend.method() == method)
            .map(|backend| backend.as_ref())
    }

    fn trace(&self, input: &Path, stage: CompressionStage) {
        log::debug!("{}: {}", input.display(), stage);
    }

    /// Compress `input` into `output`. The input is never modified.
    pub async fn compress(&self, input: &Path, output: &Path) -> DomainResult<CompressionReport> {
        let started = Instant::now();
        self.trace(input, CompressionStage::Idle);

        let size_before = match tokio::fs::metadata(input).await {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            Ok(_) => return Err(DomainError::InputNotFound(input.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DomainError::InputNotFound(input.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let max_size = self.config.max_file_size_bytes();
        if size_before > max_size {
            log::warn!(
                "Refusing {}: {} bytes exceeds the {} byte limit",
                input.display(),
                size_before,
                max_size
            );
            return Err(DomainError::InputTooLarge {
                path: input.display().to_string(),
                size: size_before,
                max: max_size,
            });
        }
        ensure_distinct_paths(input, output).await?;
        self.trace(input, CompressionStage::SizeChecked);

        if size_before < self.config.min_file_size_bytes() {
            log::info!("{} is {} bytes, copying without compression", input.display(), size_before);
            copy_verbatim(input, output).await?;
            return Ok(CompressionReport {
                input_path: input.to_path_buf(),
                output_path: output.to_path_buf(),
                size_before,
                size_after: size_before,
                savings: calculate_savings(size_before, size_before),
                method: None,
                disposition: CompressionDisposition::CopiedTooSmall,
                message: TOO_SMALL_MESSAGE.to_string(),
                duration_ms: started.elapsed().as_millis() as i64,
            });
        }

        let chosen = self.choose_method(input, size_before).await;
        self.trace(input, CompressionStage::MethodChosen(chosen));

        let order = attempt_order(chosen, &self.availability);
        let mut attempts = 0;
        let mut last_error: Option<String> = None;
        let mut succeeded: Option<PdfMethod> = None;

        for method in order {
            let backend = match self.backend(method) {
                Some(backend) => backend,
                None => continue,
            };
            self.trace(input, CompressionStage::Attempting(method));
            remove_if_present(output).await?;
            attempts += 1;

            match backend.apply(input, output).await {
                Ok(_) => {
                    if tokio::fs::metadata(output).await.is_ok() {
                        succeeded = Some(method);
                        break;
                    }
                    log::warn!("{} reported success for {} but wrote nothing", method, input.display());
                    last_error = Some(format!("{} produced no output file", method));
                }
                Err(e) => {
                    log::warn!("Compression attempt failed for {}: {}", input.display(), e);
                    last_error = Some(e.to_string());
                }
            }
        }

        let method = match succeeded {
            Some(method) => method,
            None => {
                self.trace(input, CompressionStage::AllFailed);
                remove_if_present(output).await?;
                let last_error = last_error.unwrap_or_else(|| "no compression method available".to_string());
                log::error!("All compression methods failed for {}: {}", input.display(), last_error);
                return Err(DomainError::AllMethodsFailed { attempts, last_error });
            }
        };
        self.trace(input, CompressionStage::Succeeded(method));

        let size_after = tokio::fs::metadata(output).await?.len();
        let savings = calculate_savings(size_before, size_after);
        let minimum = self.config.filters.min_compression_percent;

        let report = if savings.percent_saved < minimum {
            log::info!(
                "{} saved only {} on {} (minimum {:.1}%), keeping the original",
                method,
                savings.size_reduction(),
                input.display(),
                minimum
            );
            if let Err(e) = copy_verbatim(input, output).await {
                remove_if_present(output).await?;
                return Err(e);
            }
            CompressionReport {
                input_path: input.to_path_buf(),
                output_path: output.to_path_buf(),
                size_before,
                size_after: size_before,
                savings: SavingsReport::none(),
                method: Some(method),
                disposition: CompressionDisposition::KeptOriginal,
                message: format!(
                    "{} saved {} which is below the {:.1}% minimum - original kept",
                    method,
                    savings.size_reduction(),
                    minimum
                ),
                duration_ms: started.elapsed().as_millis() as i64,
            }
        } else {
            log::info!(
                "Compressed {} with {}: {} -> {} bytes ({})",
                input.display(),
                method,
                size_before,
                size_after,
                savings.size_reduction()
            );
            CompressionReport {
                input_path: input.to_path_buf(),
                output_path: output.to_path_buf(),
                size_before,
                size_after,
                savings,
                method: Some(method),
                disposition: CompressionDisposition::Compressed,
                message: format!("compressed with {}", method),
                duration_ms: started.elapsed().as_millis() as i64,
            }
        };

        Ok(report)
    }

    async fn choose_method(&self, input: &Path, size: u64) -> PdfMethod {
        let path = input.to_path_buf();
        match tokio::task::spawn_blocking(move || analyze(&path)).await {
            Ok(Ok(analysis)) => {
                if analysis.encrypted {
                    log::warn!("{} is encrypted, compression may fail", input.display());
                }
                choose(size, &analysis, &self.availability)
            }
            Ok(Err(e)) => {
                log::warn!("Analysis of {} failed, using {}: {}", input.display(), SAFE_METHOD, e);
                SAFE_METHOD
            }
            Err(e) => {
                log::warn!("Analysis task for {} failed, using {}: {}", input.display(), SAFE_METHOD, e);
                SAFE_METHOD
            }
        }
    }

    /// Check that a compressed file reopens cleanly
    pub async fn ensure_intact(&self, path: &Path) -> DomainResult<()> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || check_integrity(&owned))
            .await
            .map_err(|e| DomainError::Internal(format!("Task join error: {}", e)))?
    }

    pub async fn verify(&self, path: &Path) -> bool {
        match self.ensure_intact(path).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Verification of {} failed: {}", path.display(), e);
                false
            }
        }
    }

    pub fn describe(&self) -> CompressorInfo {
        CompressorInfo {
            level: self.level,
            settings: self.settings.clone(),
            available_tools: self.availability.clone(),
            limits: LimitsInfo {
                max_file_size_mb: self.config.limits.max_file_size_mb,
                min_file_size_kb: self.config.limits.min_file_size_kb,
                min_compression_percent: self.config.filters.min_compression_percent,
            },
        }
    }
}

async fn copy_verbatim(input: &Path, output: &Path) -> DomainResult<()> {
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(input, output).await?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> DomainResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn canonical(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Writing onto the input would destroy the original
async fn ensure_distinct_paths(input: &Path, output: &Path) -> DomainResult<()> {
    let same = input == output
        || (tokio::fs::metadata(output).await.is_ok() && canonical(input).await == canonical(output).await);
    if same {
        return Err(DomainError::Validation(ValidationError::invalid_value(
            "output_path",
            "must differ from the input path",
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::compression::compressors::{BaselineBackend, StructuralBackend};
    use crate::domains::compression::types::{BackendError, BackendErrorKind, BackendResult, BackendSuccess};
    use crate::test_support::{write_junk, SamplePdf};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const KIB: usize = 1024;
    const MIB: usize = 1024 * 1024;

    #[derive(Clone)]
    enum Behavior {
        Fail(&'static str),
        Timeout,
        Write(usize),
        /// Writes output, then deletes the input out from under the compressor
        WriteAndRemoveInput(usize),
        NoOutput,
    }

    struct FakeBackend {
        method: PdfMethod,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PdfBackend for FakeBackend {
        fn method(&self) -> PdfMethod {
            self.method
        }

        async fn apply(&self, input: &Path, output: &Path) -> BackendResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Fail(message) => Err(BackendError::new(self.method, BackendErrorKind::NonZeroExit, *message)),
                Behavior::Timeout => Err(BackendError::new(
                    self.method,
                    BackendErrorKind::Timeout,
                    "timed out after 180s",
                )),
                Behavior::Write(size) => {
                    std::fs::write(output, vec![b'%'; *size]).unwrap();
                    Ok(BackendSuccess { method: self.method })
                }
                Behavior::WriteAndRemoveInput(size) => {
                    std::fs::write(output, vec![b'%'; *size]).unwrap();
                    std::fs::remove_file(input).unwrap();
                    Ok(BackendSuccess { method: self.method })
                }
                Behavior::NoOutput => Ok(BackendSuccess { method: self.method }),
            }
        }
    }

    struct Harness {
        backends: Vec<Box<dyn PdfBackend>>,
        calls: Vec<(PdfMethod, Arc<AtomicUsize>)>,
    }

    impl Harness {
        fn new(behaviors: &[(PdfMethod, Behavior)]) -> Self {
            let mut backends: Vec<Box<dyn PdfBackend>> = Vec::new();
            let mut calls = Vec::new();
            for (method, behavior) in behaviors {
                let counter = Arc::new(AtomicUsize::new(0));
                calls.push((*method, counter.clone()));
                backends.push(Box::new(FakeBackend {
                    method: *method,
                    behavior: behavior.clone(),
                    calls: counter,
                }));
            }
            Self { backends, calls }
        }

        fn calls(&self, method: PdfMethod) -> usize {
            self.calls
                .iter()
                .find(|(m, _)| *m == method)
                .map(|(_, counter)| counter.load(Ordering::SeqCst))
                .unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.calls.iter().map(|(_, counter)| counter.load(Ordering::SeqCst)).sum()
        }

        fn compressor(&mut self, config: CompressorConfig, availability: ToolAvailability) -> PdfCompressor {
            let level = CompressionLevel::Medium;
            PdfCompressor::with_backends(
                Arc::new(config),
                level,
                LevelSettings::defaults_for(level),
                availability,
                std::mem::take(&mut self.backends),
            )
        }
    }

    fn all_methods() -> ToolAvailability {
        ToolAvailability::only(&PdfMethod::ALL)
    }

    #[tokio::test]
    async fn test_small_input_is_copied_unchanged() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("small.pdf");
        let output = dir.path().join("out").join("small.pdf");
        write_junk(&input, 50 * KIB);

        let mut harness = Harness::new(&[(PdfMethod::Qpdf, Behavior::Write(KIB))]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        let report = compressor.compress(&input, &output).await.unwrap();

        assert_eq!(report.disposition, CompressionDisposition::CopiedTooSmall);
        assert_eq!(report.method, None);
        assert_eq!(report.size_before, report.size_after);
        assert_eq!(report.bytes_saved(), 0);
        assert_eq!(report.message, TOO_SMALL_MESSAGE);
        assert_eq!(std::fs::read(&output).unwrap(), std::fs::read(&input).unwrap());
        assert_eq!(harness.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_input_is_refused_without_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("huge.pdf");
        let output = dir.path().join("huge_out.pdf");
        write_junk(&input, 2 * MIB);

        let mut config = CompressorConfig::default();
        config.limits.max_file_size_mb = 1;
        let mut harness = Harness::new(&[(PdfMethod::Baseline, Behavior::Write(KIB))]);
        let compressor = harness.compressor(config, all_methods());

        let error = compressor.compress(&input, &output).await.unwrap_err();
        assert!(matches!(error, DomainError::InputTooLarge { size, .. } if size == 2 * MIB as u64));
        assert!(error.is_input_rejected());
        assert!(!output.exists());
        assert_eq!(harness.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempdir().unwrap();
        let mut harness = Harness::new(&[]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        let error = compressor
            .compress(&dir.path().join("absent.pdf"), &dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(error, DomainError::InputNotFound(_)));
    }

    #[tokio::test]
    async fn test_fallback_reports_the_method_that_succeeded() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        write_junk(&input, MIB);

        let mut harness = Harness::new(&[
            (PdfMethod::Qpdf, Behavior::Fail("qpdf: damaged xref")),
            (PdfMethod::Ghostscript, Behavior::Write(400 * KIB)),
            (PdfMethod::Structural, Behavior::Write(KIB)),
            (PdfMethod::Baseline, Behavior::Write(KIB)),
        ]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        let report = compressor.compress(&input, &output).await.unwrap();

        assert_eq!(report.method, Some(PdfMethod::Ghostscript));
        assert_eq!(report.disposition, CompressionDisposition::Compressed);
        assert_eq!(report.size_after, 400 * KIB as u64);
        assert_eq!(harness.calls(PdfMethod::Qpdf), 1);
        assert_eq!(harness.calls(PdfMethod::Structural), 0);
    }

    #[tokio::test]
    async fn test_timeout_only_aborts_that_attempt() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        write_junk(&input, MIB);

        let mut harness = Harness::new(&[
            (PdfMethod::Qpdf, Behavior::Timeout),
            (PdfMethod::Ghostscript, Behavior::Write(300 * KIB)),
            (PdfMethod::Baseline, Behavior::Write(KIB)),
        ]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        let report = compressor.compress(&input, &output).await.unwrap();

        assert_eq!(report.method, Some(PdfMethod::Ghostscript));
        assert_eq!(report.disposition, CompressionDisposition::Compressed);
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 300 * KIB as u64);
        assert_eq!(harness.calls(PdfMethod::Qpdf), 1);
        assert_eq!(harness.calls(PdfMethod::Baseline), 0);
    }

    #[tokio::test]
    async fn test_all_failures_carry_the_last_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        write_junk(&input, MIB);
        std::fs::write(&output, b"stale").unwrap();

        let mut harness = Harness::new(&[
            (PdfMethod::Ghostscript, Behavior::Fail("gs crashed")),
            (PdfMethod::Qpdf, Behavior::Fail("qpdf refused")),
            (PdfMethod::Structural, Behavior::Fail("structural broke")),
            (PdfMethod::Baseline, Behavior::Fail("baseline exploded")),
        ]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        let error = compressor.compress(&input, &output).await.unwrap_err();

        match &error {
            DomainError::AllMethodsFailed { attempts, last_error } => {
                assert_eq!(*attempts, 4);
                assert!(last_error.contains("baseline exploded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(error.to_string().contains("baseline exploded"));
        assert!(!output.exists());
        assert_eq!(harness.total_calls(), 4);
    }

    #[tokio::test]
    async fn test_low_savings_keep_the_original() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        write_junk(&input, MIB);

        let mut config = CompressorConfig::default();
        config.filters.min_compression_percent = 10.0;
        let mut harness = Harness::new(&[(PdfMethod::Qpdf, Behavior::Write(950 * KIB))]);
        let compressor = harness.compressor(config, all_methods());
        let report = compressor.compress(&input, &output).await.unwrap();

        assert_eq!(report.disposition, CompressionDisposition::KeptOriginal);
        assert_eq!(report.size_after, MIB as u64);
        assert_eq!(report.size_before, report.size_after);
        assert_eq!(report.bytes_saved(), 0);
        assert_eq!(report.method, Some(PdfMethod::Qpdf));
        assert!(report.message.contains("qpdf"));
        assert_eq!(std::fs::read(&output).unwrap(), std::fs::read(&input).unwrap());
    }

    #[tokio::test]
    async fn test_failed_restore_leaves_no_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        write_junk(&input, MIB);

        let mut config = CompressorConfig::default();
        config.filters.min_compression_percent = 10.0;
        let mut harness = Harness::new(&[(PdfMethod::Qpdf, Behavior::WriteAndRemoveInput(990 * KIB))]);
        let compressor = harness.compressor(config, all_methods());

        let error = compressor.compress(&input, &output).await.unwrap_err();
        assert!(matches!(error, DomainError::Io(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_success_without_output_moves_on() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        write_junk(&input, MIB);

        let mut harness = Harness::new(&[
            (PdfMethod::Qpdf, Behavior::NoOutput),
            (PdfMethod::Baseline, Behavior::Write(100 * KIB)),
        ]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        let report = compressor.compress(&input, &output).await.unwrap();
        assert_eq!(report.method, Some(PdfMethod::Baseline));
    }

    #[tokio::test]
    async fn test_only_baseline_is_reached() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        write_junk(&input, MIB);

        let mut harness = Harness::new(&[(PdfMethod::Baseline, Behavior::Write(600 * KIB))]);
        let compressor = harness.compressor(CompressorConfig::default(), ToolAvailability::in_process_only());
        assert_eq!(compressor.availability().available_methods(), vec![PdfMethod::Baseline]);

        let report = compressor.compress(&input, &output).await.unwrap();
        assert_eq!(report.method, Some(PdfMethod::Baseline));
    }

    #[tokio::test]
    async fn test_forms_avoid_qpdf() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("form.pdf");
        let output = dir.path().join("out.pdf");
        SamplePdf::default().with_form().filler_lines(50).write_to(&input);

        let mut config = CompressorConfig::default();
        config.limits.min_file_size_kb = 0;
        config.filters.min_compression_percent = 0.0;
        let mut harness = Harness::new(&[
            (PdfMethod::Qpdf, Behavior::Write(10)),
            (PdfMethod::Structural, Behavior::Write(10)),
            (PdfMethod::Baseline, Behavior::Write(10)),
        ]);
        let compressor = harness.compressor(config, all_methods());
        let report = compressor.compress(&input, &output).await.unwrap();

        assert_eq!(report.method, Some(PdfMethod::Structural));
        assert_eq!(harness.calls(PdfMethod::Qpdf), 0);
    }

    #[tokio::test]
    async fn test_output_must_differ_from_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        write_junk(&input, MIB);

        let mut harness = Harness::new(&[(PdfMethod::Baseline, Behavior::Write(KIB))]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        let error = compressor.compress(&input, &input).await.unwrap_err();
        assert!(matches!(error, DomainError::Validation(_)));
        assert_eq!(std::fs::metadata(&input).unwrap().len(), MIB as u64);

        // Same file reached through another spelling
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let alias = dir.path().join("sub").join("..").join("in.pdf");
        assert_ne!(alias, input);
        let error = compressor.compress(&input, &alias).await.unwrap_err();
        assert!(matches!(error, DomainError::Validation(_)));
        assert_eq!(harness.total_calls(), 0);
        assert_eq!(std::fs::read(&input).unwrap(), vec![b'x'; MIB]);
    }

    #[tokio::test]
    async fn test_real_in_process_backends() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("report.pdf");
        let output = dir.path().join("compressed").join("report.pdf");
        SamplePdf::default().pages(4).filler_lines(400).with_image().write_to(&input);

        let mut config = CompressorConfig::default();
        config.limits.min_file_size_kb = 0;
        let level = CompressionLevel::High;
        let compressor = PdfCompressor::with_backends(
            Arc::new(config),
            level,
            LevelSettings::defaults_for(level),
            ToolAvailability::in_process_only(),
            vec![Box::new(StructuralBackend::new()), Box::new(BaselineBackend::new())],
        );

        let report = compressor.compress(&input, &output).await.unwrap();
        assert_eq!(report.method, Some(PdfMethod::Structural));
        assert_eq!(report.disposition, CompressionDisposition::Compressed);
        assert!(report.percent_saved() > 5.0);
        assert!(compressor.verify(&output).await);
        assert!(!compressor.verify(&input.with_extension("missing")).await);
    }

    #[tokio::test]
    async fn test_verify_rejects_corrupt_output() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("bad.pdf");
        write_junk(&bad, 4 * KIB);

        let mut harness = Harness::new(&[]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        assert!(!compressor.verify(&bad).await);
        assert!(matches!(compressor.ensure_intact(&bad).await, Err(DomainError::Integrity(_))));
    }

    #[test]
    fn test_describe() {
        let mut harness = Harness::new(&[(PdfMethod::Qpdf, Behavior::NoOutput), (PdfMethod::Structural, Behavior::NoOutput)]);
        let compressor = harness.compressor(CompressorConfig::default(), all_methods());
        let info = compressor.describe();

        assert_eq!(info.level, CompressionLevel::Medium);
        assert_eq!(info.settings.preset_name, "ebook");
        assert_eq!(info.limits.max_file_size_mb, 200);
        assert_eq!(info.limits.min_compression_percent, 5.0);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["available_tools"]["qpdf"], true);
        assert_eq!(json["available_tools"]["ghostscript"], false);
        assert_eq!(json["level"], "medium");
    }
}
