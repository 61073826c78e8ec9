use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;

use crate::domains::compression::service::PdfCompressor;
use crate::domains::compression::types::CompressionDisposition;
use crate::domains::settings::types::CompressorConfig;
use crate::errors::{DomainError, DomainResult};
use crate::utils::{format_duration, is_candidate_pdf};
use super::types::BatchStats;

/// Bytes read to sniff the file type
const SNIFF_LEN: usize = 1024;

/// Compresses every eligible PDF of a directory, one file at a time
pub struct BatchRunner {
    compressor: PdfCompressor,
    config: Arc<CompressorConfig>,
}

impl BatchRunner {
    pub fn new(compressor: PdfCompressor, config: Arc<CompressorConfig>) -> Self {
        Self { compressor, config }
    }

    pub fn compressor(&self) -> &PdfCompressor {
        &self.compressor
    }

    /// Sorted `.pdf` files of `input_dir` that pass the name and content
    /// filters, plus the number of `.pdf` files rejected by them.
    pub async fn collect_candidates(&self, input_dir: &Path) -> DomainResult<(Vec<PathBuf>, usize)> {
        let mut entries = tokio::fs::read_dir(input_dir)
            .await
            .map_err(|e| DomainError::InputNotFound(format!("{}: {}", input_dir.display(), e)))?;

        let mut pdfs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_pdf_name = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if is_pdf_name && entry.file_type().await?.is_file() {
                pdfs.push(path);
            }
        }
        pdfs.sort();

        let mut candidates = Vec::new();
        let mut rejected = 0;
        for path in pdfs {
            if !is_candidate_pdf(&path, &self.config.filters.skip_patterns) {
                log::debug!("Skipping {}: name matches a skip pattern", path.display());
                rejected += 1;
            } else if !looks_like_pdf(&path).await {
                log::warn!("Skipping {}: content is not a PDF", path.display());
                rejected += 1;
            } else {
                candidates.push(path);
            }
        }

        Ok((candidates, rejected))
    }

    /// Compress the PDFs of `input_dir` into `output_dir`, keeping file names
    pub async fn run(&self, input_dir: &Path, output_dir: &Path) -> DomainResult<BatchStats> {
        let started = Instant::now();
        let mut stats = BatchStats::new(self.compressor.level());

        let (candidates, rejected) = self.collect_candidates(input_dir).await?;
        stats.files_found = candidates.len();
        stats.files_skipped += rejected;

        let limit = self.config.limits.max_files_per_run;
        if candidates.len() > limit {
            log::warn!(
                "{} files found, only the first {} are processed this run",
                candidates.len(),
                limit
            );
        }
        tokio::fs::create_dir_all(output_dir).await?;

        for (index, input) in candidates.iter().enumerate() {
            if index >= limit {
                stats.record_skip();
                continue;
            }

            let file_name = input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let output = output_dir.join(&file_name);
            log::info!("[{}/{}] {}", index + 1, candidates.len().min(limit), file_name);

            match self.compressor.compress(input, &output).await {
                Ok(report) => {
                    let must_verify = self.config.safety.verify_compression
                        && report.disposition == CompressionDisposition::Compressed;
                    if must_verify {
                        if let Err(e) = self.compressor.ensure_intact(&output).await {
                            log::error!("Discarding corrupt result for {}: {}", file_name, e);
                            if let Err(remove_error) = tokio::fs::remove_file(&output).await {
                                log::warn!("Failed to remove {}: {}", output.display(), remove_error);
                            }
                            stats.record_failure(&file_name, e);
                            continue;
                        }
                    }
                    stats.record_success(&file_name, &report);
                }
                Err(e) => {
                    log::error!("Failed to compress {}: {}", file_name, e);
                    stats.record_failure(&file_name, e);
                }
            }
        }

        stats.finish();
        log::info!(
            "Batch {} finished in {}: {}",
            stats.run_id,
            format_duration(started.elapsed()),
            stats.summary()
        );
        Ok(stats)
    }
}

/// Magic-byte check, independent of the file name
async fn looks_like_pdf(path: &Path) -> bool {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut buffer = vec![0u8; SNIFF_LEN];
    let read = match file.read(&mut buffer).await {
        Ok(read) => read,
        Err(_) => return false,
    };
    infer::get(&buffer[..read])
        .map(|kind| kind.mime_type() == "application/pdf")
        .unwrap_or(false)
}
