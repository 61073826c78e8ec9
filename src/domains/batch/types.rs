use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::domains::compression::types::{CompressionDisposition, CompressionLevel, CompressionReport, PdfMethod};
use crate::errors::{DomainError, DomainResult};
use crate::utils::format_file_size;

/// One file that made it through compression
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub file_name: String,
    pub size_before: u64,
    pub size_after: u64,
    pub bytes_saved: i64,
    pub percent_saved: f64,
    pub method: Option<PdfMethod>,
    pub disposition: CompressionDisposition,
    pub duration_ms: i64,
    pub timestamp: DateTime<Utc>,
}

impl FileRecord {
    pub fn from_report(file_name: &str, report: &CompressionReport) -> Self {
        Self {
            file_name: file_name.to_string(),
            size_before: report.size_before,
            size_after: report.size_after,
            bytes_saved: report.bytes_saved(),
            percent_saved: report.percent_saved(),
            method: report.method,
            disposition: report.disposition,
            duration_ms: report.duration_ms,
            timestamp: Utc::now(),
        }
    }
}

/// A file that was rejected or could not be compressed
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file_name: String,
    pub message: String,
    pub error: DomainError,
    pub timestamp: DateTime<Utc>,
}

/// Statistics of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub compression_level: CompressionLevel,
    pub files_found: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub total_size_before: u64,
    pub total_size_after: u64,
    pub total_saved: i64,
    pub processed: Vec<FileRecord>,
    pub errors: Vec<FileFailure>,
}

impl BatchStats {
    pub fn new(compression_level: CompressionLevel) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            compression_level,
            files_found: 0,
            files_processed: 0,
            files_failed: 0,
            files_skipped: 0,
            total_size_before: 0,
            total_size_after: 0,
            total_saved: 0,
            processed: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self, file_name: &str, report: &CompressionReport) {
        self.files_processed += 1;
        self.total_size_before += report.size_before;
        self.total_size_after += report.size_after;
        self.total_saved += report.bytes_saved();
        self.processed.push(FileRecord::from_report(file_name, report));
    }

    /// Input rejections count as skipped, everything else as failed
    pub fn record_failure(&mut self, file_name: &str, error: DomainError) {
        if error.is_input_rejected() {
            self.files_skipped += 1;
        } else {
            self.files_failed += 1;
        }
        self.errors.push(FileFailure {
            file_name: file_name.to_string(),
            message: error.to_string(),
            error,
            timestamp: Utc::now(),
        });
    }

    pub fn record_skip(&mut self) {
        self.files_skipped += 1;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Percent saved over every processed file
    pub fn percent_saved(&self) -> f64 {
        if self.total_size_before == 0 {
            0.0
        } else {
            self.total_saved as f64 / self.total_size_before as f64 * 100.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} found, {} processed, {} failed, {} skipped; {} -> {} (saved {}, {:.1}%)",
            self.files_found,
            self.files_processed,
            self.files_failed,
            self.files_skipped,
            format_file_size(self.total_size_before),
            format_file_size(self.total_size_after),
            format_file_size(self.total_saved.max(0) as u64),
            self.percent_saved()
        )
    }

    pub async fn save_json(&self, path: &Path) -> DomainResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::Internal(format!("Failed to serialize statistics: {}", e)))?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        log::debug!("Statistics written to {}", path.display());
        Ok(())
    }
}
