//! Type definitions for the compression domain.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domains::settings::types::LevelSettings;
use crate::errors::ConfigError;
use super::savings::SavingsReport;

/// Compression levels a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Light compression, keeps print quality
    Low,

    /// Balanced compression for screen reading
    Medium,

    /// Aggressive compression, smallest files
    High,
}

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 3] = [
        CompressionLevel::Low,
        CompressionLevel::Medium,
        CompressionLevel::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        }
    }

    /// Medium and high levels override the rasterizer's image resampling parameters
    pub fn overrides_image_settings(&self) -> bool {
        matches!(self, CompressionLevel::Medium | CompressionLevel::High)
    }
}

impl FromStr for CompressionLevel {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            _ => Err(ConfigError::UnknownLevel(s.to_string())),
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four compression methods the compressor can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfMethod {
    /// Ghostscript pdfwrite: re-renders the document, resamples images
    Ghostscript,

    /// QPDF: lossless structural rewrite with maximum stream compression
    Qpdf,

    /// In-process rewrite that keeps forms and annotations intact
    Structural,

    /// In-process minimal re-serialization with object deduplication
    Baseline,
}

impl PdfMethod {
    pub const ALL: [PdfMethod; 4] = [
        PdfMethod::Ghostscript,
        PdfMethod::Qpdf,
        PdfMethod::Structural,
        PdfMethod::Baseline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PdfMethod::Ghostscript => "ghostscript",
            PdfMethod::Qpdf => "qpdf",
            PdfMethod::Structural => "structural",
            PdfMethod::Baseline => "baseline",
        }
    }

    /// Rank in the fallback chain, lower runs first
    pub fn priority(&self) -> u8 {
        match self {
            PdfMethod::Qpdf => 0,
            PdfMethod::Ghostscript => 1,
            PdfMethod::Structural => 2,
            PdfMethod::Baseline => 3,
        }
    }

    /// Every method ordered by `priority`
    pub fn by_priority() -> Vec<PdfMethod> {
        let mut methods = Self::ALL.to_vec();
        methods.sort_by_key(|method| method.priority());
        methods
    }

    /// In-process methods need no external binary and are always available
    pub fn is_in_process(&self) -> bool {
        matches!(self, PdfMethod::Structural | PdfMethod::Baseline)
    }
}

impl fmt::Display for PdfMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which methods can run in this process. Probed once per compressor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolAvailability {
    tools: BTreeMap<PdfMethod, bool>,
}

impl ToolAvailability {
    /// Only the in-process methods
    pub fn in_process_only() -> Self {
        let tools = PdfMethod::ALL
            .iter()
            .map(|method| (*method, method.is_in_process()))
            .collect();
        Self { tools }
    }

    /// Exactly the given methods, nothing else
    pub fn only(methods: &[PdfMethod]) -> Self {
        let tools = PdfMethod::ALL
            .iter()
            .map(|method| (*method, methods.contains(method)))
            .collect();
        Self { tools }
    }

    pub fn set(&mut self, method: PdfMethod, available: bool) {
        self.tools.insert(method, available);
    }

    pub fn is_available(&self, method: PdfMethod) -> bool {
        self.tools.get(&method).copied().unwrap_or(false)
    }

    pub fn available_methods(&self) -> Vec<PdfMethod> {
        self.tools
            .iter()
            .filter(|(_, available)| **available)
            .map(|(method, _)| *method)
            .collect()
    }

    /// True when at least one external binary was found
    pub fn has_external_tools(&self) -> bool {
        self.tools
            .iter()
            .any(|(method, available)| *available && !method.is_in_process())
    }
}

impl Serialize for ToolAvailability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.tools.iter().map(|(method, available)| (method.as_str(), available)))
    }
}

/// Structural features of a PDF, used only to bias method selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfAnalysis {
    pub page_count: u32,
    pub has_images: bool,
    pub has_forms: bool,
    pub has_annotations: bool,
    pub encrypted: bool,
    pub file_size: u64,
}

impl PdfAnalysis {
    /// Analysis of a file neither parser could read
    pub fn unreadable(file_size: u64) -> Self {
        Self {
            file_size,
            ..Default::default()
        }
    }
}

/// A backend finished and left its output in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSuccess {
    pub method: PdfMethod,
}

/// Why a single backend attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendErrorKind {
    /// The external binary could not be started
    Spawn,
    /// The external binary exited with a failure code
    NonZeroExit,
    /// The attempt exceeded its hard timeout
    Timeout,
    /// The in-process PDF library rejected the document
    Library,
    /// Preparing or persisting the output file failed
    Io,
}

impl BackendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendErrorKind::Spawn => "spawn",
            BackendErrorKind::NonZeroExit => "exit",
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::Library => "library",
            BackendErrorKind::Io => "io",
        }
    }
}

/// A failed backend attempt. Recovered by the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendError {
    pub method: PdfMethod,
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(method: PdfMethod, kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            method,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.method, self.kind.as_str(), self.message)
    }
}

impl std::error::Error for BackendError {}

/// Outcome of one backend attempt
pub type BackendResult = Result<BackendSuccess, BackendError>;

/// What ended up at the output path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionDisposition {
    /// The compressed file was kept
    Compressed,
    /// A backend succeeded but saved too little, the original was copied instead
    KeptOriginal,
    /// The input was below the minimum size and copied without compression
    CopiedTooSmall,
}

/// Steps of a single `compress` call, used for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStage {
    Idle,
    SizeChecked,
    MethodChosen(PdfMethod),
    Attempting(PdfMethod),
    Succeeded(PdfMethod),
    AllFailed,
}

impl fmt::Display for CompressionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionStage::Idle => f.write_str("idle"),
            CompressionStage::SizeChecked => f.write_str("size-checked"),
            CompressionStage::MethodChosen(method) => write!(f, "method-chosen({})", method),
            CompressionStage::Attempting(method) => write!(f, "attempting({})", method),
            CompressionStage::Succeeded(method) => write!(f, "succeeded({})", method),
            CompressionStage::AllFailed => f.write_str("all-failed"),
        }
    }
}

/// Result from a successful compression call
#[derive(Debug, Clone, Serialize)]
pub struct CompressionReport {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub size_before: u64,
    pub size_after: u64,
    pub savings: SavingsReport,
    pub method: Option<PdfMethod>,
    pub disposition: CompressionDisposition,
    pub message: String,
    pub duration_ms: i64,
}

impl CompressionReport {
    pub fn bytes_saved(&self) -> i64 {
        self.savings.bytes_saved
    }

    pub fn percent_saved(&self) -> f64 {
        self.savings.percent_saved
    }

    pub fn compression_ratio(&self) -> f64 {
        self.savings.compression_ratio
    }
}

/// Size limits as reported by `describe`
#[derive(Debug, Clone, Serialize)]
pub struct LimitsInfo {
    pub max_file_size_mb: u64,
    pub min_file_size_kb: u64,
    pub min_compression_percent: f64,
}

/// Compressor introspection for logging and reporting
#[derive(Debug, Clone, Serialize)]
pub struct CompressorInfo {
    pub level: CompressionLevel,
    pub settings: LevelSettings,
    pub available_tools: ToolAvailability,
    pub limits: LimitsInfo,
}
