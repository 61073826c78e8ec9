use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use crate::domains::compression::types::CompressionLevel;
use crate::errors::{ConfigError, ConfigResult, DomainError, DomainResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};

/// Per-level compression profile handed to the backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSettings {
    /// Ghostscript `-dPDFSETTINGS` preset (screen, ebook, printer, prepress)
    pub preset_name: String,
    /// Target image quality, 0-100
    pub image_quality: u8,
    /// Target image resolution in dpi
    pub image_resolution: u32,
}

impl LevelSettings {
    pub fn new(preset_name: &str, image_quality: u8, image_resolution: u32) -> Self {
        Self {
            preset_name: preset_name.to_string(),
            image_quality,
            image_resolution,
        }
    }

    pub fn defaults_for(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Low => Self::new("printer", 85, 300),
            CompressionLevel::Medium => Self::new("ebook", 75, 150),
            CompressionLevel::High => Self::new("screen", 50, 72),
        }
    }
}

impl Validate for LevelSettings {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("preset_name", Some(self.preset_name.clone()))
            .validate_with(|name| {
                if name.trim().is_empty() {
                    Err(ValidationError::required("preset_name"))
                } else {
                    Ok(())
                }
            })
            .validate()?;
        ValidationBuilder::new("image_quality", Some(self.image_quality))
            .range(0, 100)
            .validate()?;
        ValidationBuilder::new("image_resolution", Some(self.image_resolution))
            .positive()
            .validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_files_per_run: usize,
    pub max_file_size_mb: u64,
    pub min_file_size_kb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_files_per_run: 50,
            max_file_size_mb: 200,
            min_file_size_kb: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Compressed output saving less than this is discarded for the original
    pub min_compression_percent: f64,
    /// File names containing any of these are never picked up by a batch
    pub skip_patterns: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            min_compression_percent: 5.0,
            skip_patterns: ["compressed", "_comp", "optimized", "_small", "temp_"]
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSection {
    pub default_level: CompressionLevel,
    /// Keyed by level name ("low", "medium", "high")
    pub levels: BTreeMap<String, LevelSettings>,
}

impl Default for CompressionSection {
    fn default() -> Self {
        let levels = CompressionLevel::ALL
            .iter()
            .map(|level| (level.as_str().to_string(), LevelSettings::defaults_for(*level)))
            .collect();
        Self {
            default_level: CompressionLevel::Medium,
            levels,
        }
    }
}

/// Locations of the external binaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ghostscript_path: String,
    pub qpdf_path: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ghostscript_path: "gs".to_string(),
            qpdf_path: "qpdf".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Re-open every compressed file before accepting it
    pub verify_compression: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            verify_compression: true,
        }
    }
}

/// Immutable compressor configuration, built once and shared read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    pub limits: LimitsConfig,
    pub filters: FiltersConfig,
    pub compression: CompressionSection,
    pub tools: ToolPaths,
    pub safety: SafetyConfig,
    pub log_level: String,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            limits: LimitsConfig::default(),
            filters: FiltersConfig::default(),
            compression: CompressionSection::default(),
            tools: ToolPaths::default(),
            safety: SafetyConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Problems found while validating a configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ConfigReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

const ENV_MAX_FILE_SIZE_MB: &str = "PDF_SQUEEZE_MAX_FILE_SIZE_MB";
const ENV_MIN_FILE_SIZE_KB: &str = "PDF_SQUEEZE_MIN_FILE_SIZE_KB";
const ENV_MIN_COMPRESSION_PERCENT: &str = "PDF_SQUEEZE_MIN_COMPRESSION_PERCENT";
const ENV_LEVEL: &str = "PDF_SQUEEZE_LEVEL";
const ENV_GS_PATH: &str = "PDF_SQUEEZE_GS_PATH";
const ENV_QPDF_PATH: &str = "PDF_SQUEEZE_QPDF_PATH";

impl CompressorConfig {
    /// Load configuration from an optional JSON file, then apply `.env` and
    /// environment overrides. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                log::debug!("Loaded configuration from {}", path.display());
                Self::from_json_str(&raw)?
            }
            Some(path) => {
                log::warn!("Configuration file {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;

        let report = config.check();
        for warning in &report.warnings {
            log::warn!("Configuration warning: {}", warning);
        }
        if let Some(error) = report.errors.into_iter().next() {
            return Err(ConfigError::Validation(error));
        }

        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_FILE_SIZE_MB) {
            self.limits.max_file_size_mb = parse_override(ENV_MAX_FILE_SIZE_MB, &value)?;
        }
        if let Some(value) = lookup(ENV_MIN_FILE_SIZE_KB) {
            self.limits.min_file_size_kb = parse_override(ENV_MIN_FILE_SIZE_KB, &value)?;
        }
        if let Some(value) = lookup(ENV_MIN_COMPRESSION_PERCENT) {
            self.filters.min_compression_percent = parse_override(ENV_MIN_COMPRESSION_PERCENT, &value)?;
        }
        if let Some(value) = lookup(ENV_LEVEL) {
            self.compression.default_level = value.parse()?;
        }
        if let Some(value) = lookup(ENV_GS_PATH) {
            self.tools.ghostscript_path = value;
        }
        if let Some(value) = lookup(ENV_QPDF_PATH) {
            self.tools.qpdf_path = value;
        }
        Ok(())
    }

    /// Validate every section, collecting all errors and warnings
    pub fn check(&self) -> ConfigReport {
        let mut report = ConfigReport::default();

        report.errors.extend(
            ValidationBuilder::new("limits.max_file_size_mb", Some(self.limits.max_file_size_mb))
                .positive()
                .into_errors(),
        );
        report.errors.extend(
            ValidationBuilder::new("filters.min_compression_percent", Some(self.filters.min_compression_percent))
                .range(0.0, 100.0)
                .into_errors(),
        );

        if self.min_file_size_bytes() >= self.max_file_size_bytes() && self.limits.max_file_size_mb > 0 {
            report.errors.push(ValidationError::invalid_value(
                "limits.min_file_size_kb",
                "must be below limits.max_file_size_mb",
            ));
        }

        for level in CompressionLevel::ALL {
            match self.compression.levels.get(level.as_str()) {
                Some(settings) => {
                    if let Err(DomainError::Validation(error)) = settings.validate() {
                        report.errors.push(error);
                    }
                }
                None if level == self.compression.default_level => {
                    report.errors.push(ValidationError::required(&format!("compression.levels.{}", level)));
                }
                None => report.warnings.push(format!("No settings for compression level '{}'", level)),
            }
        }

        if self.limits.max_files_per_run == 0 {
            report.warnings.push("limits.max_files_per_run is 0, batches will process nothing".to_string());
        }

        report
    }

    pub fn level_settings(&self, level: CompressionLevel) -> ConfigResult<&LevelSettings> {
        self.compression
            .levels
            .get(level.as_str())
            .ok_or_else(|| ConfigError::UnknownLevel(level.as_str().to_string()))
    }

    pub fn default_level(&self) -> CompressionLevel {
        self.compression.default_level
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.limits.max_file_size_mb * 1024 * 1024
    }

    pub fn min_file_size_bytes(&self) -> u64 {
        self.limits.min_file_size_kb * 1024
    }
}

impl Validate for CompressorConfig {
    fn validate(&self) -> DomainResult<()> {
        match self.check().errors.into_iter().next() {
            None => Ok(()),
            Some(error) => Err(DomainError::Validation(error)),
        }
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse::<T>().map_err(|_| {
        ConfigError::Validation(ValidationError::invalid_value(key, &format!("cannot parse '{}'", value)))
    })
}
