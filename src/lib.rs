//! PDF compression with a fallback chain of methods.
//!
//! `PdfCompressor` picks a method from the file's structure and the tools
//! installed, then falls back through the remaining methods until one
//! produces output. `BatchRunner` drives it over a directory.

// Public modules
pub mod domains;
pub mod errors;
pub mod logging;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use domains::batch::{BatchRunner, BatchStats};
pub use domains::compression::{CompressionLevel, CompressionReport, PdfCompressor, PdfMethod};
pub use domains::settings::CompressorConfig;
pub use errors::{DomainError, DomainResult};
