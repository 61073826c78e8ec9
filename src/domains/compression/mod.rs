// Declare submodules for the compression domain
pub mod analyzer;
pub mod compressors;
pub mod probe;
pub mod savings;
pub mod selector;
pub mod service;
pub mod types;

pub use savings::{calculate_savings, SavingsReport};
pub use service::PdfCompressor;
pub use types::{
    CompressionDisposition, CompressionLevel, CompressionReport, CompressorInfo, PdfAnalysis, PdfMethod,
    ToolAvailability,
};
