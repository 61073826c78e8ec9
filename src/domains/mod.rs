pub mod batch;
pub mod compression;
pub mod settings;

pub use batch::{BatchRunner, BatchStats};
pub use compression::PdfCompressor;
pub use settings::CompressorConfig;
