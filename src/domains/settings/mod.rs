pub mod types;

pub use types::{CompressorConfig, ConfigReport, LevelSettings, ToolPaths};
