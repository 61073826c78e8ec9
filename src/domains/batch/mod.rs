pub mod service;
pub mod types;

pub use service::BatchRunner;
pub use types::{BatchStats, FileFailure, FileRecord};
