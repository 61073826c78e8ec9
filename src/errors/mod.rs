mod error;

pub use error::{ConfigError, DomainError, ValidationError};

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
