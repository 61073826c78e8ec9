use crate::errors::{DomainError, DomainResult, ValidationError};

/// A trait that configuration values implement for validation.
pub trait Validate {
    /// Validates the value and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        if self.value.is_none() {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    pub fn validate_with<F>(mut self, validator: F) -> Self
    where F: FnOnce(&T) -> Result<(), ValidationError> {
        if let Some(value) = &self.value {
            if let Err(err) = validator(value) {
                self.errors.push(err);
            }
        }
        self
    }

    /// All collected errors, for callers that report every problem at once
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(DomainError::Validation(first)),
        }
    }
}

/// Numeric validations
impl<T> ValidationBuilder<T>
where T: PartialOrd + Clone + Default + std::fmt::Display
{
    pub fn positive(mut self) -> Self {
        if let Some(value) = &self.value {
            if value <= &T::default() {
                self.errors.push(ValidationError::not_positive(&self.field_name));
            }
        }
        self
    }

    pub fn range(mut self, min: T, max: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min || value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    max.to_string()
                ));
            }
        }
        self
    }
}

/// File extension validation helper
pub fn validate_file_extension(filename: &str, allowed_extensions: &[&str]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, extension)) => allowed_extensions.iter().any(|&ext| ext.eq_ignore_ascii_case(extension)),
        None => false,
    }
}
