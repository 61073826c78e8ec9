//! Byte savings between an original file and its compressed copy.

use serde::{Deserialize, Serialize};

/// Derived savings figures. Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsReport {
    pub bytes_saved: i64,
    pub percent_saved: f64,
    /// `original / compressed`; positive infinity when the compressed size is zero
    pub compression_ratio: f64,
}

impl SavingsReport {
    /// Savings of a file that was kept as-is
    pub fn none() -> Self {
        Self {
            bytes_saved: 0,
            percent_saved: 0.0,
            compression_ratio: 1.0,
        }
    }

    /// Human readable reduction, e.g. "12.5%"
    pub fn size_reduction(&self) -> String {
        format!("{:.1}%", self.percent_saved)
    }
}

/// Compute savings from two sizes.
///
/// An empty original yields all-zero figures. A zero compressed size is
/// degenerate and reports an infinite ratio.
pub fn calculate_savings(original_size: u64, compressed_size: u64) -> SavingsReport {
    if original_size == 0 {
        return SavingsReport {
            bytes_saved: 0,
            percent_saved: 0.0,
            compression_ratio: 0.0,
        };
    }

    let bytes_saved = original_size as i64 - compressed_size as i64;
    let percent_saved = bytes_saved as f64 / original_size as f64 * 100.0;
    let compression_ratio = if compressed_size > 0 {
        original_size as f64 / compressed_size as f64
    } else {
        f64::INFINITY
    };

    SavingsReport {
        bytes_saved,
        percent_saved,
        compression_ratio,
    }
}
