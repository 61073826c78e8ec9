use std::path::Path;
use std::time::Duration;

use crate::validation::validate_file_extension;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human readable size, e.g. "1.5 MB"
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

/// Human readable duration: "12.5s", "3m 5s" or "1h 2m"
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if seconds < 60.0 {
        return format!("{:.1}s", seconds);
    }

    let total = duration.as_secs();
    let minutes = total / 60;
    if minutes < 60 {
        return format!("{}m {}s", minutes, total % 60);
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// A `.pdf` file whose name does not look like an earlier result
pub fn is_candidate_pdf(path: &Path, skip_patterns: &[String]) -> bool {
    let name = match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => name.to_lowercase(),
        None => return false,
    };
    validate_file_extension(&name, &["pdf"])
        && !skip_patterns
            .iter()
            .any(|pattern| name.contains(&pattern.to_lowercase()))
}
