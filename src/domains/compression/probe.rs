//! Detection of the external compression tools.

use std::ffi::OsString;
use std::time::Duration;

use crate::domains::settings::types::ToolPaths;
use super::compressors::process::run_tool;
use super::types::{PdfMethod, ToolAvailability};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `<tool> --version` and report the first output line when it succeeds
async fn tool_version(program: &str) -> Option<String> {
    let args = [OsString::from("--version")];
    match run_tool(program, &args, PROBE_TIMEOUT).await {
        Ok(output) if output.success => Some(
            output
                .stdout
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        ),
        Ok(output) => {
            log::debug!("{} --version failed: {}", program, output.failure_summary());
            None
        }
        Err(e) => {
            log::debug!("{} unavailable: {}", program, e);
            None
        }
    }
}

/// Probe which methods can run. Never fails; a missing tool is just unavailable.
pub async fn probe(tools: &ToolPaths) -> ToolAvailability {
    let mut availability = ToolAvailability::in_process_only();

    for (method, program) in [
        (PdfMethod::Ghostscript, tools.ghostscript_path.as_str()),
        (PdfMethod::Qpdf, tools.qpdf_path.as_str()),
    ] {
        match tool_version(program).await {
            Some(version) => {
                log::info!("{} available ({}): {}", method, program, version);
                availability.set(method, true);
            }
            None => log::warn!("{} not found ({}), skipping that method", method, program),
        }
    }

    availability
}
