//! Running external tools with an argument vector and a hard timeout.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Captured result of a tool that ran to completion
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// None when the process was killed by a signal
    pub status_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Last non-empty stderr line, or the exit code when stderr is silent
    pub fn failure_summary(&self) -> String {
        let code = self
            .status_code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        match self.stderr.lines().rev().map(str::trim).find(|line| !line.is_empty()) {
            Some(line) => format!("exit code {}: {}", code, line),
            None => format!("exit code {}", code),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolRunError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} timed out after {}s", .limit.as_secs())]
    Timeout { program: String, limit: Duration },

    #[error("failed waiting for {program}: {message}")]
    Wait { program: String, message: String },
}

/// Run `program` with `args`. No shell is involved, file names reach the tool verbatim.
/// The child is killed when the limit expires.
pub async fn run_tool(program: &str, args: &[OsString], limit: Duration) -> Result<ToolOutput, ToolRunError> {
    log::debug!("Running {} {:?}", program, args);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ToolRunError::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        })?;

    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(ToolOutput {
            status_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Ok(Err(e)) => Err(ToolRunError::Wait {
            program: program.to_string(),
            message: e.to_string(),
        }),
        Err(_elapsed) => Err(ToolRunError::Timeout {
            program: program.to_string(),
            limit,
        }),
    }
}
