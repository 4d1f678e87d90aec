//! Summarization collaborators.
//!
//! The engine never summarizes by itself; callers pick a [`Summarizer`] and
//! feed it the narrative. Output is used as-is: no retries, no caching.

use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;

pub const MIN_LENGTH_ENV: &str = "ESG_SUMMARY_MIN_LENGTH";
pub const MAX_LENGTH_ENV: &str = "ESG_SUMMARY_MAX_LENGTH";

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("Failed to start summarizer '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Summarizer I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Summarizer '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Summarizer '{0}' returned no text")]
    EmptyOutput(String),
}

/// Length bounds forwarded to the summarization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryBounds {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self {
            min_length: 30,
            max_length: 100,
        }
    }
}

/// Opaque text-to-text function.
pub trait Summarizer {
    fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String, SummarizerError>;
}

/// Returns the narrative unchanged; used when no model is configured.
pub struct PassthroughSummarizer;

impl Summarizer for PassthroughSummarizer {
    fn summarize(&self, text: &str, _bounds: SummaryBounds) -> Result<String, SummarizerError> {
        Ok(text.to_string())
    }
}

/// Pipes the narrative through an external program and reads the summary
/// from its stdout.
#[derive(Debug, Clone)]
pub struct CommandSummarizer {
    program: String,
    args: Vec<String>,
}

impl CommandSummarizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `["python3", "summarize.py"]` -> program + args; `None` when empty.
    pub fn from_command_line(parts: &[String]) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl Summarizer for CommandSummarizer {
    fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String, SummarizerError> {
        debug!("Running summarizer {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(MIN_LENGTH_ENV, bounds.min_length.to_string())
            .env(MAX_LENGTH_ENV, bounds.max_length.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SummarizerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(SummarizerError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let summary = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if summary.is_empty() {
            return Err(SummarizerError::EmptyOutput(self.program.clone()));
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_returns_input() {
        let out = PassthroughSummarizer
            .summarize("This period, DemoCo produced 1 tCO2.", SummaryBounds::default())
            .unwrap();
        assert_eq!(out, "This period, DemoCo produced 1 tCO2.");
    }

    #[test]
    fn empty_command_line_gives_no_summarizer() {
        assert!(CommandSummarizer::from_command_line(&[]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn command_reads_stdin_and_trims_output() {
        let summarizer = CommandSummarizer::new("cat", Vec::new());
        let out = summarizer
            .summarize("  DemoCo emitted less.\n", SummaryBounds::default())
            .unwrap();
        assert_eq!(out, "DemoCo emitted less.");
    }

    #[cfg(unix)]
    #[test]
    fn command_receives_length_bounds() {
        let summarizer = CommandSummarizer::from_command_line(&[
            "sh".to_string(),
            "-c".to_string(),
            format!("cat > /dev/null; echo ${}-${}", MIN_LENGTH_ENV, MAX_LENGTH_ENV),
        ])
        .unwrap();
        let bounds = SummaryBounds {
            min_length: 10,
            max_length: 60,
        };
        assert_eq!(summarizer.summarize("text", bounds).unwrap(), "10-60");
    }

    #[cfg(unix)]
    #[test]
    fn command_failure_is_reported() {
        let summarizer = CommandSummarizer::from_command_line(&[
            "sh".to_string(),
            "-c".to_string(),
            "cat > /dev/null; echo model unavailable >&2; exit 3".to_string(),
        ])
        .unwrap();
        let err = summarizer
            .summarize("text", SummaryBounds::default())
            .unwrap_err();
        match err {
            SummarizerError::Failed { stderr, .. } => assert_eq!(stderr, "model unavailable"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let summarizer = CommandSummarizer::new("esg-summarizer-that-does-not-exist", Vec::new());
        let err = summarizer
            .summarize("text", SummaryBounds::default())
            .unwrap_err();
        assert!(matches!(err, SummarizerError::Spawn { .. }));
    }
}
