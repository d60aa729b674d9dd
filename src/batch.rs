//! Batch processing - runs the mirror operation over a set of URLs
//!
//! A batch never stops at the first broken repository. Each failure is
//! logged and counted, and the batch reports [`BatchStatus::Failed`] at the
//! end. The only error that escapes a batch is an unreadable list file.

use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info};

use crate::error::{MirrorError, Result};
use crate::git::GitRunner;
use crate::mirror::{MirrorOutcome, Mirrorer};

/// Aggregate status of one or more batches, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum BatchStatus {
    #[default]
    Clean,
    Failed,
}

impl BatchStatus {
    /// Combine two statuses, keeping the worst
    pub fn worst(self, other: BatchStatus) -> BatchStatus {
        self.max(other)
    }

    pub fn exit_code(self) -> ExitCode {
        match self {
            BatchStatus::Clean => ExitCode::SUCCESS,
            BatchStatus::Failed => ExitCode::from(1),
        }
    }
}

/// Results from one batch
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub label: String,
    pub mirrored: Vec<MirrorOutcome>,
    /// `(url, message)` for every item that failed
    pub failures: Vec<(String, String)>,
    /// Items deliberately left out (self-owned stars)
    pub skipped: usize,
    /// Set when the batch could not even enumerate its items
    pub aborted: Option<String>,
}

impl BatchSummary {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn status(&self) -> BatchStatus {
        if self.failures.is_empty() && self.aborted.is_none() {
            BatchStatus::Clean
        } else {
            BatchStatus::Failed
        }
    }

    pub fn attempted(&self) -> usize {
        self.mirrored.len() + self.failures.len()
    }

    /// Record the result of mirroring one URL, logging failures with their URL
    pub fn record(&mut self, url: &str, result: Result<MirrorOutcome>) {
        match result {
            Ok(outcome) => {
                debug!("Mirrored {} at {}", url, outcome.path().display());
                self.mirrored.push(outcome);
            }
            Err(e) => {
                error!("Failed to mirror {}: {}", url, e);
                self.failures.push((url.to_string(), e.to_string()));
            }
        }
    }

    pub fn abort(&mut self, err: &MirrorError) {
        error!("{}: {}", self.label, err);
        self.aborted = Some(err.to_string());
    }

    pub fn log(&self) {
        info!(
            "{}: {} mirrored, {} failed, {} skipped",
            self.label,
            self.mirrored.len(),
            self.failures.len(),
            self.skipped
        );
    }
}

/// Extract the URL from one list-file line, if it holds one
///
/// Everything from the first `#` on is a comment; the rest is trimmed.
pub fn parse_list_line(line: &str) -> Option<&str> {
    let line = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };
    let line = line.trim();
    (!line.is_empty()).then_some(line)
}

/// All URLs in a list file's contents, in order
pub fn parse_list(content: &str) -> Vec<&str> {
    content.lines().filter_map(parse_list_line).collect()
}

/// Mirror every repository named in a list file
///
/// Fails only if the list file itself cannot be read.
pub async fn mirror_list<G: GitRunner>(
    mirrorer: &mut Mirrorer<G>,
    list: &Path,
) -> Result<BatchSummary> {
    info!("Backing up repositories listed in {} ...", list.display());

    let content = tokio::fs::read_to_string(list)
        .await
        .map_err(|source| MirrorError::ListFile {
            path: list.to_path_buf(),
            source,
        })?;

    let mut summary = BatchSummary::new(format!("List {}", list.display()));
    for url in parse_list(&content) {
        let result = mirrorer.mirror(url).await;
        summary.record(url, result);
    }

    summary.log();
    Ok(summary)
}
