//! `git` command-line backend.

use crate::SourceControl;
use c3i_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Lists changed files by shelling out to `git diff-tree`.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    /// Use the `git` found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Revision argument for `git diff-tree`: `start` alone, or `start..stop`.
#[must_use]
pub fn revision_range(start: &str, stop: Option<&str>) -> String {
    match stop {
        Some(stop) => format!("{start}..{stop}"),
        None => start.to_string(),
    }
}

impl SourceControl for GitCli {
    fn changed_files(&self, root: &Path, start: &str, stop: Option<&str>) -> Result<Vec<PathBuf>> {
        let range = revision_range(start, stop);
        debug!(root = %root.display(), range = %range, "Listing changed files");

        let output = Command::new(&self.program)
            .args([
                "diff-tree",
                "--no-commit-id",
                "--name-only",
                "-r",
                "--relative",
                &range,
            ])
            .current_dir(root)
            .output()
            .map_err(|e| Error::source_control(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::source_control(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}
