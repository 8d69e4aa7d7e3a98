//! Diff engines: the contract the session relies on and two implementations

use imara_diff::{Algorithm, BasicLineDiffPrinter, Diff, InternedInput, UnifiedDiffConfig};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Produces a human-readable unified diff between two files.
///
/// Called synchronously; the session never issues a second call before the
/// first has returned.
pub trait DiffEngine {
    fn diff(&self, left: &Path, right: &Path) -> Result<String, DiffError>;
}

fn identical(left: &Path, right: &Path) -> String {
    format!(
        "Files {} and {} are identical\n",
        left.display(),
        right.display()
    )
}

fn read_lossy(path: &Path) -> Result<String, DiffError> {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|source| DiffError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// In-process engine backed by imara-diff
#[derive(Debug, Clone, Copy)]
pub struct BuiltinDiff {
    context: u32,
}

impl Default for BuiltinDiff {
    fn default() -> Self {
        Self { context: 3 }
    }
}

impl BuiltinDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unchanged lines shown around each hunk
    pub fn with_context(mut self, context: u32) -> Self {
        self.context = context;
        self
    }

    pub fn diff_strings(&self, left_name: &str, left: &str, right_name: &str, right: &str) -> String {
        let input = InternedInput::new(left, right);
        let mut diff = Diff::compute(Algorithm::Histogram, &input);
        diff.postprocess_lines(&input);

        let mut config = UnifiedDiffConfig::default();
        config.context_len(self.context);
        let hunks = diff
            .unified_diff(&BasicLineDiffPrinter(&input.interner), config, &input)
            .to_string();

        if hunks.is_empty() {
            return String::new();
        }
        let mut out = format!("--- {left_name}\n+++ {right_name}\n");
        out.push_str(&hunks);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

impl DiffEngine for BuiltinDiff {
    fn diff(&self, left: &Path, right: &Path) -> Result<String, DiffError> {
        let left_text = read_lossy(left)?;
        let right_text = read_lossy(right)?;
        let out = self.diff_strings(
            &left.display().to_string(),
            &left_text,
            &right.display().to_string(),
            &right_text,
        );
        if out.is_empty() {
            return Ok(identical(left, right));
        }
        Ok(out)
    }
}

/// Runs an external `diff`-compatible program
#[derive(Debug, Clone)]
pub struct ExternalDiff {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ExternalDiff {
    fn default() -> Self {
        Self {
            program: "diff".to_string(),
            args: vec!["-u".to_string()],
        }
    }
}

impl ExternalDiff {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl DiffEngine for ExternalDiff {
    fn diff(&self, left: &Path, right: &Path) -> Result<String, DiffError> {
        // diff(1) reports a missing operand through exit status 2; check
        // up front so the error names the file
        for path in [left, right] {
            if let Err(source) = std::fs::metadata(path) {
                return Err(DiffError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(left)
            .arg(right)
            .output()
            .map_err(|source| DiffError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        match output.status.code() {
            Some(0) | Some(1) => {
                let text = String::from_utf8_lossy(&output.stdout).to_string();
                if text.is_empty() {
                    Ok(identical(left, right))
                } else {
                    Ok(text)
                }
            }
            _ => Err(DiffError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

/// Line counts of a unified diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffStats {
    pub fn from_unified(text: &str) -> Self {
        let mut stats = DiffStats::default();
        let mut in_hunk = false;
        for line in text.lines() {
            if line.starts_with("@@") {
                in_hunk = true;
                continue;
            }
            if !in_hunk {
                continue;
            }
            match line.as_bytes().first() {
                Some(b'+') => stats.insertions += 1,
                Some(b'-') => stats.deletions += 1,
                _ => {}
            }
        }
        stats
    }
}
