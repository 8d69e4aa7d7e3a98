//! Find the backup in which a line first appeared

use crate::display::DisplayLayer;
use crate::error::WalkError;
use crate::session::{NavigationSession, ORIGINAL_LABEL};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlameOutcome {
    /// The line is missing from the backup now under the cursor and present
    /// in `label`, its newer neighbour
    Introduced { label: String },
    /// Every backup from the starting point down to the oldest has the line
    PresentInOldest { number: u64 },
}

fn contains_line(path: &Path, needle: &str) -> Result<bool, WalkError> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.lines().any(|line| line.contains(needle)))
}

impl NavigationSession {
    /// Walk toward older backups, starting at the left side of the current
    /// diff, for as long as `line` is still present, and stop on the diff
    /// that introduces it.
    pub fn blame(
        &mut self,
        line: &str,
        display: &mut dyn DisplayLayer,
    ) -> Result<BlameOutcome, WalkError> {
        let needle = line.trim();
        if needle.is_empty() {
            return Err(WalkError::EmptyNeedle);
        }

        let versions = self.set().versions();
        // (label, path, cursor that shows this file on the right)
        let mut chain: Vec<(String, PathBuf, Option<usize>)> = Vec::new();
        let first = match self.cursor() {
            0 => {
                chain.push((
                    ORIGINAL_LABEL.to_string(),
                    self.set().original().to_path_buf(),
                    None,
                ));
                0
            }
            cursor => cursor - 1,
        };
        for (index, version) in versions.iter().enumerate().skip(first) {
            chain.push((version.number.to_string(), version.path.clone(), Some(index)));
        }

        let (start_label, start_path, _) = &chain[0];
        if !contains_line(start_path, needle)? {
            return Err(WalkError::LineNotFound {
                line: needle.to_string(),
                label: start_label.clone(),
            });
        }

        let mut target = None;
        for pair in chain.windows(2) {
            let (newer_label, _, _) = &pair[0];
            let (_, path, index) = &pair[1];
            if !contains_line(path, needle)? {
                target = index.map(|i| (i, newer_label.clone()));
                break;
            }
        }

        let (cursor, outcome) = match target {
            Some((cursor, label)) => (cursor, BlameOutcome::Introduced { label }),
            None => {
                let oldest = self.set().len() - 1;
                let number = self.set().oldest().number;
                (oldest, BlameOutcome::PresentInOldest { number })
            }
        };
        tracing::debug!(needle, ?outcome, "blame");

        if cursor != self.cursor() {
            self.move_to(cursor, display)?;
        }
        Ok(outcome)
    }
}
