//! Discovery of numbered backups (`name.~N~`)

use crate::error::WalkError;
use crate::version::parse_version;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// One numbered backup on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupVersion {
    pub number: u64,
    pub path: PathBuf,
}

/// Where backups of a file are written.
///
/// By default a backup sits next to its original. With a backup directory
/// configured, every backup goes into that directory and its name encodes
/// the original's absolute path (`/` becomes `!`, literal `!` is doubled).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupNaming {
    pub directory: Option<PathBuf>,
}

impl BackupNaming {
    pub fn same_directory() -> Self {
        Self { directory: None }
    }

    pub fn relocated(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
        }
    }

    /// The version-stripped backup name shared by every backup of `original`.
    /// `original` must already be absolute.
    pub fn prefix_for(&self, original: &Path) -> String {
        match &self.directory {
            None => format!("{}.~", original.to_string_lossy()),
            Some(dir) => {
                let mangled = original
                    .to_string_lossy()
                    .replace('!', "!!")
                    .replace('/', "!");
                format!("{}.~", dir.join(mangled).to_string_lossy())
            }
        }
    }

    /// Path of the `number`th backup of `original`
    pub fn backup_name(&self, original: &Path, number: u64) -> PathBuf {
        PathBuf::from(format!("{}{}~", self.prefix_for(original), number))
    }

    /// Path the next backup of this set would be written to
    pub fn next_backup_name(&self, set: &BackupSet) -> PathBuf {
        let next = set.newest().number.saturating_add(1);
        self.backup_name(set.original(), next)
    }
}

/// All backups of one file, newest first. Never empty.
#[derive(Debug, Clone)]
pub struct BackupSet {
    original: PathBuf,
    prefix: String,
    versions: Vec<BackupVersion>,
}

impl BackupSet {
    /// Build a set from already-discovered versions.
    ///
    /// Versions are reordered newest first; an empty list is rejected.
    pub fn new(
        original: PathBuf,
        prefix: String,
        mut versions: Vec<BackupVersion>,
    ) -> Result<Self, WalkError> {
        if versions.is_empty() {
            return Err(WalkError::NoBackups { original });
        }
        // Path order first so equal numbers have a stable, repeatable order
        versions.sort_by(|a, b| a.path.cmp(&b.path));
        versions.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(Self {
            original,
            prefix,
            versions,
        })
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn versions(&self) -> &[BackupVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always false for a constructed set
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BackupVersion> {
        self.versions.get(index)
    }

    pub fn newest(&self) -> &BackupVersion {
        &self.versions[0]
    }

    pub fn oldest(&self) -> &BackupVersion {
        &self.versions[self.versions.len() - 1]
    }

    /// Index of the backup carrying `number`, if any
    pub fn position_of(&self, number: u64) -> Option<usize> {
        self.versions.iter().position(|v| v.number == number)
    }
}

/// List regular files whose full path starts with `prefix`.
///
/// A missing parent directory simply means there are no entries.
pub fn list_entries_with_prefix(prefix: &str) -> std::io::Result<Vec<PathBuf>> {
    let dir = match Path::new(prefix).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let read_dir = match std::fs::read_dir(&dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let path = entry?.path();
        if path.to_string_lossy().starts_with(prefix) && path.is_file() {
            entries.push(path);
        }
    }
    Ok(entries)
}

/// Finds the backups of a file under a naming convention
#[derive(Debug, Clone, Default)]
pub struct BackupLocator {
    naming: BackupNaming,
}

impl BackupLocator {
    pub fn new(naming: BackupNaming) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> &BackupNaming {
        &self.naming
    }

    pub fn locate(&self, original: &Path) -> Result<BackupSet, WalkError> {
        let original = absolutize(original)?;
        let prefix = self.naming.prefix_for(&original);
        tracing::debug!(prefix = %prefix, "scanning for backups");

        let mut versions = Vec::new();
        for path in list_entries_with_prefix(&prefix)? {
            if path == original {
                continue;
            }
            let name = path.to_string_lossy();
            if !is_numbered_suffix(&name[prefix.len()..]) {
                tracing::debug!(path = %name, "skipping non-backup entry");
                continue;
            }
            let number = match parse_version(&name, prefix.len()) {
                Ok(number) => number,
                Err(err) => {
                    tracing::debug!(path = %name, error = %err, "skipping unreadable version");
                    continue;
                }
            };
            versions.push(BackupVersion {
                number,
                path: path.clone(),
            });
        }

        tracing::debug!(count = versions.len(), "backups found");
        BackupSet::new(original, prefix, versions)
    }
}

/// `N~` with at least one digit
fn is_numbered_suffix(rest: &str) -> bool {
    match rest.strip_suffix('~') {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Absolute, lexically normalized form of `path`. Symlinks are left alone.
fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
