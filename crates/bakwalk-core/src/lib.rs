//! bakwalk-core - discover numbered backups of a file and walk them one diff at a time
//!
//! The core knows nothing about terminals. It finds and orders backups
//! ([`BackupLocator`]), computes diffs through a [`DiffEngine`], and drives a
//! [`DisplayLayer`] supplied by the front end from a [`NavigationSession`].

pub mod backup;
pub mod blame;
pub mod cleanup;
pub mod diff;
pub mod display;
pub mod error;
pub mod session;
pub mod version;

pub use backup::{list_entries_with_prefix, BackupLocator, BackupNaming, BackupSet, BackupVersion};
pub use blame::BlameOutcome;
pub use cleanup::{cleanup, owned_resources, CleanupReport};
pub use diff::{BuiltinDiff, DiffEngine, DiffError, DiffStats, ExternalDiff};
pub use display::{DisplayError, DisplayLayer, ResourceHandle};
pub use error::WalkError;
pub use session::{
    decorate_label, NavigationSession, Refresh, SessionOptions, Status, VersionControl,
};
pub use version::parse_version;

#[cfg(test)]
pub(crate) mod testing;
