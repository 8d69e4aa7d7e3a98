//! What the session needs from whatever shows things to the user

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Opaque handle to a view opened by the display layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(pub u64);

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("view {0} is already closed")]
    Gone(ResourceHandle),
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Display collaborator of a [`crate::NavigationSession`].
///
/// Views opened through [`DisplayLayer::open_in_secondary_view`] may be shared
/// with the rest of the environment, so they are only ever closed through
/// [`DisplayLayer::destroy`].
pub trait DisplayLayer {
    /// Replace the main surface's content
    fn render_text(&mut self, text: &str);
    fn set_status_line(&mut self, text: &str);
    fn open_in_secondary_view(&mut self, path: &Path) -> Result<ResourceHandle, DisplayError>;
    /// Every view currently open, whoever opened it
    fn list_open_resources(&self) -> Vec<(PathBuf, ResourceHandle)>;
    fn destroy(&mut self, handle: ResourceHandle) -> Result<(), DisplayError>;
    /// Ask a yes/no question; blocks until answered
    fn confirm(&mut self, prompt: &str) -> bool;
    fn close_own_surface(&mut self);
}
