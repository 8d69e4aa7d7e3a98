//! Test doubles for the display layer and diff engine

use crate::diff::{DiffEngine, DiffError};
use crate::display::{DisplayError, DisplayLayer, ResourceHandle};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

#[derive(Default)]
pub(crate) struct FakeDisplay {
    pub text: String,
    pub status: String,
    pub renders: usize,
    pub views: Vec<(PathBuf, ResourceHandle)>,
    pub next_handle: u64,
    pub answer: bool,
    pub prompts: Vec<String>,
    pub fail_destroy: Vec<ResourceHandle>,
    pub closed: bool,
}

impl DisplayLayer for FakeDisplay {
    fn render_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.renders += 1;
    }

    fn set_status_line(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn open_in_secondary_view(&mut self, path: &Path) -> Result<ResourceHandle, DisplayError> {
        self.next_handle += 1;
        let handle = ResourceHandle(self.next_handle);
        self.views.push((path.to_path_buf(), handle));
        Ok(handle)
    }

    fn list_open_resources(&self) -> Vec<(PathBuf, ResourceHandle)> {
        self.views.clone()
    }

    fn destroy(&mut self, handle: ResourceHandle) -> Result<(), DisplayError> {
        if self.fail_destroy.contains(&handle) {
            return Err(DisplayError::Gone(handle));
        }
        let before = self.views.len();
        self.views.retain(|(_, h)| *h != handle);
        if self.views.len() == before {
            return Err(DisplayError::Gone(handle));
        }
        Ok(())
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answer
    }

    fn close_own_surface(&mut self) {
        self.closed = true;
    }
}

/// Engine that reports which files it was asked about
#[derive(Default)]
pub(crate) struct FakeEngine {
    pub calls: RefCell<Vec<(PathBuf, PathBuf)>>,
    pub fail: Cell<bool>,
}

impl DiffEngine for FakeEngine {
    fn diff(&self, left: &Path, right: &Path) -> Result<String, DiffError> {
        self.calls
            .borrow_mut()
            .push((left.to_path_buf(), right.to_path_buf()));
        if self.fail.get() {
            return Err(DiffError::Read {
                path: right.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "vanished"),
            });
        }
        Ok(format!("{} -> {}", left.display(), right.display()))
    }
}

impl DiffEngine for std::rc::Rc<FakeEngine> {
    fn diff(&self, left: &Path, right: &Path) -> Result<String, DiffError> {
        self.as_ref().diff(left, right)
    }
}
