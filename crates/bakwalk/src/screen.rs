//! Terminal implementation of the display layer

use crate::ui;
use bakwalk_core::{DisplayError, DisplayLayer, ResourceHandle};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

/// Where key presses come from
pub trait KeySource {
    /// `Ok(None)` means "nothing to handle, just redraw" (e.g. a resize)
    fn next_key(&mut self) -> io::Result<Option<KeyEvent>>;
}

/// Keys from the real terminal
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Option<KeyEvent>> {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

/// Pre-recorded keys; runs dry with an `UnexpectedEof` error
#[derive(Default)]
pub struct ScriptedKeys(pub VecDeque<KeyEvent>);

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> io::Result<Option<KeyEvent>> {
        self.0
            .pop_front()
            .map(Some)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more keys"))
    }
}

/// A file opened next to the diff
#[derive(Debug, Clone)]
pub struct Pane {
    pub handle: ResourceHandle,
    pub path: PathBuf,
    pub content: String,
    /// Modification time, pre-formatted
    pub modified: String,
}

impl Pane {
    pub fn title(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Confirm(String),
    Input { label: String, buffer: String },
}

/// Everything the renderer needs
#[derive(Debug, Default)]
pub struct View {
    pub diff: String,
    pub status: String,
    /// Shown in place of the status line until the next key
    pub message: Option<String>,
    pub prompt: Option<Prompt>,
    pub panes: Vec<Pane>,
    pub focused_pane: usize,
    pub scroll: usize,
    pub pane_scroll: usize,
    pub show_help: bool,
    /// The diff surface is gone; only panes remain
    pub closed: bool,
    /// 1-based position and total, for the status bar
    pub position: Option<(usize, usize)>,
    pub insertions: usize,
    pub deletions: usize,
    pub status_bar: bool,
    pub line_numbers: bool,
}

impl View {
    pub fn focused(&self) -> Option<&Pane> {
        self.panes.get(self.focused_pane)
    }

    pub fn cycle_pane(&mut self) {
        if !self.panes.is_empty() {
            self.focused_pane = (self.focused_pane + 1) % self.panes.len();
            self.pane_scroll = 0;
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max = self.diff.lines().count().saturating_sub(1);
        self.scroll = (self.scroll + lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_pane_down(&mut self, lines: usize) {
        let max = self
            .focused()
            .map(|p| p.content.lines().count().saturating_sub(1))
            .unwrap_or(0);
        self.pane_scroll = (self.pane_scroll + lines).min(max);
    }

    pub fn scroll_pane_up(&mut self, lines: usize) {
        self.pane_scroll = self.pane_scroll.saturating_sub(lines);
    }
}

/// Terminal, key source and view state behind one [`DisplayLayer`]
pub struct Screen<B: Backend, K: KeySource> {
    pub terminal: Terminal<B>,
    pub keys: K,
    pub view: View,
    /// Answer every confirmation with yes without asking
    pub auto_confirm: bool,
    pub time: crate::time_format::TimeFormatter,
    next_handle: u64,
}

impl<B: Backend, K: KeySource> Screen<B, K> {
    pub fn new(terminal: Terminal<B>, keys: K) -> Self {
        Self {
            terminal,
            keys,
            view: View {
                status_bar: true,
                ..View::default()
            },
            auto_confirm: false,
            time: crate::time_format::TimeFormatter::default(),
            next_handle: 0,
        }
    }

    /// Draw the view; false when the terminal refused
    pub fn redraw(&mut self) -> bool {
        let view = &self.view;
        self.terminal.draw(|frame| ui::draw(frame, view)).is_ok()
    }

    /// Close the focused pane
    pub fn close_focused(&mut self) -> Result<(), DisplayError> {
        match self.view.focused().map(|p| p.handle) {
            Some(handle) => self.destroy(handle),
            None => Ok(()),
        }
    }
}

impl<K: KeySource> Screen<CrosstermBackend<io::Stdout>, K> {
    pub fn draw(&mut self) -> io::Result<()> {
        let view = &self.view;
        self.terminal.draw(|frame| ui::draw(frame, view))?;
        Ok(())
    }
}

impl<B: Backend, K: KeySource> DisplayLayer for Screen<B, K> {
    fn render_text(&mut self, text: &str) {
        self.view.diff = text.to_string();
        self.view.scroll = 0;
    }

    fn set_status_line(&mut self, text: &str) {
        self.view.status = text.to_string();
    }

    fn open_in_secondary_view(&mut self, path: &Path) -> Result<ResourceHandle, DisplayError> {
        let bytes = std::fs::read(path).map_err(|source| DisplayError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.next_handle += 1;
        let handle = ResourceHandle(self.next_handle);
        self.view.panes.push(Pane {
            handle,
            path: path.to_path_buf(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
            modified: self.time.format_modified(path),
        });
        self.view.focused_pane = self.view.panes.len() - 1;
        self.view.pane_scroll = 0;
        Ok(handle)
    }

    fn list_open_resources(&self) -> Vec<(PathBuf, ResourceHandle)> {
        self.view
            .panes
            .iter()
            .map(|p| (p.path.clone(), p.handle))
            .collect()
    }

    fn destroy(&mut self, handle: ResourceHandle) -> Result<(), DisplayError> {
        let index = self
            .view
            .panes
            .iter()
            .position(|p| p.handle == handle)
            .ok_or(DisplayError::Gone(handle))?;
        self.view.panes.remove(index);
        if self.view.focused_pane >= self.view.panes.len() {
            self.view.focused_pane = self.view.panes.len().saturating_sub(1);
        }
        if index <= self.view.focused_pane {
            self.view.pane_scroll = 0;
        }
        Ok(())
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.auto_confirm {
            return true;
        }
        self.view.prompt = Some(Prompt::Confirm(prompt.to_string()));
        let answer = loop {
            if !self.redraw() {
                tracing::warn!("draw failed while asking for confirmation");
            }
            match self.keys.next_key() {
                Ok(Some(key)) => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => break true,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => break false,
                    _ => {}
                },
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "no answer, assuming no");
                    break false;
                }
            }
        };
        self.view.prompt = None;
        answer
    }

    fn close_own_surface(&mut self) {
        self.view.closed = true;
        self.view.diff.clear();
        self.view.status.clear();
        self.view.position = None;
    }
}
