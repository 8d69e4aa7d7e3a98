//! Application state and key handling

use crate::screen::{KeySource, Prompt, Screen};
use bakwalk_core::{
    decorate_label, BlameOutcome, DiffStats, DisplayLayer, NavigationSession, WalkError,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::Backend;
use std::path::PathBuf;


const BLAME_LABEL: &str = "Blame line: ";

/// The main application state
pub struct App {
    /// Active walk; `None` once quit
    pub session: Option<NavigationSession>,
    /// The file being walked, kept for reopening after the session is gone
    pub original: PathBuf,
    /// Pending count for vim-style commands (e.g., 3p = three backups older)
    pub pending_count: Option<usize>,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: NavigationSession) -> Self {
        let original = session.set().original().to_path_buf();
        Self {
            session: Some(session),
            original,
            pending_count: None,
            should_quit: false,
        }
    }

    pub fn push_count_digit(&mut self, digit: u8) {
        let current = self.pending_count.unwrap_or(0);
        self.pending_count = Some(current.saturating_mul(10).saturating_add(digit as usize));
    }

    pub fn take_count(&mut self) -> usize {
        self.pending_count.take().unwrap_or(1).max(1)
    }

    /// Count for a session step; huge counts stay positive
    fn take_step(&mut self) -> i64 {
        i64::try_from(self.take_count()).unwrap_or(i64::MAX)
    }

    pub fn reset_count(&mut self) {
        self.pending_count = None;
    }

    /// Copy session facts the renderer shows but the display layer is not told
    pub fn sync<B: Backend, K: KeySource>(&self, screen: &mut Screen<B, K>) {
        match &self.session {
            Some(session) => {
                screen.view.position = Some((session.cursor() + 1, session.set().len()));
                let stats = DiffStats::from_unified(&session.refresh().text);
                screen.view.insertions = stats.insertions;
                screen.view.deletions = stats.deletions;
            }
            None => screen.view.position = None,
        }
    }

    fn report<B: Backend, K: KeySource>(screen: &mut Screen<B, K>, result: Result<(), WalkError>) {
        if let Err(err) = result {
            tracing::debug!(error = %err, "command failed");
            screen.view.message = Some(err.to_string());
        }
    }

    pub fn handle_key<B: Backend, K: KeySource>(
        &mut self,
        key: KeyEvent,
        screen: &mut Screen<B, K>,
    ) {
        screen.view.message = None;

        if screen.view.show_help {
            screen.view.show_help = false;
            return;
        }
        if matches!(screen.view.prompt, Some(Prompt::Input { .. })) {
            self.handle_input_key(key, screen);
            return;
        }

        match key.code {
            KeyCode::Char(c @ '0'..='9') if c != '0' || self.pending_count.is_some() => {
                self.push_count_digit(c as u8 - b'0');
                return;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.quit(screen),
            KeyCode::Char('n') => {
                let count = self.take_step();
                self.with_session(screen, |session, display| session.next(count, display));
            }
            KeyCode::Char('p') => {
                let count = self.take_step();
                self.with_session(screen, |session, display| session.previous(count, display));
            }
            KeyCode::Char('N') => {
                self.with_session(screen, |session, display| session.goto_newest(display));
            }
            KeyCode::Char('P') => {
                self.with_session(screen, |session, display| session.goto_oldest(display));
            }
            KeyCode::Char('o') | KeyCode::Char('w') => {
                self.with_session(screen, |session, display| {
                    session.open_current_in_other_view(display).map(|_| ())
                });
            }
            KeyCode::Char('O') => {
                let result = screen
                    .open_in_secondary_view(&self.original)
                    .map(|_| ())
                    .map_err(WalkError::from);
                Self::report(screen, result);
            }
            KeyCode::Char('x') => {
                let result = screen.close_focused().map_err(WalkError::from);
                Self::report(screen, result);
            }
            KeyCode::Tab => screen.view.cycle_pane(),
            KeyCode::Char('b') if self.session.is_some() => {
                screen.view.prompt = Some(Prompt::Input {
                    label: BLAME_LABEL.to_string(),
                    buffer: String::new(),
                });
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let count = self.take_count();
                screen.view.scroll_down(count);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let count = self.take_count();
                screen.view.scroll_up(count);
            }
            KeyCode::Char('J') => {
                let count = self.take_count();
                screen.view.scroll_pane_down(count);
            }
            KeyCode::Char('K') => {
                let count = self.take_count();
                screen.view.scroll_pane_up(count);
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                screen.view.scroll_down(10);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                screen.view.scroll_up(10);
            }
            KeyCode::Char('g') | KeyCode::Home => screen.view.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => screen.view.scroll_down(usize::MAX / 2),
            KeyCode::Char('?') => screen.view.show_help = true,
            _ => {}
        }
        self.reset_count();
        self.sync(screen);
    }

    fn handle_input_key<B: Backend, K: KeySource>(
        &mut self,
        key: KeyEvent,
        screen: &mut Screen<B, K>,
    ) {
        let Some(Prompt::Input { buffer, .. }) = screen.view.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Esc => screen.view.prompt = None,
            KeyCode::Enter => {
                let needle = std::mem::take(buffer);
                screen.view.prompt = None;
                self.blame(&needle, screen);
            }
            _ => {}
        }
    }

    fn blame<B: Backend, K: KeySource>(&mut self, needle: &str, screen: &mut Screen<B, K>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let display: &mut dyn DisplayLayer = &mut *screen;
        match session.blame(needle, display) {
            Ok(BlameOutcome::Introduced { label }) => {
                screen.view.message =
                    Some(format!("line added in {}", decorate_label(&label)));
            }
            Ok(BlameOutcome::PresentInOldest { number }) => {
                screen.view.message = Some(format!("line already in oldest backup ~{number}~"));
            }
            Err(err) => Self::report(screen, Err(err)),
        }
        self.sync(screen);
    }

    fn with_session<B, K, F>(&mut self, screen: &mut Screen<B, K>, op: F)
    where
        B: Backend,
        K: KeySource,
        F: FnOnce(&mut NavigationSession, &mut dyn DisplayLayer) -> Result<(), WalkError>,
    {
        if let Some(session) = self.session.as_mut() {
            let display: &mut dyn DisplayLayer = &mut *screen;
            let result = op(session, display);
            Self::report(screen, result);
        }
    }

    /// First `q` ends the walk; if backup views were kept open they stay
    /// browsable and the next `q` exits.
    pub fn quit<B: Backend, K: KeySource>(&mut self, screen: &mut Screen<B, K>) {
        let Some(session) = self.session.take() else {
            self.should_quit = true;
            return;
        };
        let report = session.quit(&mut *screen);
        if report.failed > 0 {
            screen.view.message = Some(format!("{} view(s) could not be closed", report.failed));
        }
        if screen.view.panes.is_empty() {
            self.should_quit = true;
        }
    }
}
