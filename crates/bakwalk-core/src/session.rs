//! Navigation through a backup set, one diff at a time

use crate::backup::{BackupLocator, BackupNaming, BackupSet};
use crate::cleanup::{cleanup, CleanupReport};
use crate::diff::DiffEngine;
use crate::display::{DisplayLayer, ResourceHandle};
use crate::error::WalkError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Label of the original file in diffs and status lines
pub const ORIGINAL_LABEL: &str = "orig";

/// Backup policy of the environment, in GNU `VERSION_CONTROL` terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionControl {
    /// Always make numbered backups (`t`)
    Numbered,
    /// Numbered only for files that already have them (`nil`)
    #[default]
    Existing,
    /// Single `name~` backups only
    Never,
}

impl VersionControl {
    pub fn numbered_backups(self) -> bool {
        self == VersionControl::Numbered
    }
}

impl FromStr for VersionControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numbered" | "t" => Ok(VersionControl::Numbered),
            "existing" | "nil" => Ok(VersionControl::Existing),
            "never" | "simple" => Ok(VersionControl::Never),
            other => Err(format!(
                "unknown version control {other:?} (expected numbered, existing or never)"
            )),
        }
    }
}

impl fmt::Display for VersionControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionControl::Numbered => "numbered",
            VersionControl::Existing => "existing",
            VersionControl::Never => "never",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub version_control: VersionControl,
    pub naming: BackupNaming,
}

/// Everything shown for one cursor position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refresh {
    pub left: PathBuf,
    pub left_label: String,
    pub right: PathBuf,
    pub right_label: String,
    /// Version one step newer than the current one
    pub newer: Option<u64>,
    /// Version one step older than the current one
    pub older: Option<u64>,
    pub text: String,
}

impl Refresh {
    pub fn status(&self) -> Status {
        Status {
            left_label: self.left_label.clone(),
            right_label: self.right_label.clone(),
            newer: self.newer,
            older: self.older,
        }
    }
}

/// Display-only metadata about the current position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub left_label: String,
    pub right_label: String,
    pub newer: Option<u64>,
    pub older: Option<u64>,
}

impl Status {
    /// `[n] newer ~9~ << diff ~9~ -> ~5~ >> [p] older ~3~`
    pub fn header(&self) -> String {
        let mut header = String::new();
        if let Some(newer) = self.newer {
            header.push_str(&format!("[n] newer ~{newer}~ << "));
        }
        header.push_str(&format!(
            "diff {} -> {}",
            decorate_label(&self.left_label),
            decorate_label(&self.right_label)
        ));
        if let Some(older) = self.older {
            header.push_str(&format!(" >> [p] older ~{older}~"));
        }
        header
    }
}

/// `~N~` for a backup number, `orig` as is
pub fn decorate_label(label: &str) -> String {
    if label == ORIGINAL_LABEL {
        label.to_string()
    } else {
        format!("~{label}~")
    }
}

/// A walk through the backups of one file.
///
/// Cursor 0 is the newest backup; larger cursors are older. Every position
/// shows the diff between its newer neighbour (or the original file) and
/// the backup under the cursor.
pub struct NavigationSession {
    set: BackupSet,
    cursor: usize,
    engine: Box<dyn DiffEngine>,
    refresh: Refresh,
}

impl NavigationSession {
    /// Discover the backups of `original` and show the newest one.
    pub fn start(
        original: &Path,
        options: &SessionOptions,
        engine: Box<dyn DiffEngine>,
        display: &mut dyn DisplayLayer,
    ) -> Result<Self, WalkError> {
        if !options.version_control.numbered_backups() {
            return Err(WalkError::Configuration(format!(
                "numbered backups are not enabled (version control is {}); \
                 set version_control = \"numbered\" so backups can be walked",
                options.version_control
            )));
        }

        let set = BackupLocator::new(options.naming.clone()).locate(original)?;
        Self::from_set(set, engine, display)
    }

    /// Start a session over an already located set
    pub fn from_set(
        set: BackupSet,
        engine: Box<dyn DiffEngine>,
        display: &mut dyn DisplayLayer,
    ) -> Result<Self, WalkError> {
        let refresh = compute_refresh(&set, engine.as_ref(), 0)?;
        tracing::debug!(
            original = %set.original().display(),
            backups = set.len(),
            "session started"
        );
        let session = Self {
            set,
            cursor: 0,
            engine,
            refresh,
        };
        session.show(display);
        Ok(session)
    }

    pub fn set(&self) -> &BackupSet {
        &self.set
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn refresh(&self) -> &Refresh {
        &self.refresh
    }

    pub fn status(&self) -> Status {
        self.refresh.status()
    }

    /// The backup under the cursor
    pub fn current_file(&self) -> &Path {
        &self.set.versions()[self.cursor].path
    }

    /// Move `count` backups toward newer ones. Negative counts move older.
    pub fn next(&mut self, count: i64, display: &mut dyn DisplayLayer) -> Result<(), WalkError> {
        if count < 0 {
            return self.step_older(count.unsigned_abs(), display);
        }
        self.step_newer(count.unsigned_abs(), display)
    }

    /// Move `count` backups toward older ones. Negative counts move newer.
    pub fn previous(
        &mut self,
        count: i64,
        display: &mut dyn DisplayLayer,
    ) -> Result<(), WalkError> {
        if count < 0 {
            return self.step_newer(count.unsigned_abs(), display);
        }
        self.step_older(count.unsigned_abs(), display)
    }

    pub fn goto_newest(&mut self, display: &mut dyn DisplayLayer) -> Result<(), WalkError> {
        self.step_newer(self.cursor as u64, display)
    }

    pub fn goto_oldest(&mut self, display: &mut dyn DisplayLayer) -> Result<(), WalkError> {
        self.step_older(self.max_older() as u64, display)
    }

    fn max_older(&self) -> usize {
        self.set.len() - 1 - self.cursor
    }

    fn step_newer(&mut self, count: u64, display: &mut dyn DisplayLayer) -> Result<(), WalkError> {
        if count == 0 {
            return Ok(());
        }
        if count > self.cursor as u64 {
            return Err(WalkError::OutOfRange(format!(
                "not enough newer backups, max is {}",
                self.cursor
            )));
        }
        self.move_to(self.cursor - count as usize, display)
    }

    fn step_older(&mut self, count: u64, display: &mut dyn DisplayLayer) -> Result<(), WalkError> {
        if count == 0 {
            return Ok(());
        }
        let max = self.max_older();
        if count > max as u64 {
            return Err(WalkError::OutOfRange(format!(
                "not enough older backups, max is {max}"
            )));
        }
        self.move_to(self.cursor + count as usize, display)
    }

    /// Recompute the diff for `cursor` and only then commit the move
    pub(crate) fn move_to(
        &mut self,
        cursor: usize,
        display: &mut dyn DisplayLayer,
    ) -> Result<(), WalkError> {
        let refresh = compute_refresh(&self.set, self.engine.as_ref(), cursor)?;
        tracing::debug!(from = self.cursor, to = cursor, "moved");
        self.cursor = cursor;
        self.refresh = refresh;
        self.show(display);
        Ok(())
    }

    fn show(&self, display: &mut dyn DisplayLayer) {
        display.render_text(&self.refresh.text);
        display.set_status_line(&self.refresh.status().header());
    }

    /// Open the backup under the cursor next to the diff.
    ///
    /// The view is not registered anywhere; [`NavigationSession::quit`]
    /// finds it again by its path.
    pub fn open_current_in_other_view(
        &self,
        display: &mut dyn DisplayLayer,
    ) -> Result<ResourceHandle, WalkError> {
        let handle = display.open_in_secondary_view(self.current_file())?;
        tracing::debug!(path = %self.current_file().display(), %handle, "opened backup view");
        Ok(handle)
    }

    /// Offer to close the views belonging to this backup set, then close the
    /// session's own surface whatever the answer.
    pub fn quit(self, display: &mut dyn DisplayLayer) -> CleanupReport {
        let report = cleanup(display, self.set.prefix());
        display.close_own_surface();
        tracing::debug!(?report, "session closed");
        report
    }
}

fn compute_refresh(
    set: &BackupSet,
    engine: &dyn DiffEngine,
    cursor: usize,
) -> Result<Refresh, WalkError> {
    let versions = set.versions();
    let current = &versions[cursor];
    let (left, left_label) = match cursor.checked_sub(1) {
        None => (set.original().to_path_buf(), ORIGINAL_LABEL.to_string()),
        Some(newer) => (versions[newer].path.clone(), versions[newer].number.to_string()),
    };

    let text = engine.diff(&left, &current.path)?;

    Ok(Refresh {
        left,
        left_label,
        right: current.path.clone(),
        right_label: current.number.to_string(),
        newer: cursor.checked_sub(1).map(|i| versions[i].number),
        older: versions.get(cursor + 1).map(|v| v.number),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupVersion;
    use crate::testing::{FakeDisplay, FakeEngine};
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        original: PathBuf,
        engine: Rc<FakeEngine>,
    }

    fn fixture(numbers: &[u64]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("foo.txt");
        fs::write(&original, "current\n").unwrap();
        for n in numbers {
            fs::write(dir.path().join(format!("foo.txt.~{n}~")), format!("v{n}\n")).unwrap();
        }
        Fixture {
            _dir: dir,
            original,
            engine: Rc::new(FakeEngine::default()),
        }
    }

    fn numbered() -> SessionOptions {
        SessionOptions {
            version_control: VersionControl::Numbered,
            naming: BackupNaming::same_directory(),
        }
    }

    fn start(fx: &Fixture, display: &mut FakeDisplay) -> NavigationSession {
        NavigationSession::start(&fx.original, &numbered(), Box::new(Rc::clone(&fx.engine)), display)
            .unwrap()
    }

    fn labels(session: &NavigationSession) -> (String, String) {
        let r = session.refresh();
        (r.left_label.clone(), r.right_label.clone())
    }

    #[test]
    fn test_version_control_parse() {
        assert_eq!("t".parse::<VersionControl>().unwrap(), VersionControl::Numbered);
        assert_eq!("Numbered".parse::<VersionControl>().unwrap(), VersionControl::Numbered);
        assert_eq!("nil".parse::<VersionControl>().unwrap(), VersionControl::Existing);
        assert_eq!("simple".parse::<VersionControl>().unwrap(), VersionControl::Never);
        assert!("sometimes".parse::<VersionControl>().is_err());
    }

    #[test]
    fn test_start_requires_numbered_backups() {
        let fx = fixture(&[1]);
        let mut display = FakeDisplay::default();
        let options = SessionOptions {
            version_control: VersionControl::Existing,
            ..numbered()
        };
        let result =
            NavigationSession::start(&fx.original, &options, Box::new(Rc::clone(&fx.engine)), &mut display);
        assert!(matches!(result, Err(WalkError::Configuration(_))));
        assert!(fx.engine.calls.borrow().is_empty());
        assert_eq!(display.renders, 0);
    }

    #[test]
    fn test_start_without_backups() {
        let fx = fixture(&[]);
        let mut display = FakeDisplay::default();
        let result =
            NavigationSession::start(&fx.original, &numbered(), Box::new(Rc::clone(&fx.engine)), &mut display);
        assert!(matches!(result, Err(WalkError::NoBackups { .. })));
        assert_eq!(display.renders, 0);
    }

    #[test]
    fn test_walk_scenario() {
        let fx = fixture(&[3, 5, 9]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);

        let numbers: Vec<u64> = session.set().versions().iter().map(|v| v.number).collect();
        assert_eq!(numbers, vec![9, 5, 3]);
        assert_eq!(session.cursor(), 0);
        assert_eq!(labels(&session), ("orig".to_string(), "9".to_string()));
        assert_eq!(session.refresh().left, fx.original);

        session.previous(1, &mut display).unwrap();
        assert_eq!(session.cursor(), 1);
        assert_eq!(labels(&session), ("9".to_string(), "5".to_string()));
        assert_eq!(session.status().newer, Some(9));
        assert_eq!(session.status().older, Some(3));

        session.next(1, &mut display).unwrap();
        assert_eq!(session.cursor(), 0);
        assert_eq!(labels(&session), ("orig".to_string(), "9".to_string()));
        assert_eq!(display.renders, 3);
    }

    #[test]
    fn test_status_header() {
        let fx = fixture(&[3, 5, 9]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        assert_eq!(display.status, "diff orig -> ~9~ >> [p] older ~5~");

        session.previous(1, &mut display).unwrap();
        assert_eq!(display.status, "[n] newer ~9~ << diff ~9~ -> ~5~ >> [p] older ~3~");

        session.previous(1, &mut display).unwrap();
        assert_eq!(display.status, "[n] newer ~5~ << diff ~5~ -> ~3~");
    }

    #[test]
    fn test_decorate_label() {
        assert_eq!(decorate_label(ORIGINAL_LABEL), "orig");
        assert_eq!(decorate_label("12"), "~12~");
    }

    #[test]
    fn test_huge_count_is_out_of_range() {
        let fx = fixture(&[3, 5, 9]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        session.previous(1, &mut display).unwrap();

        let err = session.previous(i64::MAX, &mut display).unwrap_err();
        assert_eq!(err.to_string(), "not enough older backups, max is 1");
        let err = session.next(i64::MAX, &mut display).unwrap_err();
        assert_eq!(err.to_string(), "not enough newer backups, max is 1");
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_next_at_newest_is_out_of_range() {
        let fx = fixture(&[1, 2]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);

        let err = session.next(1, &mut display).unwrap_err();
        assert!(matches!(err, WalkError::OutOfRange(_)));
        assert_eq!(err.to_string(), "not enough newer backups, max is 0");
        assert!(!err.is_fatal());
        assert_eq!(session.cursor(), 0);
        assert_eq!(display.renders, 1);
    }

    #[test]
    fn test_previous_at_oldest_is_out_of_range() {
        let fx = fixture(&[1, 2, 3]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        session.previous(2, &mut display).unwrap();

        let err = session.previous(1, &mut display).unwrap_err();
        assert_eq!(err.to_string(), "not enough older backups, max is 0");
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn test_over_long_jump_reports_max() {
        let fx = fixture(&[1, 2, 3, 4]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        session.previous(1, &mut display).unwrap();

        let err = session.previous(5, &mut display).unwrap_err();
        assert_eq!(err.to_string(), "not enough older backups, max is 2");
        let err = session.next(2, &mut display).unwrap_err();
        assert_eq!(err.to_string(), "not enough newer backups, max is 1");
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_negative_counts_delegate() {
        let fx = fixture(&[1, 2, 3]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);

        session.next(-2, &mut display).unwrap();
        assert_eq!(session.cursor(), 2);
        session.previous(-1, &mut display).unwrap();
        assert_eq!(session.cursor(), 1);
        let err = session.previous(-2, &mut display).unwrap_err();
        assert!(err.to_string().starts_with("not enough newer backups"));
    }

    #[test]
    fn test_zero_count_is_noop() {
        let fx = fixture(&[1, 2]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        let calls = fx.engine.calls.borrow().len();

        session.next(0, &mut display).unwrap();
        session.previous(0, &mut display).unwrap();
        assert_eq!(fx.engine.calls.borrow().len(), calls);
        assert_eq!(display.renders, 1);
    }

    #[test]
    fn test_round_trip_restores_diff() {
        let fx = fixture(&[1, 2, 3, 4, 5]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        session.previous(1, &mut display).unwrap();
        let before = session.refresh().clone();

        session.previous(3, &mut display).unwrap();
        session.next(3, &mut display).unwrap();
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.refresh(), &before);
        assert_eq!(display.text, before.text);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let fx = fixture(&[1, 2, 3, 4]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        let moves: [i64; 9] = [1, 2, -1, 3, 1, -4, 2, -2, 5];
        for (i, count) in moves.iter().enumerate() {
            let _ = if i % 2 == 0 {
                session.previous(*count, &mut display)
            } else {
                session.next(*count, &mut display)
            };
            assert!(session.cursor() < session.set().len());
        }
    }

    #[test]
    fn test_failed_refresh_keeps_position() {
        let fx = fixture(&[1, 2, 3]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        let shown = display.text.clone();

        fx.engine.fail.set(true);
        let err = session.previous(1, &mut display).unwrap_err();
        assert!(matches!(err, WalkError::Diff(_)));
        assert_eq!(session.cursor(), 0);
        assert_eq!(display.text, shown);
        assert_eq!(session.refresh().right_label, "3");

        fx.engine.fail.set(false);
        session.previous(1, &mut display).unwrap();
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_goto_ends() {
        let fx = fixture(&[1, 2, 3]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        session.goto_oldest(&mut display).unwrap();
        assert_eq!(session.current_file(), session.set().oldest().path);
        session.goto_newest(&mut display).unwrap();
        assert_eq!(session.cursor(), 0);
        // already there: nothing recomputed
        let calls = fx.engine.calls.borrow().len();
        session.goto_newest(&mut display).unwrap();
        assert_eq!(fx.engine.calls.borrow().len(), calls);
    }

    #[test]
    fn test_diff_called_with_newer_then_current() {
        let fx = fixture(&[4, 7]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        session.previous(1, &mut display).unwrap();
        let calls = fx.engine.calls.borrow();
        assert_eq!(calls[0].0, fx.original);
        assert!(calls[0].1.to_string_lossy().ends_with("foo.txt.~7~"));
        assert!(calls[1].0.to_string_lossy().ends_with("foo.txt.~7~"));
        assert!(calls[1].1.to_string_lossy().ends_with("foo.txt.~4~"));
    }

    fn open_three(session: &mut NavigationSession, display: &mut FakeDisplay) {
        for _ in 0..3 {
            session.open_current_in_other_view(display).unwrap();
            let _ = session.previous(1, display);
        }
    }

    #[test]
    fn test_quit_declined_keeps_views() {
        let fx = fixture(&[3, 5, 9]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        open_three(&mut session, &mut display);
        display.answer = false;

        let report = session.quit(&mut display);
        assert_eq!(report.matched, 3);
        assert_eq!(report.destroyed, 0);
        assert_eq!(display.views.len(), 3);
        assert!(display.closed);
    }

    #[test]
    fn test_quit_accepted_survives_failure() {
        let fx = fixture(&[3, 5, 9]);
        let mut display = FakeDisplay::default();
        let mut session = start(&fx, &mut display);
        open_three(&mut session, &mut display);
        display.answer = true;
        display.fail_destroy.push(display.views[0].1);

        let report = session.quit(&mut display);
        assert_eq!(report.destroyed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(display.views.len(), 1);
        assert!(display.closed);
    }

    #[test]
    fn test_quit_ignores_unrelated_views() {
        let fx = fixture(&[1]);
        let mut display = FakeDisplay::default();
        let session = start(&fx, &mut display);
        display.open_in_secondary_view(Path::new("/elsewhere/notes.txt")).unwrap();

        let report = session.quit(&mut display);
        assert_eq!(report.matched, 0);
        assert!(display.prompts.is_empty());
        assert_eq!(display.views.len(), 1);
        assert!(display.closed);
    }

    #[test]
    fn test_from_set_reports_diff_failure() {
        let set = BackupSet::new(
            PathBuf::from("/nowhere/x"),
            "/nowhere/x.~".to_string(),
            vec![BackupVersion {
                number: 1,
                path: PathBuf::from("/nowhere/x.~1~"),
            }],
        )
        .unwrap();
        let engine = Rc::new(FakeEngine::default());
        engine.fail.set(true);
        let mut display = FakeDisplay::default();
        let result = NavigationSession::from_set(set, Box::new(engine), &mut display);
        assert!(matches!(result, Err(WalkError::Diff(_))));
    }
}
