//! Version numbers embedded in backup file names

use crate::error::WalkError;
use regex::Regex;
use std::sync::OnceLock;

fn digit_run() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"))
}

/// Parse the first run of decimal digits at or after `search_start`.
///
/// `search_start` is normally the length of the version-stripped prefix, so
/// `parse_version("/tmp/foo.txt.~12~", "/tmp/foo.txt.~".len())` yields 12
/// even though the directory part may itself contain digits.
pub fn parse_version(file_name: &str, search_start: usize) -> Result<u64, WalkError> {
    let no_version = || WalkError::NoVersion {
        name: file_name.to_string(),
        start: search_start,
    };

    if search_start > file_name.len() || !file_name.is_char_boundary(search_start) {
        return Err(no_version());
    }

    let found = digit_run()
        .find_at(file_name, search_start)
        .ok_or_else(no_version)?;
    found.as_str().parse::<u64>().map_err(|_| no_version())
}
