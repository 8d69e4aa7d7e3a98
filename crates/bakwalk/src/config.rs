//! Configuration file support for bakwalk
//!
//! Config file location: `~/.config/bakwalk/config.toml` (XDG_CONFIG_HOME)
//!
//! Example config:
//! ```toml
//! [backup]
//! version_control = "numbered"
//! directory = "~/.backups"
//!
//! [diff]
//! engine = "builtin"
//! context = 3
//! program = "diff"
//! args = ["-u"]
//!
//! [ui]
//! status_bar = true
//! line_numbers = false
//! confirm_cleanup = true
//! time = "relative"
//! ```

use anyhow::{anyhow, Result};
use bakwalk_core::{BackupNaming, BuiltinDiff, DiffEngine, ExternalDiff, VersionControl};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Backup location and policy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// "numbered", "existing" or "never"; falls back to $VERSION_CONTROL
    pub version_control: Option<String>,
    /// Single directory holding every backup (path-mangled names)
    pub directory: Option<PathBuf>,
}

/// Which diff engine to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-process unified diff
    #[default]
    Builtin,
    /// External `diff`-compatible program
    External,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub engine: EngineKind,
    /// Context lines for the builtin engine
    pub context: u32,
    /// Program for the external engine
    pub program: String,
    pub args: Vec<String>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Builtin,
            context: 3,
            program: "diff".to_string(),
            args: vec!["-u".to_string()],
        }
    }
}

/// How file times are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    #[default]
    Relative,
    Absolute,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Show the status bar
    pub status_bar: bool,
    /// Number the lines of opened backups
    pub line_numbers: bool,
    /// Ask before closing backup views on quit (false closes them outright)
    pub confirm_cleanup: bool,
    pub time: TimeMode,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            status_bar: true,
            line_numbers: false,
            confirm_cleanup: true,
            time: TimeMode::Relative,
        }
    }
}

/// Root configuration
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backup: BackupConfig,
    pub diff: DiffConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Get all possible config file paths in priority order
    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("bakwalk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("bakwalk").join("config.toml"));
        }

        // ~/Library/Application Support on macOS
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("bakwalk").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        paths
    }

    /// Get the first existing config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|p| p.exists())
    }

    /// Load config from XDG config path
    /// Returns default config if file doesn't exist or can't be parsed
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| {
                Self::parse(&content)
                    .map_err(|e| {
                        eprintln!("Warning: Failed to parse config: {}", e);
                        e
                    })
                    .ok()
            })
            .unwrap_or_default()
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// CLI value, then config file, then `$VERSION_CONTROL`
    pub fn version_control(&self, cli: Option<&str>) -> Result<VersionControl> {
        let env = std::env::var("VERSION_CONTROL").ok();
        self.resolve_version_control(cli, env.as_deref())
    }

    fn resolve_version_control(
        &self,
        cli: Option<&str>,
        env: Option<&str>,
    ) -> Result<VersionControl> {
        let chosen = cli
            .or(self.backup.version_control.as_deref())
            .or(env);
        match chosen {
            Some(value) => value.parse::<VersionControl>().map_err(|e| anyhow!(e)),
            None => Ok(VersionControl::default()),
        }
    }

    /// Backup naming, with the CLI directory taking precedence
    pub fn naming(&self, cli_dir: Option<&Path>) -> BackupNaming {
        match cli_dir.map(Path::to_path_buf).or_else(|| self.backup.directory.clone()) {
            Some(dir) => BackupNaming::relocated(expand_home(&dir)),
            None => BackupNaming::same_directory(),
        }
    }

    pub fn engine(&self, kind: Option<EngineKind>, context: Option<u32>) -> Box<dyn DiffEngine> {
        match kind.unwrap_or(self.diff.engine) {
            EngineKind::Builtin => {
                Box::new(BuiltinDiff::new().with_context(context.unwrap_or(self.diff.context)))
            }
            EngineKind::External => Box::new(ExternalDiff::new(
                self.diff.program.clone(),
                self.diff.args.clone(),
            )),
        }
    }
}

/// Expand a leading `~/`
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
