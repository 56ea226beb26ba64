use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

pub const CONFIG_ENV: &str = "POMOLOOP_CONFIG";
pub const DEBUG_ENV: &str = "POMOLOOP_DEBUG";

const MIN_TICK_MS: u64 = 10;
const MAX_TICK_MS: u64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Granularity of the cancellable phase wait.
    pub tick_interval_ms: u64,
    /// How often the menu checks whether the status line changed.
    pub poll_interval_ms: u64,
    pub clear_screen: bool,
    pub log_file: Option<PathBuf>,
    #[serde(skip)]
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            poll_interval_ms: 1000,
            clear_screen: true,
            log_file: None,
            debug: false,
        }
    }
}

impl Settings {
    /// Loads settings from `$POMOLOOP_CONFIG` (if set) and applies
    /// environment overrides. A missing file yields the defaults.
    pub fn from_env() -> Result<Self> {
        let mut settings = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_or_default(Path::new(&path))?,
            None => Self::default(),
        };
        settings.debug = debug_from_env();
        Ok(settings)
    }

    /// Defaults with only the environment overrides applied.
    pub fn fallback() -> Self {
        Self {
            debug: debug_from_env(),
            ..Self::default()
        }
    }

    fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.clamp(MIN_TICK_MS, MAX_TICK_MS))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_TICK_MS))
    }
}

fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
