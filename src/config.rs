use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

const CONFIG_FILE: &str = "config.json";
const DATA_DIR_ENV: &str = "LOSTBOX_DATA_DIR";
const DEBUG_ENV: &str = "LOSTBOX_DEBUG";

/// Horizons driving the load state machine and the background/recents expiry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Timings {
    pub slow_load_ms: u64,
    pub wait_ms: u64,
    pub progress_tick_ms: u64,
    pub background_ttl_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            slow_load_ms: 5_000,
            wait_ms: 30_000,
            progress_tick_ms: 100,
            background_ttl_ms: 5 * 60 * 1000,
        }
    }
}

impl Timings {
    pub fn slow_load(&self) -> Duration {
        Duration::from_millis(self.slow_load_ms)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms.max(1))
    }

    pub fn background_ttl(&self) -> Duration {
        Duration::from_millis(self.background_ttl_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShellConfig {
    /// Directory the `app/com.<id>.los.html` locators are resolved against.
    pub web_root: PathBuf,
    /// Statically declared home-screen apps.
    pub apps: Vec<String>,
    pub recents_capacity: usize,
    pub timings: Timings,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from("."),
            apps: ["camera", "gallery", "calcul", "notes", "security", "browser", "mail"]
                .into_iter()
                .map(String::from)
                .collect(),
            recents_capacity: 4,
            timings: Timings::default(),
        }
    }
}

impl ShellConfig {
    /// Reads `config.json` from `data_dir`. A missing file yields defaults, and so
    /// does a file that fails to parse (with a warning) so a bad edit never bricks boot.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        match serde_json::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(err) => {
                warn!(
                    "Ignoring malformed config at {}: {err}; using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
        let path = data_dir.join(CONFIG_FILE);
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(&path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    dirs::data_dir()
        .map(|dir| dir.join("lostbox"))
        .unwrap_or_else(|| PathBuf::from(".lostbox"))
}

pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
