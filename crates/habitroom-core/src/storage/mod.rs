mod config;
pub mod ledger;
mod settings;

pub use config::HabitStore;
pub use ledger::{DayRecord, LedgerDocument, LedgerEvent, ScoreLedger};
pub use settings::{parse_utc_offset, Settings};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const HABITS_FILE: &str = "habits.json";
pub const LEDGER_FILE: &str = "ledger.json";
pub const SETTINGS_FILE: &str = "settings.toml";

/// Returns `~/.config/habitroom[-dev]/` based on HABITROOM_ENV.
///
/// Set HABITROOM_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HABITROOM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("habitroom-dev")
    } else {
        base_dir.join("habitroom")
    };

    ensure_dir(&dir)?;
    Ok(dir)
}

/// Create `dir` (and parents) if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::DataDir {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })
}

/// Whole-file overwrite through a sibling temp file so a crash mid-write
/// never leaves a truncated document behind.
pub(crate) fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}
