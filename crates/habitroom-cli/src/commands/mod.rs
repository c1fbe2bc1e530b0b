use std::path::PathBuf;

use habitroom_core::storage;

pub mod habits;
pub mod run;
pub mod score;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// `--data-dir` if given (created when missing), otherwise the default
/// per-user directory.
pub fn resolve_data_dir(dir: Option<PathBuf>) -> CliResult<PathBuf> {
    match dir {
        Some(dir) => {
            storage::ensure_dir(&dir)?;
            Ok(dir)
        }
        None => Ok(storage::data_dir()?),
    }
}
