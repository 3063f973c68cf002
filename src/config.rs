use std::env;
use std::path::PathBuf;

const SOUNDS_DIR_ENV: &str = "HALLOWTUNE_SOUNDS_DIR";
const DEFAULT_SOUNDS_DIR: &str = "sounds";

/// Resolve the directory holding the bundled soundtrack. A `--dir`
/// flag wins, then the env override, then `./sounds`.
pub fn sounds_dir(cli_override: Option<&str>) -> PathBuf {
    if let Some(dir) = cli_override {
        return PathBuf::from(dir);
    }

    if let Ok(dir) = env::var(SOUNDS_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    PathBuf::from(DEFAULT_SOUNDS_DIR)
}
