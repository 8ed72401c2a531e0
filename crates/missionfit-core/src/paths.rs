use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const MISSIONFIT_DIR: &str = ".missionfit";
pub const CONFIG_FILE: &str = ".missionfit/config.yaml";

pub const DEFAULT_JSON_TASKS: &str = "data/tasks.json";
pub const DEFAULT_REDB_TASKS: &str = "data/tasks.redb";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn missionfit_dir(root: &Path) -> PathBuf {
    root.join(MISSIONFIT_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path: absolute paths are kept, relative ones hang off `root`.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}
