use std::{env, fs, path::PathBuf};

/// Environment variable overriding the default database location.
pub const DB_PATH_ENV: &str = "CAMPUS_SCRAPE_DB";

pub fn data_root() -> PathBuf {
    let base = dirs::data_dir()
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("campus-scrape")
}

pub fn database_path() -> PathBuf {
    if let Ok(path) = env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    data_root().join("campus-scrape.sqlite")
}

pub fn ensure_parent(path: &PathBuf) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!("failed to create parent {:?}: {err}", parent);
        }
    }
}
