//! Path utilities

use std::path::{Path, PathBuf};

/// Expand a path, replacing `~` with the user's home directory
pub fn expand_path(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Ok(stripped) = path.strip_prefix("~") {
            if let Some(home) = home_dir() {
                return home.join(stripped);
            }
        }
    }
    path.to_path_buf()
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
