use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("codedrill"),
            )
        } else {
            ProjectDirs::from("", "", "codedrill")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.db"))
    }

    pub fn profile_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("profile.json"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "codedrill")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
    }
}
