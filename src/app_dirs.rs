use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "zetadrill")
    }

    /// Key-value store holding the saved settings.
    pub fn store_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("store.json"))
            .unwrap_or_else(|| PathBuf::from("zetadrill_store.json"))
    }

    /// Log file; the terminal itself belongs to the TUI.
    pub fn log_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("zetadrill")
                .join("zetadrill.log")
        } else {
            Self::project()
                .map(|pd| pd.data_local_dir().join("zetadrill.log"))
                .unwrap_or_else(|| PathBuf::from("zetadrill.log"))
        }
    }
}
