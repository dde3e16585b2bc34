use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "spell-gym")
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("spell_gym_config.json"))
    }

    /// `./lists` when present, otherwise `lists/` under the user data dir.
    pub fn default_lists_dir() -> PathBuf {
        Self::lists_dir_from(Path::new("."))
    }

    pub fn lists_dir_from(cwd: &Path) -> PathBuf {
        let local = cwd.join("lists");
        if local.is_dir() {
            return local;
        }
        Self::project()
            .map(|pd| pd.data_dir().join("lists"))
            .unwrap_or(local)
    }
}
