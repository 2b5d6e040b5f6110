use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
#[derive(Debug, Clone, PartialEq)]
pub struct AppDirs {
    data_dir: PathBuf,
    state_dir: PathBuf,
}

impl AppDirs {
    /// Platform directories, falling back to the working directory
    pub fn resolve() -> Self {
        match ProjectDirs::from("", "", "timesheet") {
            Some(pd) => Self {
                data_dir: pd.data_dir().to_path_buf(),
                state_dir: pd.data_local_dir().to_path_buf(),
            },
            None => Self::rooted_at("."),
        }
    }

    /// Keep everything under one directory (tests, `--data-dir`)
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            data_dir: root.clone(),
            state_dir: root,
        }
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "timesheet")
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }

    pub fn log_dir(&self) -> &Path {
        &self.state_dir
    }
}
