use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "volt.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    /// `data_dir` comes from the command line or `VOLT_DATA_DIR` (clap reads
    /// both); without it the platform data directory is used.
    pub fn resolve(data_dir: Option<PathBuf>, log_level: Option<String>) -> Self {
        Self {
            data_dir: data_dir.unwrap_or_else(default_data_dir),
            log_level: log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

fn default_data_dir() -> PathBuf {
    // XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "volt") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        Path::new(".volt").to_path_buf()
    }
}
