use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolve the database location, creating its directory if needed.
    ///
    /// An explicit path (from `--db` or `NUTRILOG_DB`) wins over the
    /// platform data directory.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_override {
            Some(path) => path,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "nutrilog")
                    .context("Could not determine home directory")?;
                proj_dirs.data_dir().join("nutrilog.db")
            }
        };

        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            ensure_dir(dir)?;
        }

        Ok(Config { db_path })
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_creates_parent_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("food.db");
        let config = Config::load(Some(path.clone())).unwrap();
        assert_eq!(config.db_path, path);
        assert!(tmp.path().join("nested").is_dir());
    }

    #[test]
    fn test_bare_filename_override() {
        let config = Config::load(Some(PathBuf::from("food.db"))).unwrap();
        assert_eq!(config.db_path, PathBuf::from("food.db"));
    }
}
