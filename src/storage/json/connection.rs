use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the roster file inside the data directory. Kept identical to the
/// storage key used by earlier versions of the tracker so existing data
/// loads unchanged.
pub const ROSTER_FILE: &str = "members_attendance_v1.json";

/// JsonConnection manages the data directory holding the persisted roster.
#[derive(Debug, Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Create a new connection with a base directory, creating it if needed.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a connection in the default data directory
    /// (`Documents/Roster Tracker`, falling back to the home directory).
    pub fn new_default() -> Result<Self> {
        let parent = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine a data directory"))?;

        let data_dir = parent.join("Roster Tracker");
        info!("Using data directory: {}", data_dir.display());

        Self::new(data_dir)
    }

    /// Get the base directory path.
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Get the path of the roster file.
    pub fn roster_file_path(&self) -> PathBuf {
        self.base_directory.join(ROSTER_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("rosters").join("main");

        let connection = JsonConnection::new(&nested).unwrap();

        assert!(nested.exists());
        assert_eq!(connection.base_directory(), nested.as_path());
    }

    #[test]
    fn test_roster_file_path_uses_fixed_name() {
        let temp_dir = TempDir::new().unwrap();
        let connection = JsonConnection::new(temp_dir.path()).unwrap();

        let path = connection.roster_file_path();
        assert_eq!(path, temp_dir.path().join("members_attendance_v1.json"));
    }
}
