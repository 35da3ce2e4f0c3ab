use anyhow::Result;
use log::{debug, warn};
use std::fs;
use std::sync::Arc;

use super::connection::JsonConnection;
use crate::domain::models::member::Member;
use crate::storage::traits::MemberStorage;

/// JSON-file roster repository.
///
/// The whole roster is persisted as a single JSON array in the connection's
/// roster file. Loading tolerates a missing or corrupted file by resetting
/// to an empty roster; writes replace the file atomically.
#[derive(Clone)]
pub struct MemberRepository {
    connection: Arc<JsonConnection>,
}

impl MemberRepository {
    /// Create a new JSON member repository.
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        Self { connection }
    }
}

impl MemberStorage for MemberRepository {
    fn load_members(&self) -> Result<Vec<Member>> {
        let file_path = self.connection.roster_file_path();

        if !file_path.exists() {
            debug!("Roster file {} does not exist yet", file_path.display());
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&file_path)?;

        match serde_json::from_str::<Vec<Member>>(&raw) {
            Ok(members) => {
                debug!("Loaded {} members from {}", members.len(), file_path.display());
                Ok(members)
            }
            Err(e) => {
                warn!(
                    "Roster file {} is not valid JSON ({}), resetting to an empty roster",
                    file_path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    fn save_members(&self, members: &[Member]) -> Result<()> {
        let base_dir = self.connection.base_directory();
        if !base_dir.exists() {
            fs::create_dir_all(base_dir)?;
        }

        let file_path = self.connection.roster_file_path();
        let json = serde_json::to_string(members)?;

        // Atomic write using temp file
        let temp_path = file_path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &file_path)?;

        debug!("Saved {} members to {}", members.len(), file_path.display());
        Ok(())
    }
}
