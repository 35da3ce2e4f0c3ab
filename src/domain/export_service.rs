//! Export service domain logic for the roster tracker.
//!
//! Serializes the member collection as CSV and handles the file-system side
//! of offering it to the user: resolving a target directory, creating it,
//! and writing the dated file.

use anyhow::Result;
use chrono::NaiveDate;
use log::{error, info};
use std::fs;

use crate::domain::commands::export::{
    ExportRosterResult, ExportToPathRequest, ExportToPathResponse,
};
use crate::domain::models::member::Member;

/// Fixed column order of the exported CSV.
const EXPORT_HEADER: &str = "name,email,birthDate,lastSeen,status";

/// Export service that handles all export-related business logic.
#[derive(Clone)]
pub struct ExportService {
    // No internal state needed for now
}

impl ExportService {
    /// Create a new ExportService instance.
    pub fn new() -> Self {
        Self {}
    }

    /// Serialize the roster as CSV text with a dated filename. Every value
    /// is double-quoted with internal quotes doubled; absent optional
    /// fields render as empty strings.
    pub fn export_roster(&self, members: &[Member], today: NaiveDate) -> ExportRosterResult {
        info!("Exporting {} members as CSV", members.len());

        let mut csv_content = String::new();
        csv_content.push_str(EXPORT_HEADER);
        csv_content.push('\n');

        for member in members {
            let row = format!(
                "{},{},{},{},{}\n",
                quote(&member.name),
                quote(&member.email),
                quote(&member.birth_date),
                quote(&member.last_seen),
                quote(member.status.as_str()),
            );
            csv_content.push_str(&row);
        }

        let filename = format!("members_{}.csv", today.format("%Y-%m-%d"));

        ExportRosterResult {
            csv_content,
            filename,
            member_count: members.len(),
        }
    }

    /// Export the roster directly to a directory on disk, falling back to
    /// the Documents folder (then the home directory) when no usable custom
    /// path is given. IO problems the user can fix come back as a failed
    /// response rather than an error.
    pub fn export_to_path(
        &self,
        request: ExportToPathRequest,
        members: &[Member],
        today: NaiveDate,
    ) -> Result<ExportToPathResponse> {
        let export = self.export_roster(members, today);

        let export_dir = match request.custom_path {
            Some(ref custom_path) if !custom_path.trim().is_empty() => {
                std::path::PathBuf::from(self.sanitize_path(custom_path))
            }
            _ => match dirs::document_dir().or_else(dirs::home_dir) {
                Some(dir) => dir,
                None => {
                    error!("Could not determine a default export directory");
                    return Ok(ExportToPathResponse {
                        success: false,
                        message: "Failed to determine export directory".to_string(),
                        file_path: String::new(),
                        member_count: 0,
                    });
                }
            },
        };

        let file_path = export_dir.join(&export.filename);

        if let Err(e) = fs::create_dir_all(&export_dir) {
            error!("Failed to create export directory {:?}: {}", export_dir, e);
            return Ok(ExportToPathResponse {
                success: false,
                message: format!("Failed to create export directory: {}", e),
                file_path: export_dir.to_string_lossy().to_string(),
                member_count: 0,
            });
        }

        match fs::write(&file_path, &export.csv_content) {
            Ok(_) => {
                let file_path_str = file_path.to_string_lossy().to_string();
                info!(
                    "Exported {} members to: {}",
                    export.member_count, file_path_str
                );
                Ok(ExportToPathResponse {
                    success: true,
                    message: format!("File exported successfully to: {}", file_path_str),
                    file_path: file_path_str,
                    member_count: export.member_count,
                })
            }
            Err(e) => {
                error!("Failed to write export file to {:?}: {}", file_path, e);
                Ok(ExportToPathResponse {
                    success: false,
                    message: format!("Failed to write export file: {}", e),
                    file_path: file_path.to_string_lossy().to_string(),
                    member_count: 0,
                })
            }
        }
    }

    /// Basic path sanitization to handle common user input issues.
    fn sanitize_path(&self, path: &str) -> String {
        let mut cleaned = path.trim().to_string();

        // Remove surrounding quotes (single or double)
        if (cleaned.starts_with('"') && cleaned.ends_with('"'))
            || (cleaned.starts_with('\'') && cleaned.ends_with('\''))
        {
            cleaned = cleaned[1..cleaned.len() - 1].to_string();
        }

        cleaned = cleaned.trim().to_string();

        // Handle escaped spaces (common on some systems)
        cleaned = cleaned.replace("\\ ", " ");

        // Remove any trailing slashes/backslashes
        while cleaned.ends_with('/') || cleaned.ends_with('\\') {
            cleaned.pop();
        }

        // Handle tilde expansion for home directory
        if cleaned.starts_with('~') {
            if let Some(home) = dirs::home_dir() {
                if cleaned == "~" {
                    cleaned = home.to_string_lossy().to_string();
                } else if cleaned.starts_with("~/") || cleaned.starts_with("~\\") {
                    cleaned = home.join(&cleaned[2..]).to_string_lossy().to_string();
                }
            }
        }

        cleaned
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
