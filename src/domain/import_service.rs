use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, NaiveDate};
use log::{info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::domain::commands::import::ImportFileResult;
use crate::domain::member_service::MemberService;
use crate::domain::models::member::{Member, MemberStatus};

/// Header aliases recognized for each imported column, all compared against
/// lowercased, trimmed header cells.
const NAME_ALIASES: [&str; 2] = ["name", "nome"];
const EMAIL_ALIASES: [&str; 1] = ["email"];
const LAST_SEEN_ALIASES: [&str; 4] = ["lastseen", "last_seen", "last seen", "data"];
const BIRTH_DATE_ALIASES: [&str; 4] = ["birthdate", "birth_date", "birth date", "nascimento"];

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Unsupported file format '{0}'. Upload a .xlsx or .csv file")]
    UnsupportedFormat(String),
    #[error("The spreadsheet contains no worksheets")]
    EmptyWorkbook,
}

/// One row of an import file after header-alias resolution and date
/// normalization, not yet merged into the roster.
#[derive(Debug, Clone)]
struct ImportedRow {
    name: String,
    email: String,
    birth_date: String,
    last_seen: String,
}

/// Service that ingests spreadsheet/CSV files and merges their rows into
/// the roster.
///
/// The merge is an upsert by case-insensitive name: a row matching an
/// existing member overwrites that member's optional fields with the row's
/// non-empty values and keeps the member's id and status; an unmatched row
/// is appended as a new `present` member. Re-importing the same file is
/// therefore idempotent.
#[derive(Clone)]
pub struct ImportService {
    // No internal state needed for now
}

impl ImportService {
    /// Create a new ImportService instance.
    pub fn new() -> Self {
        Self {}
    }

    /// Import a roster file into the store.
    ///
    /// The file is parsed to completion before the store is touched; any
    /// read or parse failure leaves the roster unchanged.
    pub fn import_file(
        &self,
        path: &Path,
        members: &mut MemberService,
    ) -> Result<ImportFileResult> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        info!("Importing roster file: {}", path.display());

        let rows = match extension.as_str() {
            "xlsx" | "xls" => self.read_spreadsheet_rows(path)?,
            "csv" => self.read_csv_rows(path)?,
            other => return Err(ImportError::UnsupportedFormat(other.to_string()).into()),
        };

        let result = self.merge_rows(&rows, members)?;

        info!(
            "Import complete: {} added, {} updated, roster now has {} members",
            result.added, result.updated, result.total
        );

        Ok(result)
    }

    /// Read the first worksheet of a spreadsheet into keyed rows. The first
    /// row is the header row.
    fn read_spreadsheet_rows(&self, path: &Path) -> Result<Vec<HashMap<String, String>>> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open spreadsheet {}", path.display()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ImportError::EmptyWorkbook)?
            .context("Failed to read the first worksheet")?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = match rows_iter.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell_to_string(cell).to_lowercase())
                .collect(),
            None => return Ok(Vec::new()),
        };

        let mut rows = Vec::new();
        for sheet_row in rows_iter {
            let mut row = HashMap::new();
            for (idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = sheet_row.get(idx).map(cell_to_string).unwrap_or_default();
                row.insert(header.clone(), value);
            }
            if row.values().any(|v| !v.is_empty()) {
                rows.push(row);
            }
        }

        Ok(rows)
    }

    /// Read a delimited text file with a header row into keyed rows.
    fn read_csv_rows(&self, path: &Path) -> Result<Vec<HashMap<String, String>>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file {}", path.display()))?;
        let mut csv_reader = csv::Reader::from_reader(BufReader::new(file));

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read the CSV header row")?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.context("Failed to parse CSV row")?;
            let mut row = HashMap::new();
            for (idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = record.get(idx).unwrap_or("").trim().to_string();
                row.insert(header.clone(), value);
            }
            if row.values().any(|v| !v.is_empty()) {
                rows.push(row);
            }
        }

        Ok(rows)
    }

    /// Upsert the parsed rows into the roster and persist once at the end.
    fn merge_rows(
        &self,
        rows: &[HashMap<String, String>],
        members: &mut MemberService,
    ) -> Result<ImportFileResult> {
        let imported: Vec<ImportedRow> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| resolve_row(idx, row))
            .collect();

        let mut roster = members.members().to_vec();
        let mut by_name: HashMap<String, usize> = roster
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.name.to_lowercase(), idx))
            .collect();

        let mut added = 0;
        let mut updated = 0;

        for row in imported {
            let key = row.name.to_lowercase();
            match by_name.get(&key) {
                Some(&idx) => {
                    let existing = &mut roster[idx];
                    if !row.email.is_empty() {
                        existing.email = row.email;
                    }
                    if !row.last_seen.is_empty() {
                        existing.last_seen = row.last_seen;
                    }
                    if !row.birth_date.is_empty() {
                        existing.birth_date = row.birth_date;
                    }
                    updated += 1;
                }
                None => {
                    let member = Member {
                        id: Member::generate_id(),
                        name: row.name.clone(),
                        email: row.email,
                        birth_date: row.birth_date,
                        last_seen: row.last_seen,
                        status: MemberStatus::Present,
                    };
                    by_name.insert(key, roster.len());
                    roster.push(member);
                    added += 1;
                }
            }
        }

        let total = roster.len();
        members.replace_roster(roster)?;

        Ok(ImportFileResult {
            added,
            updated,
            total,
        })
    }
}

impl Default for ImportService {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve one keyed row into an importable member, synthesizing a name for
/// rows that carry none.
fn resolve_row(index: usize, row: &HashMap<String, String>) -> ImportedRow {
    let name = first_value(row, &NAME_ALIASES)
        .unwrap_or_else(|| format!("Membro {}", index + 1));
    let email = first_value(row, &EMAIL_ALIASES).unwrap_or_default();
    let last_seen = first_value(row, &LAST_SEEN_ALIASES)
        .map(|v| normalize_date(&v))
        .unwrap_or_default();
    let birth_date = first_value(row, &BIRTH_DATE_ALIASES)
        .map(|v| normalize_date(&v))
        .unwrap_or_default();

    ImportedRow {
        name,
        email,
        birth_date,
        last_seen,
    }
}

/// First non-blank value among the aliased keys.
fn first_value(row: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.trim().is_empty())
        .map(|value| value.trim().to_string())
}

/// Normalize a raw date value to an ISO calendar date, or empty when it
/// cannot be parsed.
fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    for format in ["%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    warn!("Could not parse date '{}', leaving it empty", raw);
    String::new()
}

/// Render a spreadsheet cell the way it reads: numbers without a spurious
/// fraction, date cells as ISO calendar dates.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => normalize_date(s),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::members::AddMemberCommand;
    use crate::storage::json::JsonConnection;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup_test() -> (ImportService, MemberService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = JsonConnection::new(temp_dir.path().join("data")).unwrap();
        let members = MemberService::new(Arc::new(connection)).unwrap();
        (ImportService::new(), members, temp_dir)
    }

    fn write_csv(dir: &Path, filename: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let (service, mut members, temp_dir) = setup_test();
        let path = write_csv(temp_dir.path(), "roster.pdf", "not a roster");

        let err = service.import_file(&path, &mut members).unwrap_err();
        assert!(err.downcast_ref::<ImportError>().is_some());
        assert!(members.members().is_empty());
    }

    #[test]
    fn test_malformed_csv_leaves_store_unchanged() {
        let (service, mut members, temp_dir) = setup_test();
        members
            .add_member(AddMemberCommand {
                name: "Ana".to_string(),
                ..Default::default()
            })
            .unwrap();

        // A row with an unclosed quote fails the CSV parser
        let path = write_csv(
            temp_dir.path(),
            "broken.csv",
            "name,email\n\"Bruno,bruno@example.com\nCarla,carla@example.com",
        );

        assert!(service.import_file(&path, &mut members).is_err());
        assert_eq!(members.members().len(), 1);
        assert_eq!(members.members()[0].name, "Ana");
    }

    #[test]
    fn test_csv_import_adds_members_as_present() {
        let (service, mut members, temp_dir) = setup_test();
        let path = write_csv(
            temp_dir.path(),
            "roster.csv",
            "name,email,lastseen\nAna,ana@example.com,2024-05-01\nBruno,,\n",
        );

        let result = service.import_file(&path, &mut members).unwrap();

        assert_eq!(result.added, 2);
        assert_eq!(result.updated, 0);
        assert_eq!(result.total, 2);
        let roster = members.members();
        assert_eq!(roster[0].name, "Ana");
        assert_eq!(roster[0].email, "ana@example.com");
        assert_eq!(roster[0].last_seen, "2024-05-01");
        assert_eq!(roster[0].status, MemberStatus::Present);
        assert_eq!(roster[1].name, "Bruno");
        assert_eq!(roster[1].status, MemberStatus::Present);
    }

    #[test]
    fn test_header_aliases_and_synthesized_names() {
        let (service, mut members, temp_dir) = setup_test();
        let path = write_csv(
            temp_dir.path(),
            "roster.csv",
            "nome,data,nascimento\nAna,15/06/2024,1990-02-10\n,2024-05-01,\n",
        );

        service.import_file(&path, &mut members).unwrap();

        let roster = members.members();
        assert_eq!(roster[0].name, "Ana");
        assert_eq!(roster[0].last_seen, "2024-06-15");
        assert_eq!(roster[0].birth_date, "1990-02-10");
        // Row without a name gets a synthesized one, 1-indexed
        assert_eq!(roster[1].name, "Membro 2");
        assert_eq!(roster[1].last_seen, "2024-05-01");
    }

    #[test]
    fn test_unparseable_dates_are_left_empty() {
        let (service, mut members, temp_dir) = setup_test();
        let path = write_csv(
            temp_dir.path(),
            "roster.csv",
            "name,lastseen\nAna,sometime last winter\n",
        );

        service.import_file(&path, &mut members).unwrap();
        assert_eq!(members.members()[0].last_seen, "");
    }

    #[test]
    fn test_upsert_overwrites_only_non_empty_fields() {
        let (service, mut members, temp_dir) = setup_test();
        members
            .add_member(AddMemberCommand {
                name: "Carla".to_string(),
                email: "old@example.com".to_string(),
                last_seen: "2023-01-01".to_string(),
                status: MemberStatus::Absent,
                ..Default::default()
            })
            .unwrap();
        let original_id = members.members()[0].id.clone();

        let path = write_csv(
            temp_dir.path(),
            "roster.csv",
            "name,email,lastseen\nCARLA,,2024-05-20\n",
        );
        let result = service.import_file(&path, &mut members).unwrap();

        assert_eq!(result.added, 0);
        assert_eq!(result.updated, 1);
        let roster = members.members();
        assert_eq!(roster.len(), 1);
        // Id and status survive; empty import email keeps the old value
        assert_eq!(roster[0].id, original_id);
        assert_eq!(roster[0].status, MemberStatus::Absent);
        assert_eq!(roster[0].email, "old@example.com");
        assert_eq!(roster[0].last_seen, "2024-05-20");
    }

    #[test]
    fn test_duplicate_names_within_one_import_collapse() {
        let (service, mut members, temp_dir) = setup_test();
        let path = write_csv(
            temp_dir.path(),
            "roster.csv",
            "name,email\nCarla,first@example.com\ncarla,second@example.com\n",
        );

        let result = service.import_file(&path, &mut members).unwrap();

        assert_eq!(result.added, 1);
        assert_eq!(result.updated, 1);
        let roster = members.members();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Carla");
        assert_eq!(roster[0].email, "second@example.com");
    }

    #[test]
    fn test_reimporting_the_same_file_is_idempotent() {
        let (service, mut members, temp_dir) = setup_test();
        let path = write_csv(
            temp_dir.path(),
            "roster.csv",
            "name,email\nAna,ana@example.com\nBruno,bruno@example.com\n",
        );

        service.import_file(&path, &mut members).unwrap();
        let first_pass = members.members().to_vec();

        let result = service.import_file(&path, &mut members).unwrap();

        assert_eq!(result.added, 0);
        assert_eq!(result.updated, 2);
        assert_eq!(members.members(), first_pass.as_slice());
    }

    #[test]
    fn test_existing_member_order_is_preserved_on_merge() {
        let (service, mut members, temp_dir) = setup_test();
        for name in ["Zoe", "Ana"] {
            members
                .add_member(AddMemberCommand {
                    name: name.to_string(),
                    ..Default::default()
                })
                .unwrap();
        }

        let path = write_csv(
            temp_dir.path(),
            "roster.csv",
            "name\nana\nBruno\n",
        );
        service.import_file(&path, &mut members).unwrap();

        let names: Vec<&str> = members.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Zoe", "Ana", "Bruno"]);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2024-06-15"), "2024-06-15");
        assert_eq!(normalize_date("15/06/2024"), "2024-06-15");
        assert_eq!(normalize_date("2024/06/15"), "2024-06-15");
        assert_eq!(normalize_date("2024-06-15T10:30:00Z"), "2024-06-15");
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("yesterday"), "");
    }
}
