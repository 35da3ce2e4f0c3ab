//! Domain-level command and query types.
//!
//! These structs are the inputs and outputs of the domain services. The
//! controller (or any other caller) maps user actions onto these types; the
//! services never see UI concerns.

pub mod members {
    use chrono::NaiveDate;

    use crate::domain::models::member::{Member, MemberStatus};

    /// Input for adding a new member. Optional fields may be left empty.
    #[derive(Debug, Clone, Default)]
    pub struct AddMemberCommand {
        pub name: String,
        pub email: String,
        pub birth_date: String,
        pub last_seen: String,
        pub status: MemberStatus,
    }

    /// Result of adding a member.
    #[derive(Debug, Clone)]
    pub struct AddMemberResult {
        pub member: Member,
    }

    /// Input for partially updating a member. `None` fields are left
    /// untouched; `Some` fields replace the stored value.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateMemberCommand {
        pub member_id: String,
        pub name: Option<String>,
        pub email: Option<String>,
        pub birth_date: Option<String>,
        pub last_seen: Option<String>,
        pub status: Option<MemberStatus>,
    }

    /// Result of an update. `member` is `None` when the id was not found
    /// (the operation still succeeds).
    #[derive(Debug, Clone)]
    pub struct UpdateMemberResult {
        pub member: Option<Member>,
    }

    /// Input for marking attendance. `attendance_date` stamps `last_seen`
    /// only when the new status is `present`.
    #[derive(Debug, Clone)]
    pub struct MarkAttendanceCommand {
        pub member_id: String,
        pub status: MemberStatus,
        pub attendance_date: NaiveDate,
    }

    /// Result of marking attendance. `member` is `None` when the id was not
    /// found.
    #[derive(Debug, Clone)]
    pub struct MarkAttendanceResult {
        pub member: Option<Member>,
    }

    /// Input for removing a member.
    #[derive(Debug, Clone)]
    pub struct RemoveMemberCommand {
        pub member_id: String,
    }

    /// Result of removing a member. `removed` is false when the id was not
    /// found (silent no-op).
    #[derive(Debug, Clone)]
    pub struct RemoveMemberResult {
        pub removed: bool,
    }

    /// Result of clearing the whole roster.
    #[derive(Debug, Clone)]
    pub struct ClearAllResult {
        pub removed_count: usize,
    }
}

pub mod import {
    /// Result of importing a roster file.
    #[derive(Debug, Clone)]
    pub struct ImportFileResult {
        /// Members inserted as new records.
        pub added: usize,
        /// Existing members overwritten by the upsert merge.
        pub updated: usize,
        /// Roster size after the merge.
        pub total: usize,
    }
}

pub mod export {
    /// Result of serializing the roster, ready to be offered as a download
    /// or written to disk.
    #[derive(Debug, Clone)]
    pub struct ExportRosterResult {
        pub csv_content: String,
        pub filename: String,
        pub member_count: usize,
    }

    /// Input for exporting directly to a directory on disk.
    #[derive(Debug, Clone, Default)]
    pub struct ExportToPathRequest {
        /// Target directory; the default export directory is used when
        /// absent or blank.
        pub custom_path: Option<String>,
    }

    /// Outcome of an export-to-path operation. IO problems the user can fix
    /// are reported here rather than as errors.
    #[derive(Debug, Clone)]
    pub struct ExportToPathResponse {
        pub success: bool,
        pub message: String,
        pub file_path: String,
        pub member_count: usize,
    }
}
