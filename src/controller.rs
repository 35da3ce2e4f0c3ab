//! UI-agnostic controller over the backend services.
//!
//! The controller owns the transient view state (filters, search, sort
//! order, selected attendance date) and exposes one handler per user
//! action. Rendering layers attach through the observer contract: every
//! successful mutation or view-state change emits [`RosterEvent::RosterChanged`],
//! and user-facing outcomes (the toast analog) arrive as
//! [`RosterEvent::Notice`] values. The controller never renders anything
//! itself.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::path::Path;

use crate::domain::commands::export::{ExportToPathRequest, ExportToPathResponse};
use crate::domain::commands::import::ImportFileResult;
use crate::domain::commands::members::{
    AddMemberCommand, MarkAttendanceCommand, RemoveMemberCommand, UpdateMemberCommand,
};
use crate::domain::models::member::{Member, MemberStatus, RosterStats};
use crate::domain::roster_view::{
    self, AgeBracketFilter, RosterQuery, SortDirection, SortKey, StatusFilter,
};
use crate::Backend;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Events published to subscribers.
#[derive(Debug, Clone)]
pub enum RosterEvent {
    /// The roster or the view state changed; views should re-render.
    RosterChanged,
    /// A user-visible message.
    Notice {
        level: NoticeLevel,
        message: String,
    },
}

type Subscriber = Box<dyn Fn(&RosterEvent)>;

/// Controller wiring user actions to the domain services.
pub struct RosterController {
    backend: Backend,
    query: RosterQuery,
    selected_date: NaiveDate,
    subscribers: Vec<Subscriber>,
}

impl RosterController {
    /// Create a controller over a backend, with default view state and the
    /// attendance date set to today.
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            query: RosterQuery::default(),
            selected_date: Local::now().date_naive(),
            subscribers: Vec::new(),
        }
    }

    /// Register an observer. Subscribers receive every event emitted from
    /// this point on.
    pub fn subscribe(&mut self, subscriber: impl Fn(&RosterEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// The current view state.
    pub fn query(&self) -> &RosterQuery {
        &self.query
    }

    /// The date stamped on members marked present.
    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// Direct read access to the underlying backend.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// The roster as currently filtered, searched and sorted.
    pub fn visible_roster(&self) -> Vec<Member> {
        roster_view::filtered_roster(
            self.backend.member_service.members(),
            &self.query,
            Self::today(),
        )
    }

    /// Aggregate counts over the full (unfiltered) roster.
    pub fn stats(&self) -> RosterStats {
        self.backend.member_service.stats(Self::today())
    }

    // ----- mutations -----

    pub fn add_member(&mut self, command: AddMemberCommand) -> Result<Member> {
        match self.backend.member_service.add_member(command) {
            Ok(result) => {
                self.emit(RosterEvent::RosterChanged);
                self.notice(NoticeLevel::Success, "Member added successfully");
                Ok(result.member)
            }
            Err(err) => {
                self.notice(NoticeLevel::Error, err.to_string());
                Err(err)
            }
        }
    }

    pub fn update_member(&mut self, command: UpdateMemberCommand) -> Result<Option<Member>> {
        match self.backend.member_service.update_member(command) {
            Ok(result) => {
                self.emit(RosterEvent::RosterChanged);
                self.notice(NoticeLevel::Success, "Member updated successfully");
                Ok(result.member)
            }
            Err(err) => {
                self.notice(NoticeLevel::Error, err.to_string());
                Err(err)
            }
        }
    }

    /// Mark a member present on the selected attendance date.
    pub fn mark_present(&mut self, member_id: &str) -> Result<Option<Member>> {
        self.mark_attendance(member_id, MemberStatus::Present)
    }

    pub fn mark_absent(&mut self, member_id: &str) -> Result<Option<Member>> {
        self.mark_attendance(member_id, MemberStatus::Absent)
    }

    pub fn mark_long_missing(&mut self, member_id: &str) -> Result<Option<Member>> {
        self.mark_attendance(member_id, MemberStatus::LongMissing)
    }

    fn mark_attendance(
        &mut self,
        member_id: &str,
        status: MemberStatus,
    ) -> Result<Option<Member>> {
        let result = self.backend.member_service.mark_attendance(MarkAttendanceCommand {
            member_id: member_id.to_string(),
            status,
            attendance_date: self.selected_date,
        })?;
        self.emit(RosterEvent::RosterChanged);
        Ok(result.member)
    }

    pub fn remove_member(&mut self, member_id: &str) -> Result<bool> {
        let result = self.backend.member_service.remove_member(RemoveMemberCommand {
            member_id: member_id.to_string(),
        })?;
        if result.removed {
            self.emit(RosterEvent::RosterChanged);
            self.notice(NoticeLevel::Success, "Member removed successfully");
        }
        Ok(result.removed)
    }

    pub fn clear_all(&mut self) -> Result<usize> {
        let result = self.backend.member_service.clear_all()?;
        self.emit(RosterEvent::RosterChanged);
        self.notice(NoticeLevel::Warning, "All members were removed");
        Ok(result.removed_count)
    }

    /// Import a roster file and merge it into the store.
    pub fn import_file(&mut self, path: &Path) -> Result<ImportFileResult> {
        let Backend {
            import_service,
            member_service,
            ..
        } = &mut self.backend;

        match import_service.import_file(path, member_service) {
            Ok(result) => {
                self.emit(RosterEvent::RosterChanged);
                self.notice(
                    NoticeLevel::Success,
                    format!(
                        "Import complete: {} new members, {} updated",
                        result.added, result.updated
                    ),
                );
                Ok(result)
            }
            Err(err) => {
                self.notice(NoticeLevel::Error, format!("Failed to import file: {}", err));
                Err(err)
            }
        }
    }

    /// Export the roster to a directory (default export directory when
    /// `custom_path` is absent).
    pub fn export_to_path(&mut self, custom_path: Option<String>) -> Result<ExportToPathResponse> {
        let response = self.backend.export_service.export_to_path(
            ExportToPathRequest { custom_path },
            self.backend.member_service.members(),
            Self::today(),
        )?;

        let level = if response.success {
            NoticeLevel::Success
        } else {
            NoticeLevel::Error
        };
        self.notice(level, response.message.clone());

        Ok(response)
    }

    // ----- view state -----

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.query.status = filter;
        self.emit(RosterEvent::RosterChanged);
    }

    pub fn set_age_filter(&mut self, filter: AgeBracketFilter) {
        self.query.bracket = filter;
        self.emit(RosterEvent::RosterChanged);
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.query.search = term.into().trim().to_string();
        self.emit(RosterEvent::RosterChanged);
    }

    pub fn clear_search(&mut self) {
        self.set_search("");
    }

    /// Select a sort key. Re-selecting the active key toggles the
    /// direction; a new key starts ascending.
    pub fn sort_by(&mut self, key: SortKey) {
        if self.query.sort_by == key {
            self.query.direction = match self.query.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.query.sort_by = key;
            self.query.direction = SortDirection::Asc;
        }
        self.emit(RosterEvent::RosterChanged);
    }

    /// Set the date stamped on members marked present.
    pub fn set_selected_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    // ----- internals -----

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn emit(&self, event: RosterEvent) {
        for subscriber in &self.subscribers {
            subscriber(&event);
        }
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(RosterEvent::Notice {
            level,
            message: message.into(),
        });
    }
}
