use anyhow::Result;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;

use crate::domain::commands::members::{
    AddMemberCommand, AddMemberResult, ClearAllResult, MarkAttendanceCommand,
    MarkAttendanceResult, RemoveMemberCommand, RemoveMemberResult, UpdateMemberCommand,
    UpdateMemberResult,
};
use crate::domain::models::member::{Member, MemberStatus, MemberValidationError, RosterStats};
use crate::storage::json::{JsonConnection, MemberRepository};
use crate::storage::traits::MemberStorage;

/// Service owning the member roster.
///
/// The in-memory collection is the working copy; every mutating operation
/// persists the full roster through the repository before returning, so the
/// serialized copy is never more than one operation behind.
pub struct MemberService {
    repository: MemberRepository,
    members: Vec<Member>,
}

impl MemberService {
    /// Create a new MemberService, loading the persisted roster.
    pub fn new(connection: Arc<JsonConnection>) -> Result<Self> {
        let repository = MemberRepository::new(connection);
        let members = repository.load_members()?;

        info!("Loaded {} members from storage", members.len());

        Ok(Self {
            repository,
            members,
        })
    }

    /// Read access to the roster in insertion order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up a member by id.
    pub fn get_member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    /// Add a new member with a fresh id. No duplicate check is performed.
    pub fn add_member(&mut self, command: AddMemberCommand) -> Result<AddMemberResult> {
        info!("Adding member: name={}", command.name);

        let name = command.name.trim();
        if name.is_empty() {
            return Err(MemberValidationError::EmptyName.into());
        }
        Self::validate_date_field(&command.birth_date)?;
        Self::validate_date_field(&command.last_seen)?;

        let member = Member {
            id: Member::generate_id(),
            name: name.to_string(),
            email: command.email.trim().to_string(),
            birth_date: command.birth_date.trim().to_string(),
            last_seen: command.last_seen.trim().to_string(),
            status: command.status,
        };

        self.members.push(member.clone());
        self.persist()?;

        info!("Added member: {} with ID: {}", member.name, member.id);

        Ok(AddMemberResult { member })
    }

    /// Update the listed fields of an existing member, leaving the others
    /// untouched. An unknown id is a logged no-op that still succeeds.
    pub fn update_member(&mut self, command: UpdateMemberCommand) -> Result<UpdateMemberResult> {
        info!("Updating member: {}", command.member_id);

        if let Some(ref name) = command.name {
            if name.trim().is_empty() {
                return Err(MemberValidationError::EmptyName.into());
            }
        }
        if let Some(ref birth_date) = command.birth_date {
            Self::validate_date_field(birth_date)?;
        }
        if let Some(ref last_seen) = command.last_seen {
            Self::validate_date_field(last_seen)?;
        }

        let member = match self.members.iter_mut().find(|m| m.id == command.member_id) {
            Some(member) => member,
            None => {
                warn!("Member not found for update: {}", command.member_id);
                return Ok(UpdateMemberResult { member: None });
            }
        };

        if let Some(name) = command.name {
            member.name = name.trim().to_string();
        }
        if let Some(email) = command.email {
            member.email = email.trim().to_string();
        }
        if let Some(birth_date) = command.birth_date {
            member.birth_date = birth_date.trim().to_string();
        }
        if let Some(last_seen) = command.last_seen {
            member.last_seen = last_seen.trim().to_string();
        }
        if let Some(status) = command.status {
            member.status = status;
        }

        let updated = member.clone();
        self.persist()?;

        info!("Updated member: {} with ID: {}", updated.name, updated.id);

        Ok(UpdateMemberResult {
            member: Some(updated),
        })
    }

    /// Set a member's attendance status. Marking a member `present` also
    /// stamps `last_seen` with the attendance date; the other statuses leave
    /// `last_seen` untouched.
    pub fn mark_attendance(
        &mut self,
        command: MarkAttendanceCommand,
    ) -> Result<MarkAttendanceResult> {
        let member = match self.members.iter_mut().find(|m| m.id == command.member_id) {
            Some(member) => member,
            None => {
                warn!("Member not found for attendance: {}", command.member_id);
                return Ok(MarkAttendanceResult { member: None });
            }
        };

        member.status = command.status;
        if command.status == MemberStatus::Present {
            member.last_seen = command.attendance_date.format("%Y-%m-%d").to_string();
        }

        let updated = member.clone();
        self.persist()?;

        info!(
            "Marked member {} as {}",
            updated.id,
            updated.status.as_str()
        );

        Ok(MarkAttendanceResult {
            member: Some(updated),
        })
    }

    /// Remove a member by id. An unknown id is a silent no-op.
    pub fn remove_member(&mut self, command: RemoveMemberCommand) -> Result<RemoveMemberResult> {
        let before = self.members.len();
        self.members.retain(|m| m.id != command.member_id);
        let removed = self.members.len() < before;

        if removed {
            info!("Removed member: {}", command.member_id);
        } else {
            warn!("Member not found for removal: {}", command.member_id);
        }

        self.persist()?;

        Ok(RemoveMemberResult { removed })
    }

    /// Remove every member from the roster.
    pub fn clear_all(&mut self) -> Result<ClearAllResult> {
        let removed_count = self.members.len();
        self.members.clear();
        self.persist()?;

        info!("Cleared roster ({} members removed)", removed_count);

        Ok(ClearAllResult { removed_count })
    }

    /// Replace the whole roster at once. This is the commit point of the
    /// import merge; the new collection is persisted immediately.
    pub fn replace_roster(&mut self, members: Vec<Member>) -> Result<()> {
        self.members = members;
        self.persist()
    }

    /// Aggregate counts over the roster in a single pass. `today` anchors
    /// the age computation.
    pub fn stats(&self, today: NaiveDate) -> RosterStats {
        let mut stats = RosterStats::default();
        let mut age_sum: u64 = 0;
        let mut age_count: u64 = 0;

        for member in &self.members {
            stats.total += 1;
            match member.status {
                MemberStatus::Present => stats.present += 1,
                MemberStatus::Absent => stats.absent += 1,
                MemberStatus::LongMissing => stats.long_missing += 1,
            }
            if let Some(age) = member.age_on(today) {
                age_sum += u64::from(age);
                age_count += 1;
            }
        }

        if age_count > 0 {
            stats.average_age = ((age_sum as f64) / (age_count as f64)).round() as u32;
        }

        stats
    }

    /// Non-empty date fields must hold an ISO calendar date.
    fn validate_date_field(value: &str) -> Result<(), MemberValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        if Member::parse_iso_date(value).is_none() {
            return Err(MemberValidationError::InvalidDate(value.to_string()));
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        self.repository.save_members(&self.members)
    }
}
