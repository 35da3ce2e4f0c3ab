//! Pure filter/sort engine over the roster.
//!
//! Everything here is deterministic given the member slice, the query, and
//! the reference date; filtering never reorders, and the stable sort at the
//! end is the sole reordering step.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::domain::models::member::{Member, MemberStatus};

/// Status filter: everything, or a single status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(MemberStatus),
}

/// Fixed, inclusive age ranges used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBracket {
    /// 0–17
    UnderEighteen,
    /// 18–30
    EighteenToThirty,
    /// 31–50
    ThirtyOneToFifty,
    /// 51–70
    FiftyOneToSeventy,
    /// 71 and older
    OverSeventy,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 5] = [
        AgeBracket::UnderEighteen,
        AgeBracket::EighteenToThirty,
        AgeBracket::ThirtyOneToFifty,
        AgeBracket::FiftyOneToSeventy,
        AgeBracket::OverSeventy,
    ];

    pub fn contains(&self, age: u32) -> bool {
        match self {
            AgeBracket::UnderEighteen => age <= 17,
            AgeBracket::EighteenToThirty => (18..=30).contains(&age),
            AgeBracket::ThirtyOneToFifty => (31..=50).contains(&age),
            AgeBracket::FiftyOneToSeventy => (51..=70).contains(&age),
            AgeBracket::OverSeventy => age >= 71,
        }
    }
}

/// Age-bracket filter: everything, or a single bracket. When a concrete
/// bracket is active, members without a parseable birth date are excluded
/// entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeBracketFilter {
    #[default]
    All,
    Bracket(AgeBracket),
}

/// Sort key over member fields, plus the derived `Age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Email,
    BirthDate,
    LastSeen,
    Status,
    Age,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// The transient view state: filters, search term and sort order. Held for
/// the current session only, never persisted.
#[derive(Debug, Clone, Default)]
pub struct RosterQuery {
    pub status: StatusFilter,
    pub bracket: AgeBracketFilter,
    pub search: String,
    pub sort_by: SortKey,
    pub direction: SortDirection,
}

/// Apply filters and sort, producing the derived ordered view.
pub fn filtered_roster(members: &[Member], query: &RosterQuery, today: NaiveDate) -> Vec<Member> {
    let mut roster: Vec<Member> = members
        .iter()
        .filter(|m| match query.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => m.status == status,
        })
        .filter(|m| match query.bracket {
            AgeBracketFilter::All => true,
            AgeBracketFilter::Bracket(bracket) => {
                m.age_on(today).is_some_and(|age| bracket.contains(age))
            }
        })
        .filter(|m| matches_search(m, &query.search))
        .cloned()
        .collect();

    sort_roster(&mut roster, query.sort_by, query.direction, today);
    roster
}

/// Case-insensitive substring match against name, email and the raw birth
/// date string. An empty or blank term matches everything.
fn matches_search(member: &Member, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    member.name.to_lowercase().contains(&term)
        || member.email.to_lowercase().contains(&term)
        || member.birth_date.to_lowercase().contains(&term)
}

/// Stable sort by the selected key. Date keys treat empty or unparseable
/// values as 1900-01-01 so they sort before any real date; the derived age
/// treats a missing birth date as 0; other keys compare as case-insensitive
/// strings. Ties keep their original relative order.
pub fn sort_roster(roster: &mut [Member], key: SortKey, direction: SortDirection, today: NaiveDate) {
    roster.sort_by(|a, b| {
        let ordering = compare_by_key(a, b, key, today);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_by_key(a: &Member, b: &Member, key: SortKey, today: NaiveDate) -> Ordering {
    match key {
        SortKey::Name => compare_text(&a.name, &b.name),
        SortKey::Email => compare_text(&a.email, &b.email),
        SortKey::Status => compare_text(a.status.as_str(), b.status.as_str()),
        SortKey::BirthDate => date_or_epoch(&a.birth_date).cmp(&date_or_epoch(&b.birth_date)),
        SortKey::LastSeen => date_or_epoch(&a.last_seen).cmp(&date_or_epoch(&b.last_seen)),
        SortKey::Age => a.age_on(today).unwrap_or(0).cmp(&b.age_on(today).unwrap_or(0)),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn date_or_epoch(value: &str) -> NaiveDate {
    Member::parse_iso_date(value)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1900, 1, 1).unwrap())
}
