//! # Roster Tracker
//!
//! Core of a client-side roster/attendance tracker: a member store with
//! attendance status, a pure filter/sort engine over it, spreadsheet/CSV
//! import with an upsert merge, CSV export, and JSON-file persistence.
//!
//! All operations are synchronous and run to completion; the whole model is
//! single-threaded. Rendering is out of scope: a UI drives the
//! [`controller::RosterController`] and observes its events.

use anyhow::Result;
use std::sync::Arc;

pub mod controller;
pub mod domain;
pub mod storage;

pub use controller::{NoticeLevel, RosterController, RosterEvent};
pub use storage::json::JsonConnection;

use domain::{ExportService, ImportService, MemberService};

/// Main backend struct that bundles all services.
pub struct Backend {
    pub member_service: MemberService,
    pub import_service: ImportService,
    pub export_service: ExportService,
}

impl Backend {
    /// Create a backend over the default data directory.
    pub fn new() -> Result<Self> {
        Self::with_connection(Arc::new(JsonConnection::new_default()?))
    }

    /// Create a backend over an explicit connection.
    pub fn with_connection(connection: Arc<JsonConnection>) -> Result<Self> {
        let member_service = MemberService::new(connection)?;

        Ok(Backend {
            member_service,
            import_service: ImportService::new(),
            export_service: ExportService::new(),
        })
    }
}
