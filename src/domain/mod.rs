pub mod commands;
pub mod export_service;
pub mod import_service;
pub mod member_service;
pub mod models;
pub mod roster_view;

pub use export_service::ExportService;
pub use import_service::ImportService;
pub use member_service::MemberService;
