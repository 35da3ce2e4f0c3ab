//! # JSON Storage Module
//!
//! File-based persistence for the roster: the whole member collection is
//! stored as a single JSON array under a fixed file name inside the data
//! directory. Loading fails open (missing or corrupted file yields an empty
//! roster); every write replaces the file atomically.

pub mod connection;
pub mod member_repository;

pub use connection::JsonConnection;
pub use member_repository::MemberRepository;
