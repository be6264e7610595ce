//! Core types and storage for the meetups site.
//!
//! This crate provides:
//! - SQLite-backed store for meetups, sponsor links and the update marker
//! - Snippet registry for admin integration
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod registry;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use registry::{Snippet, SnippetRegistry};
pub use store::{Event, EventQuery, MeetupDb, Sponsor, SponsorId, SponsorLink};
