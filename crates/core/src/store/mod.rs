//! SQLite-backed store for meetups, sponsor links and the update marker.
//!
//! This module provides persistent storage using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Automatic schema migrations
//! - WAL mode with foreign keys enforced
//! - A single-row update marker written with an atomic upsert
//! - Restartable queries over upcoming meetups

pub mod connection;
pub mod events;
pub mod marker;
pub mod migrations;
pub mod sponsors;
pub mod timestamp;

pub use crate::Error;

pub use connection::MeetupDb;
pub use events::{Event, EventQuery};
pub use sponsors::{Sponsor, SponsorId, SponsorLink};
