//! Drives a whole run: index, match, plan, execute, record.
//!
//! An [`Organizer`] is built from [`OrganizerSettings`] (usually from
//! `Config::organizer_settings()`) and a [`Placer`](crate::placer::Placer).
//! Stores are optional so the engine can run without a database.

mod config;
mod runner;
mod types;

pub use config::OrganizerSettings;
pub use runner::Organizer;
pub use types::{OrganizeError, RunReport};
