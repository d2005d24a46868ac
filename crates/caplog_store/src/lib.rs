//! Reactive client-side state for the caplog application.
//!
//! The store crate owns the pieces of the data layer that are not plain
//! pass-through to the backend:
//!
//! - [`RecordStore`]: in-memory record cache mirroring backend change events
//!   as full replacement snapshots, with the create-retry policy and the
//!   advisory sync status
//! - [`stats`]: pure progress aggregates (streak, completion rate, averages)
//! - [`SettingsService`]: lazily materialized per-user settings
//! - [`ProfileService`]: profile CRUD, avatar upload and the tutorial gate
//!
//! Everything is constructed from an explicit [`GatewayFactory`] plus a
//! session; there is no ambient global state.
//!
//! [`GatewayFactory`]: caplog_common::services::GatewayFactory

// Declare modules within this crate
pub mod profile;
pub mod settings;
pub mod stats;
pub mod store;

#[cfg(test)]
mod testing;


pub use profile::{ProfileService, TutorialState};
pub use settings::SettingsService;
pub use stats::ProgressStats;
pub use store::{RecordStore, RecordsFeed, StoreTuning};
