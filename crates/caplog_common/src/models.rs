//! Domain models shared across the caplog workspace.
//!
//! These mirror the four backend relations (users are only seen through the
//! auth session) plus the wire payloads for inserts and partial updates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One daily intake-tracking entry for a user on a specific calendar date.
///
/// At most one record exists per `(user_id, date)` pair; the backend enforces
/// the uniqueness, the client only reacts to the resulting conflict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRecord {
    /// Backend-assigned identifier.
    pub id: String,
    pub user_id: String,
    /// Calendar date of the entry; comparison is always date-only.
    pub date: NaiveDate,
    /// Units taken that day.
    pub capsules: i32,
    /// Wall-clock time string associated with the dose, e.g. "08:30".
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Whether the day's goal was fulfilled.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a daily record. The backend assigns `id` and the
/// timestamps on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDailyRecord {
    pub user_id: String,
    pub date: NaiveDate,
    pub capsules: i32,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub completed: bool,
}

impl NewDailyRecord {
    /// A record for `date` with the default dose of two capsules.
    pub fn with_defaults(user_id: impl Into<String>, date: NaiveDate, time: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            capsules: 2,
            time: time.into(),
            notes: None,
            completed: false,
        }
    }
}

/// Partial update payload for a daily record. Absent fields are left
/// untouched by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyRecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capsules: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Theme selection stored in user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePref {
    #[default]
    System,
    Light,
    Dark,
}

/// Interface language stored in user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePref {
    #[default]
    En,
    De,
    Fr,
}

/// Per-user settings row. Singleton per user, created lazily with defaults on
/// first read if absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    pub id: String,
    pub user_id: String,
    pub notifications_enabled: bool,
    /// Reminder wall-clock time string, e.g. "08:00".
    pub reminder_time: String,
    pub daily_goal: i32,
    pub weekly_goal: i32,
    pub theme: ThemePref,
    pub language: LanguagePref,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a settings row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUserSettings {
    pub user_id: String,
    pub notifications_enabled: bool,
    pub reminder_time: String,
    pub daily_goal: i32,
    pub weekly_goal: i32,
    pub theme: ThemePref,
    pub language: LanguagePref,
}

impl NewUserSettings {
    /// The defaults applied when a settings row is first materialized.
    pub fn defaults_for(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            notifications_enabled: true,
            reminder_time: "08:00".to_string(),
            daily_goal: 2,
            weekly_goal: 14,
            theme: ThemePref::System,
            language: LanguagePref::En,
        }
    }
}

/// Partial update payload for user settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_goal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemePref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguagePref>,
}

/// Per-user profile row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// One-time onboarding gate; see the tutorial state machine in the store.
    pub has_seen_tutorial: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a profile row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUserProfile {
    pub user_id: String,
    pub display_name: String,
    pub has_seen_tutorial: bool,
}

/// Partial update payload for a profile row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_seen_tutorial: Option<bool>,
}

/// The authenticated user as reported by the auth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserIdentity {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// An authenticated session against the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserIdentity,
}

/// Advisory UI-facing indicator of the last mutating operation's outcome.
/// It has no bearing on data correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
    Syncing,
    Error,
}

/// A change notification from the backend. Carries just enough information to
/// trigger a full re-fetch; insert/update/delete are not distinguished.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: String,
    pub user_id: String,
    pub observed_at: DateTime<Utc>,
}
