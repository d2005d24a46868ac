//! Service abstractions for the hosted backend.
//!
//! This module provides trait definitions for every capability the data layer
//! delegates to the external platform. The traits allow dependency injection
//! and easier testing by decoupling the store logic from the concrete gateway
//! implementation.

use chrono::NaiveDate;
use futures::stream::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::CaplogError;
use crate::models::{
    ChangeEvent, DailyRecord, DailyRecordPatch, NewDailyRecord, NewUserProfile, NewUserSettings,
    Session, UserProfile, UserProfilePatch, UserSettings, UserSettingsPatch,
};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Type alias for a boxed, non-terminating stream of items
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

/// A trait for authentication operations against the hosted platform.
pub trait AuthService: Send + Sync {
    /// Error type returned by auth operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Register a new account and provision its profile and settings rows.
    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> BoxFuture<'_, Session, Self::Error>;

    /// Exchange credentials for a session.
    fn login(&self, email: &str, password: &str) -> BoxFuture<'_, Session, Self::Error>;

    /// Invalidate a session.
    fn logout(&self, session: &Session) -> BoxFuture<'_, (), Self::Error>;

    /// Trigger the platform's password-reset email flow.
    fn send_password_reset(&self, email: &str) -> BoxFuture<'_, (), Self::Error>;
}

/// Row operations for the daily-records relation.
///
/// The backend enforces uniqueness on `(user_id, date)`; `create` surfaces a
/// violation as [`CaplogError::Conflict`]. Mutations return the written row
/// (read-your-writes acknowledgment), not just a status.
pub trait DailyRecordRepository: Send + Sync {
    /// Error type returned by record operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the complete record set for a user, newest date first.
    fn list(&self, user_id: &str) -> BoxFuture<'_, Vec<DailyRecord>, Self::Error>;

    /// Look up the single record for one calendar date, if any.
    fn find_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Option<DailyRecord>, Self::Error>;

    /// Insert a record and return it with backend-assigned id and timestamps.
    fn create(&self, record: NewDailyRecord) -> BoxFuture<'_, DailyRecord, Self::Error>;

    /// Partially update a record and return the written row.
    fn update(
        &self,
        id: &str,
        patch: DailyRecordPatch,
    ) -> BoxFuture<'_, DailyRecord, Self::Error>;

    /// Delete a record by id.
    fn delete(&self, id: &str) -> BoxFuture<'_, (), Self::Error>;
}

/// Row operations for the per-user profile relation.
pub trait UserProfileRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn find(&self, user_id: &str) -> BoxFuture<'_, Option<UserProfile>, Self::Error>;

    fn create(&self, profile: NewUserProfile) -> BoxFuture<'_, UserProfile, Self::Error>;

    fn update(
        &self,
        user_id: &str,
        patch: UserProfilePatch,
    ) -> BoxFuture<'_, UserProfile, Self::Error>;
}

/// Row operations for the per-user settings relation.
pub trait UserSettingsRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn find(&self, user_id: &str) -> BoxFuture<'_, Option<UserSettings>, Self::Error>;

    fn create(&self, settings: NewUserSettings) -> BoxFuture<'_, UserSettings, Self::Error>;

    fn update(
        &self,
        user_id: &str,
        patch: UserSettingsPatch,
    ) -> BoxFuture<'_, UserSettings, Self::Error>;
}

/// A live change subscription: a cancellable handle over a non-terminating
/// stream of [`ChangeEvent`]s. Dropping the handle tears the feed down; no
/// events are delivered afterwards.
pub struct RealtimeSubscription {
    events: BoxStream<ChangeEvent>,
    canceller: Option<Box<dyn FnOnce() + Send>>,
}

impl RealtimeSubscription {
    /// Build a subscription from an event stream and a teardown closure.
    ///
    /// The closure runs exactly once, on [`cancel`](Self::cancel) or drop.
    pub fn new(
        events: BoxStream<ChangeEvent>,
        canceller: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            canceller: Some(Box::new(canceller)),
        }
    }

    /// Wait for the next change event. `None` means the feed has terminated
    /// (the upstream side was dropped).
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        use futures::StreamExt;
        self.events.next().await
    }

    /// Tear the subscription down explicitly.
    pub fn cancel(mut self) {
        if let Some(canceller) = self.canceller.take() {
            canceller();
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        if let Some(canceller) = self.canceller.take() {
            canceller();
        }
    }
}

/// A trait for per-user change subscriptions on the records relation.
pub trait RealtimeService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a change feed for one user. Every delivered event is a cue to
    /// re-fetch the full record set; events carry no delta payload.
    fn subscribe(&self, user_id: &str) -> BoxFuture<'_, RealtimeSubscription, Self::Error>;
}

/// A trait for binary object storage operations.
pub trait StorageService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Upload an object and return its public URL.
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> BoxFuture<'_, String, Self::Error>;

    /// Delete an object. Callers treat failures as best-effort cleanup.
    fn delete(&self, path: &str) -> BoxFuture<'_, (), Self::Error>;
}

/// Convenience aliases for gateway trait objects with the workspace error.
pub type DynAuthService = Arc<dyn AuthService<Error = CaplogError>>;
pub type DynDailyRecords = Arc<dyn DailyRecordRepository<Error = CaplogError>>;
pub type DynUserProfiles = Arc<dyn UserProfileRepository<Error = CaplogError>>;
pub type DynUserSettings = Arc<dyn UserSettingsRepository<Error = CaplogError>>;
pub type DynRealtime = Arc<dyn RealtimeService<Error = CaplogError>>;
pub type DynStorage = Arc<dyn StorageService<Error = CaplogError>>;

/// A factory handing out gateway services bound to an authenticated session.
///
/// The store constructors take this instead of concrete clients so tests can
/// substitute an in-memory gateway.
pub trait GatewayFactory: Send + Sync {
    /// The auth service (anon-key scoped; no session required).
    fn auth_service(&self) -> DynAuthService;

    /// Daily-record repository bound to a session.
    fn daily_records(&self, session: &Session) -> DynDailyRecords;

    /// Profile repository bound to a session.
    fn user_profiles(&self, session: &Session) -> DynUserProfiles;

    /// Settings repository bound to a session.
    fn user_settings(&self, session: &Session) -> DynUserSettings;

    /// Change-feed service bound to a session.
    fn realtime(&self, session: &Session) -> DynRealtime;

    /// Object storage bound to a session.
    fn storage(&self, session: &Session) -> DynStorage;
}
