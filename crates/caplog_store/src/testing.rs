//! In-memory gateway used by the store/service tests.
//!
//! Implements every gateway trait over plain maps plus a broadcast channel
//! for change events, with counters for injecting a fixed number of failures
//! on selected paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use caplog_common::models::{
    ChangeEvent, DailyRecord, DailyRecordPatch, NewDailyRecord, NewUserProfile, NewUserSettings,
    Session, UserIdentity, UserProfile, UserProfilePatch, UserSettings, UserSettingsPatch,
};
use caplog_common::services::{
    AuthService, BoxFuture, DailyRecordRepository, DynAuthService, DynDailyRecords, DynRealtime,
    DynStorage, DynUserProfiles, DynUserSettings, GatewayFactory, RealtimeService,
    RealtimeSubscription, StorageService, UserProfileRepository, UserSettingsRepository,
};
use caplog_common::{conflict, not_found, CaplogError};
use chrono::{NaiveDate, Utc};
use tokio::sync::broadcast;

pub fn test_session(user_id: &str) -> Session {
    Session {
        access_token: "test-token".to_string(),
        refresh_token: "test-refresh".to_string(),
        user: UserIdentity {
            id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            display_name: Some("Test User".to_string()),
        },
    }
}

pub struct MockState {
    pub records: Mutex<Vec<DailyRecord>>,
    pub profiles: Mutex<Vec<UserProfile>>,
    pub settings: Mutex<Vec<UserSettings>>,
    pub uploaded: Mutex<Vec<String>>,
    pub deleted_objects: Mutex<Vec<String>>,
    /// Number of upcoming record-create calls that fail with a transport error.
    pub fail_creates: AtomicUsize,
    /// Number of upcoming record-delete calls that fail.
    pub fail_deletes: AtomicUsize,
    /// Number of upcoming record-read calls (list/find) that fail.
    pub fail_record_reads: AtomicUsize,
    /// Number of upcoming profile-read calls that fail.
    pub fail_profile_reads: AtomicUsize,
    pub create_attempts: AtomicUsize,
    next_id: AtomicUsize,
    changes: broadcast::Sender<ChangeEvent>,
}

impl MockState {
    pub fn new() -> Arc<Self> {
        let (changes, _) = broadcast::channel(16);
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            profiles: Mutex::new(Vec::new()),
            settings: Mutex::new(Vec::new()),
            uploaded: Mutex::new(Vec::new()),
            deleted_objects: Mutex::new(Vec::new()),
            fail_creates: AtomicUsize::new(0),
            fail_deletes: AtomicUsize::new(0),
            fail_record_reads: AtomicUsize::new(0),
            fail_profile_reads: AtomicUsize::new(0),
            create_attempts: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
            changes,
        })
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Consume one injected failure if any remain.
    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn emit(&self, user_id: &str) {
        let _ = self.changes.send(ChangeEvent {
            table: "daily_records".to_string(),
            user_id: user_id.to_string(),
            observed_at: Utc::now(),
        });
    }

    pub fn seed_record(&self, user_id: &str, date: NaiveDate, completed: bool) -> DailyRecord {
        let now = Utc::now();
        let record = DailyRecord {
            id: self.next_id("rec"),
            user_id: user_id.to_string(),
            date,
            capsules: 2,
            time: "08:30".to_string(),
            notes: None,
            completed,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(record.clone());
        record
    }

    pub fn seed_profile(&self, user_id: &str, has_seen_tutorial: bool) -> UserProfile {
        let now = Utc::now();
        let profile = UserProfile {
            id: self.next_id("prof"),
            user_id: user_id.to_string(),
            display_name: "Test User".to_string(),
            age: None,
            gender: None,
            avatar_url: None,
            has_seen_tutorial,
            created_at: now,
            updated_at: now,
        };
        self.profiles.lock().unwrap().push(profile.clone());
        profile
    }
}

pub struct MockGateway {
    pub state: Arc<MockState>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            state: MockState::new(),
        }
    }
}

impl GatewayFactory for MockGateway {
    fn auth_service(&self) -> DynAuthService {
        Arc::new(MockAuth)
    }

    fn daily_records(&self, _session: &Session) -> DynDailyRecords {
        Arc::new(MockDailyRecords {
            state: self.state.clone(),
        })
    }

    fn user_profiles(&self, _session: &Session) -> DynUserProfiles {
        Arc::new(MockUserProfiles {
            state: self.state.clone(),
        })
    }

    fn user_settings(&self, _session: &Session) -> DynUserSettings {
        Arc::new(MockUserSettings {
            state: self.state.clone(),
        })
    }

    fn realtime(&self, _session: &Session) -> DynRealtime {
        Arc::new(MockRealtime {
            state: self.state.clone(),
        })
    }

    fn storage(&self, _session: &Session) -> DynStorage {
        Arc::new(MockStorage {
            state: self.state.clone(),
        })
    }
}

struct MockAuth;

impl AuthService for MockAuth {
    type Error = CaplogError;

    fn register(
        &self,
        _email: &str,
        _password: &str,
        _display_name: &str,
    ) -> BoxFuture<'_, Session, Self::Error> {
        Box::pin(async move { Ok(test_session("user-1")) })
    }

    fn login(&self, _email: &str, _password: &str) -> BoxFuture<'_, Session, Self::Error> {
        Box::pin(async move { Ok(test_session("user-1")) })
    }

    fn logout(&self, _session: &Session) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async move { Ok(()) })
    }

    fn send_password_reset(&self, _email: &str) -> BoxFuture<'_, (), Self::Error> {
        Box::pin(async move { Ok(()) })
    }
}

struct MockDailyRecords {
    state: Arc<MockState>,
}

impl DailyRecordRepository for MockDailyRecords {
    type Error = CaplogError;

    fn list(&self, user_id: &str) -> BoxFuture<'_, Vec<DailyRecord>, Self::Error> {
        let state = self.state.clone();
        let user_id = user_id.to_string();
        Box::pin(async move {
            if MockState::take_failure(&state.fail_record_reads) {
                return Err(CaplogError::Http("injected list failure".to_string()));
            }
            let mut records: Vec<DailyRecord> = state
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            records.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(records)
        })
    }

    fn find_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Option<DailyRecord>, Self::Error> {
        let state = self.state.clone();
        let user_id = user_id.to_string();
        Box::pin(async move {
            if MockState::take_failure(&state.fail_record_reads) {
                return Err(CaplogError::Http("injected find failure".to_string()));
            }
            Ok(state
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.user_id == user_id && r.date == date)
                .cloned())
        })
    }

    fn create(&self, record: NewDailyRecord) -> BoxFuture<'_, DailyRecord, Self::Error> {
        let state = self.state.clone();
        Box::pin(async move {
            state.create_attempts.fetch_add(1, Ordering::SeqCst);
            if MockState::take_failure(&state.fail_creates) {
                return Err(CaplogError::Http("injected create failure".to_string()));
            }

            let created = {
                let mut records = state.records.lock().unwrap();
                if records
                    .iter()
                    .any(|r| r.user_id == record.user_id && r.date == record.date)
                {
                    return Err(conflict(format!("record already exists for {}", record.date)));
                }
                let now = Utc::now();
                let created = DailyRecord {
                    id: state.next_id("rec"),
                    user_id: record.user_id,
                    date: record.date,
                    capsules: record.capsules,
                    time: record.time,
                    notes: record.notes,
                    completed: record.completed,
                    created_at: now,
                    updated_at: now,
                };
                records.push(created.clone());
                created
            };
            state.emit(&created.user_id);
            Ok(created)
        })
    }

    fn update(
        &self,
        id: &str,
        patch: DailyRecordPatch,
    ) -> BoxFuture<'_, DailyRecord, Self::Error> {
        let state = self.state.clone();
        let id = id.to_string();
        Box::pin(async move {
            let updated = {
                let mut records = state.records.lock().unwrap();
                let record = records
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| not_found(format!("record {id}")))?;
                if let Some(capsules) = patch.capsules {
                    record.capsules = capsules;
                }
                if let Some(time) = patch.time {
                    record.time = time;
                }
                if let Some(notes) = patch.notes {
                    record.notes = Some(notes);
                }
                if let Some(completed) = patch.completed {
                    record.completed = completed;
                }
                record.updated_at = Utc::now();
                record.clone()
            };
            state.emit(&updated.user_id);
            Ok(updated)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, (), Self::Error> {
        let state = self.state.clone();
        let id = id.to_string();
        Box::pin(async move {
            if MockState::take_failure(&state.fail_deletes) {
                return Err(CaplogError::Http("injected delete failure".to_string()));
            }
            let removed_user = {
                let mut records = state.records.lock().unwrap();
                let before = records.len();
                let user = records
                    .iter()
                    .find(|r| r.id == id)
                    .map(|r| r.user_id.clone());
                records.retain(|r| r.id != id);
                (records.len() < before).then_some(user).flatten()
            };
            if let Some(user_id) = removed_user {
                state.emit(&user_id);
            }
            Ok(())
        })
    }
}

struct MockUserProfiles {
    state: Arc<MockState>,
}

impl UserProfileRepository for MockUserProfiles {
    type Error = CaplogError;

    fn find(&self, user_id: &str) -> BoxFuture<'_, Option<UserProfile>, Self::Error> {
        let state = self.state.clone();
        let user_id = user_id.to_string();
        Box::pin(async move {
            if MockState::take_failure(&state.fail_profile_reads) {
                return Err(CaplogError::Http("injected profile read failure".to_string()));
            }
            Ok(state
                .profiles
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.user_id == user_id)
                .cloned())
        })
    }

    fn create(&self, profile: NewUserProfile) -> BoxFuture<'_, UserProfile, Self::Error> {
        let state = self.state.clone();
        Box::pin(async move {
            let mut profiles = state.profiles.lock().unwrap();
            if profiles.iter().any(|p| p.user_id == profile.user_id) {
                return Err(conflict("profile already exists"));
            }
            let now = Utc::now();
            let created = UserProfile {
                id: state.next_id("prof"),
                user_id: profile.user_id,
                display_name: profile.display_name,
                age: None,
                gender: None,
                avatar_url: None,
                has_seen_tutorial: profile.has_seen_tutorial,
                created_at: now,
                updated_at: now,
            };
            profiles.push(created.clone());
            Ok(created)
        })
    }

    fn update(
        &self,
        user_id: &str,
        patch: UserProfilePatch,
    ) -> BoxFuture<'_, UserProfile, Self::Error> {
        let state = self.state.clone();
        let user_id = user_id.to_string();
        Box::pin(async move {
            let mut profiles = state.profiles.lock().unwrap();
            let profile = profiles
                .iter_mut()
                .find(|p| p.user_id == user_id)
                .ok_or_else(|| not_found(format!("profile for {user_id}")))?;
            if let Some(display_name) = patch.display_name {
                profile.display_name = display_name;
            }
            if let Some(age) = patch.age {
                profile.age = Some(age);
            }
            if let Some(gender) = patch.gender {
                profile.gender = Some(gender);
            }
            if let Some(avatar_url) = patch.avatar_url {
                profile.avatar_url = Some(avatar_url);
            }
            if let Some(seen) = patch.has_seen_tutorial {
                profile.has_seen_tutorial = seen;
            }
            profile.updated_at = Utc::now();
            Ok(profile.clone())
        })
    }
}

struct MockUserSettings {
    state: Arc<MockState>,
}

impl UserSettingsRepository for MockUserSettings {
    type Error = CaplogError;

    fn find(&self, user_id: &str) -> BoxFuture<'_, Option<UserSettings>, Self::Error> {
        let state = self.state.clone();
        let user_id = user_id.to_string();
        Box::pin(async move {
            Ok(state
                .settings
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.user_id == user_id)
                .cloned())
        })
    }

    fn create(&self, settings: NewUserSettings) -> BoxFuture<'_, UserSettings, Self::Error> {
        let state = self.state.clone();
        Box::pin(async move {
            let mut rows = state.settings.lock().unwrap();
            if rows.iter().any(|s| s.user_id == settings.user_id) {
                return Err(conflict("settings already exist"));
            }
            let now = Utc::now();
            let created = UserSettings {
                id: state.next_id("set"),
                user_id: settings.user_id,
                notifications_enabled: settings.notifications_enabled,
                reminder_time: settings.reminder_time,
                daily_goal: settings.daily_goal,
                weekly_goal: settings.weekly_goal,
                theme: settings.theme,
                language: settings.language,
                created_at: now,
                updated_at: now,
            };
            rows.push(created.clone());
            Ok(created)
        })
    }

    fn update(
        &self,
        user_id: &str,
        patch: UserSettingsPatch,
    ) -> BoxFuture<'_, UserSettings, Self::Error> {
        let state = self.state.clone();
        let user_id = user_id.to_string();
        Box::pin(async move {
            let mut rows = state.settings.lock().unwrap();
            let settings = rows
                .iter_mut()
                .find(|s| s.user_id == user_id)
                .ok_or_else(|| not_found(format!("settings for {user_id}")))?;
            if let Some(enabled) = patch.notifications_enabled {
                settings.notifications_enabled = enabled;
            }
            if let Some(reminder_time) = patch.reminder_time {
                settings.reminder_time = reminder_time;
            }
            if let Some(daily_goal) = patch.daily_goal {
                settings.daily_goal = daily_goal;
            }
            if let Some(weekly_goal) = patch.weekly_goal {
                settings.weekly_goal = weekly_goal;
            }
            if let Some(theme) = patch.theme {
                settings.theme = theme;
            }
            if let Some(language) = patch.language {
                settings.language = language;
            }
            settings.updated_at = Utc::now();
            Ok(settings.clone())
        })
    }
}

struct MockRealtime {
    state: Arc<MockState>,
}

impl RealtimeService for MockRealtime {
    type Error = CaplogError;

    fn subscribe(&self, user_id: &str) -> BoxFuture<'_, RealtimeSubscription, Self::Error> {
        use futures::StreamExt;

        let rx = self.state.changes.subscribe();
        let user_id = user_id.to_string();
        Box::pin(async move {
            let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(move |ev| {
                let user_id = user_id.clone();
                async move { ev.ok().filter(|e| e.user_id == user_id) }
            });
            Ok(RealtimeSubscription::new(Box::pin(stream), || {}))
        })
    }
}

struct MockStorage {
    state: Arc<MockState>,
}

impl StorageService for MockStorage {
    type Error = CaplogError;

    fn upload(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> BoxFuture<'_, String, Self::Error> {
        let state = self.state.clone();
        let path = path.to_string();
        Box::pin(async move {
            state.uploaded.lock().unwrap().push(path.clone());
            Ok(format!(
                "https://mock.local/storage/v1/object/public/avatars/{path}"
            ))
        })
    }

    fn delete(&self, path: &str) -> BoxFuture<'_, (), Self::Error> {
        let state = self.state.clone();
        let path = path.to_string();
        Box::pin(async move {
            state.deleted_objects.lock().unwrap().push(path);
            Ok(())
        })
    }
}
