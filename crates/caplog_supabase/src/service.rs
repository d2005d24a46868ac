//! Gateway factory implementation for the Supabase-backed platform.
//!
//! This is the one place the rest of the application learns about concrete
//! gateway types; everything downstream works against the trait objects from
//! `caplog_common::services`.

use std::sync::Arc;
use std::time::Duration;

use caplog_common::models::Session;
use caplog_common::services::{
    DynAuthService, DynDailyRecords, DynRealtime, DynStorage, DynUserProfiles, DynUserSettings,
    GatewayFactory,
};
use caplog_config::AppConfig;

use crate::auth::SupabaseAuthService;
use crate::client::SupabaseClient;
use crate::realtime::PollingRealtimeService;
use crate::repository::{SupabaseDailyRecords, SupabaseUserProfiles, SupabaseUserSettings};
use crate::storage::SupabaseStorageService;

/// Supabase gateway factory.
pub struct SupabaseGatewayFactory {
    client: Arc<SupabaseClient>,
    poll_interval: Duration,
}

impl SupabaseGatewayFactory {
    /// Create a new factory from the application configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Arc::new(SupabaseClient::new(config.supabase.clone())),
            poll_interval: Duration::from_millis(config.realtime.poll_interval_ms),
        }
    }
}

impl GatewayFactory for SupabaseGatewayFactory {
    fn auth_service(&self) -> DynAuthService {
        Arc::new(SupabaseAuthService::new(self.client.clone()))
    }

    fn daily_records(&self, session: &Session) -> DynDailyRecords {
        Arc::new(SupabaseDailyRecords::new(
            self.client.clone(),
            session.access_token.clone(),
        ))
    }

    fn user_profiles(&self, session: &Session) -> DynUserProfiles {
        Arc::new(SupabaseUserProfiles::new(
            self.client.clone(),
            session.access_token.clone(),
        ))
    }

    fn user_settings(&self, session: &Session) -> DynUserSettings {
        Arc::new(SupabaseUserSettings::new(
            self.client.clone(),
            session.access_token.clone(),
        ))
    }

    fn realtime(&self, session: &Session) -> DynRealtime {
        Arc::new(PollingRealtimeService::new(
            self.client.clone(),
            session.access_token.clone(),
            self.poll_interval,
        ))
    }

    fn storage(&self, session: &Session) -> DynStorage {
        Arc::new(SupabaseStorageService::new(
            self.client.clone(),
            session.access_token.clone(),
        ))
    }
}
