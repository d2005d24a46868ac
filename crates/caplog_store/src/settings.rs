//! Per-user settings service.
//!
//! The settings row is a singleton per user, materialized lazily: the first
//! read creates it with defaults when absent.

use caplog_common::models::{NewUserSettings, Session, UserSettings, UserSettingsPatch};
use caplog_common::services::{DynUserSettings, GatewayFactory, UserSettingsRepository};
use caplog_common::{internal_error, CaplogError};
use tracing::{debug, info};

pub struct SettingsService {
    settings: DynUserSettings,
    user_id: String,
}

impl SettingsService {
    pub fn new(gateway: &dyn GatewayFactory, session: &Session) -> Self {
        Self {
            settings: gateway.user_settings(session),
            user_id: session.user.id.clone(),
        }
    }

    /// Read the settings row, creating it with defaults on first use.
    ///
    /// A concurrent first read from another device can win the creation race;
    /// the resulting conflict is resolved by re-reading the winner's row.
    pub async fn get_or_init(&self) -> Result<UserSettings, CaplogError> {
        if let Some(settings) = self.settings.find(&self.user_id).await? {
            return Ok(settings);
        }

        debug!(user_id = %self.user_id, "no settings row yet; creating defaults");
        match self
            .settings
            .create(NewUserSettings::defaults_for(self.user_id.clone()))
            .await
        {
            Ok(created) => {
                info!(user_id = %self.user_id, "settings row created with defaults");
                Ok(created)
            }
            Err(CaplogError::Conflict(_)) => self
                .settings
                .find(&self.user_id)
                .await?
                .ok_or_else(|| internal_error("settings row conflicted but cannot be read back")),
            Err(e) => Err(e),
        }
    }

    /// Partially update the settings row.
    pub async fn update(&self, patch: UserSettingsPatch) -> Result<UserSettings, CaplogError> {
        self.settings.update(&self.user_id, patch).await
    }
}
