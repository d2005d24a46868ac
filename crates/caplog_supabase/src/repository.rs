//! Row repositories over the platform's REST surface.
//!
//! One repository per relation, each bound to a session bearer token.
//! Mutations ask the backend to return the written representation, which is
//! the read-your-writes acknowledgment the store relies on instead of
//! artificial settle delays.

use std::sync::Arc;

use caplog_common::models::{
    DailyRecord, DailyRecordPatch, NewDailyRecord, NewUserProfile, NewUserSettings, UserProfile,
    UserProfilePatch, UserSettings, UserSettingsPatch,
};
use caplog_common::services::{
    BoxFuture, DailyRecordRepository, UserProfileRepository, UserSettingsRepository,
};
use caplog_common::CaplogError;
use chrono::NaiveDate;
use reqwest::Method;

use crate::client::{check, rows, written_row, SupabaseClient};

const RECORDS_TABLE: &str = "daily_records";
const PROFILES_TABLE: &str = "user_profiles";
const SETTINGS_TABLE: &str = "user_settings";

/// Ask the backend to echo the written row back in the response body.
const RETURN_REPRESENTATION: &str = "return=representation";

/// Daily-record repository bound to one session.
#[derive(Debug, Clone)]
pub struct SupabaseDailyRecords {
    client: Arc<SupabaseClient>,
    access_token: String,
}

impl SupabaseDailyRecords {
    pub fn new(client: Arc<SupabaseClient>, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }
}

impl DailyRecordRepository for SupabaseDailyRecords {
    type Error = CaplogError;

    fn list(&self, user_id: &str) -> BoxFuture<'_, Vec<DailyRecord>, Self::Error> {
        let path = format!("rest/v1/{RECORDS_TABLE}?user_id=eq.{user_id}&select=*&order=date.desc");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::GET, &path, &self.access_token)
                .send()
                .await?;
            rows(response).await
        })
    }

    fn find_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> BoxFuture<'_, Option<DailyRecord>, Self::Error> {
        let path = format!(
            "rest/v1/{RECORDS_TABLE}?user_id=eq.{user_id}&date=eq.{date}&select=*&limit=1"
        );
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::GET, &path, &self.access_token)
                .send()
                .await?;
            Ok(rows::<DailyRecord>(response).await?.pop())
        })
    }

    fn create(&self, record: NewDailyRecord) -> BoxFuture<'_, DailyRecord, Self::Error> {
        let path = format!("rest/v1/{RECORDS_TABLE}");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::POST, &path, &self.access_token)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&record)
                .send()
                .await?;
            written_row(response).await
        })
    }

    fn update(
        &self,
        id: &str,
        patch: DailyRecordPatch,
    ) -> BoxFuture<'_, DailyRecord, Self::Error> {
        let path = format!("rest/v1/{RECORDS_TABLE}?id=eq.{id}");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::PATCH, &path, &self.access_token)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&patch)
                .send()
                .await?;
            written_row(response).await
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, (), Self::Error> {
        let path = format!("rest/v1/{RECORDS_TABLE}?id=eq.{id}");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::DELETE, &path, &self.access_token)
                .send()
                .await?;
            check(response).await?;
            Ok(())
        })
    }
}

/// Profile repository bound to one session.
#[derive(Debug, Clone)]
pub struct SupabaseUserProfiles {
    client: Arc<SupabaseClient>,
    access_token: String,
}

impl SupabaseUserProfiles {
    pub fn new(client: Arc<SupabaseClient>, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }
}

impl UserProfileRepository for SupabaseUserProfiles {
    type Error = CaplogError;

    fn find(&self, user_id: &str) -> BoxFuture<'_, Option<UserProfile>, Self::Error> {
        let path = format!("rest/v1/{PROFILES_TABLE}?user_id=eq.{user_id}&select=*&limit=1");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::GET, &path, &self.access_token)
                .send()
                .await?;
            Ok(rows::<UserProfile>(response).await?.pop())
        })
    }

    fn create(&self, profile: NewUserProfile) -> BoxFuture<'_, UserProfile, Self::Error> {
        let path = format!("rest/v1/{PROFILES_TABLE}");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::POST, &path, &self.access_token)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&profile)
                .send()
                .await?;
            written_row(response).await
        })
    }

    fn update(
        &self,
        user_id: &str,
        patch: UserProfilePatch,
    ) -> BoxFuture<'_, UserProfile, Self::Error> {
        let path = format!("rest/v1/{PROFILES_TABLE}?user_id=eq.{user_id}");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::PATCH, &path, &self.access_token)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&patch)
                .send()
                .await?;
            written_row(response).await
        })
    }
}

/// Settings repository bound to one session.
#[derive(Debug, Clone)]
pub struct SupabaseUserSettings {
    client: Arc<SupabaseClient>,
    access_token: String,
}

impl SupabaseUserSettings {
    pub fn new(client: Arc<SupabaseClient>, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }
}

impl UserSettingsRepository for SupabaseUserSettings {
    type Error = CaplogError;

    fn find(&self, user_id: &str) -> BoxFuture<'_, Option<UserSettings>, Self::Error> {
        let path = format!("rest/v1/{SETTINGS_TABLE}?user_id=eq.{user_id}&select=*&limit=1");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::GET, &path, &self.access_token)
                .send()
                .await?;
            Ok(rows::<UserSettings>(response).await?.pop())
        })
    }

    fn create(&self, settings: NewUserSettings) -> BoxFuture<'_, UserSettings, Self::Error> {
        let path = format!("rest/v1/{SETTINGS_TABLE}");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::POST, &path, &self.access_token)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&settings)
                .send()
                .await?;
            written_row(response).await
        })
    }

    fn update(
        &self,
        user_id: &str,
        patch: UserSettingsPatch,
    ) -> BoxFuture<'_, UserSettings, Self::Error> {
        let path = format!("rest/v1/{SETTINGS_TABLE}?user_id=eq.{user_id}");
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::PATCH, &path, &self.access_token)
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&patch)
                .send()
                .await?;
            written_row(response).await
        })
    }
}
