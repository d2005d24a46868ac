//! Authentication against the platform's auth endpoints.
//!
//! Registration also provisions the new user's profile and default settings
//! rows, so the rest of the data layer can assume both exist.

use std::sync::Arc;

use caplog_common::models::{NewUserProfile, NewUserSettings, Session, UserIdentity};
use caplog_common::services::{AuthService, BoxFuture};
use caplog_common::CaplogError;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::client::SupabaseClient;
use crate::repository::{SupabaseUserProfiles, SupabaseUserSettings};

/// Token grant response from the auth endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let display_name = self
            .user
            .user_metadata
            .get("display_name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user: UserIdentity {
                id: self.user.id,
                email: self.user.email.unwrap_or_default(),
                display_name,
            },
        }
    }
}

/// Extract a human-readable failure message from an auth error body.
fn auth_failure(status: reqwest::StatusCode, body: &str) -> CaplogError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| format!("auth request failed with status {status}"));
    CaplogError::Auth(message)
}

/// Auth service backed by the platform's GoTrue endpoints.
pub struct SupabaseAuthService {
    client: Arc<SupabaseClient>,
}

impl SupabaseAuthService {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    async fn token_request(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<Session, CaplogError> {
        let response = self
            .client
            .request(Method::POST, path)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(auth_failure(status, &body));
        }

        // A signup response without tokens means the project requires email
        // confirmation, which this client does not support.
        let token: TokenResponse = serde_json::from_str(&body).map_err(|_| {
            CaplogError::Auth("auth endpoint returned no usable session".to_string())
        })?;
        Ok(token.into_session())
    }

    /// Create the profile and settings rows for a freshly registered user.
    ///
    /// A conflict here means a previous registration attempt already
    /// provisioned the row; that is fine and not surfaced.
    async fn provision(&self, session: &Session, display_name: &str) -> Result<(), CaplogError> {
        use caplog_common::services::{UserProfileRepository, UserSettingsRepository};

        let profiles =
            SupabaseUserProfiles::new(self.client.clone(), session.access_token.clone());
        let settings =
            SupabaseUserSettings::new(self.client.clone(), session.access_token.clone());

        let profile = NewUserProfile {
            user_id: session.user.id.clone(),
            display_name: display_name.to_string(),
            has_seen_tutorial: false,
        };
        match profiles.create(profile).await {
            Ok(_) => {}
            Err(CaplogError::Conflict(_)) => debug!("profile row already provisioned"),
            Err(e) => return Err(e),
        }

        match settings
            .create(NewUserSettings::defaults_for(session.user.id.clone()))
            .await
        {
            Ok(_) => {}
            Err(CaplogError::Conflict(_)) => debug!("settings row already provisioned"),
            Err(e) => return Err(e),
        }

        Ok(())
    }
}

impl AuthService for SupabaseAuthService {
    type Error = CaplogError;

    fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> BoxFuture<'_, Session, Self::Error> {
        let email = email.to_string();
        let password = password.to_string();
        let display_name = display_name.to_string();
        Box::pin(async move {
            let session = self
                .token_request(
                    "auth/v1/signup",
                    json!({
                        "email": email,
                        "password": password,
                        "data": { "display_name": display_name },
                    }),
                )
                .await?;

            self.provision(&session, &display_name).await?;
            info!(user_id = %session.user.id, "registered new account");
            Ok(session)
        })
    }

    fn login(&self, email: &str, password: &str) -> BoxFuture<'_, Session, Self::Error> {
        let email = email.to_string();
        let password = password.to_string();
        Box::pin(async move {
            self.token_request(
                "auth/v1/token?grant_type=password",
                json!({ "email": email, "password": password }),
            )
            .await
        })
    }

    fn logout(&self, session: &Session) -> BoxFuture<'_, (), Self::Error> {
        let access_token = session.access_token.clone();
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::POST, "auth/v1/logout", &access_token)
                .send()
                .await?;
            crate::client::check(response).await?;
            Ok(())
        })
    }

    fn send_password_reset(&self, email: &str) -> BoxFuture<'_, (), Self::Error> {
        let email = email.to_string();
        Box::pin(async move {
            let response = self
                .client
                .request(Method::POST, "auth/v1/recover")
                .json(&json!({ "email": email }))
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(auth_failure(status, &body));
            }
            Ok(())
        })
    }
}
