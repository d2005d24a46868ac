//! Per-user profile service and the tutorial/onboarding gate.

use caplog_common::models::{Session, UserProfile, UserProfilePatch};
use caplog_common::services::{
    DynStorage, DynUserProfiles, GatewayFactory, StorageService, UserProfileRepository,
};
use caplog_common::CaplogError;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// One-time onboarding gate.
///
/// `Pending → Completed` fires on completion or skip (identical by
/// definition); the only way back is the explicit reset exposed for support
/// and testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorialState {
    Pending,
    Completed,
}

pub struct ProfileService {
    profiles: DynUserProfiles,
    storage: DynStorage,
    user_id: String,
}

impl ProfileService {
    pub fn new(gateway: &dyn GatewayFactory, session: &Session) -> Self {
        Self {
            profiles: gateway.user_profiles(session),
            storage: gateway.storage(session),
            user_id: session.user.id.clone(),
        }
    }

    /// Fetch the profile row, if it exists.
    pub async fn get(&self) -> Result<Option<UserProfile>, CaplogError> {
        self.profiles.find(&self.user_id).await
    }

    /// Partially update the profile row.
    pub async fn update(&self, patch: UserProfilePatch) -> Result<UserProfile, CaplogError> {
        self.profiles.update(&self.user_id, patch).await
    }

    /// Current tutorial gate state.
    ///
    /// A read failure resolves to `Completed`: the fail-safe direction is to
    /// never re-interrupt a returning user over a transient read problem. A
    /// missing profile row, by contrast, is a genuinely fresh account and
    /// reports `Pending`.
    pub async fn tutorial_state(&self) -> TutorialState {
        match self.get().await {
            Ok(Some(profile)) if profile.has_seen_tutorial => TutorialState::Completed,
            Ok(Some(_)) => TutorialState::Pending,
            Ok(None) => TutorialState::Pending,
            Err(e) => {
                warn!(error = %e, "tutorial gate read failed; suppressing tutorial");
                TutorialState::Completed
            }
        }
    }

    /// Permanently dismiss the tutorial. Idempotent.
    pub async fn complete_tutorial(&self) -> Result<(), CaplogError> {
        self.set_tutorial_seen(true).await
    }

    /// Skipping is defined as completing: same transition, same permanence.
    pub async fn skip_tutorial(&self) -> Result<(), CaplogError> {
        self.complete_tutorial().await
    }

    /// Support/testing path back to `Pending`.
    pub async fn reset_tutorial(&self) -> Result<(), CaplogError> {
        self.set_tutorial_seen(false).await
    }

    async fn set_tutorial_seen(&self, seen: bool) -> Result<(), CaplogError> {
        let patch = UserProfilePatch {
            has_seen_tutorial: Some(seen),
            ..Default::default()
        };
        self.profiles.update(&self.user_id, patch).await?;
        Ok(())
    }

    /// Upload a new profile image and point the profile at its public URL.
    ///
    /// The replaced object, if any, is deleted best-effort afterwards; a
    /// failed cleanup is logged and otherwise ignored.
    pub async fn upload_avatar(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, CaplogError> {
        let extension = match content_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "bin",
        };
        let path = format!("{}/{}.{}", self.user_id, Uuid::new_v4(), extension);

        let previous = self
            .get()
            .await
            .ok()
            .flatten()
            .and_then(|profile| profile.avatar_url);

        let url = self.storage.upload(&path, bytes, content_type).await?;
        self.update(UserProfilePatch {
            avatar_url: Some(url.clone()),
            ..Default::default()
        })
        .await?;
        info!(user_id = %self.user_id, "profile image replaced");

        if let Some(old_path) = previous.as_deref().and_then(object_path_of) {
            if let Err(e) = self.storage.delete(&old_path).await {
                warn!(error = %e, path = %old_path, "stale profile image not cleaned up");
            }
        }

        Ok(url)
    }
}

/// Extract the bucket-relative object path from a public storage URL.
fn object_path_of(public_url: &str) -> Option<String> {
    let (_, after) = public_url.split_once("/object/public/")?;
    // The first segment is the bucket name; the remainder is the object path.
    let (_bucket, path) = after.split_once('/')?;
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
