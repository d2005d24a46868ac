//! Object storage operations (profile images).

use std::sync::Arc;

use caplog_common::services::{BoxFuture, StorageService};
use caplog_common::CaplogError;
use reqwest::{header, Method};
use tracing::info;

use crate::client::{check, SupabaseClient};

/// Storage service bound to one session and one bucket.
pub struct SupabaseStorageService {
    client: Arc<SupabaseClient>,
    access_token: String,
}

impl SupabaseStorageService {
    pub fn new(client: Arc<SupabaseClient>, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }

    fn bucket(&self) -> &str {
        &self.client.config().storage_bucket
    }

    /// The public download URL the platform serves uploaded objects under.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.client.config().url.trim_end_matches('/'),
            self.bucket(),
            path
        )
    }
}

impl StorageService for SupabaseStorageService {
    type Error = CaplogError;

    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> BoxFuture<'_, String, Self::Error> {
        let object_path = format!("storage/v1/object/{}/{}", self.bucket(), path);
        let public_url = self.public_url(path);
        let content_type = content_type.to_string();
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::POST, &object_path, &self.access_token)
                .header(header::CONTENT_TYPE, content_type)
                // Re-uploading under the same path replaces the object.
                .header("x-upsert", "true")
                .body(bytes)
                .send()
                .await?;
            check(response).await?;
            info!(path = %object_path, "uploaded storage object");
            Ok(public_url)
        })
    }

    fn delete(&self, path: &str) -> BoxFuture<'_, (), Self::Error> {
        let object_path = format!("storage/v1/object/{}/{}", self.bucket(), path);
        Box::pin(async move {
            let response = self
                .client
                .authed(Method::DELETE, &object_path, &self.access_token)
                .send()
                .await?;
            check(response).await?;
            Ok(())
        })
    }
}
