use serde::{Deserialize, Serialize};

// --- Supabase Config ---
// Holds the non-secret platform coordinates. The anon key is a publishable
// key by design of the platform; the service-role key is never configured here.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SupabaseConfig {
    pub url: String,      // e.g. https://<project>.supabase.co, no trailing slash
    pub anon_key: String, // Loaded via CAPLOG__SUPABASE__ANON_KEY or SUPABASE_ANON_KEY
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
}

fn default_storage_bucket() -> String {
    "avatars".to_string()
}

// --- Retry Config ---
// Tuning for the single automatic retry on the create-record path.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_create_retry_delay_ms")]
    pub create_retry_delay_ms: u64,
}

fn default_create_retry_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            create_retry_delay_ms: default_create_retry_delay_ms(),
        }
    }
}

// --- Realtime Config ---
// Poll cadence of the change-feed head probe.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RealtimeConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Platform coordinates are mandatory
    pub supabase: SupabaseConfig,

    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}
