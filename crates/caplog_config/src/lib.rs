//! Configuration loading for the caplog client data layer.
//!
//! Configuration is assembled from an optional `config/default.toml`, an
//! optional `config/{RUN_ENV}.toml` overlay, and environment variables
//! prefixed with `CAPLOG` (double-underscore path separator, e.g.
//! `CAPLOG__SUPABASE__URL`). A `.env` file is honoured once per process.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;

pub mod models;
pub use models::{AppConfig, RealtimeConfig, RetryConfig, SupabaseConfig};

static DOTENV_LOADED: OnceCell<()> = OnceCell::new();

/// Load `.env` into the process environment exactly once.
///
/// Subsequent calls are no-ops, so any entry point (binary, test, doc
/// example) can call this without worrying about ordering.
pub fn ensure_dotenv_loaded() {
    DOTENV_LOADED.get_or_init(|| {
        // A missing .env file is not an error; deployments use real env vars.
        let _ = dotenv::dotenv();
    });
}

/// Loads the application configuration.
///
/// Dependent crates call this so they do not need to know where the
/// configuration comes from (files, environment, or both).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());

    let config = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_env}")).required(false))
        .add_source(
            Environment::with_prefix("CAPLOG")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    config.try_deserialize()
}
