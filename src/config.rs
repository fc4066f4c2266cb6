use std::time::Duration;

use thiserror::Error;

use crate::sync::WriteDiscipline;

/// Tunables for the progress engine and the sync controller
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// How long an identity transition may block the caller before it is released
    pub failsafe_timeout: Duration,
    /// Upper bound on loyalty points awarded for a single game result
    pub max_event_points: u64,
    /// Upper bound on the duration credited for a single game result
    pub max_duration_seconds: u64,
    /// Maximum guest points carried over when a guest signs in
    pub guest_merge_point_cap: u64,
    /// Maximum guest play time carried over when a guest signs in
    pub guest_merge_time_cap_seconds: u64,
    /// Stored point totals above this value are treated as corrupted
    pub clamp_threshold: u64,
    /// Value a corrupted point total is reset to
    pub clamp_reset_points: u64,
    /// Number of recently applied event ids remembered per profile
    pub idempotency_window: usize,
    pub write_discipline: WriteDiscipline,
    pub users_collection: String,
    pub guest_cache_key: String,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            failsafe_timeout: Duration::from_millis(2000),
            max_event_points: 5_000,
            max_duration_seconds: 3_600,
            guest_merge_point_cap: 10_000,
            guest_merge_time_cap_seconds: 36_000,
            clamp_threshold: 1_000_000,
            clamp_reset_points: 150_000,
            idempotency_window: 32,
            write_discipline: WriteDiscipline::FireAndForget,
            users_collection: "users".to_string(),
            guest_cache_key: "guest_profile".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid tier table: {0}")]
    InvalidTierTable(String),

    #[error("Invalid setting {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

/// Process-level settings for the HTTP server binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub guest_cache_dir: Option<String>,
    pub region_map_path: Option<String>,
    pub identity_token_secret: String,
    pub progress: ProgressConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut progress = ProgressConfig::default();

        if let Ok(raw) = std::env::var("WRITE_DISCIPLINE") {
            progress.write_discipline =
                raw.parse()
                    .map_err(|_| ConfigError::InvalidSetting {
                        name: "WRITE_DISCIPLINE",
                        value: raw.clone(),
                    })?;
        }

        if let Ok(raw) = std::env::var("SYNC_FAILSAFE_MS") {
            let millis: u64 = raw.parse().map_err(|_| ConfigError::InvalidSetting {
                name: "SYNC_FAILSAFE_MS",
                value: raw.clone(),
            })?;
            progress.failsafe_timeout = Duration::from_millis(millis);
        }

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            guest_cache_dir: std::env::var("GUEST_CACHE_DIR").ok(),
            region_map_path: std::env::var("REGION_MAP_PATH").ok(),
            identity_token_secret: std::env::var("IDENTITY_TOKEN_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            progress,
        })
    }
}
