//! Runtime configuration schema.
//!
//! innkeep is configured entirely through environment variables; the struct
//! here is the typed snapshot the rest of the runtime consumes.

use serde::{Deserialize, Serialize};

/// Runtime configuration for the innkeep daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnkeepConfig {
    /// HTTP gateway bind address.
    pub bind_address: String,
    /// HTTP gateway port.
    pub port: u16,
    /// SQLite database path.
    pub db_path: String,
    /// Directory for rolling log files.
    pub log_dir: String,
    /// Default log level when RUST_LOG is unset.
    pub log_level: String,

    /// PMS API key (required).
    pub pms_api_key: String,
    /// PMS API base URL.
    pub pms_api_url: String,
    /// Shared token expected in PMS webhook envelopes (optional).
    pub pms_webhook_token: Option<String>,

    /// Telegram bot token (required).
    pub telegram_bot_token: String,
    /// Telegram user ids allowed to talk to the bot and receive digests.
    pub telegram_allowed_users: Vec<i64>,

    /// Cloud Vision API key; when absent the photo flow is disabled.
    pub vision_api_key: Option<String>,

    /// Cron expression for the daily digest (seconds-resolution fields).
    pub digest_cron: String,

    /// Property slug used to expand short online check-in URLs.
    pub checkin_property_slug: String,
}

impl Default for InnkeepConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            db_path: "innkeep.db".to_string(),
            log_dir: "logs".to_string(),
            log_level: "info".to_string(),
            pms_api_key: String::new(),
            pms_api_url: "https://api.rentl.io/v1".to_string(),
            pms_webhook_token: None,
            telegram_bot_token: String::new(),
            telegram_allowed_users: Vec::new(),
            vision_api_key: None,
            digest_cron: "0 0 8 * * *".to_string(),
            checkin_property_slug: "sun-apartments".to_string(),
        }
    }
}
