//! Environment loading for [`InnkeepConfig`].

use std::collections::HashMap;

use crate::schema::InnkeepConfig;

/// Load configuration from the process environment with defaults.
pub fn from_env() -> InnkeepConfig {
    from_map(&std::env::vars().collect())
}

/// Load configuration from a provided map (useful for testing).
pub fn from_map(env: &HashMap<String, String>) -> InnkeepConfig {
    let defaults = InnkeepConfig::default();
    let get = |key: &str| env.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    InnkeepConfig {
        bind_address: get("INNKEEP_BIND").unwrap_or(defaults.bind_address),
        port: get("INNKEEP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port),
        db_path: get("INNKEEP_DB").unwrap_or(defaults.db_path),
        log_dir: get("INNKEEP_LOG_DIR").unwrap_or(defaults.log_dir),
        log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
        pms_api_key: get("PMS_API_KEY").unwrap_or_default(),
        pms_api_url: get("PMS_API_URL").unwrap_or(defaults.pms_api_url),
        pms_webhook_token: get("PMS_WEBHOOK_TOKEN"),
        telegram_bot_token: get("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
        telegram_allowed_users: get("TELEGRAM_ALLOWED_USERS")
            .map(|raw| parse_user_list(&raw))
            .unwrap_or_default(),
        vision_api_key: get("VISION_API_KEY"),
        digest_cron: get("DIGEST_CRON").unwrap_or(defaults.digest_cron),
        checkin_property_slug: get("CHECKIN_PROPERTY_SLUG")
            .unwrap_or(defaults.checkin_property_slug),
    }
}

fn parse_user_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = from_map(&HashMap::new());
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.pms_api_url, "https://api.rentl.io/v1");
        assert!(cfg.telegram_allowed_users.is_empty());
    }

    #[test]
    fn parses_user_list_with_noise() {
        let cfg = from_map(&env(&[(
            "TELEGRAM_ALLOWED_USERS",
            "12345, 67890,,abc, 111",
        )]));
        assert_eq!(cfg.telegram_allowed_users, vec![12345, 67890, 111]);
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let cfg = from_map(&env(&[("INNKEEP_PORT", ""), ("PMS_API_URL", "  ")]));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.pms_api_url, "https://api.rentl.io/v1");
    }

    #[test]
    fn overrides_apply() {
        let cfg = from_map(&env(&[
            ("INNKEEP_PORT", "9000"),
            ("PMS_API_KEY", "key-123"),
            ("DIGEST_CRON", "0 30 7 * * *"),
        ]));
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.pms_api_key, "key-123");
        assert_eq!(cfg.digest_cron, "0 30 7 * * *");
    }
}
