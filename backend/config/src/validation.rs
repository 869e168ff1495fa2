//! Startup validation: collect every problem at once instead of failing on
//! the first missing variable.

use crate::schema::InnkeepConfig;

/// Validate required settings. Returns a list of human-readable problems;
/// empty means the config is usable.
pub fn validate(config: &InnkeepConfig) -> Vec<String> {
    let mut problems = Vec::new();

    if config.pms_api_key.is_empty() {
        problems.push("PMS_API_KEY is required".to_string());
    }
    if config.telegram_bot_token.is_empty() {
        problems.push("TELEGRAM_BOT_TOKEN is required".to_string());
    }
    if config.telegram_allowed_users.is_empty() {
        problems.push(
            "TELEGRAM_ALLOWED_USERS is empty — nobody can use the bot or receive digests"
                .to_string(),
        );
    }
    if !config.pms_api_url.starts_with("http") {
        problems.push(format!("PMS_API_URL is not a URL: {}", config.pms_api_url));
    }
    if config.digest_cron.split_whitespace().count() < 6 {
        problems.push(format!(
            "DIGEST_CRON must be a seconds-resolution cron expression, got '{}'",
            config.digest_cron
        ));
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_all_missing_keys() {
        let cfg = InnkeepConfig::default();
        let problems = validate(&cfg);
        assert!(problems.iter().any(|p| p.contains("PMS_API_KEY")));
        assert!(problems.iter().any(|p| p.contains("TELEGRAM_BOT_TOKEN")));
        assert!(problems.iter().any(|p| p.contains("TELEGRAM_ALLOWED_USERS")));
    }

    #[test]
    fn accepts_complete_config() {
        let cfg = InnkeepConfig {
            pms_api_key: "key".into(),
            telegram_bot_token: "token".into(),
            telegram_allowed_users: vec![1],
            ..Default::default()
        };
        assert!(validate(&cfg).is_empty());
    }

    #[test]
    fn rejects_short_cron() {
        let cfg = InnkeepConfig {
            pms_api_key: "key".into(),
            telegram_bot_token: "token".into(),
            telegram_allowed_users: vec![1],
            digest_cron: "0 8 * * *".into(),
            ..Default::default()
        };
        let problems = validate(&cfg);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("DIGEST_CRON"));
    }
}
