//! Secret redaction for startup logging.

use crate::schema::InnkeepConfig;

/// Mask a secret, keeping the last four characters for recognizability.
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    if secret.len() <= 4 {
        return "****".to_string();
    }
    format!("****{}", &secret[secret.len() - 4..])
}

/// Clone of the config with secrets masked, safe to log at startup.
pub fn redacted(config: &InnkeepConfig) -> InnkeepConfig {
    InnkeepConfig {
        pms_api_key: mask(&config.pms_api_key),
        telegram_bot_token: mask(&config.telegram_bot_token),
        vision_api_key: config.vision_api_key.as_deref().map(mask),
        pms_webhook_token: config.pms_webhook_token.as_deref().map(mask),
        ..config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_keep_tail() {
        assert_eq!(mask("abcdefgh1234"), "****1234");
        assert_eq!(mask("ab"), "****");
        assert_eq!(mask(""), "<unset>");
    }

    #[test]
    fn redacted_leaves_plain_fields() {
        let cfg = InnkeepConfig {
            pms_api_key: "super-secret-key".into(),
            port: 9999,
            ..Default::default()
        };
        let red = redacted(&cfg);
        assert_eq!(red.port, 9999);
        assert!(!red.pms_api_key.contains("super"));
    }
}
