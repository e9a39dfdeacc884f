use critbot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines =
        vec!["effective config (source precedence: overrides > env > file > default):".to_string()];
    lines.push(format!(
        "telegram.bot_token = {}",
        redact_token(config.telegram.bot_token.expose_secret())
    ));
    lines.push(format!("telegram.poll_timeout_secs = {}", config.telegram.poll_timeout_secs));
    lines.push(format!("phrases.path = {}", config.phrases.path.display()));
    lines.push(format!("logging.level = {}", config.logging.level));
    lines.push(format!("logging.format = {:?}", config.logging.format).to_lowercase());

    lines.join("\n")
}

/// Keeps the public numeric bot id, masks the secret half.
fn redact_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, _)) => format!("{id}:********"),
        None => "********".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn redaction_keeps_the_bot_id_and_hides_the_secret() {
        assert_eq!(redact_token("12345:abc-def"), "12345:********");
        assert!(!redact_token("12345:abc-def").contains("abc"));
    }

    #[test]
    fn redaction_hides_shapeless_tokens_entirely() {
        assert_eq!(redact_token("no-colon"), "********");
    }
}
