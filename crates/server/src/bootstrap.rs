use std::sync::Arc;

use critbot_core::config::{AppConfig, ConfigError, LoadOptions};
use critbot_core::phrases::{PhraseOverrides, PhraseResolver};
use critbot_telegram::api::BotApiTransport;
use critbot_telegram::commands::D20CommandService;
use critbot_telegram::poller::{LongPollRunner, ReconnectPolicy};
use critbot_telegram::updates::dispatcher_with_service;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runner: LongPollRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    Ok(bootstrap_with_config(config))
}

/// Wires the application from an already-loaded config. Phrase override
/// loading happens here, once, before any update is polled; its failure is
/// absorbed into the built-in table.
pub fn bootstrap_with_config(config: AppConfig) -> Application {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let overrides = PhraseOverrides::load_or_default(&config.phrases.path);
    info!(
        event_name = "system.bootstrap.phrases_loaded",
        path = %config.phrases.path.display(),
        override_count = overrides.len(),
        "phrase override table loaded"
    );

    let service = D20CommandService::new(PhraseResolver::new(overrides));
    let dispatcher = dispatcher_with_service(service);
    let transport = Arc::new(BotApiTransport::new(
        &config.telegram.bot_token,
        config.telegram.poll_timeout_secs,
    ));
    let runner = LongPollRunner::new(transport, dispatcher, ReconnectPolicy::default());

    Application { config, runner }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use critbot_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap, BootstrapError};

    fn valid_overrides() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                bot_token: Some("12345:test-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn bootstrap_fails_fast_without_a_usable_bot_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                bot_token: Some("not-a-botfather-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let error = result.err().expect("bootstrap must fail");
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("telegram.bot_token"));
    }

    #[test]
    fn bootstrap_survives_a_missing_phrase_file() {
        let mut options = valid_overrides();
        options.overrides.phrases_path = Some(PathBuf::from("does-not-exist.toml"));

        let app = bootstrap(options).expect("missing phrase file must not be fatal");
        assert_eq!(app.config.phrases.path, PathBuf::from("does-not-exist.toml"));
    }
}
