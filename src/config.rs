//! Environment contract. Everything the tool needs from the outside is
//! read once at startup into one struct; nothing else in the crate touches
//! the process environment.

use anyhow::{bail, Context, Result};
use std::env;

const DEVMAN_TOKEN_VAR: &str = "DEVMAN_ACCESS_TOKEN";
const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_ACCESS_TOKEN";
const TELEGRAM_CHAT_VAR: &str = "TELEGRAM_CHAT_ID";
const TELEGRAM_LOG_TOKEN_VAR: &str = "TELEGRAM_LOG_ACCESS_TOKEN";

/// Startup configuration snapshot.
#[derive(Debug, Clone)]
pub struct Config {
    /// API token for the dvmn.org long-polling endpoint.
    pub devman_token: String,
    /// Bot token used for review notifications.
    pub telegram_token: String,
    /// Chat that notifications (and forwarded log records) are delivered to.
    pub telegram_chat_id: String,
    /// Token of a dedicated log-forwarding bot; `None` disables forwarding.
    pub telegram_log_token: Option<String>,
}

impl Config {
    /// Read the whole contract from the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            devman_token: require(DEVMAN_TOKEN_VAR)?,
            telegram_token: require(TELEGRAM_TOKEN_VAR)?,
            telegram_chat_id: require(TELEGRAM_CHAT_VAR)?,
            telegram_log_token: env::var(TELEGRAM_LOG_TOKEN_VAR)
                .ok()
                .filter(|value| !value.is_empty()),
        })
    }
}

fn require(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{name} is not set"))?;
    if value.is_empty() {
        bail!("{name} is set but empty");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required() {
        env::set_var(DEVMAN_TOKEN_VAR, "devman-token");
        env::set_var(TELEGRAM_TOKEN_VAR, "bot-token");
        env::set_var(TELEGRAM_CHAT_VAR, "424242");
        env::remove_var(TELEGRAM_LOG_TOKEN_VAR);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_required_variables() {
        set_required();

        let config = Config::from_env().unwrap();
        assert_eq!(config.devman_token, "devman-token");
        assert_eq!(config.telegram_token, "bot-token");
        assert_eq!(config.telegram_chat_id, "424242");
        assert_eq!(config.telegram_log_token, None);
    }

    #[test]
    #[serial]
    fn test_missing_variable_is_named_in_the_error() {
        set_required();
        env::remove_var(DEVMAN_TOKEN_VAR);

        let err = Config::from_env().expect_err("missing token should fail");
        assert!(format!("{err:#}").contains(DEVMAN_TOKEN_VAR));
    }

    #[test]
    #[serial]
    fn test_empty_required_variable_is_rejected() {
        set_required();
        env::set_var(TELEGRAM_CHAT_VAR, "");

        let err = Config::from_env().expect_err("empty chat id should fail");
        assert!(format!("{err:#}").contains(TELEGRAM_CHAT_VAR));
    }

    #[test]
    #[serial]
    fn test_log_token_is_optional() {
        set_required();
        env::set_var(TELEGRAM_LOG_TOKEN_VAR, "log-bot-token");

        let config = Config::from_env().unwrap();
        assert_eq!(config.telegram_log_token.as_deref(), Some("log-bot-token"));
    }

    #[test]
    #[serial]
    fn test_empty_log_token_disables_forwarding() {
        set_required();
        env::set_var(TELEGRAM_LOG_TOKEN_VAR, "");

        let config = Config::from_env().unwrap();
        assert_eq!(config.telegram_log_token, None);
    }
}
