use crate::oracle::{OfflineOracle, OpenAICompatibleOracle, Oracle};
use crate::prompts::PromptLibrary;
use anyhow::Context;
use async_openai::config::OpenAIConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported backends for the oracle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
    /// No network; see [`OfflineOracle`].
    Offline,
}

/// Everything needed to build the oracle and the prompt library.
#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub timeout: Duration,
    pub prompts_path: Option<PathBuf>,
}

impl OracleConfig {
    /// Loads oracle configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let provider_str =
            std::env::var("CLASSROOM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "offline" => Provider::Offline,
            _ => Provider::OpenAI,
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        let timeout = match std::env::var("ORACLE_TIMEOUT_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "ORACLE_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", raw),
                    ));
                }
            },
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        match provider {
            Provider::OpenAI if openai_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                ));
            }
            Provider::Gemini if gemini_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            timeout,
            prompts_path,
        })
    }

    /// A configuration that needs no keys and never touches the network.
    pub fn offline() -> Self {
        Self {
            provider: Provider::Offline,
            openai_api_key: None,
            gemini_api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            prompts_path: None,
        }
    }

    /// Embedded prompts, overridden by `prompts_path` when set.
    pub fn load_prompts(&self) -> anyhow::Result<PromptLibrary> {
        let library = PromptLibrary::default();
        match &self.prompts_path {
            Some(dir) => library
                .with_overrides_from(dir)
                .with_context(|| format!("Failed to load prompts from {}", dir.display())),
            None => Ok(library),
        }
    }
}

/// Builds the oracle selected by `config`.
pub fn build_oracle(config: &OracleConfig) -> Result<Arc<dyn Oracle>, ConfigError> {
    let (api_key, api_base) = match config.provider {
        Provider::Offline => {
            info!("Using offline oracle.");
            return Ok(Arc::new(OfflineOracle));
        }
        Provider::OpenAI => {
            info!("Using OpenAI provider.");
            let key = config.openai_api_key.as_ref().ok_or_else(|| {
                ConfigError::MissingVar("OPENAI_API_KEY".to_string())
            })?;
            (key, OPENAI_API_BASE)
        }
        Provider::Gemini => {
            info!("Using Gemini provider.");
            let key = config.gemini_api_key.as_ref().ok_or_else(|| {
                ConfigError::MissingVar("GEMINI_API_KEY".to_string())
            })?;
            (key, GEMINI_API_BASE)
        }
    };

    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(api_base);
    Ok(Arc::new(OpenAICompatibleOracle::new(
        openai_config,
        config.chat_model.clone(),
        config.timeout,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("CLASSROOM_PROVIDER");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("ORACLE_TIMEOUT_SECS");
            env::remove_var("PROMPTS_PATH");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal_openai() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let config = OracleConfig::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.openai_api_key, Some("test-openai-key".to_string()));
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.prompts_path, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("CLASSROOM_PROVIDER", "Gemini");
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
            env::set_var("CHAT_MODEL", "gemini-2.0-flash");
            env::set_var("ORACLE_TIMEOUT_SECS", "15");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
        }

        let config = OracleConfig::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.chat_model, "gemini-2.0-flash");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.prompts_path, Some(PathBuf::from("/custom/prompts")));
    }

    #[test]
    #[serial]
    fn test_config_offline_needs_no_keys() {
        clear_env_vars();
        unsafe {
            env::set_var("CLASSROOM_PROVIDER", "offline");
        }

        let config = OracleConfig::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::Offline);
        assert!(build_oracle(&config).is_ok());
    }

    #[test]
    #[serial]
    fn test_config_missing_keys() {
        clear_env_vars();
        let err = OracleConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(msg) if msg.contains("OPENAI_API_KEY")));

        unsafe {
            env::set_var("CLASSROOM_PROVIDER", "gemini");
            env::set_var("OPENAI_API_KEY", "wrong-provider-key");
        }
        let err = OracleConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(msg) if msg.contains("GEMINI_API_KEY")));
    }

    #[test]
    #[serial]
    fn test_config_invalid_timeout() {
        for bad in ["soon", "0", "-3"] {
            clear_env_vars();
            unsafe {
                env::set_var("OPENAI_API_KEY", "test-openai-key");
                env::set_var("ORACLE_TIMEOUT_SECS", bad);
            }

            let err = OracleConfig::from_env().unwrap_err();
            match err {
                ConfigError::InvalidValue(var, _) => assert_eq!(var, "ORACLE_TIMEOUT_SECS"),
                _ => panic!("Expected InvalidValue for ORACLE_TIMEOUT_SECS"),
            }
        }
    }

    #[test]
    fn test_build_oracle_requires_key() {
        let mut config = OracleConfig::offline();
        config.provider = Provider::OpenAI;
        assert!(build_oracle(&config).is_err());

        config.openai_api_key = Some("k".to_string());
        assert!(build_oracle(&config).is_ok());
    }

    #[test]
    fn test_missing_prompts_dir_is_an_error() {
        let mut config = OracleConfig::offline();
        assert!(config.load_prompts().is_ok());

        config.prompts_path = Some(PathBuf::from("/definitely/not/here"));
        assert!(config.load_prompts().is_err());
    }
}
