use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Effective configuration for every TIA binary.
///
/// Precedence, lowest to highest: built-in defaults, `tia.toml` (or
/// `config/tia.toml`) with `${ENV}` interpolation, `TIA_*` environment
/// overrides, programmatic overrides.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub whatsapp: WhatsAppConfig,
    pub llm: LlmConfig,
    pub advisor: AdvisorConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub access_token: SecretString,
    pub verify_token: SecretString,
    pub phone_number_id: String,
    pub api_version: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    /// How many ranked rows a recommendation returns. Tuned for a narrow
    /// chat display, hence the small default.
    pub recommendation_limit: usize,
    /// How many recent messages each session keeps for the prompt.
    pub history_window: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub recommendation_limit: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://tia.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            whatsapp: WhatsAppConfig {
                access_token: String::new().into(),
                verify_token: String::new().into(),
                phone_number_id: String::new(),
                api_version: "v21.0".to_string(),
            },
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 60,
                temperature: 0.3,
            },
            advisor: AdvisorConfig { recommendation_limit: 2, history_window: 5 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tia.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(whatsapp) = patch.whatsapp {
            if let Some(token) = whatsapp.access_token {
                self.whatsapp.access_token = token.into();
            }
            if let Some(token) = whatsapp.verify_token {
                self.whatsapp.verify_token = token.into();
            }
            if let Some(phone_number_id) = whatsapp.phone_number_id {
                self.whatsapp.phone_number_id = phone_number_id;
            }
            if let Some(api_version) = whatsapp.api_version {
                self.whatsapp.api_version = api_version;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(api_key.into());
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
        }

        if let Some(advisor) = patch.advisor {
            if let Some(limit) = advisor.recommendation_limit {
                self.advisor.recommendation_limit = limit;
            }
            if let Some(window) = advisor.history_window {
                self.advisor.history_window = window;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TIA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("TIA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("TIA_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("TIA_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("TIA_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TIA_WHATSAPP_ACCESS_TOKEN") {
            self.whatsapp.access_token = value.into();
        }
        if let Some(value) = read_env("TIA_WHATSAPP_VERIFY_TOKEN") {
            self.whatsapp.verify_token = value.into();
        }
        if let Some(value) = read_env("TIA_WHATSAPP_PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = value;
        }
        if let Some(value) = read_env("TIA_WHATSAPP_API_VERSION") {
            self.whatsapp.api_version = value;
        }

        if let Some(value) = read_env("TIA_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("TIA_LLM_API_KEY") {
            self.llm.api_key = Some(value.into());
        }
        if let Some(value) = read_env("TIA_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("TIA_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("TIA_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TIA_ADVISOR_RECOMMENDATION_LIMIT") {
            self.advisor.recommendation_limit =
                parse_usize("TIA_ADVISOR_RECOMMENDATION_LIMIT", &value)?;
        }
        if let Some(value) = read_env("TIA_ADVISOR_HISTORY_WINDOW") {
            self.advisor.history_window = parse_usize("TIA_ADVISOR_HISTORY_WINDOW", &value)?;
        }

        if let Some(value) = read_env("TIA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TIA_SERVER_PORT") {
            self.server.port = parse_u16("TIA_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("TIA_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("TIA_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(limit) = overrides.recommendation_limit {
            self.advisor.recommendation_limit = limit;
        }
    }

    /// Offline validation: everything the CLI needs. Transport credentials
    /// are checked separately by [`AppConfig::validate_transport`] so `tia
    /// recommend` and `tia seed` work without WhatsApp secrets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        let sqlite_url =
            url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
        if !sqlite_url {
            return Err(ConfigError::Validation(
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                    .to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if self.database.timeout_secs == 0 || self.database.timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "database.timeout_secs must be in range 1..=300".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 || self.llm.timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be in range 1..=300".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(
                "llm.temperature must be in range 0.0..=2.0".to_string(),
            ));
        }

        if self.advisor.recommendation_limit == 0 {
            return Err(ConfigError::Validation(
                "advisor.recommendation_limit must be greater than zero".to_string(),
            ));
        }
        if self.advisor.history_window == 0 {
            return Err(ConfigError::Validation(
                "advisor.history_window must be greater than zero".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be greater than zero".to_string(),
            ));
        }
        if self.server.graceful_shutdown_secs == 0 {
            return Err(ConfigError::Validation(
                "server.graceful_shutdown_secs must be greater than zero".to_string(),
            ));
        }

        let level = self.logging.level.trim().to_ascii_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Validation(
                    "logging.level must be one of trace|debug|info|warn|error".to_string(),
                ))
            }
        }

        Ok(())
    }

    /// Additional checks for binaries that talk to WhatsApp and the LLM.
    pub fn validate_transport(&self) -> Result<(), ConfigError> {
        if self.whatsapp.access_token.expose_secret().is_empty() {
            return Err(ConfigError::Validation(
                "whatsapp.access_token is required. Get it from Meta Business > WhatsApp > API Setup"
                    .to_string(),
            ));
        }
        if self.whatsapp.verify_token.expose_secret().is_empty() {
            return Err(ConfigError::Validation(
                "whatsapp.verify_token is required; it must match the token configured on the webhook"
                    .to_string(),
            ));
        }
        if self.whatsapp.phone_number_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "whatsapp.phone_number_id is required".to_string(),
            ));
        }

        let api_key_missing = self
            .llm
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if api_key_missing {
            return Err(ConfigError::Validation("llm.api_key is required".to_string()));
        }

        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tia.toml"), PathBuf::from("config/tia.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    whatsapp: Option<WhatsAppPatch>,
    llm: Option<LlmPatch>,
    advisor: Option<AdvisorPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsAppPatch {
    access_token: Option<String>,
    verify_token: Option<String>,
    phone_number_id: Option<String>,
    api_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct AdvisorPatch {
    recommendation_limit: Option<usize>,
    history_window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn defaults_validate_offline() {
        let _guard = env_lock().lock().expect("env lock");
        let config = AppConfig::load(LoadOptions::default()).expect("load defaults");
        assert_eq!(config.advisor.recommendation_limit, 2);
        assert_eq!(config.advisor.history_window, 5);
        assert!(matches!(config.logging.format, LogFormat::Compact));
        // But the transport credentials are absent until configured.
        assert!(config.validate_transport().is_err());
    }

    #[test]
    fn file_load_supports_env_interpolation() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("TEST_TIA_WA_TOKEN", "wa-token-from-env");

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("tia.toml");
        fs::write(
            &path,
            r#"
[whatsapp]
access_token = "${TEST_TIA_WA_TOKEN}"

[advisor]
recommendation_limit = 3
"#,
        )
        .expect("write config");

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .expect("load config");

        assert_eq!(config.whatsapp.access_token.expose_secret(), "wa-token-from-env");
        assert_eq!(config.advisor.recommendation_limit, 3);

        clear_vars(&["TEST_TIA_WA_TOKEN"]);
    }

    #[test]
    fn precedence_is_defaults_file_env_overrides() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("TIA_DATABASE_URL", "sqlite://from-env.db");

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("tia.toml");
        fs::write(
            &path,
            r#"
[database]
url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            overrides: ConfigOverrides {
                log_level: Some("debug".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load config");

        assert_eq!(config.database.url, "sqlite://from-env.db");
        assert_eq!(config.logging.level, "debug");

        clear_vars(&["TIA_DATABASE_URL"]);
    }

    #[test]
    fn zero_recommendation_limit_fails_validation() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("TIA_ADVISOR_RECOMMENDATION_LIMIT", "0");

        let error = AppConfig::load(LoadOptions::default()).expect_err("should fail");
        assert!(matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("recommendation_limit")
        ));

        clear_vars(&["TIA_ADVISOR_RECOMMENDATION_LIMIT"]);
    }

    #[test]
    fn non_sqlite_database_url_is_rejected() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("TIA_DATABASE_URL", "postgres://nope");

        let error = AppConfig::load(LoadOptions::default()).expect_err("should fail");
        assert!(matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("database.url")
        ));

        clear_vars(&["TIA_DATABASE_URL"]);
    }

    #[test]
    fn secrets_are_not_leaked_by_debug() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("TIA_WHATSAPP_ACCESS_TOKEN", "wa-secret-value");

        let config = AppConfig::load(LoadOptions::default()).expect("load config");
        let debug = format!("{config:?}");
        assert!(!debug.contains("wa-secret-value"));

        clear_vars(&["TIA_WHATSAPP_ACCESS_TOKEN"]);
    }
}
