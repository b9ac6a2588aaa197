use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use tia_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let file = (config_file_doc.as_ref(), config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(entry("database.url", &config.database.url, "TIA_DATABASE_URL", file));
    lines.push(entry(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        "TIA_DATABASE_MAX_CONNECTIONS",
        file,
    ));
    lines.push(entry(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        "TIA_DATABASE_TIMEOUT_SECS",
        file,
    ));

    lines.push(entry(
        "whatsapp.access_token",
        &redact_secret(config.whatsapp.access_token.expose_secret()),
        "TIA_WHATSAPP_ACCESS_TOKEN",
        file,
    ));
    lines.push(entry(
        "whatsapp.verify_token",
        &redact_secret(config.whatsapp.verify_token.expose_secret()),
        "TIA_WHATSAPP_VERIFY_TOKEN",
        file,
    ));
    lines.push(entry(
        "whatsapp.phone_number_id",
        value_or_unset(&config.whatsapp.phone_number_id),
        "TIA_WHATSAPP_PHONE_NUMBER_ID",
        file,
    ));
    lines.push(entry(
        "whatsapp.api_version",
        &config.whatsapp.api_version,
        "TIA_WHATSAPP_API_VERSION",
        file,
    ));

    lines.push(entry("llm.base_url", &config.llm.base_url, "TIA_LLM_BASE_URL", file));
    lines.push(entry("llm.model", &config.llm.model, "TIA_LLM_MODEL", file));
    let api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(entry("llm.api_key", api_key, "TIA_LLM_API_KEY", file));

    lines.push(entry(
        "advisor.recommendation_limit",
        &config.advisor.recommendation_limit.to_string(),
        "TIA_ADVISOR_RECOMMENDATION_LIMIT",
        file,
    ));
    lines.push(entry(
        "advisor.history_window",
        &config.advisor.history_window.to_string(),
        "TIA_ADVISOR_HISTORY_WINDOW",
        file,
    ));

    lines.push(entry(
        "server.bind_address",
        &config.server.bind_address,
        "TIA_SERVER_BIND_ADDRESS",
        file,
    ));
    lines.push(entry("server.port", &config.server.port.to_string(), "TIA_SERVER_PORT", file));

    lines.push(entry("logging.level", &config.logging.level, "TIA_LOG_LEVEL", file));
    lines.push(entry(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        "TIA_LOG_FORMAT",
        file,
    ));

    lines.join("\n")
}

fn entry(
    key: &str,
    value: &str,
    env_var: &str,
    file: (Option<&Value>, Option<&Path>),
) -> String {
    let source = field_source(key, env_var, file.0, file.1);
    format!("  {key} = {value}  ({source})")
}

fn field_source(
    key: &str,
    env_var: &str,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if env::var(env_var).is_ok() {
        return format!("env:{env_var}");
    }
    if let (Some(doc), Some(path)) = (file_doc, file_path) {
        if file_has_key(doc, key) {
            return format!("file:{}", path.display());
        }
    }
    "default".to_string()
}

fn file_has_key(doc: &Value, dotted_key: &str) -> bool {
    let mut current = doc;
    for part in dotted_key.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("tia.toml"), PathBuf::from("config/tia.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn value_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "<unset>"
    } else {
        value
    }
}

fn redact_secret(value: &str) -> String {
    if value.is_empty() {
        "<unset>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
