use std::env;
use std::fs;
use std::path::Path;

use instabids_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct ConfigSources {
    path: Option<String>,
    doc: Option<Value>,
}

impl ConfigSources {
    fn detect() -> Self {
        let path = resolve_config_path(None);
        let doc = load_config_file_doc(path.as_deref());
        Self { path: path.map(|path| path.display().to_string()), doc }
    }

    fn line(&self, key_path: &str, value: &str, env_keys: &[&str]) -> String {
        render_line(key_path, value, field_source(key_path, env_keys, self))
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let sources = ConfigSources::detect();
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(sources.line("database.url", &config.database.url, &["INSTABIDS_DATABASE_URL"]));
    lines.push(sources.line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        &["INSTABIDS_DATABASE_MAX_CONNECTIONS"],
    ));
    lines.push(sources.line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        &["INSTABIDS_DATABASE_TIMEOUT_SECS"],
    ));

    let llm_api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(sources.line(
        "llm.api_key",
        &llm_api_key,
        &["INSTABIDS_LLM_API_KEY", "GOOGLE_API_KEY"],
    ));
    lines.push(sources.line("llm.model", &config.llm.model, &["INSTABIDS_LLM_MODEL"]));
    lines.push(sources.line(
        "llm.vision_model",
        &config.llm.vision_model,
        &["INSTABIDS_LLM_VISION_MODEL"],
    ));
    lines.push(sources.line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        &["INSTABIDS_LLM_TIMEOUT_SECS"],
    ));

    lines.push(sources.line(
        "server.bind_address",
        &config.server.bind_address,
        &["INSTABIDS_SERVER_BIND_ADDRESS"],
    ));
    lines.push(sources.line(
        "server.port",
        &config.server.port.to_string(),
        &["INSTABIDS_SERVER_PORT"],
    ));
    lines.push(sources.line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        &["INSTABIDS_SERVER_GRACEFUL_SHUTDOWN_SECS"],
    ));
    lines.push(sources.line(
        "server.allowed_origins",
        &config.server.allowed_origins.join(","),
        &["INSTABIDS_SERVER_ALLOWED_ORIGINS"],
    ));

    lines.push(sources.line(
        "a2a.enabled",
        &config.a2a.enabled.to_string(),
        &["INSTABIDS_A2A_ENABLED"],
    ));
    lines.push(sources.line(
        "a2a.agent_url",
        config.a2a.agent_url.as_deref().unwrap_or("<unset>"),
        &["INSTABIDS_A2A_AGENT_URL"],
    ));
    let a2a_token = config
        .a2a
        .auth_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(sources.line("a2a.auth_token", &a2a_token, &["INSTABIDS_A2A_AUTH_TOKEN"]));
    lines.push(sources.line(
        "a2a.timeout_secs",
        &config.a2a.timeout_secs.to_string(),
        &["INSTABIDS_A2A_TIMEOUT_SECS"],
    ));

    lines.push(sources.line(
        "logging.level",
        &config.logging.level,
        &["INSTABIDS_LOGGING_LEVEL", "INSTABIDS_LOG_LEVEL"],
    ));
    lines.push(sources.line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        &["INSTABIDS_LOGGING_FORMAT", "INSTABIDS_LOG_FORMAT"],
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_keys: &[&str], sources: &ConfigSources) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = &sources.doc {
        if contains_path(doc, key_path) {
            let file_path = sources.path.as_deref().unwrap_or("config file");
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps at most the first four characters of a secret.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.char_indices().nth(4) {
        Some((cut, _)) if trimmed.len() > 8 => format!("{}***", &trimmed[..cut]),
        _ => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_token, render_line};

    #[test]
    fn redaction_keeps_only_a_short_prefix() {
        assert_eq!(redact_token("AIzaSyExampleKey123"), "AIza***");
        assert_eq!(redact_token("short"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
    }

    #[test]
    fn nested_key_lookup_follows_dotted_path() {
        let doc: Value = "[a2a]\nenabled = true\n".parse().expect("toml");
        assert!(contains_path(&doc, "a2a.enabled"));
        assert!(!contains_path(&doc, "a2a.agent_url"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn rendered_line_names_its_source() {
        assert_eq!(
            render_line("server.port", "8080", "default".to_string()),
            "- server.port = 8080 (source: default)"
        );
    }
}
