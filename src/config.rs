//! Configuration parsing and validation for wolf.
//!
//! Configuration is read once at startup and never mutated. It comes from
//! built-in defaults, an optional TOML file, and the `PORT` / `GROQ_API_KEY`
//! environment variables, in increasing order of precedence.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "PORT";
/// Environment variable holding the upstream bearer credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// The `host:port` string handed to the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream completion API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Full URL of the chat completions endpoint
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Bearer credential; may contain `${VAR}` references in the TOML file
    pub api_key: Option<ApiKey>,
    /// Model used when the caller does not name one
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Temperature used when the caller does not send one
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Token limit used when the caller does not send one
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u64,
}

fn default_upstream_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f64 {
    0.8
}

fn default_max_tokens() -> u64 {
    150
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            api_key: None,
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
        }
    }
}

impl UpstreamConfig {
    /// Value for the outbound `Authorization` header.
    ///
    /// A missing credential yields `"Bearer "`; the provider rejects the call
    /// and its error payload is relayed to the caller.
    pub fn bearer(&self) -> String {
        let token = self.api_key.as_ref().map(ApiKey::expose_secret).unwrap_or("");
        format!("Bearer {}", token)
    }
}

/// Static site configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// HTML file served at `GET /`
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

fn default_index_path() -> PathBuf {
    PathBuf::from("index.html")
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
        }
    }
}

/// API key wrapper that redacts in Debug/Display/Serialize and zeroizes on drop.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Access the raw key value. Every call site is auditable via `grep expose_secret`.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for ApiKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| ApiKey(SecretString::from(s)))
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(SecretString::from(s))
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(SecretString::from(s))
    }
}

/// How the upstream API key was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    /// Key was a literal string in the config file
    Literal,
    /// Key contained ${VAR} references expanded from environment
    EnvExpanded,
    /// Key was read from an environment variable (holds var name)
    Environment(String),
    /// No key available
    None,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Literal => write!(f, "config-literal"),
            KeySource::EnvExpanded => write!(f, "env-expanded"),
            KeySource::Environment(var) => write!(f, "environment ({})", var),
            KeySource::None => write!(f, "none"),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable '{var}': {message}")]
    EnvVar { var: String, message: String },
}

/// Expand all `${VAR}` references in a string using a custom lookup function.
///
/// Fails on first missing variable, unclosed `${`, or empty variable name.
fn expand_env_vars_with<F>(input: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains("${") {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = after.find('}').ok_or_else(|| ConfigError::EnvVar {
            var: "<unclosed>".to_string(),
            message: "Unclosed '${' in upstream.api_key".to_string(),
        })?;

        let var_name = &after[..end];
        if var_name.is_empty() {
            return Err(ConfigError::EnvVar {
                var: "".to_string(),
                message: "Empty variable name in '${}' reference".to_string(),
            });
        }

        let value = lookup(var_name).ok_or_else(|| ConfigError::EnvVar {
            var: var_name.to_string(),
            message: "not set (referenced in upstream.api_key)".to_string(),
        })?;

        result.push_str(&value);
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

impl Config {
    /// Parse configuration from a TOML string.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus process environment.
    pub fn from_env() -> Result<(Self, KeySource), ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Defaults plus the environment seen through `lookup`.
    pub fn from_env_with<F>(lookup: F) -> Result<(Self, KeySource), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Config::default().resolve_with(lookup)
    }

    /// Load a TOML file, expand `${VAR}` references and apply environment overrides.
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<(Self, KeySource), ConfigError> {
        let content = read_config_file(path.as_ref())?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve the credential and environment overrides, then validate.
    ///
    /// - `api_key` containing `${VAR}`: expanded through `lookup`, source = `EnvExpanded`
    /// - `api_key` literal: kept, source = `Literal`
    /// - `GROQ_API_KEY` set: overrides either of the above, source = `Environment`
    /// - `PORT` set: overrides `server.port`
    pub fn resolve_with<F>(mut self, lookup: F) -> Result<(Self, KeySource), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut source = KeySource::None;

        if let Some(raw_key) = self.upstream.api_key.take() {
            let raw_key = raw_key.expose_secret();
            if raw_key.contains("${") {
                let expanded = expand_env_vars_with(raw_key, &lookup)?;
                self.upstream.api_key = Some(ApiKey::from(expanded));
                source = KeySource::EnvExpanded;
            } else {
                self.upstream.api_key = Some(ApiKey::from(raw_key));
                source = KeySource::Literal;
            }
        }

        if let Some(key) = lookup(API_KEY_ENV) {
            self.upstream.api_key = Some(ApiKey::from(key));
            source = KeySource::Environment(API_KEY_ENV.to_string());
        }

        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("{} must be a port number, got '{}'", PORT_ENV, port))
            })?;
        }

        self.validate()?;
        Ok((self, source))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.url.is_empty() {
            return Err(ConfigError::Validation("upstream.url is empty".to_string()));
        }

        let url = reqwest::Url::parse(&self.upstream.url).map_err(|e| {
            ConfigError::Validation(format!("upstream.url '{}' is invalid: {}", self.upstream.url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "upstream.url must be http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::parse_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.upstream.url,
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(config.upstream.default_model, "llama-3.3-70b-versatile");
        assert_eq!(config.upstream.default_temperature, 0.8);
        assert_eq!(config.upstream.default_max_tokens, 150);
        assert!(config.upstream.api_key.is_none());
        assert_eq!(config.site.index_path, PathBuf::from("index.html"));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [upstream]
            url = "http://localhost:9999/v1/chat/completions"
            api_key = "literal-key"
            default_model = "mixtral-8x7b"
            default_temperature = 0.2
            default_max_tokens = 512

            [site]
            index_path = "public/index.html"
        "#;

        let config = Config::parse_str(toml).unwrap();
        assert_eq!(config.server.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.upstream.default_model, "mixtral-8x7b");
        assert_eq!(config.upstream.default_temperature, 0.2);
        assert_eq!(config.upstream.default_max_tokens, 512);
        assert_eq!(config.site.index_path, PathBuf::from("public/index.html"));
        assert_eq!(
            config.upstream.api_key.as_ref().unwrap().expose_secret(),
            "literal-key"
        );
    }

    #[test]
    fn test_invalid_upstream_url_rejected() {
        let err = Config::parse_str("[upstream]\nurl = \"not a url\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = Config::parse_str("[upstream]\nurl = \"ftp://example.com/x\"").unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_from_env_defaults_without_variables() {
        let (config, source) = Config::from_env_with(env(&[])).unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.upstream.api_key.is_none());
        assert_eq!(source, KeySource::None);
        assert_eq!(config.upstream.bearer(), "Bearer ");
    }

    #[test]
    fn test_from_env_reads_port_and_key() {
        let (config, source) =
            Config::from_env_with(env(&[("PORT", "4100"), ("GROQ_API_KEY", "gsk_test")])).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.upstream.bearer(), "Bearer gsk_test");
        assert_eq!(source, KeySource::Environment("GROQ_API_KEY".to_string()));
    }

    #[test]
    fn test_non_numeric_port_fails() {
        let err = Config::from_env_with(env(&[("PORT", "abc")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_literal_key_source() {
        let config = Config::parse_str("[upstream]\napi_key = \"from-file\"").unwrap();
        let (config, source) = config.resolve_with(env(&[])).unwrap();
        assert_eq!(source, KeySource::Literal);
        assert_eq!(config.upstream.bearer(), "Bearer from-file");
    }

    #[test]
    fn test_env_expanded_key_source() {
        let config = Config::parse_str("[upstream]\napi_key = \"gsk_${SUFFIX}\"").unwrap();
        let (config, source) = config.resolve_with(env(&[("SUFFIX", "abc")])).unwrap();
        assert_eq!(source, KeySource::EnvExpanded);
        assert_eq!(config.upstream.bearer(), "Bearer gsk_abc");
    }

    #[test]
    fn test_environment_overrides_file_key() {
        let config = Config::parse_str("[upstream]\napi_key = \"from-file\"").unwrap();
        let (config, source) = config
            .resolve_with(env(&[("GROQ_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(source, KeySource::Environment("GROQ_API_KEY".to_string()));
        assert_eq!(config.upstream.bearer(), "Bearer from-env");
    }

    #[test]
    fn test_missing_expansion_var_fails() {
        let config = Config::parse_str("[upstream]\napi_key = \"${NOPE}\"").unwrap();
        let err = config.resolve_with(env(&[])).unwrap_err();
        match err {
            ConfigError::EnvVar { var, .. } => assert_eq!(var, "NOPE"),
            other => panic!("Expected EnvVar error, got: {:?}", other),
        }
    }

    #[test]
    fn test_expand_multiple_vars() {
        let result = expand_env_vars_with("${A}-${B}", env(&[("A", "x"), ("B", "y")])).unwrap();
        assert_eq!(result, "x-y");
    }

    #[test]
    fn test_expand_unclosed_brace_fails() {
        let err = expand_env_vars_with("${OPEN", env(&[])).unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn test_expand_empty_var_name_fails() {
        let err = expand_env_vars_with("key-${}", env(&[])).unwrap_err();
        assert!(err.to_string().contains("Empty variable name"));
    }

    #[test]
    fn test_expand_dollar_without_brace_passthrough() {
        let result = expand_env_vars_with("cost$5", env(&[])).unwrap();
        assert_eq!(result, "cost$5");
    }

    #[test]
    fn test_api_key_redaction() {
        let key = ApiKey::from("gsk_super_secret");
        assert_eq!(format!("{:?}", key), "[REDACTED]");
        assert_eq!(format!("{}", key), "[REDACTED]");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"[REDACTED]\"");
        assert_eq!(key.expose_secret(), "gsk_super_secret");
    }

    #[test]
    fn test_config_debug_never_leaks_key() {
        let (config, _) = Config::from_env_with(env(&[("GROQ_API_KEY", "gsk_leak")])).unwrap();
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("gsk_leak"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = Config::from_file_with_env("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_key_source_display() {
        assert_eq!(KeySource::Literal.to_string(), "config-literal");
        assert_eq!(
            KeySource::Environment("GROQ_API_KEY".to_string()).to_string(),
            "environment (GROQ_API_KEY)"
        );
        assert_eq!(KeySource::None.to_string(), "none");
    }
}
