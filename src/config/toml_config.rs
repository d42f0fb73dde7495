use crate::config::{settings, DEFAULT_DATABASE_PATH, DEFAULT_HOST, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, WebhookError};
use crate::utils::logger::LogFormat;
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    pub verify_token: Option<String>,
    pub app_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub verbose: bool,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"))
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(WebhookError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| WebhookError::config(format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    fn resolved(value: Option<&str>) -> Option<&str> {
        // a placeholder left behind means the variable was not set
        value.filter(|v| !env_var_pattern().is_match(v))
    }
}

impl ConfigProvider for TomlConfig {
    fn host(&self) -> &str {
        &self.server.host
    }

    fn port(&self) -> u16 {
        self.server.port
    }

    fn database_path(&self) -> &str {
        &self.storage.database_path
    }

    fn verify_token(&self) -> Option<&str> {
        Self::resolved(self.whatsapp.verify_token.as_deref())
    }

    fn app_secret(&self) -> Option<&str> {
        Self::resolved(self.whatsapp.app_secret.as_deref())
    }

    fn max_body_bytes(&self) -> usize {
        self.server.max_body_bytes
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        settings::validate_provider(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8080
max_body_bytes = 2048

[whatsapp]
verify_token = "zas"
app_secret = "abc123"

[storage]
database_path = "/data/whatsapp_data.db"

[logging]
format = "json"
verbose = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.max_body_bytes(), 2048);
        assert_eq!(config.database_path(), "/data/whatsapp_data.db");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.logging.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config = TomlConfig::from_toml_str(
            r#"
[whatsapp]
verify_token = "zas"
app_secret = "abc123"
"#,
        )
        .unwrap();

        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.database_path(), DEFAULT_DATABASE_PATH);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("WA_TEST_SUBST_SECRET", "from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[whatsapp]
verify_token = "zas"
app_secret = "${WA_TEST_SUBST_SECRET}"
"#,
        )
        .unwrap();
        assert_eq!(config.app_secret(), Some("from-env"));

        std::env::remove_var("WA_TEST_SUBST_SECRET");
    }

    #[test]
    fn test_unset_placeholder_counts_as_missing() {
        let config = TomlConfig::from_toml_str(
            r#"
[whatsapp]
verify_token = "${WA_TEST_DEFINITELY_UNSET_TOKEN}"
app_secret = "abc123"
"#,
        )
        .unwrap();

        assert_eq!(config.verify_token(), None);
        assert!(matches!(
            config.validate(),
            Err(WebhookError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            TomlConfig::from_toml_str("[server\nport = 1"),
            Err(WebhookError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 5050\n[whatsapp]\nverify_token = \"t\"\napp_secret = \"s\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.port(), 5050);
    }
}
