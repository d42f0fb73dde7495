pub mod settings;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::logger::LogFormat;
use crate::utils::validation::Validate;
use crate::utils::error::Result;
use clap::Parser;

pub use settings::ServiceSettings;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_PATH: &str = "data/whatsapp_data.db";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "wa-webhook")]
#[command(about = "WhatsApp Business webhook receiver that tracks new conversations")]
pub struct CliConfig {
    /// Optional TOML configuration file; when given it replaces the flags below
    #[arg(short, long, env = "WEBHOOK_CONFIG")]
    pub config: Option<String>,

    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    pub database_path: String,

    #[arg(long, env = "WHATSAPP_VERIFY_TOKEN", hide_env_values = true)]
    pub verify_token: Option<String>,

    #[arg(long, env = "WHATSAPP_APP_SECRET", hide_env_values = true)]
    pub app_secret: Option<String>,

    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn database_path(&self) -> &str {
        &self.database_path
    }

    fn verify_token(&self) -> Option<&str> {
        self.verify_token.as_deref()
    }

    fn app_secret(&self) -> Option<&str> {
        self.app_secret.as_deref()
    }

    fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        settings::validate_provider(self)
    }
}
