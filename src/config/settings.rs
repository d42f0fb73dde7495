use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_port, validate_range,
    validate_required_field, validate_secret, Validate,
};
use std::fmt;
use std::path::PathBuf;

const MIN_BODY_BYTES: usize = 1024;
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub(crate) fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_non_empty_string("server.host", config.host())?;
    validate_port("server.port", config.port())?;
    validate_path("storage.database_path", config.database_path())?;
    validate_range(
        "server.max_body_bytes",
        config.max_body_bytes(),
        MIN_BODY_BYTES,
        MAX_BODY_BYTES,
    )?;

    let token = validate_required_field("whatsapp.verify_token", config.verify_token())?;
    validate_secret("whatsapp.verify_token", token)?;
    let secret = validate_required_field("whatsapp.app_secret", config.app_secret())?;
    validate_secret("whatsapp.app_secret", secret)?;

    Ok(())
}

/// Validated runtime settings, independent of where they came from.
#[derive(Clone)]
pub struct ServiceSettings {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub verify_token: String,
    pub app_secret: String,
    pub max_body_bytes: usize,
}

impl ServiceSettings {
    /// Validates `config` and copies out the resolved values.
    pub fn from_provider<C: ConfigProvider + Validate + ?Sized>(config: &C) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            host: config.host().to_string(),
            port: config.port(),
            database_path: PathBuf::from(config.database_path()),
            verify_token: config.verify_token().unwrap_or_default().to_string(),
            app_secret: config.app_secret().unwrap_or_default().to_string(),
            max_body_bytes: config.max_body_bytes(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("verify_token", &"<redacted>")
            .field("app_secret", &"<redacted>")
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}
