use clap::Parser;
use wa_webhook::core::server::shutdown_signal;
use wa_webhook::utils::logger;
use wa_webhook::{CliConfig, ServiceSettings, SqliteStore, TomlConfig, WebhookError, WebhookServer};

fn fail(e: WebhookError) -> ! {
    tracing::error!(
        "❌ Startup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; in the container compose injects the same variables
    let _ = dotenvy::dotenv();
    let cli = CliConfig::parse();

    let toml_config = match cli.config.as_deref() {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => None,
    };

    match &toml_config {
        Some(config) => logger::init_logger(config.logging.format, config.logging.verbose || cli.verbose),
        None => logger::init_logger(cli.log_format, cli.verbose),
    }

    tracing::info!("Starting wa-webhook {}", env!("CARGO_PKG_VERSION"));

    let settings = match &toml_config {
        Some(config) => {
            tracing::info!("📁 Configuration loaded from {}", cli.config.as_deref().unwrap_or_default());
            ServiceSettings::from_provider(config)
        }
        None => ServiceSettings::from_provider(&cli),
    }
    .unwrap_or_else(|e| fail(e));

    tracing::debug!(?settings, "Resolved settings");

    let store = SqliteStore::open(&settings.database_path).unwrap_or_else(|e| fail(e));
    tracing::info!("📁 Conversation database: {}", settings.database_path.display());

    let server = WebhookServer::bind(&settings, store)
        .await
        .unwrap_or_else(|e| fail(e));

    server.run(shutdown_signal()).await?;
    Ok(())
}
