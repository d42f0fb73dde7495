use clap::Parser;
use std::time::Instant;
use wa_webhook::core::summary::export_summary;
use wa_webhook::utils::logger;

#[derive(Parser)]
#[command(name = "summary-export")]
#[command(about = "Export new/open/closed conversation counts to a CSV file")]
struct Args {
    /// Path to the SQLite database written by the webhook server
    #[arg(short, long, env = "DATABASE_PATH", default_value = "data/whatsapp_data.db")]
    database: String,

    /// Output CSV file
    #[arg(short, long, default_value = "conversation_summary.csv")]
    output: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("--- Exporting summary from '{}' ---", args.database);
    let started = Instant::now();

    match export_summary(&args.database, &args.output) {
        Ok(summary) => {
            println!("New Conversations (Total): {}", summary.new_conversations);
            println!("Open Conversations (Current): {}", summary.open_conversations);
            println!("Closed Conversations: {}", summary.closed_conversations);
            println!("✅ Summary exported to '{}'", args.output);
            tracing::info!(
                "--- Export finished in {:.2} seconds ---",
                started.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Export failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
