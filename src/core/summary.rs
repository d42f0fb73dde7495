use crate::adapters::storage::SqliteStore;
use crate::core::ConversationStore;
use crate::domain::model::ConversationSummary;
use crate::utils::error::Result;
use std::fs;
use std::io::Write;
use std::path::Path;

pub const SUMMARY_HEADER: [&str; 2] = ["Metric", "Value"];

/// Writes the summary as a two-column metric/value CSV.
pub fn write_summary_csv<W: Write>(summary: &ConversationSummary, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(SUMMARY_HEADER)?;
    for (metric, value) in [
        ("New Conversations (Total)", summary.new_conversations),
        ("Open Conversations (Current)", summary.open_conversations),
        ("Closed Conversations", summary.closed_conversations),
    ] {
        csv_writer.write_record([metric.to_string(), value.to_string()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Reads the counts from an existing database and writes them to `csv_path`.
/// The database is opened read-only and never created.
pub fn export_summary<P: AsRef<Path>, Q: AsRef<Path>>(
    db_path: P,
    csv_path: Q,
) -> Result<ConversationSummary> {
    let store = SqliteStore::open_read_only(db_path)?;
    let summary = store.summary()?;

    tracing::info!(
        new = summary.new_conversations,
        open = summary.open_conversations,
        closed = summary.closed_conversations,
        "Conversation summary computed"
    );

    write_summary_file(&summary, csv_path)?;
    Ok(summary)
}

pub fn write_summary_file<P: AsRef<Path>>(summary: &ConversationSummary, csv_path: P) -> Result<()> {
    let csv_path = csv_path.as_ref();
    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(csv_path)?;
    write_summary_csv(summary, file)?;

    tracing::info!("Summary written to {}", csv_path.display());
    Ok(())
}
