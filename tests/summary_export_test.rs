use tempfile::TempDir;
use wa_webhook::core::summary::export_summary;
use wa_webhook::core::ConversationStore;
use wa_webhook::{SqliteStore, WebhookError};

#[test]
fn test_export_summary_from_database_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("data").join("whatsapp_data.db");
    let csv_path = temp_dir.path().join("reports").join("conversation_summary.csv");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        for sender in ["5511000000001", "5511000000002", "5511000000003"] {
            store.record_message(sender, 1_700_000_000).unwrap();
        }
        store.close_conversation("5511000000001").unwrap();
        store.close_conversation("5511000000002").unwrap();
        store.record_message("5511000000002", 1_700_000_500).unwrap();
    }

    let summary = export_summary(&db_path, &csv_path).unwrap();

    assert_eq!(summary.new_conversations, 4);
    assert_eq!(summary.open_conversations, 2);
    assert_eq!(summary.closed_conversations, 1);

    let content = std::fs::read_to_string(&csv_path).unwrap();
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["Metric", "Value"]);

    let rows: Vec<(String, i64)> = reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].parse().unwrap())
        })
        .collect();

    assert_eq!(
        rows,
        vec![
            ("New Conversations (Total)".to_string(), 4),
            ("Open Conversations (Current)".to_string(), 2),
            ("Closed Conversations".to_string(), 1),
        ]
    );
}

#[test]
fn test_export_requires_existing_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("whatsapp_data.db");
    let csv_path = temp_dir.path().join("conversation_summary.csv");

    let result = export_summary(&db_path, &csv_path);

    assert!(matches!(result, Err(WebhookError::NotFound { .. })));
    assert!(!db_path.exists());
    assert!(!csv_path.exists());
}

#[test]
fn test_export_of_fresh_database_is_all_zero() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("whatsapp_data.db");
    let csv_path = temp_dir.path().join("conversation_summary.csv");
    drop(SqliteStore::open(&db_path).unwrap());

    export_summary(&db_path, &csv_path).unwrap();

    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert!(content.contains("New Conversations (Total),0"));
    assert!(content.contains("Closed Conversations,0"));
}

#[test]
fn test_export_does_not_modify_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("whatsapp_data.db");
    let csv_path = temp_dir.path().join("conversation_summary.csv");

    // Bare schema as the first release wrote it, without a migration ledger
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE conversations (sender_id TEXT PRIMARY KEY, status TEXT NOT NULL, last_update INTEGER NOT NULL);
             CREATE TABLE counters (counter_name TEXT PRIMARY KEY, value INTEGER NOT NULL);
             INSERT INTO conversations VALUES ('a', 'open', 10), ('b', 'closed', 20);
             INSERT INTO counters VALUES ('new_conversation_count', 3);",
        )
        .unwrap();
    }

    let summary = export_summary(&db_path, &csv_path).unwrap();
    assert_eq!(
        (summary.new_conversations, summary.open_conversations, summary.closed_conversations),
        (3, 1, 1)
    );

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let ledger_tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'schema_migrations'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(ledger_tables, 0);
    let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)).unwrap();
    assert_ne!(journal_mode.to_lowercase(), "wal");
}
