//! SQLite-backed [`ConversationStore`].

use crate::core::ConversationStore;
use crate::domain::model::{
    ConversationRecord, ConversationStatus, ConversationSummary, MessageOutcome,
};
use crate::utils::error::{Result, WebhookError};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

pub const NEW_CONVERSATION_COUNTER: &str = "new_conversation_count";

const BUSY_TIMEOUT: Duration = Duration::from_millis(3000);

const MIGRATIONS: &[(&str, &str)] = &[("001_init", include_str!("../../migrations/001_init.sql"))];

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and its directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        tracing::debug!("Opened conversation database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Opens an existing database for reading only. Nothing is created,
    /// migrated or switched to WAL.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(WebhookError::NotFound {
                what: format!("Database file '{}'", path.display()),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        tracing::debug!("Opened conversation database read-only at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &mut Connection) -> Result<()> {
        let tx = conn.transaction()?;
        tx.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version TEXT PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
            [],
        )?;

        for (version, sql) in MIGRATIONS {
            let applied = tx
                .query_row(
                    "SELECT 1 FROM schema_migrations WHERE version = ?1",
                    [version],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if applied {
                continue;
            }

            tx.execute_batch(sql)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                (version, Utc::now().timestamp()),
            )?;
            tracing::info!(version, "Applied database migration");
        }

        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| WebhookError::LockPoisoned)
    }
}

fn status_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<ConversationStatus> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

impl ConversationStore for SqliteStore {
    fn record_message(&self, sender_id: &str, timestamp: i64) -> Result<MessageOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let current = tx
            .query_row(
                "SELECT status FROM conversations WHERE sender_id = ?1",
                [sender_id],
                |row| status_column(row, 0),
            )
            .optional()?;

        let outcome = match current {
            None => MessageOutcome::FirstContact,
            Some(ConversationStatus::Closed) => MessageOutcome::Reopened,
            Some(ConversationStatus::Open) => MessageOutcome::Continued,
        };

        if outcome.is_new_conversation() {
            tx.execute(
                "INSERT INTO conversations (sender_id, status, last_update) VALUES (?1, 'open', ?2)
                 ON CONFLICT (sender_id) DO UPDATE SET status = 'open', last_update = excluded.last_update",
                (sender_id, timestamp),
            )?;
            tx.execute(
                "INSERT INTO counters (counter_name, value) VALUES (?1, 1)
                 ON CONFLICT (counter_name) DO UPDATE SET value = value + 1",
                [NEW_CONVERSATION_COUNTER],
            )?;
        } else {
            tx.execute(
                "UPDATE conversations SET last_update = ?2 WHERE sender_id = ?1",
                (sender_id, timestamp),
            )?;
        }

        tx.commit()?;
        Ok(outcome)
    }

    fn close_conversation(&self, sender_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE conversations SET status = 'closed' WHERE sender_id = ?1",
            [sender_id],
        )?;
        Ok(changed > 0)
    }

    fn new_conversation_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM counters WHERE counter_name = ?1",
                [NEW_CONVERSATION_COUNTER],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }

    fn conversations(&self) -> Result<BTreeMap<String, ConversationRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT sender_id, status, last_update FROM conversations ORDER BY sender_id",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = BTreeMap::new();
        while let Some(row) = rows.next()? {
            out.insert(
                row.get(0)?,
                ConversationRecord {
                    status: status_column(row, 1)?,
                    last_update: row.get(2)?,
                },
            );
        }
        Ok(out)
    }

    fn summary(&self) -> Result<ConversationSummary> {
        // one statement, so the counter and the status counts are one snapshot
        let conn = self.lock()?;
        let (new_conversations, open_conversations, closed_conversations) = conn.query_row(
            "SELECT
                COALESCE((SELECT value FROM counters WHERE counter_name = ?1), 0),
                COALESCE(SUM(status = 'open'), 0),
                COALESCE(SUM(status = 'closed'), 0)
             FROM conversations",
            [NEW_CONVERSATION_COUNTER],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(ConversationSummary {
            new_conversations,
            open_conversations,
            closed_conversations,
            generated_at: Utc::now(),
        })
    }
}
