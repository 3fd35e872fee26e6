use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use colloquy_llm::{Message, Role};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{PersistError, Result};
use crate::models::{Conversation, ConversationSummary};
use crate::sqlite::migrations;
use crate::trait_client::PersistenceClient;

/// SQLite-backed conversation storage.
///
/// A single connection guarded by a mutex; queries run on the blocking
/// thread pool. WAL mode and foreign keys are enabled on open.
pub struct SqlitePersistenceClient {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl SqlitePersistenceClient {
    /// Open (or create) a database file and apply pending migrations
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PersistError::Connection(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        migrations::run_migrations(&conn)?;

        tracing::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: path.display().to_string(),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location: ":memory:".to_string(),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| PersistError::Internal(format!("Database lock poisoned: {}", e)))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| PersistError::Internal(format!("Database task failed: {}", e)))?
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| PersistError::InvalidData(format!("bad timestamp '{}': {}", raw, e)))
}

struct RawMessage {
    id: i64,
    conversation_id: String,
    role: String,
    content: String,
    timestamp: String,
}

impl RawMessage {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            role: row.get(2)?,
            content: row.get(3)?,
            timestamp: row.get(4)?,
        })
    }

    fn into_message(self) -> Result<Message> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: colloquy_llm::types::UnknownRole| PersistError::InvalidData(e.to_string()))?;
        Ok(Message {
            id: self.id,
            conversation_id: self.conversation_id,
            role,
            content: self.content,
            timestamp: parse_ts(&self.timestamp)?,
        })
    }
}

fn conversation_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM conversations WHERE id = ?1", params![id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

#[async_trait]
impl PersistenceClient for SqlitePersistenceClient {
    async fn create_conversation(&self, title: &str) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let title = title.to_string();
        let now = format_ts(&Utc::now());

        let created = id.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![created, title, now],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(conversation_id = %id, "Created conversation");
        Ok(id)
    }

    async fn add_message(&self, conversation_id: &str, message: &Message) -> Result<i64> {
        let conversation_id = conversation_id.to_string();
        let role = message.role.as_str();
        let content = message.content.clone();
        let timestamp = format_ts(&message.timestamp);

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            if !conversation_exists(&tx, &conversation_id)? {
                return Err(PersistError::ConversationNotFound(conversation_id));
            }
            tx.execute(
                "INSERT INTO messages (conversation_id, role, content, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![conversation_id, role, content, timestamp],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "UPDATE conversations SET updated_at = MAX(updated_at, ?2) WHERE id = ?1",
                params![conversation_id, format_ts(&Utc::now())],
            )?;
            tx.commit()?;
            Ok(id)
        })
        .await
    }

    async fn update_message(&self, message_id: i64, content: &str) -> Result<()> {
        let content = content.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET content = ?2 WHERE id = ?1",
                params![message_id, content],
            )?;
            if changed == 0 {
                return Err(PersistError::MessageNotFound(message_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_message(&self, message_id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM messages WHERE id = ?1", params![message_id])?;
            if changed == 0 {
                return Err(PersistError::MessageNotFound(message_id));
            }
            Ok(())
        })
        .await
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let conversation_id = conversation_id.to_string();
        self.with_conn(move |conn| {
            let header: Option<(String, String, String, String)> = conn
                .query_row(
                    "SELECT id, title, created_at, updated_at FROM conversations WHERE id = ?1",
                    params![conversation_id],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
                )
                .optional()?;

            let Some((id, title, created_at, updated_at)) = header else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, role, content, timestamp
                 FROM messages WHERE conversation_id = ?1
                 ORDER BY timestamp ASC, id ASC",
            )?;
            let raw = stmt
                .query_map(params![id], RawMessage::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let messages = raw
                .into_iter()
                .map(RawMessage::into_message)
                .collect::<Result<Vec<_>>>()?;

            Ok(Some(Conversation {
                id,
                title,
                messages,
                created_at: parse_ts(&created_at)?,
                updated_at: parse_ts(&updated_at)?,
            }))
        })
        .await
    }

    async fn list_recent_conversations(&self, limit: usize) -> Result<Vec<ConversationSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.title, c.created_at, c.updated_at,
                        (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id)
                 FROM conversations c
                 ORDER BY c.updated_at DESC, c.created_at DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit], |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, i64>(4)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(id, title, created_at, updated_at, count)| {
                    Ok(ConversationSummary {
                        id,
                        title,
                        created_at: parse_ts(&created_at)?,
                        updated_at: parse_ts(&updated_at)?,
                        message_count: count.max(0) as u64,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<bool> {
        let conversation_id = conversation_id.to_string();
        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM conversations WHERE id = ?1",
                params![conversation_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn update_conversation_title(&self, conversation_id: &str, title: &str) -> Result<()> {
        let conversation_id = conversation_id.to_string();
        let title = title.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE conversations SET title = ?2, updated_at = MAX(updated_at, ?3) WHERE id = ?1",
                params![conversation_id, title, format_ts(&Utc::now())],
            )?;
            if changed == 0 {
                return Err(PersistError::ConversationNotFound(conversation_id));
            }
            Ok(())
        })
        .await
    }

    async fn count_conversations(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM conversations", [], |r| r.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn count_messages(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }
}
