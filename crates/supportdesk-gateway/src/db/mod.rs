//! Conversation history persistence.
//!
//! Conversations are append-only logs of turns keyed by session id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(feature = "persistence-sqlx")]
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use supportdesk_context::{Role, Turn};
use thiserror::Error;
use tokio::sync::RwLock;

/// Database connection pool type used by gateway persistence.
#[cfg(feature = "persistence-sqlx")]
pub type DatabasePool = SqlitePool;

/// SQL schema for the `sessions` table.
pub const SESSIONS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);"#;

/// SQL schema for the `messages` table.
pub const MESSAGES_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
);"#;

/// Error type returned by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[cfg(feature = "persistence-sqlx")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored row could not be mapped back to a turn.
    #[error("corrupt stored turn: {0}")]
    Corrupt(String),
}

/// Persistence operations for conversation history.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Register a conversation. Creating an existing conversation is a no-op.
    async fn create_conversation(&self, id: &str) -> Result<(), RepositoryError>;
    /// Append one turn to the end of a conversation.
    async fn append_turn(&self, id: &str, role: Role, content: &str)
        -> Result<(), RepositoryError>;
    /// All turns of a conversation in append order; empty when unknown.
    async fn list_turns(&self, id: &str) -> Result<Vec<Turn>, RepositoryError>;
}

/// Process-local history store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryConversationRepository {
    conversations: Arc<RwLock<HashMap<String, Vec<Turn>>>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create_conversation(&self, id: &str) -> Result<(), RepositoryError> {
        self.conversations
            .write()
            .await
            .entry(id.to_string())
            .or_default();
        Ok(())
    }

    async fn append_turn(
        &self,
        id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), RepositoryError> {
        self.conversations
            .write()
            .await
            .entry(id.to_string())
            .or_default()
            .push(Turn::new(role, content));
        Ok(())
    }

    async fn list_turns(&self, id: &str) -> Result<Vec<Turn>, RepositoryError> {
        Ok(self
            .conversations
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Open (creating if needed) an SQLite database for gateway persistence.
#[cfg(feature = "persistence-sqlx")]
pub async fn init_pool(database_url: &str) -> Result<DatabasePool, RepositoryError> {
    let options = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);
    Ok(SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?)
}

/// Initialize required tables if they do not exist.
#[cfg(feature = "persistence-sqlx")]
pub async fn initialize_schema(pool: &DatabasePool) -> Result<(), RepositoryError> {
    sqlx::query(SESSIONS_TABLE_SCHEMA).execute(pool).await?;
    sqlx::query(MESSAGES_TABLE_SCHEMA).execute(pool).await?;
    Ok(())
}

/// SQLx/SQLite implementation of [`ConversationRepository`].
#[cfg(feature = "persistence-sqlx")]
#[derive(Debug, Clone)]
pub struct SqlxConversationRepository {
    pool: DatabasePool,
}

#[cfg(feature = "persistence-sqlx")]
impl SqlxConversationRepository {
    /// Build a repository over an existing pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "persistence-sqlx")]
#[async_trait]
impl ConversationRepository for SqlxConversationRepository {
    async fn create_conversation(&self, id: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR IGNORE INTO sessions (id) VALUES (?)")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_turn(
        &self,
        id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO messages (session_id, role, content) VALUES (?, ?, ?)")
            .bind(id)
            .bind(role.as_str())
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_turns(&self, id: &str) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query("SELECT role, content FROM messages WHERE session_id = ? ORDER BY id ASC")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let role: String = row.get("role");
                let role = role
                    .parse::<Role>()
                    .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
                Ok(Turn::new(role, row.get::<String, _>("content")))
            })
            .collect()
    }
}
