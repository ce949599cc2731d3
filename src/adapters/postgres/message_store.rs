//! PostgreSQL implementation of MessageStore.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};
use crate::domain::marketplace::Message;
use crate::ports::MessageStore;

use super::conversation_store::message_from_row;
use super::{db_err, is_foreign_key_violation};

/// PostgreSQL implementation of MessageStore.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Creates a new PostgresMessageStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn append(&self, message: &Message) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to start transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, created_at, read_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.conversation_id.as_uuid())
        .bind(message.sender_id.as_str())
        .bind(&message.content)
        .bind(message.created_at.as_datetime())
        .bind(message.read_at.map(|t| *t.as_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DomainError::not_found("Conversation", message.conversation_id)
            } else {
                db_err("Failed to insert message", e)
            }
        })?;

        // Inbox ordering signal; rides in the same transaction.
        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(message.conversation_id.as_uuid())
            .bind(message.created_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to bump conversation timestamp", e))?;

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit transaction", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at, read_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch message", e))?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn list_for_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at, read_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch messages", e))?;

        rows.iter().map(message_from_row).collect()
    }

    async fn recent(
        &self,
        conversation_id: ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at, read_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch recent messages", e))?;

        let mut messages: Vec<Message> =
            rows.iter().map(message_from_row).collect::<Result<_, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
        at: Timestamp,
    ) -> Result<u64, DomainError> {
        // The `read_at IS NULL` predicate is what makes the receipt
        // monotonic under concurrent marks from sockets and polls.
        let result = sqlx::query(
            r#"
            UPDATE messages SET read_at = $3
            WHERE conversation_id = $1
              AND sender_id <> $2
              AND read_at IS NULL
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(reader.as_str())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to mark messages read", e))?;

        Ok(result.rows_affected())
    }

    async fn unread_count(
        &self,
        conversation_id: ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS unread
            FROM messages
            WHERE conversation_id = $1
              AND sender_id <> $2
              AND read_at IS NULL
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to count unread messages", e))?;

        Ok(row.get::<i64, _>("unread") as u64)
    }

    async fn total_unread(&self, user: &UserId) -> Result<u64, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS unread
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE (c.seller_id = $1 OR c.buyer_id = $1)
              AND m.sender_id <> $1
              AND m.read_at IS NULL
            "#,
        )
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to count total unread", e))?;

        Ok(row.get::<i64, _>("unread") as u64)
    }

    async fn delete(&self, id: MessageId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("Failed to delete message", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Message", id));
        }
        Ok(())
    }
}
