//! PostgreSQL implementation of ConversationStore.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    ConversationId, DomainError, MessageId, SellPostId, Timestamp, UserId,
};
use crate::domain::marketplace::{Conversation, ConversationStatus, Message};
use crate::ports::{ConversationStore, InboxEntry};

use super::{db_err, stored_user_id};

/// PostgreSQL implementation of ConversationStore.
///
/// The `(sell_post_id, buyer_id)` unique constraint owns the get-or-create
/// race: insert with `ON CONFLICT DO NOTHING`, then re-read the winner.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    /// Creates a new PostgresConversationStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn get_or_create(
        &self,
        sell_post_id: SellPostId,
        seller_id: &UserId,
        buyer_id: &UserId,
    ) -> Result<Conversation, DomainError> {
        let candidate = Conversation::start(sell_post_id, seller_id.clone(), buyer_id.clone());

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, sell_post_id, seller_id, buyer_id, status,
                transaction_completed, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (sell_post_id, buyer_id) DO NOTHING
            "#,
        )
        .bind(candidate.id.as_uuid())
        .bind(sell_post_id.as_uuid())
        .bind(seller_id.as_str())
        .bind(buyer_id.as_str())
        .bind(status_to_str(candidate.status))
        .bind(candidate.transaction_completed)
        .bind(candidate.created_at.as_datetime())
        .bind(candidate.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to insert conversation", e))?;

        // Re-read covers both outcomes: our insert won, or a concurrent
        // first contact already holds the row.
        let row = sqlx::query(
            r#"
            SELECT id, sell_post_id, seller_id, buyer_id, status,
                   transaction_completed, completed_at, created_at, updated_at
            FROM conversations
            WHERE sell_post_id = $1 AND buyer_id = $2
            "#,
        )
        .bind(sell_post_id.as_uuid())
        .bind(buyer_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to re-read conversation after insert", e))?;

        conversation_from_row(&row)
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, sell_post_id, seller_id, buyer_id, status,
                   transaction_completed, completed_at, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to fetch conversation", e))?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<InboxEntry>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.sell_post_id, c.seller_id, c.buyer_id, c.status,
                   c.transaction_completed, c.completed_at, c.created_at, c.updated_at,
                   sp.title AS listing_title,
                   sp.images[1] AS listing_image,
                   (SELECT COUNT(*) FROM messages m
                     WHERE m.conversation_id = c.id
                       AND m.sender_id <> $1
                       AND m.read_at IS NULL) AS unread_count
            FROM conversations c
            JOIN sell_posts sp ON sp.id = c.sell_post_id
            WHERE (c.seller_id = $1 OR c.buyer_id = $1)
              AND ($2::text IS NULL OR c.status = $2)
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(user.as_str())
        .bind(status.map(status_to_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list conversations", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let conversation = conversation_from_row(row)?;
            entries.push(InboxEntry {
                is_seller: &conversation.seller_id == user,
                unread_count: row.get::<i64, _>("unread_count") as u64,
                listing_title: row.get("listing_title"),
                listing_image: row.get("listing_image"),
                last_message: None,
                conversation,
            });
        }

        // One follow-up query hydrates the newest message of every thread.
        let ids: Vec<uuid::Uuid> = entries
            .iter()
            .map(|e| *e.conversation.id.as_uuid())
            .collect();
        if !ids.is_empty() {
            let message_rows = sqlx::query(
                r#"
                SELECT DISTINCT ON (conversation_id)
                       id, conversation_id, sender_id, content, created_at, read_at
                FROM messages
                WHERE conversation_id = ANY($1)
                ORDER BY conversation_id, created_at DESC
                "#,
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_err("Failed to fetch last messages", e))?;

            for row in &message_rows {
                let message = message_from_row(row)?;
                if let Some(entry) = entries
                    .iter_mut()
                    .find(|e| e.conversation.id == message.conversation_id)
                {
                    entry.last_message = Some(message);
                }
            }
        }

        Ok(entries)
    }

    async fn set_status(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE conversations SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status_to_str(status))
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("Failed to update conversation status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Conversation", id));
        }
        Ok(())
    }

    async fn complete(
        &self,
        id: ConversationId,
        completed_at: Timestamp,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations SET
                transaction_completed = TRUE,
                completed_at = $2,
                status = $3,
                updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(completed_at.as_datetime())
        .bind(status_to_str(ConversationStatus::Completed))
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to complete conversation", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Conversation", id));
        }
        Ok(())
    }

    async fn unread_badge_count(&self, user: &UserId) -> Result<u64, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS unread
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE (c.seller_id = $1 OR c.buyer_id = $1)
              AND c.status <> 'ARCHIVED'
              AND m.sender_id <> $1
              AND m.read_at IS NULL
            "#,
        )
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to count unread badge", e))?;

        Ok(row.get::<i64, _>("unread") as u64)
    }

    async fn completed_count_for_seller(&self, seller: &UserId) -> Result<u64, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS completed
            FROM conversations
            WHERE seller_id = $1 AND transaction_completed
            "#,
        )
        .bind(seller.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to count completed sales", e))?;

        Ok(row.get::<i64, _>("completed") as u64)
    }
}

// === Helper Functions ===

fn status_to_str(status: ConversationStatus) -> &'static str {
    match status {
        ConversationStatus::Active => "ACTIVE",
        ConversationStatus::Archived => "ARCHIVED",
        ConversationStatus::Blocked => "BLOCKED",
        ConversationStatus::Completed => "COMPLETED",
    }
}

fn str_to_status(s: &str) -> Result<ConversationStatus, DomainError> {
    match s {
        "ACTIVE" => Ok(ConversationStatus::Active),
        "ARCHIVED" => Ok(ConversationStatus::Archived),
        "BLOCKED" => Ok(ConversationStatus::Blocked),
        "COMPLETED" => Ok(ConversationStatus::Completed),
        _ => Err(DomainError::Database(format!(
            "Invalid conversation status: {}",
            s
        ))),
    }
}

fn conversation_from_row(row: &sqlx::postgres::PgRow) -> Result<Conversation, DomainError> {
    let id: uuid::Uuid = row.get("id");
    let sell_post_id: uuid::Uuid = row.get("sell_post_id");
    let status_str: &str = row.get("status");
    let completed_at: Option<chrono::DateTime<chrono::Utc>> = row.get("completed_at");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(Conversation {
        id: ConversationId::from_uuid(id),
        sell_post_id: SellPostId::from_uuid(sell_post_id),
        seller_id: stored_user_id(row.get("seller_id"))?,
        buyer_id: stored_user_id(row.get("buyer_id"))?,
        status: str_to_status(status_str)?,
        transaction_completed: row.get("transaction_completed"),
        completed_at: completed_at.map(Timestamp::from_datetime),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}

pub(super) fn message_from_row(row: &sqlx::postgres::PgRow) -> Result<Message, DomainError> {
    let id: uuid::Uuid = row.get("id");
    let conversation_id: uuid::Uuid = row.get("conversation_id");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let read_at: Option<chrono::DateTime<chrono::Utc>> = row.get("read_at");

    Ok(Message {
        id: MessageId::from_uuid(id),
        conversation_id: ConversationId::from_uuid(conversation_id),
        sender_id: stored_user_id(row.get("sender_id"))?,
        content: row.get("content"),
        created_at: Timestamp::from_datetime(created_at),
        read_at: read_at.map(Timestamp::from_datetime),
    })
}
