//! Durable HTTP gateway for the conversation view.
//!
//! Every mutation the view performs goes through this gateway - message
//! sending in particular is HTTP-only, never the socket, so a dropped
//! connection can never lose a message.

use async_trait::async_trait;

use crate::adapters::http::conversation::dto::{
    ConversationActionRequest, ConversationAction, ConversationDetailView, CountView, MessageView,
    SendMessageRequest,
};
use crate::adapters::http::review::dto::{ReviewView, SubmitReviewRequest};
use crate::adapters::http::ErrorBody;
use crate::domain::foundation::{ConversationId, DomainError};

/// A review as composed in the view.
#[derive(Debug, Clone, Default)]
pub struct ReviewSubmission {
    pub rating: i32,
    pub communication_rating: Option<i32>,
    pub description_accuracy_rating: Option<i32>,
    pub meetup_rating: Option<i32>,
    pub comment: Option<String>,
}

/// The durable request path of the conversation view.
#[async_trait]
pub trait ConversationGateway: Send + Sync {
    /// Fetches the hydrated conversation snapshot.
    async fn fetch(&self, id: ConversationId) -> Result<ConversationDetailView, DomainError>;

    /// Sends a message; resolves with the acknowledged message.
    async fn send_message(
        &self,
        id: ConversationId,
        content: &str,
    ) -> Result<MessageView, DomainError>;

    /// Marks incoming messages read; returns the affected count.
    async fn mark_read(&self, id: ConversationId) -> Result<u64, DomainError>;

    /// Marks the transaction complete.
    async fn complete(&self, id: ConversationId) -> Result<(), DomainError>;

    /// Submits the seller review.
    async fn submit_review(
        &self,
        id: ConversationId,
        submission: ReviewSubmission,
    ) -> Result<ReviewView, DomainError>;
}

/// reqwest-backed gateway speaking the service's own REST API.
pub struct HttpConversationGateway {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpConversationGateway {
    /// Creates a gateway for the given API base URL and bearer token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DomainError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| DomainError::Transport(format!("malformed response: {}", e)));
        }

        // Error bodies carry the service's stable codes; translate the ones
        // the view branches on and fold the rest into Transport.
        let body = response.json::<ErrorBody>().await.ok();
        Err(match body {
            Some(body) => error_from_body(status.as_u16(), body),
            None => DomainError::Transport(format!("HTTP {}", status)),
        })
    }
}

fn error_from_body(status: u16, body: ErrorBody) -> DomainError {
    match body.code.as_str() {
        "NOT_FOUND" => DomainError::NotFound {
            entity: "Resource",
            id: body.message,
        },
        "PERMISSION_DENIED" => DomainError::permission(body.message),
        "CONVERSATION_BLOCKED" => DomainError::ConversationBlocked(body.message),
        "ALREADY_COMPLETED" => DomainError::AlreadyCompleted(body.message),
        "TRANSACTION_INCOMPLETE" => DomainError::TransactionIncomplete(body.message),
        "DUPLICATE_REVIEW" => DomainError::DuplicateReview(body.message),
        "INVALID_RATING" => DomainError::InvalidRating { value: 0 },
        other => DomainError::Transport(format!("HTTP {}: {} ({})", status, body.message, other)),
    }
}

#[async_trait]
impl ConversationGateway for HttpConversationGateway {
    async fn fetch(&self, id: ConversationId) -> Result<ConversationDetailView, DomainError> {
        let response = self
            .http
            .get(self.url(&format!("/conversations/{}", id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        Self::decode(response).await
    }

    async fn send_message(
        &self,
        id: ConversationId,
        content: &str,
    ) -> Result<MessageView, DomainError> {
        let response = self
            .http
            .post(self.url(&format!("/conversations/{}/messages", id)))
            .bearer_auth(&self.token)
            .json(&SendMessageRequest {
                content: content.to_string(),
            })
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        Self::decode(response).await
    }

    async fn mark_read(&self, id: ConversationId) -> Result<u64, DomainError> {
        let response = self
            .http
            .post(self.url(&format!("/conversations/{}/read", id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        let count: CountView = Self::decode(response).await?;
        Ok(count.count)
    }

    async fn complete(&self, id: ConversationId) -> Result<(), DomainError> {
        let response = self
            .http
            .patch(self.url(&format!("/conversations/{}", id)))
            .bearer_auth(&self.token)
            .json(&ConversationActionRequest {
                action: ConversationAction::Complete,
            })
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        let _: ConversationDetailViewOrView = Self::decode(response).await?;
        Ok(())
    }

    async fn submit_review(
        &self,
        id: ConversationId,
        submission: ReviewSubmission,
    ) -> Result<ReviewView, DomainError> {
        let response = self
            .http
            .post(self.url(&format!("/conversations/{}/review", id)))
            .bearer_auth(&self.token)
            .json(&SubmitReviewRequest {
                rating: submission.rating,
                communication_rating: submission.communication_rating,
                description_accuracy_rating: submission.description_accuracy_rating,
                meetup_rating: submission.meetup_rating,
                comment: submission.comment,
                seller_id: None,
            })
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        Self::decode(response).await
    }
}

/// The complete endpoint answers with the updated conversation; the view
/// only needs success, so accept any JSON object.
type ConversationDetailViewOrView = serde_json::Value;
