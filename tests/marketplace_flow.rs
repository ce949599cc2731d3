//! End-to-end marketplace flows over the in-memory store.
//!
//! These tests exercise the three services together the way the HTTP layer
//! drives them: first contact, chat with read receipts, blocking, completion,
//! and the one-time seller review. The property test at the bottom checks the
//! unread-count bookkeeping against a model under arbitrary interleavings of
//! send and read operations.

use std::sync::Arc;

use proptest::prelude::*;

use bookbarter::adapters::memory::InMemoryMarketplace;
use bookbarter::application::{
    ConversationService, MessageService, ReviewDraft, ReviewService,
};
use bookbarter::domain::foundation::{BookId, ConversationId, DomainError, SellPostId, UserId};
use bookbarter::domain::marketplace::{Condition, ConversationStatus, ListingStatus};
use bookbarter::ports::{
    BookSummary, ConversationNotifier, ListingSummary, MessageStore, NullNotifier, UserSummary,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn seller() -> UserId {
    UserId::new("seller-1").unwrap()
}

fn buyer() -> UserId {
    UserId::new("buyer-1").unwrap()
}

fn listing(id: SellPostId) -> ListingSummary {
    ListingSummary {
        id,
        title: "The Left Hand of Darkness".to_string(),
        price_cents: 1200,
        negotiable: true,
        condition: Condition::LikeNew,
        status: ListingStatus::Available,
        city: Some("Portland".to_string()),
        cover_image: None,
        seller: UserSummary {
            id: seller(),
            display_name: "Sam".to_string(),
        },
        book: Some(BookSummary {
            id: BookId::new(),
            title: "The Left Hand of Darkness".to_string(),
            author: Some("Ursula K. Le Guin".to_string()),
        }),
    }
}

struct Harness {
    store: Arc<InMemoryMarketplace>,
    conversations: ConversationService,
    messages: MessageService,
    reviews: ReviewService,
    sell_post_id: SellPostId,
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryMarketplace::new());
    let notifier: Arc<dyn ConversationNotifier> = Arc::new(NullNotifier);

    let sell_post_id = SellPostId::new();
    store.add_listing(listing(sell_post_id)).await;

    Harness {
        conversations: ConversationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        ),
        messages: MessageService::new(store.clone(), store.clone(), notifier),
        reviews: ReviewService::new(store.clone(), store.clone()),
        store,
        sell_post_id,
    }
}

fn review_draft(conversation_id: ConversationId) -> ReviewDraft {
    ReviewDraft {
        conversation_id,
        reviewer_id: buyer(),
        seller_id: Some(seller()),
        rating: 5,
        communication: None,
        description_accuracy: None,
        meetup: None,
        comment: Some("great".to_string()),
    }
}

// =============================================================================
// Scenario: first contact, chat, read receipts
// =============================================================================

#[tokio::test]
async fn repeated_contact_chat_and_read_receipts() {
    let h = harness().await;

    // Contacting the listing twice resolves to one conversation row.
    let first = h.conversations.get_or_create(h.sell_post_id, &buyer()).await.unwrap();
    let second = h.conversations.get_or_create(h.sell_post_id, &buyer()).await.unwrap();
    assert_eq!(first.conversation.id, second.conversation.id);

    let id = first.conversation.id;
    h.messages.create(id, &buyer(), "Hi").await.unwrap();

    // The unread message counts against the seller, not its sender.
    assert_eq!(h.messages.unread_count(id, &buyer()).await.unwrap(), 0);
    assert_eq!(h.messages.unread_count(id, &seller()).await.unwrap(), 1);

    assert_eq!(h.messages.mark_read(id, &seller()).await.unwrap(), 1);
    assert_eq!(h.messages.unread_count(id, &seller()).await.unwrap(), 0);

    // The receipt is visible in the hydrated history.
    let detail = h.conversations.get_with_messages(id, &buyer()).await.unwrap();
    assert_eq!(detail.messages.len(), 1);
    assert!(detail.messages[0].is_read());
}

#[tokio::test]
async fn inbox_reflects_activity_for_both_participants() {
    let h = harness().await;
    let detail = h.conversations.get_or_create(h.sell_post_id, &buyer()).await.unwrap();
    let id = detail.conversation.id;

    h.messages.create(id, &buyer(), "Is the price firm?").await.unwrap();

    let seller_inbox = h.conversations.list_for_user(&seller(), None).await.unwrap();
    assert_eq!(seller_inbox.len(), 1);
    assert!(seller_inbox[0].is_seller);
    assert_eq!(seller_inbox[0].unread_count, 1);
    assert_eq!(
        seller_inbox[0].last_message.as_ref().unwrap().content,
        "Is the price firm?"
    );

    let buyer_inbox = h.conversations.list_for_user(&buyer(), None).await.unwrap();
    assert!(!buyer_inbox[0].is_seller);
    assert_eq!(buyer_inbox[0].unread_count, 0);

    assert_eq!(h.conversations.unread_badge_count(&seller()).await.unwrap(), 1);
    assert_eq!(h.conversations.unread_badge_count(&buyer()).await.unwrap(), 0);
}

// =============================================================================
// Scenario: blocking stops messaging
// =============================================================================

#[tokio::test]
async fn blocked_conversation_rejects_sends_without_writing() {
    let h = harness().await;
    let detail = h.conversations.get_or_create(h.sell_post_id, &buyer()).await.unwrap();
    let id = detail.conversation.id;

    h.messages.create(id, &buyer(), "hello?").await.unwrap();
    h.conversations.block(id, &seller()).await.unwrap();

    let result = h.messages.create(id, &buyer(), "please respond").await;
    assert!(matches!(result, Err(DomainError::ConversationBlocked(_))));

    // Message count unchanged by the rejected send.
    let messages = h.store.list_for_conversation(id).await.unwrap();
    assert_eq!(messages.len(), 1);
}

// =============================================================================
// Scenario: completion and the one-time review
// =============================================================================

#[tokio::test]
async fn completed_transaction_accepts_exactly_one_review() {
    let h = harness().await;
    let detail = h.conversations.get_or_create(h.sell_post_id, &buyer()).await.unwrap();
    let id = detail.conversation.id;

    // The seller finalizes; messaging stays open afterwards.
    h.conversations.complete_transaction(id, &seller()).await.unwrap();
    h.messages.create(id, &buyer(), "thanks, great meetup").await.unwrap();

    let review = h.reviews.submit(review_draft(id)).await.unwrap();
    assert_eq!(review.rating.value(), 5);
    assert_eq!(review.comment.as_deref(), Some("great"));

    let second = h.reviews.submit(review_draft(id)).await;
    assert!(matches!(second, Err(DomainError::DuplicateReview(_))));

    // The review now rides along in the hydrated detail.
    let detail = h.conversations.get_with_messages(id, &buyer()).await.unwrap();
    assert_eq!(detail.review.unwrap().id, review.id);

    let stats = h.reviews.seller_stats(&seller()).await.unwrap();
    assert_eq!(stats.review_count, 1);
    assert_eq!(stats.completed_sales, 1);
    assert!((stats.average_rating - 5.0).abs() < f64::EPSILON);
    assert_eq!(stats.distribution, [0, 0, 0, 0, 1]);
}

#[tokio::test]
async fn each_review_precondition_reports_its_own_error() {
    let h = harness().await;
    let detail = h.conversations.get_or_create(h.sell_post_id, &buyer()).await.unwrap();
    let id = detail.conversation.id;

    // Before completion.
    let premature = h.reviews.submit(review_draft(id)).await;
    assert!(matches!(premature, Err(DomainError::TransactionIncomplete(_))));

    h.conversations.complete_transaction(id, &buyer()).await.unwrap();

    // Seller reviewing themselves.
    let mut by_seller = review_draft(id);
    by_seller.reviewer_id = seller();
    assert!(matches!(
        h.reviews.submit(by_seller).await,
        Err(DomainError::Permission { .. })
    ));

    // Claimed seller disagrees with the conversation's seller.
    let mut wrong_seller = review_draft(id);
    wrong_seller.seller_id = Some(UserId::new("someone-else").unwrap());
    assert!(matches!(
        h.reviews.submit(wrong_seller).await,
        Err(DomainError::SellerMismatch { .. })
    ));

    // Rating bounds.
    let mut too_high = review_draft(id);
    too_high.rating = 6;
    assert!(matches!(
        h.reviews.submit(too_high).await,
        Err(DomainError::InvalidRating { value: 6 })
    ));

    // Nothing above persisted a row; the valid one still goes through.
    assert!(h.reviews.submit(review_draft(id)).await.is_ok());
}

#[tokio::test]
async fn duplicate_complete_request_is_rejected() {
    let h = harness().await;
    let detail = h.conversations.get_or_create(h.sell_post_id, &buyer()).await.unwrap();
    let id = detail.conversation.id;

    h.conversations.complete_transaction(id, &buyer()).await.unwrap();
    let again = h.conversations.complete_transaction(id, &seller()).await;
    assert!(matches!(again, Err(DomainError::AlreadyCompleted(_))));

    let stored = h.conversations.get_with_messages(id, &buyer()).await.unwrap();
    assert_eq!(stored.conversation.status, ConversationStatus::Completed);
    assert!(stored.conversation.completed_at.is_some());
}

// =============================================================================
// Property: unread counts under arbitrary send/read interleavings
// =============================================================================

/// One step of a two-party chat session.
#[derive(Debug, Clone, Copy)]
enum ChatOp {
    BuyerSends,
    SellerSends,
    BuyerReads,
    SellerReads,
}

fn arb_chat_op() -> impl Strategy<Value = ChatOp> {
    prop_oneof![
        Just(ChatOp::BuyerSends),
        Just(ChatOp::SellerSends),
        Just(ChatOp::BuyerReads),
        Just(ChatOp::SellerReads),
    ]
}

proptest! {
    /// Property: after any interleaving of sends and read-marks, each
    /// participant's unread count equals the number of messages sent by the
    /// other side since that participant's last read-mark.
    #[test]
    fn prop_unread_counts_match_model(ops in prop::collection::vec(arb_chat_op(), 0..40)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let h = harness().await;
            let detail = h.conversations.get_or_create(h.sell_post_id, &buyer()).await.unwrap();
            let id = detail.conversation.id;

            // Model: messages each side has sent that the other hasn't read.
            let mut unread_for_seller = 0u64;
            let mut unread_for_buyer = 0u64;

            for op in &ops {
                match op {
                    ChatOp::BuyerSends => {
                        h.messages.create(id, &buyer(), "ping").await.unwrap();
                        unread_for_seller += 1;
                    }
                    ChatOp::SellerSends => {
                        h.messages.create(id, &seller(), "pong").await.unwrap();
                        unread_for_buyer += 1;
                    }
                    ChatOp::BuyerReads => {
                        let marked = h.messages.mark_read(id, &buyer()).await.unwrap();
                        prop_assert_eq!(marked, unread_for_buyer);
                        unread_for_buyer = 0;
                    }
                    ChatOp::SellerReads => {
                        let marked = h.messages.mark_read(id, &seller()).await.unwrap();
                        prop_assert_eq!(marked, unread_for_seller);
                        unread_for_seller = 0;
                    }
                }

                prop_assert_eq!(
                    h.messages.unread_count(id, &seller()).await.unwrap(),
                    unread_for_seller
                );
                prop_assert_eq!(
                    h.messages.unread_count(id, &buyer()).await.unwrap(),
                    unread_for_buyer
                );
            }

            // The per-conversation counts agree with the cross-conversation totals.
            prop_assert_eq!(
                h.messages.total_unread_count(&seller()).await.unwrap(),
                unread_for_seller
            );
            prop_assert_eq!(
                h.messages.total_unread_count(&buyer()).await.unwrap(),
                unread_for_buyer
            );
            Ok(())
        })?;
    }
}
