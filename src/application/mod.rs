//! Application layer - marketplace services.
//!
//! Each service owns the business rules of one slice of the conversation
//! workflow and orchestrates the ports: `ConversationService` (lifecycle and
//! inbox), `MessageService` (the append-only chat log and read receipts),
//! `ReviewService` (post-transaction seller ratings).

mod conversations;
mod messages;
mod reviews;

pub use conversations::{ConversationDetail, ConversationService};
pub use messages::MessageService;
pub use reviews::{ReviewChanges, ReviewDraft, ReviewService};
