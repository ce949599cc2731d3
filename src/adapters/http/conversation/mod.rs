//! Conversation HTTP feature: DTOs, handlers, routes.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::conversation_routes;
