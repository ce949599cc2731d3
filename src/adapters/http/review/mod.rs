//! Review HTTP feature: DTOs, handlers, routes.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::review_routes;
