//! Bookbarter - Peer-to-peer used-book marketplace messaging backend.
//!
//! This crate implements the marketplace conversation layer: per-listing
//! buyer/seller chat with realtime delivery, transaction completion, and
//! seller reviews.

pub mod adapters;
pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;
