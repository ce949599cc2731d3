//! Auth adapters - SessionValidator implementations.

mod trusted;

pub use trusted::TrustedTokenValidator;
