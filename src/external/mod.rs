//! Clients for external services.

pub mod client;
pub mod publish;
