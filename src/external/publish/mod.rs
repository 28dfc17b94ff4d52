//! Publish connectors: adapters that post finalized text to external
//! platforms and report a tri-state outcome.

pub mod connector;
pub mod registry;
pub mod threads;
pub mod webhook;

pub use connector::{PublishConnector, PublishOutcome, is_retryable_status};
pub use registry::{ConnectorRegistry, THREADS_PLATFORM};
pub use threads::ThreadsConnector;
pub use webhook::WebhookConnector;
