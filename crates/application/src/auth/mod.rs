//! Session management for the gateway.
//!
//! This module provides:
//! - The per-pool token store with durable persistence
//! - The credential refresher calling the backend refresh endpoint
//! - Single-flight coordination of refreshes
//! - Session lifecycle events for the UI layer

mod coordinator;
mod events;
mod refresher;
mod token_store;

pub use coordinator::{RefreshCoordinator, RefreshOutcome};
pub use events::{SessionEvent, SessionEvents};
pub use refresher::CredentialRefresher;
pub use token_store::TokenStore;
