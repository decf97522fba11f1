//! # BookRelay Registry
//!
//! Read/delete access to the delivery-token registry. Tokens are registered
//! by the apps themselves; this crate only reads the current set for a
//! recipient and prunes entries the gateway proved dead.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use bookrelay_core::error::Result;
use bookrelay_core::types::Role;

pub use memory::MemoryRegistry;
pub use rest::RestRegistry;

/// Token registry seam.
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    /// Point-in-time read of all registered tokens for a recipient.
    /// An absent or empty mapping is a normal empty vec, not an error.
    async fn tokens(&self, role: Role, recipient: &str) -> Result<Vec<String>>;

    /// Remove one token from a recipient's set. Idempotent: removing a
    /// token that is already gone succeeds.
    async fn remove(&self, role: Role, recipient: &str, token: &str) -> Result<()>;
}
