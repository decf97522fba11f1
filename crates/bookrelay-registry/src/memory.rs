//! In-memory registry — used by tests and local runs without a database.

use async_trait::async_trait;
use bookrelay_core::error::Result;
use bookrelay_core::types::Role;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::TokenRegistry;

/// In-memory token sets keyed by (role, recipient).
#[derive(Default)]
pub struct MemoryRegistry {
    sets: RwLock<HashMap<(String, String), BTreeSet<String>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token, as the device apps would.
    pub async fn register(&self, role: Role, recipient: &str, token: &str) {
        let mut sets = self.sets.write().await;
        sets.entry((role.as_str().to_string(), recipient.to_string()))
            .or_default()
            .insert(token.to_string());
    }
}

#[async_trait]
impl TokenRegistry for MemoryRegistry {
    async fn tokens(&self, role: Role, recipient: &str) -> Result<Vec<String>> {
        let sets = self.sets.read().await;
        Ok(sets
            .get(&(role.as_str().to_string(), recipient.to_string()))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn remove(&self, role: Role, recipient: &str, token: &str) -> Result<()> {
        let mut sets = self.sets.write().await;
        if let Some(set) = sets.get_mut(&(role.as_str().to_string(), recipient.to_string())) {
            set.remove(token);
        }
        // Removing from an absent set is a no-op, same as the REST backend.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_read() {
        let reg = MemoryRegistry::new();
        reg.register(Role::Panel, "P1", "tok-1").await;
        reg.register(Role::Panel, "P1", "tok-2").await;
        let tokens = reg.tokens(Role::Panel, "P1").await.unwrap();
        assert_eq!(tokens, vec!["tok-1".to_string(), "tok-2".to_string()]);
    }

    #[tokio::test]
    async fn test_roles_are_isolated() {
        let reg = MemoryRegistry::new();
        reg.register(Role::Panel, "X", "tok-panel").await;
        assert!(reg.tokens(Role::Client, "X").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let reg = MemoryRegistry::new();
        reg.register(Role::Client, "U1", "tok-1").await;
        reg.remove(Role::Client, "U1", "tok-1").await.unwrap();
        // Second delete of the same token must not error.
        reg.remove(Role::Client, "U1", "tok-1").await.unwrap();
        // Neither must a delete against a recipient that never registered.
        reg.remove(Role::Client, "ghost", "tok-1").await.unwrap();
        assert!(reg.tokens(Role::Client, "U1").await.unwrap().is_empty());
    }
}
