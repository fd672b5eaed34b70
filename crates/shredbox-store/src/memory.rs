//! In-memory session store.
//!
//! A first-class backing for deployments that accept losing sessions on
//! restart (records are small and short-lived by design), and the store of
//! choice in unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use shredbox_core::Session;

use crate::traits::{SessionStore, StoreResult};

#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, code: &str) -> StoreResult<Option<Session>> {
        Ok(self.inner.read().await.get(code).cloned())
    }

    async fn put(&self, session: &Session) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .insert(session.code.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, code: &str) -> StoreResult<()> {
        self.inner.write().await.remove(code);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self.inner.read().await.keys().cloned().collect())
    }
}
