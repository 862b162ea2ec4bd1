//! In-memory store backend.
//!
//! Instance-scoped maps behind an async lock; every [`MemoryStore`] owns its
//! own state, so tests never share data and nothing is process-global.
//! Useful for development (`STORE_BACKEND=memory`) and for handler tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use syncd_shared::{Account, Device, DeviceId, ShareCode};
use tokio::sync::RwLock;

use super::{AccountStore, DeviceStore, HealthProbe, ModuleStore, ShareCodeStore, StoreError};
use crate::auth::secret::hash_secret;

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    devices: HashMap<String, HashMap<DeviceId, Device>>,
    shares: HashMap<ShareCode, ShareEntry>,
    modules: HashMap<String, Vec<u8>>,
}

struct ShareEntry {
    username: String,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    share_ttl: Duration,
}

impl MemoryStore {
    pub fn new(share_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            share_ttl,
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create(&self, username: &str) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(username) {
            return Err(StoreError::AccountAlreadyExists(username.to_string()));
        }

        let account = Account::new(username);
        inner.accounts.insert(username.to_string(), account.clone());

        Ok(account)
    }

    async fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.get(username).cloned())
    }

    async fn health(&self) -> HealthProbe {
        HealthProbe {
            name: "memory-accounts",
            healthy: true,
        }
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn add_device(
        &self,
        account: &Account,
        device_id: DeviceId,
        secret: &str,
    ) -> Result<Device, StoreError> {
        let device = Device::new(device_id, hash_secret(secret));
        self.inner
            .write()
            .await
            .devices
            .entry(account.username.clone())
            .or_default()
            .insert(device_id, device.clone());

        Ok(device)
    }

    async fn get_device(
        &self,
        account: &Account,
        device_id: DeviceId,
    ) -> Result<Option<Device>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .devices
            .get(&account.username)
            .and_then(|devices| devices.get(&device_id))
            .cloned())
    }

    async fn get_devices(
        &self,
        account: &Account,
    ) -> Result<HashMap<DeviceId, Device>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .devices
            .get(&account.username)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_device(
        &self,
        account: &Account,
        device_id: DeviceId,
    ) -> Result<(), StoreError> {
        if let Some(devices) = self.inner.write().await.devices.get_mut(&account.username) {
            devices.remove(&device_id);
        }

        Ok(())
    }

    async fn health(&self) -> HealthProbe {
        HealthProbe {
            name: "memory-devices",
            healthy: true,
        }
    }
}

#[async_trait]
impl ShareCodeStore for MemoryStore {
    async fn share(&self, account: &Account) -> Result<ShareCode, StoreError> {
        let code = ShareCode::generate();
        self.inner.write().await.shares.insert(
            code.clone(),
            ShareEntry {
                username: account.username.clone(),
                expires_at: Instant::now() + self.share_ttl,
            },
        );

        Ok(code)
    }

    async fn shared(&self, code: &ShareCode) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        let username = match inner.shares.get(code) {
            Some(entry) if entry.expires_at > Instant::now() => entry.username.clone(),
            _ => return Ok(None),
        };

        Ok(inner.accounts.get(&username).cloned())
    }

    async fn revoke(&self, code: &ShareCode) -> Result<(), StoreError> {
        self.inner.write().await.shares.remove(code);

        Ok(())
    }
}

#[async_trait]
impl ModuleStore for MemoryStore {
    async fn set(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError> {
        self.inner.write().await.modules.insert(key.to_string(), data);

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.read().await.modules.get(key).cloned())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<(), StoreError> {
        // Only the trailing-star form is ever constructed for module keys
        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
        self.inner
            .write()
            .await
            .modules
            .retain(|key, _| !key.starts_with(prefix));

        Ok(())
    }

    async fn health(&self) -> HealthProbe {
        HealthProbe {
            name: "memory-modules",
            healthy: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = store();
        let created = store.create("alice").await.unwrap();
        let found = store.find("alice").await.unwrap().unwrap();
        assert_eq!(created, found);
        assert!(store.find("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let store = store();
        store.create("alice").await.unwrap();
        assert!(matches!(
            store.create("alice").await,
            Err(StoreError::AccountAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_add_device_overwrites_digest() {
        let store = store();
        let account = store.create("alice").await.unwrap();
        let id = DeviceId::new();

        let first = store.add_device(&account, id, "old-secret").await.unwrap();
        let second = store.add_device(&account, id, "new-secret").await.unwrap();
        assert_ne!(first.hashed_secret, second.hashed_secret);

        let stored = store.get_device(&account, id).await.unwrap().unwrap();
        assert_eq!(stored.hashed_secret, second.hashed_secret);
        assert_eq!(store.get_devices(&account).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_device_ids_are_scoped_per_account() {
        let store = store();
        let alice = store.create("alice").await.unwrap();
        let bob = store.create("bob").await.unwrap();
        let id = DeviceId::new();

        store.add_device(&alice, id, "a").await.unwrap();
        assert!(store.get_device(&bob, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_device_is_idempotent() {
        let store = store();
        let account = store.create("alice").await.unwrap();
        let id = DeviceId::new();

        store.add_device(&account, id, "secret").await.unwrap();
        store.delete_device(&account, id).await.unwrap();
        store.delete_device(&account, id).await.unwrap();
        assert!(store.get_device(&account, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_share_resolve_revoke() {
        let store = store();
        let account = store.create("alice").await.unwrap();

        let code = ShareCodeStore::share(&store, &account).await.unwrap();
        let issuer = store.shared(&code).await.unwrap().unwrap();
        assert_eq!(issuer.username, "alice");

        store.revoke(&code).await.unwrap();
        assert!(store.shared(&code).await.unwrap().is_none());
        // Revoking again is fine
        store.revoke(&code).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_share_code_is_invalid() {
        let store = MemoryStore::new(Duration::ZERO);
        let account = store.create("alice").await.unwrap();
        let code = ShareCodeStore::share(&store, &account).await.unwrap();
        assert!(store.shared(&code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_module_set_get_delete_by_pattern() {
        let store = store();
        store.set("alice-d1-notes", b"n".to_vec()).await.unwrap();
        store.set("alice-d1-todo", b"t".to_vec()).await.unwrap();
        store.set("alice-d2-notes", b"x".to_vec()).await.unwrap();

        assert_eq!(
            store.get("alice-d1-notes").await.unwrap(),
            Some(b"n".to_vec())
        );
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.delete_by_pattern("alice-d1-*").await.unwrap();
        assert!(store.get("alice-d1-notes").await.unwrap().is_none());
        assert!(store.get("alice-d1-todo").await.unwrap().is_none());
        assert!(store.get("alice-d2-notes").await.unwrap().is_some());
    }
}
