//! Store contracts for accounts, devices, share codes and module blobs.
//!
//! Handlers only ever see these traits; the backing engine is injected at
//! startup. Lookups return `Ok(None)` for absence so callers branch
//! exhaustively instead of comparing sentinel errors.

pub mod memory;
pub mod redis;

use std::collections::HashMap;

use async_trait::async_trait;
use syncd_shared::{Account, Device, DeviceId, ShareCode};

/// Infrastructure-level store failure. Absence of a record is not an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("account {0} already exists")]
    AccountAlreadyExists(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<::redis::RedisError> for StoreError {
    fn from(err: ::redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Name + outcome of a single readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthProbe {
    pub name: &'static str,
    pub healthy: bool,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account. Fails with `AccountAlreadyExists` when the
    /// username is taken; the caller surfaces the conflict rather than
    /// overwriting (two racing registrations resolve here).
    async fn create(&self, username: &str) -> Result<Account, StoreError>;

    async fn find(&self, username: &str) -> Result<Option<Account>, StoreError>;

    async fn health(&self) -> HealthProbe;
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Hash `secret` and upsert the `(account, device_id)` binding.
    /// Idempotent: re-adding overwrites the stored digest, which both
    /// first registration and share-code rebinding rely on.
    async fn add_device(
        &self,
        account: &Account,
        device_id: DeviceId,
        secret: &str,
    ) -> Result<Device, StoreError>;

    async fn get_device(
        &self,
        account: &Account,
        device_id: DeviceId,
    ) -> Result<Option<Device>, StoreError>;

    async fn get_devices(
        &self,
        account: &Account,
    ) -> Result<HashMap<DeviceId, Device>, StoreError>;

    /// Remove a binding. Absence is not an error.
    async fn delete_device(&self, account: &Account, device_id: DeviceId)
        -> Result<(), StoreError>;

    async fn health(&self) -> HealthProbe;
}

#[async_trait]
pub trait ShareCodeStore: Send + Sync {
    /// Mint a fresh random code for `account`, persisted with the configured
    /// TTL. Entropy comes from the code generator; no collision handling.
    async fn share(&self, account: &Account) -> Result<ShareCode, StoreError>;

    /// Resolve a code to its issuing account. `Ok(None)` for unknown,
    /// expired or revoked codes.
    async fn shared(&self, code: &ShareCode) -> Result<Option<Account>, StoreError>;

    /// Delete a code. Idempotent.
    async fn revoke(&self, code: &ShareCode) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ModuleStore: Send + Sync {
    async fn set(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError>;

    /// `Ok(None)` when the key holds no payload.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn delete_by_pattern(&self, pattern: &str) -> Result<(), StoreError>;

    async fn health(&self) -> HealthProbe;
}

/// Key under which a device's module payload is stored.
pub fn module_key(username: &str, device_id: DeviceId, name: &str) -> String {
    format!("{username}-{device_id}-{name}")
}

/// Glob matching every module key of one device.
pub fn module_key_pattern(username: &str, device_id: DeviceId) -> String {
    format!("{username}-{device_id}-*")
}
