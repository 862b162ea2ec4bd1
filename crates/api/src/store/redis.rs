//! Redis-backed store implementations.
//!
//! Key layout:
//! - `sync:accounts` — hash of username -> creation timestamp (unix seconds)
//! - `sync:accounts:share:<code>` — share code -> username, expiring key
//! - `sync:devices:<username>` — hash of device id -> secret digest
//! - module payloads live under their own composed keys (see `module_key`)

use std::collections::HashMap;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use async_trait::async_trait;
use syncd_shared::{Account, Device, DeviceId, ShareCode};
use time::OffsetDateTime;

use super::{AccountStore, DeviceStore, HealthProbe, ModuleStore, ShareCodeStore, StoreError};
use crate::auth::secret::hash_secret;

const ACCOUNT_KEY_SPACE: &str = "sync:accounts";
const SHARE_KEY_SPACE: &str = "sync:accounts:share";
const DEVICE_KEY_SPACE: &str = "sync:devices";

fn share_key(code: &ShareCode) -> String {
    format!("{SHARE_KEY_SPACE}:{code}")
}

fn device_key(account: &Account) -> String {
    format!("{DEVICE_KEY_SPACE}:{}", account.username)
}

async fn ping(conn: &ConnectionManager) -> bool {
    let mut conn = conn.clone();
    ::redis::cmd("PING")
        .query_async::<String>(&mut conn)
        .await
        .is_ok()
}

fn account_from_entry(username: &str, created_at: &str) -> Result<Account, StoreError> {
    let timestamp = created_at
        .parse::<i64>()
        .ok()
        .and_then(|t| OffsetDateTime::from_unix_timestamp(t).ok())
        .ok_or_else(|| {
            StoreError::Unavailable(format!("corrupt account record for {username}"))
        })?;

    Ok(Account {
        username: username.to_string(),
        created_at: timestamp,
    })
}

/// Accounts and share codes share one manager, as both live in the
/// account key space.
#[derive(Clone)]
pub struct RedisAccounts {
    conn: ConnectionManager,
    share_ttl: Duration,
}

impl RedisAccounts {
    pub fn new(conn: ConnectionManager, share_ttl: Duration) -> Self {
        Self { conn, share_ttl }
    }
}

#[async_trait]
impl AccountStore for RedisAccounts {
    async fn create(&self, username: &str) -> Result<Account, StoreError> {
        if self.find(username).await?.is_some() {
            return Err(StoreError::AccountAlreadyExists(username.to_string()));
        }

        let account = Account::new(username);
        let mut conn = self.conn.clone();
        // HSETNX so two racing creates resolve here instead of overwriting
        let created: bool = conn
            .hset_nx(
                ACCOUNT_KEY_SPACE,
                username,
                account.created_at.unix_timestamp().to_string(),
            )
            .await?;

        if !created {
            return Err(StoreError::AccountAlreadyExists(username.to_string()));
        }

        Ok(account)
    }

    async fn find(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let mut conn = self.conn.clone();
        let entry: Option<String> = conn.hget(ACCOUNT_KEY_SPACE, username).await?;

        entry
            .map(|created_at| account_from_entry(username, &created_at))
            .transpose()
    }

    async fn health(&self) -> HealthProbe {
        HealthProbe {
            name: "redis-accounts",
            healthy: ping(&self.conn).await,
        }
    }
}

#[async_trait]
impl ShareCodeStore for RedisAccounts {
    async fn share(&self, account: &Account) -> Result<ShareCode, StoreError> {
        let code = ShareCode::generate();
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                share_key(&code),
                account.username.as_str(),
                self.share_ttl.as_secs(),
            )
            .await?;

        Ok(code)
    }

    async fn shared(&self, code: &ShareCode) -> Result<Option<Account>, StoreError> {
        let mut conn = self.conn.clone();
        let username: Option<String> = conn.get(share_key(code)).await?;

        match username {
            // A dangling code whose account vanished resolves to invalid
            Some(username) => self.find(&username).await,
            None => Ok(None),
        }
    }

    async fn revoke(&self, code: &ShareCode) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(share_key(code)).await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct RedisDevices {
    conn: ConnectionManager,
}

impl RedisDevices {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DeviceStore for RedisDevices {
    async fn add_device(
        &self,
        account: &Account,
        device_id: DeviceId,
        secret: &str,
    ) -> Result<Device, StoreError> {
        let hashed = hash_secret(secret);
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(device_key(account), device_id.to_string(), &hashed)
            .await?;

        Ok(Device::new(device_id, hashed))
    }

    async fn get_device(
        &self,
        account: &Account,
        device_id: DeviceId,
    ) -> Result<Option<Device>, StoreError> {
        let mut conn = self.conn.clone();
        let digest: Option<String> = conn
            .hget(device_key(account), device_id.to_string())
            .await?;

        Ok(digest.map(|digest| Device::new(device_id, digest)))
    }

    async fn get_devices(
        &self,
        account: &Account,
    ) -> Result<HashMap<DeviceId, Device>, StoreError> {
        let mut conn = self.conn.clone();
        let entries: HashMap<String, String> = conn.hgetall(device_key(account)).await?;

        let mut devices = HashMap::with_capacity(entries.len());
        for (id, digest) in entries {
            let device_id = DeviceId::parse(&id).map_err(|_| {
                StoreError::Unavailable(format!("corrupt device id {id} in store"))
            })?;
            devices.insert(device_id, Device::new(device_id, digest));
        }

        Ok(devices)
    }

    async fn delete_device(
        &self,
        account: &Account,
        device_id: DeviceId,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hdel(device_key(account), device_id.to_string())
            .await?;

        Ok(())
    }

    async fn health(&self) -> HealthProbe {
        HealthProbe {
            name: "redis-devices",
            healthy: ping(&self.conn).await,
        }
    }
}

#[derive(Clone)]
pub struct RedisModules {
    conn: ConnectionManager,
    ttl: Option<Duration>,
}

impl RedisModules {
    pub fn new(conn: ConnectionManager, ttl: Option<Duration>) -> Self {
        Self { conn, ttl }
    }
}

#[async_trait]
impl ModuleStore for RedisModules {
    async fn set(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        match self.ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(key, data, ttl.as_secs()).await?;
            }
            None => {
                let _: () = conn.set(key, data).await?;
            }
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        let data: Option<Vec<u8>> = conn.get(key).await?;

        Ok(data)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;

        if !keys.is_empty() {
            let _: () = conn.del(keys).await?;
        }

        Ok(())
    }

    async fn health(&self) -> HealthProbe {
        HealthProbe {
            name: "redis-modules",
            healthy: ping(&self.conn).await,
        }
    }
}
