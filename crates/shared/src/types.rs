//! Common types used across syncd

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ID Wrappers
// =============================================================================

/// Device ID wrapper.
/// Unique within one account's device set; two accounts may bind the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DeviceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque one-time share code. UUID-derived so entropy comes from the
/// random generator rather than any collision handling of our own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareCode(pub String);

impl ShareCode {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ShareCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl std::fmt::Display for ShareCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Domain Records
// =============================================================================

/// A named identity owning zero or more devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Account {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// A per-installation identity bound to exactly one account.
/// Only the digest of its secret is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// SHA-256 hex digest of the device secret.
    #[serde(skip_serializing)]
    pub hashed_secret: String,
}

impl Device {
    pub fn new(id: DeviceId, hashed_secret: impl Into<String>) -> Self {
        Self {
            id,
            hashed_secret: hashed_secret.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_parse_roundtrip() {
        let id = DeviceId::new();
        let parsed = DeviceId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_device_id_parse_rejects_garbage() {
        assert!(DeviceId::parse("not-a-uuid").is_err());
        assert!(DeviceId::parse("").is_err());
    }

    #[test]
    fn test_share_codes_are_distinct() {
        let a = ShareCode::generate();
        let b = ShareCode::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_device_serialization_hides_secret() {
        let device = Device::new(DeviceId::new(), "digest");
        let json = serde_json::to_value(&device).unwrap();
        assert!(json.get("hashed_secret").is_none());
    }
}
