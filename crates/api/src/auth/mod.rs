//! Authentication module for syncd

pub mod basic;
pub mod generate;
pub mod middleware;
pub mod secret;

pub use basic::Credentials;
pub use generate::{generate_secret, generate_username};
pub use middleware::{require_device_auth, AuthContext};
pub use secret::{hash_secret, verify_secret};
