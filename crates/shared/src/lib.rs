//! syncd Shared Types and Utilities
//!
//! This crate contains types and utilities shared across syncd.

pub mod redis;
pub mod types;

pub use types::*;
