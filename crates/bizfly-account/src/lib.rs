//! Account and identity operations for Bizfly Cloud.
//!
//! Provides the region list, the current user's profile and explicit token
//! management on top of a shared [`bizfly_core::Client`].

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{Account, TokenService};
pub use models::{Region, RegionMap, UserInfo, Zone};

/// Convenient result alias sharing the `bizfly-core` error type.
pub type Result<T> = bizfly_core::Result<T>;
