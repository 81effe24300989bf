//! # bizfly-core
//!
//! Authentication, endpoint selection and the request pipeline shared by
//! every Bizfly Cloud service crate.
//!
//! ## Modules
//!
//! - [`client`] - The [`Client`], its builder, transport settings and retry policy
//! - [`credentials`] - Authentication modes and the shared credential state
//! - [`token`] - Token issuance with single-flight refresh
//! - [`catalog`] - Service catalog and per-region endpoint resolution
//! - [`request`] - Request descriptions, header composition and URL building
//! - [`executor`] - HTTP execution with bounded retries
//! - [`context`] - Cancellation and deadlines for calls
//! - [`config`] - Serializable client configuration
//! - [`error`] - Error types and HTTP status code mapping
//!
//! ## Example
//!
//! ```no_run
//! use bizfly_core::{Client, Context, RequestSpec, ServiceName};
//!
//! # async fn run() -> bizfly_core::Result<()> {
//! let client = Client::builder()
//!     .with_password("ops@example.com", "secret")
//!     .with_region("HN")
//!     .build()?;
//!
//! let ctx = Context::new();
//! let volumes: serde_json::Value = client
//!     .call(&ctx, RequestSpec::get(ServiceName::CloudServer, "/volumes"))
//!     .await?;
//! # let _ = volumes;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod client;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod query;
pub mod request;
pub mod response;
pub mod token;
pub mod types;

// Re-export commonly used types
pub use catalog::{ServiceCatalog, ServiceEntry};
pub use client::{Client, ClientBuilder, HttpConfig, RetryPolicy};
pub use config::CloudConfig;
pub use context::Context;
pub use credentials::{AuthMethod, IssuedToken};
pub use error::{Error, ErrorKind, Result};
pub use query::{ListOptions, QueryParams};
pub use request::{path_segment, RequestSpec};
pub use types::ServiceName;
