//! # vault-bridge
//!
//! A bridging layer that gives callers one uniform API for fetching
//! secrets out of third-party vaults: AWS Secrets Manager (directly or
//! through an assumed STS role), Azure Key Vault, and IBM Cloud Secrets
//! Manager.
//!
//! ## Architecture
//!
//! The embedding HTTP server hands each request to [`SecretGateway`],
//! which runs the same pipeline regardless of provider:
//!
//! ```text
//! SecretRequest → parse reference → parse auth → acquire token
//!              → fetch secret → normalize → canonical document
//! ```
//!
//! Each provider implements the pipeline behind the
//! [`bridge::VaultBridge`] trait. Upstream tokens are cached per
//! credential set in [`cache::TokenCache`], and every failure carries a
//! stable registry code that serializes to a documented error payload.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vault_bridge::{BridgeConfig, SecretGateway, SecretRequest};
//!
//! # async fn run(request: SecretRequest) -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = SecretGateway::new(BridgeConfig::from_env())?;
//! match gateway.get_secret(&request).await {
//!     Ok(document) => println!("{document}"),
//!     Err(error_document) => eprintln!("{}", serde_json::to_string(&error_document)?),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod bridge;
pub mod bulk;
pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod service;
pub mod signing;
pub mod transport;

// Re-export commonly used types and traits
pub use config::BridgeConfig;
pub use domain::{SecretRequest, SecretString, SecretType, VaultKind};
pub use errors::{BridgeError, ErrorDocument, Result};
pub use observability::init_logging;
pub use service::SecretGateway;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
