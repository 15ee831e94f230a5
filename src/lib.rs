//! rondo: a proxy pool manager.
//!
//! Maintains a persistent pool of upstream proxies (SOCKS5 by default),
//! probes their liveness and latency against public test endpoints, rotates
//! active proxies round-robin or at random, and quarantines proxies whose
//! failure rate crosses the configured threshold.
//!
//! [`ProxyPoolManager`] is the entry point; everything else is the plumbing
//! behind it.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rondo::{PoolConfig, ProxyPoolManager};
//! use rondo::store::PostgresStore;
//! use rondo::vault::PassthroughVault;
//!
//! # async fn run() -> rondo::Result<()> {
//! let config = PoolConfig::from_env()?;
//! let store = PostgresStore::connect("postgres://localhost/rondo", 5).await?;
//! store.run_migrations().await?;
//!
//! let manager = ProxyPoolManager::new(Arc::new(store), Arc::new(PassthroughVault), config);
//! manager.add("203.0.113.7:1080:user:pass").await?;
//! let proxy = manager.next().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod models;
pub mod parse;
pub mod policy;
pub mod probe;
pub mod rotation;
pub mod store;
pub mod vault;

pub use config::PoolConfig;
pub use error::{PoolError, Result};
pub use manager::{ProxyPoolManager, ProxyUpdateRequest};
pub use models::{ProbeResult, ProxyProtocol, ProxyRecord, ProxyStats};
