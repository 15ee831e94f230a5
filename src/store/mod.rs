//! Persistence seam for proxy records.
//!
//! The manager only talks to [`ProxyStore`]; [`MemoryStore`] backs tests and
//! embedders without a database, [`PostgresStore`] is the durable option.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewProxy, ProxyRecord, ProxyUpdate};

/// Storage operations the pool manager requires
#[async_trait]
pub trait ProxyStore: Send + Sync {
    /// Insert a new record; the store assigns the id and timestamps
    async fn create(&self, proxy: NewProxy) -> Result<ProxyRecord>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ProxyRecord>>;

    async fn get_by_host_port(&self, host: &str, port: u16) -> Result<Option<ProxyRecord>>;

    /// Active records ordered by id ascending
    async fn list_active(&self, limit: i64) -> Result<Vec<ProxyRecord>>;

    /// All records ordered by id ascending, optionally filtered by is_active
    async fn list_all(
        &self,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProxyRecord>>;

    /// Apply a partial update; `None` when the record does not exist
    async fn update(&self, id: i64, changes: &ProxyUpdate) -> Result<Option<ProxyRecord>>;

    /// Fold one probe/usage outcome into the counters and return the
    /// updated record; also stamps `last_tested_at`
    async fn update_stats(
        &self,
        id: i64,
        success: bool,
        latency_ms: Option<i32>,
    ) -> Result<Option<ProxyRecord>>;

    /// Flip the active flag; `false` when the record does not exist
    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;
}
