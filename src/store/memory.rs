//! In-memory proxy store for tests and database-less embedding.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::Result;
use crate::models::{NewProxy, ProxyRecord, ProxyUpdate};
use crate::store::ProxyStore;

#[derive(Default)]
struct Inner {
    rows: BTreeMap<i64, ProxyRecord>,
    next_id: i64,
}

/// Non-durable `ProxyStore` backed by a `BTreeMap` (id-ordered iteration)
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProxyStore for MemoryStore {
    async fn create(&self, proxy: NewProxy) -> Result<ProxyRecord> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = inner.next_id;

        let now = Utc::now();
        let record = ProxyRecord {
            id,
            host: proxy.host,
            port: proxy.port,
            protocol: proxy.protocol,
            username: proxy.username,
            password_encrypted: proxy.password_encrypted,
            is_active: true,
            success_count: 0,
            fail_count: 0,
            latency_ms: None,
            last_tested_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ProxyRecord>> {
        Ok(self.inner.read().rows.get(&id).cloned())
    }

    async fn get_by_host_port(&self, host: &str, port: u16) -> Result<Option<ProxyRecord>> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .find(|r| r.host == host && r.port == port)
            .cloned())
    }

    async fn list_active(&self, limit: i64) -> Result<Vec<ProxyRecord>> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .filter(|r| r.is_active)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_all(
        &self,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProxyRecord>> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .filter(|r| is_active.map_or(true, |flag| r.is_active == flag))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, changes: &ProxyUpdate) -> Result<Option<ProxyRecord>> {
        let mut inner = self.inner.write();
        let Some(record) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(ref host) = changes.host {
            record.host = host.clone();
        }
        if let Some(port) = changes.port {
            record.port = port;
        }
        if let Some(protocol) = changes.protocol {
            record.protocol = protocol;
        }
        if let Some(ref creds) = changes.credentials {
            record.username = Some(creds.username.clone());
            record.password_encrypted = Some(creds.password_encrypted.clone());
        }
        if let Some(is_active) = changes.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Utc::now();

        Ok(Some(record.clone()))
    }

    async fn update_stats(
        &self,
        id: i64,
        success: bool,
        latency_ms: Option<i32>,
    ) -> Result<Option<ProxyRecord>> {
        let mut inner = self.inner.write();
        let Some(record) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };

        if success {
            record.success_count += 1;
        } else {
            record.fail_count += 1;
        }
        if let Some(latency) = latency_ms {
            record.latency_ms = Some(latency);
        }
        let now = Utc::now();
        record.last_tested_at = Some(now);
        record.updated_at = now;

        Ok(Some(record.clone()))
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let mut inner = self.inner.write();
        let Some(record) = inner.rows.get_mut(&id) else {
            return Ok(false);
        };
        record.is_active = is_active;
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.inner.write().rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyProtocol;

    fn new_proxy(host: &str, port: u16) -> NewProxy {
        NewProxy {
            host: host.to_string(),
            port,
            protocol: ProxyProtocol::Socks5,
            username: None,
            password_encrypted: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.create(new_proxy("10.0.0.1", 1080)).await.unwrap();
        let b = store.create(new_proxy("10.0.0.2", 1080)).await.unwrap();

        assert!(b.id > a.id);
        assert!(a.is_active);
        assert_eq!(a.success_count, 0);
        assert_eq!(a.fail_count, 0);
    }

    #[tokio::test]
    async fn test_get_by_host_port() {
        let store = MemoryStore::new();
        let created = store.create(new_proxy("10.0.0.1", 1080)).await.unwrap();

        let found = store.get_by_host_port("10.0.0.1", 1080).await.unwrap();
        assert_eq!(found.unwrap().id, created.id);

        assert!(store
            .get_by_host_port("10.0.0.1", 1081)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_active_is_ordered_and_filtered() {
        let store = MemoryStore::new();
        let a = store.create(new_proxy("10.0.0.1", 1080)).await.unwrap();
        let b = store.create(new_proxy("10.0.0.2", 1080)).await.unwrap();
        let c = store.create(new_proxy("10.0.0.3", 1080)).await.unwrap();

        store.set_active(b.id, false).await.unwrap();

        let active = store.list_active(100).await.unwrap();
        let ids: Vec<i64> = active.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn test_list_all_with_filter_and_pagination() {
        let store = MemoryStore::new();
        for i in 1..=5 {
            store
                .create(new_proxy(&format!("10.0.0.{}", i), 1080))
                .await
                .unwrap();
        }
        store.set_active(2, false).await.unwrap();

        let all = store.list_all(None, 100, 0).await.unwrap();
        assert_eq!(all.len(), 5);

        let inactive = store.list_all(Some(false), 100, 0).await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, 2);

        let page = store.list_all(None, 2, 2).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_update_stats_increments_and_stamps() {
        let store = MemoryStore::new();
        let created = store.create(new_proxy("10.0.0.1", 1080)).await.unwrap();

        let after = store
            .update_stats(created.id, true, Some(42))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.success_count, 1);
        assert_eq!(after.fail_count, 0);
        assert_eq!(after.latency_ms, Some(42));
        assert!(after.last_tested_at.is_some());

        let after = store
            .update_stats(created.id, false, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.success_count, 1);
        assert_eq!(after.fail_count, 1);
        // Latency from the last successful probe is retained
        assert_eq!(after.latency_ms, Some(42));

        assert!(store.update_stats(999, true, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let store = MemoryStore::new();
        let created = store.create(new_proxy("10.0.0.1", 1080)).await.unwrap();

        let changes = ProxyUpdate {
            port: Some(3128),
            protocol: Some(ProxyProtocol::Http),
            ..Default::default()
        };
        let updated = store.update(created.id, &changes).await.unwrap().unwrap();

        assert_eq!(updated.host, "10.0.0.1");
        assert_eq!(updated.port, 3128);
        assert_eq!(updated.protocol, ProxyProtocol::Http);

        assert!(store.update(999, &changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let created = store.create(new_proxy("10.0.0.1", 1080)).await.unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.get_by_id(created.id).await.unwrap().is_none());
    }
}
