//! Postgres-backed proxy store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::info;

use crate::error::{PoolError, Result};
use crate::models::{NewProxy, ProxyProtocol, ProxyRecord, ProxyUpdate};
use crate::store::ProxyStore;

const COLUMNS: &str = "id, host, port, protocol, username, password_encrypted, is_active, \
                       success_count, fail_count, latency_ms, last_tested_at, \
                       created_at, updated_at";

/// Raw database row; protocol and port are validated on conversion
#[derive(FromRow)]
struct ProxyRow {
    id: i64,
    host: String,
    port: i32,
    protocol: String,
    username: Option<String>,
    password_encrypted: Option<Vec<u8>>,
    is_active: bool,
    success_count: i64,
    fail_count: i64,
    latency_ms: Option<i32>,
    last_tested_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProxyRow> for ProxyRecord {
    type Error = PoolError;

    fn try_from(row: ProxyRow) -> Result<Self> {
        let protocol = ProxyProtocol::from_str(&row.protocol)
            .ok_or_else(|| PoolError::UnsupportedProtocol(row.protocol.clone()))?;

        Ok(ProxyRecord {
            id: row.id,
            host: row.host,
            port: row.port as u16,
            protocol,
            username: row.username,
            password_encrypted: row.password_encrypted,
            is_active: row.is_active,
            success_count: row.success_count,
            fail_count: row.fail_count,
            latency_ms: row.latency_ms,
            last_tested_at: row.last_tested_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn rows_to_records(rows: Vec<ProxyRow>) -> Result<Vec<ProxyRecord>> {
    rows.into_iter().map(ProxyRecord::try_from).collect()
}

/// Durable `ProxyStore` on Postgres
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the pool options used across the system
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(30 * 60))
            .connect(database_url)
            .await
            .map_err(|e| PoolError::DatabaseConnection(e.to_string()))?;

        info!("Proxy store connection pool established");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply any pending schema migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for (version, name, sql) in MIGRATIONS {
            let applied = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM schema_migrations WHERE version = $1",
            )
            .bind(version)
            .fetch_one(&self.pool)
            .await?;

            if applied == 0 {
                info!(version = version, name = name, "Applying migration");
                sqlx::query(sql).execute(&self.pool).await?;
                sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
                    .bind(version)
                    .bind(name)
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ProxyStore for PostgresStore {
    async fn create(&self, proxy: NewProxy) -> Result<ProxyRecord> {
        let row = sqlx::query_as::<_, ProxyRow>(&format!(
            r#"
            INSERT INTO proxies (host, port, protocol, username, password_encrypted)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&proxy.host)
        .bind(proxy.port as i32)
        .bind(proxy.protocol.as_str())
        .bind(&proxy.username)
        .bind(&proxy.password_encrypted)
        .fetch_one(&self.pool)
        .await?;

        let record = ProxyRecord::try_from(row)?;
        info!(id = record.id, addr = %record.addr(), "Created proxy");
        Ok(record)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ProxyRecord>> {
        let row = sqlx::query_as::<_, ProxyRow>(&format!(
            "SELECT {COLUMNS} FROM proxies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProxyRecord::try_from).transpose()
    }

    async fn get_by_host_port(&self, host: &str, port: u16) -> Result<Option<ProxyRecord>> {
        let row = sqlx::query_as::<_, ProxyRow>(&format!(
            "SELECT {COLUMNS} FROM proxies WHERE host = $1 AND port = $2"
        ))
        .bind(host)
        .bind(port as i32)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProxyRecord::try_from).transpose()
    }

    async fn list_active(&self, limit: i64) -> Result<Vec<ProxyRecord>> {
        let rows = sqlx::query_as::<_, ProxyRow>(&format!(
            "SELECT {COLUMNS} FROM proxies WHERE is_active ORDER BY id ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows_to_records(rows)
    }

    async fn list_all(
        &self,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProxyRecord>> {
        let rows = match is_active {
            Some(flag) => {
                sqlx::query_as::<_, ProxyRow>(&format!(
                    "SELECT {COLUMNS} FROM proxies WHERE is_active = $1 \
                     ORDER BY id ASC LIMIT $2 OFFSET $3"
                ))
                .bind(flag)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProxyRow>(&format!(
                    "SELECT {COLUMNS} FROM proxies ORDER BY id ASC LIMIT $1 OFFSET $2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows_to_records(rows)
    }

    async fn update(&self, id: i64, changes: &ProxyUpdate) -> Result<Option<ProxyRecord>> {
        let current = match self.get_by_id(id).await? {
            Some(record) => record,
            None => return Ok(None),
        };

        let host = changes.host.as_ref().unwrap_or(&current.host);
        let port = changes.port.unwrap_or(current.port);
        let protocol = changes.protocol.unwrap_or(current.protocol);
        let (username, password_encrypted) = match &changes.credentials {
            Some(creds) => (
                Some(creds.username.clone()),
                Some(creds.password_encrypted.clone()),
            ),
            None => (current.username.clone(), current.password_encrypted.clone()),
        };
        let is_active = changes.is_active.unwrap_or(current.is_active);

        let row = sqlx::query_as::<_, ProxyRow>(&format!(
            r#"
            UPDATE proxies
            SET host = $2,
                port = $3,
                protocol = $4,
                username = $5,
                password_encrypted = $6,
                is_active = $7
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(host)
        .bind(port as i32)
        .bind(protocol.as_str())
        .bind(&username)
        .bind(&password_encrypted)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProxyRecord::try_from).transpose()
    }

    async fn update_stats(
        &self,
        id: i64,
        success: bool,
        latency_ms: Option<i32>,
    ) -> Result<Option<ProxyRecord>> {
        let row = sqlx::query_as::<_, ProxyRow>(&format!(
            r#"
            UPDATE proxies
            SET success_count = success_count + CASE WHEN $2 THEN 1 ELSE 0 END,
                fail_count = fail_count + CASE WHEN $2 THEN 0 ELSE 1 END,
                latency_ms = COALESCE($3, latency_ms),
                last_tested_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(success)
        .bind(latency_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProxyRecord::try_from).transpose()
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE proxies SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM proxies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(id = id, "Deleted proxy");
        }

        Ok(deleted)
    }
}

const MIGRATIONS: &[(i32, &str, &str)] = &[(1, "initial_schema", MIGRATION_001_INITIAL_SCHEMA)];

const MIGRATION_001_INITIAL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS proxies (
    id BIGSERIAL PRIMARY KEY,
    host VARCHAR(255) NOT NULL,
    port INTEGER NOT NULL,
    protocol VARCHAR(20) NOT NULL DEFAULT 'socks5',
    username VARCHAR(255),
    password_encrypted BYTEA,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    success_count BIGINT NOT NULL DEFAULT 0,
    fail_count BIGINT NOT NULL DEFAULT 0,
    latency_ms INTEGER,
    last_tested_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT unique_proxy_host_port UNIQUE (host, port)
);

CREATE INDEX IF NOT EXISTS idx_proxies_is_active ON proxies(is_active);

CREATE OR REPLACE FUNCTION update_updated_at_column()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ language 'plpgsql';

DROP TRIGGER IF EXISTS update_proxies_updated_at ON proxies;
CREATE TRIGGER update_proxies_updated_at
    BEFORE UPDATE ON proxies
    FOR EACH ROW
    EXECUTE FUNCTION update_updated_at_column();
"#;
