use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool::managed::{self, Metrics as RecycleMetrics, RecycleResult};
use gateway_db_common::{
    CloseOutcome, DatabaseDescriptor, DbError, DbPool, GetPoolState, PoolState, PooledConnection,
    SchemaSnapshot,
};
use rustls::{ClientConfig, RootCertStore};
use tokio_postgres::{Client, Config, NoTls};
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::{db::PgDb, introspect};

/// `deadpool::managed::Manager` for plain `tokio_postgres::Client`s. Mirrors
/// the reference project's `AsyncDieselConnectionManager` role: owns how a
/// connection is established and how it's health-checked before reuse.
pub(crate) struct PgConnectionManager {
    config: Config,
    tls: Option<MakeRustlsConnect>,
}

pub(crate) type PooledClient = managed::Object<PgConnectionManager>;

#[async_trait]
impl managed::Manager for PgConnectionManager {
    type Type = Client;
    type Error = DbError;

    async fn create(&self) -> Result<Client, DbError> {
        let client = match &self.tls {
            Some(tls) => {
                let (client, conn) = self
                    .config
                    .connect(tls.clone())
                    .await
                    .map_err(|e| DbError::connect_failed(e.to_string()))?;
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        warn!("postgres connection task ended"; "error" => %e);
                    }
                });
                client
            }
            None => {
                let (client, conn) = self
                    .config
                    .connect(NoTls)
                    .await
                    .map_err(|e| DbError::connect_failed(e.to_string()))?;
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        warn!("postgres connection task ended"; "error" => %e);
                    }
                });
                client
            }
        };
        Ok(client)
    }

    async fn recycle(&self, client: &mut Client, _: &RecycleMetrics) -> RecycleResult<DbError> {
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| managed::RecycleError::Message(e.to_string().into()))?;
        Ok(())
    }
}

type Pool = managed::Pool<PgConnectionManager>;

#[derive(Clone)]
pub struct PgDbPool {
    pool: Pool,
    descriptor: DatabaseDescriptor,
}

impl PgDbPool {
    /// Builds a pool for `descriptor`. TLS is negotiated opportunistically:
    /// `sslmode=require`/`verify-full` in the connection URI selects rustls
    /// with the platform trust store, otherwise the connection is plaintext.
    pub fn new(descriptor: &DatabaseDescriptor) -> Result<Self, DbError> {
        let config = Config::from_str(&descriptor.connection_uri)
            .map_err(|e| DbError::connect_failed(format!("invalid postgres uri: {e}")))?;

        let wants_tls = descriptor.connection_uri.contains("sslmode=require")
            || descriptor.connection_uri.contains("sslmode=verify-full");
        let tls = if wants_tls {
            let mut roots = RootCertStore::empty();
            for cert in rustls_native_certs::load_native_certs()
                .map_err(|e| DbError::connect_failed(format!("loading trust store: {e}")))?
            {
                let _ = roots.add(cert);
            }
            let tls_config = ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
            Some(MakeRustlsConnect::new(tls_config))
        } else {
            None
        };

        let manager = PgConnectionManager { config, tls };
        let pool = Pool::builder(manager)
            .max_size(descriptor.pool_max as usize)
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(|e| DbError::internal(format!("building postgres pool: {e}")))?;

        Ok(Self {
            pool,
            descriptor: descriptor.clone(),
        })
    }
}

#[async_trait]
impl DbPool for PgDbPool {
    fn dialect(&self) -> gateway_db_common::Dialect {
        gateway_db_common::Dialect::Postgres
    }

    async fn acquire(&self, deadline: Instant) -> Result<PooledConnection, DbError> {
        let wait = deadline.saturating_duration_since(Instant::now());
        let client = tokio::time::timeout(wait, self.pool.get())
            .await
            .map_err(|_| DbError::timeout())?
            .map_err(|e| match e {
                managed::PoolError::Timeout(_) => DbError::pool_exhausted(),
                managed::PoolError::Closed => DbError::pool_closing(),
                other => DbError::connect_failed(other.to_string()),
            })?;
        Ok(PooledConnection::new(Box::new(PgDb::new(client))))
    }

    async fn introspect(&self) -> Result<SchemaSnapshot, DbError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DbError::connect_failed(e.to_string()))?;
        introspect::snapshot(&client).await
    }

    async fn close(&self, deadline: Duration) -> CloseOutcome {
        self.pool.close();
        let start = Instant::now();
        loop {
            let status = self.pool.status();
            if status.size == 0 {
                return CloseOutcome {
                    graceful: true,
                    forced_terminations: 0,
                };
            }
            if start.elapsed() >= deadline {
                return CloseOutcome {
                    graceful: false,
                    forced_terminations: status.size as u32,
                };
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl GetPoolState for PgDbPool {
    fn state(&self) -> PoolState {
        self.pool.status().into()
    }
}

impl fmt::Debug for PgDbPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgDbPool")
            .field("database", &self.descriptor.name)
            .finish()
    }
}
