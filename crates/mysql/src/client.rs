//! MySQL client wrapper.

use crate::config::MySqlConfig;
use etl_core::{Error, Result};
use mysql_async::{Conn, DriverError, Pool};
use tracing::info;

/// MySQL client wrapper with connection pooling.
///
/// The pool connects lazily; an unreachable server surfaces on the first
/// `conn()` call as a connection error.
#[derive(Clone)]
pub struct MySqlClient {
    pool: Pool,
    config: MySqlConfig,
}

impl MySqlClient {
    /// Creates a new MySQL client.
    pub fn new(config: MySqlConfig) -> Result<Self> {
        let pool = Pool::new(config.opts()?);

        info!(
            url = %config.redacted_url(),
            database = %config.database,
            pool_size = config.pool_size,
            "Created MySQL client"
        );

        Ok(Self { pool, config })
    }

    /// Checks a connection out of the pool. Dropping it returns it.
    pub async fn conn(&self) -> Result<Conn> {
        self.pool.get_conn().await.map_err(|e| {
            Error::connection(format!(
                "cannot connect to {}/{}: {}",
                self.config.redacted_url(),
                self.config.database,
                e
            ))
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MySqlConfig {
        &self.config
    }

    /// Closes every pooled connection.
    pub async fn disconnect(self) -> Result<()> {
        self.pool
            .disconnect()
            .await
            .map_err(|e| Error::connection(format!("failed to close pool: {}", e)))
    }
}

/// Maps a driver error raised after connecting.
///
/// I/O failures and a dropped or desynchronized connection become
/// `Connection`; anything else, including client-side parameter errors, is
/// reported through `otherwise`.
pub(crate) fn classify(err: mysql_async::Error, otherwise: impl FnOnce(String) -> Error) -> Error {
    match err {
        mysql_async::Error::Io(e) => Error::connection(e.to_string()),
        mysql_async::Error::Driver(e) if is_connection_lost(&e) => Error::connection(e.to_string()),
        other => otherwise(other.to_string()),
    }
}

fn is_connection_lost(err: &DriverError) -> bool {
    matches!(
        err,
        DriverError::ConnectionClosed
            | DriverError::PoolDisconnected
            | DriverError::PacketOutOfOrder
            | DriverError::UnexpectedPacket { .. }
    )
}
