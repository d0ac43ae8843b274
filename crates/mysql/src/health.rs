//! MySQL health checks.

use crate::client::MySqlClient;
use mysql_async::prelude::*;
use tracing::{debug, error};

/// Check MySQL connection health.
pub async fn check_connection(client: &MySqlClient) -> bool {
    let mut conn = match client.conn().await {
        Ok(conn) => conn,
        Err(e) => {
            error!(database = %client.config().database, "MySQL health check failed: {}", e);
            return false;
        }
    };

    match conn.query_first::<u8, _>("SELECT 1").await {
        Ok(Some(1)) => {
            debug!(database = %client.config().database, "MySQL connection healthy");
            true
        }
        Ok(_) => {
            error!(database = %client.config().database, "MySQL health check returned no row");
            false
        }
        Err(e) => {
            error!(database = %client.config().database, "MySQL health check failed: {}", e);
            false
        }
    }
}
