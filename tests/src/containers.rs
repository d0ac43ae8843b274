//! Testcontainer setup for MySQL.
//!
//! Set `STAR_ETL_TEST_MYSQL_URL` (e.g. `mysql://root:pw@127.0.0.1:3306`) to
//! reuse a running server instead of starting a container.

use mysql_async::prelude::*;
use mysql_store::MySqlConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

const ROOT_PASSWORD: &str = "etl-test";

static DATABASE_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Container handle for MySQL.
pub struct TestContainers {
    #[allow(dead_code)]
    mysql: Option<ContainerAsync<GenericImage>>,
    /// Server URL with root credentials, no database.
    pub mysql_url: String,
}

impl TestContainers {
    /// Start MySQL container, or attach to the configured server.
    pub async fn start() -> Self {
        if let Some(url) = std::env::var("STAR_ETL_TEST_MYSQL_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            return Self {
                mysql: None,
                mysql_url: url,
            };
        }

        let (mysql, mysql_url) = start_mysql().await;
        Self {
            mysql: Some(mysql),
            mysql_url,
        }
    }

    /// Client configuration for one database on this server.
    pub fn config(&self, database: &str) -> MySqlConfig {
        MySqlConfig {
            url: self.mysql_url.clone(),
            database: database.to_string(),
            username: None,
            password: None,
            pool_size: 4,
        }
    }

    /// Creates a fresh, uniquely named database and returns its name.
    pub async fn create_database(&self, prefix: &str) -> String {
        let name = format!(
            "{}_{}_{}",
            prefix,
            std::process::id(),
            DATABASE_SEQ.fetch_add(1, Ordering::Relaxed)
        );

        let pool = mysql_async::Pool::new(self.mysql_url.as_str());
        let mut conn = pool.get_conn().await.expect("Failed to connect to MySQL");
        conn.query_drop(format!("DROP DATABASE IF EXISTS {}", name))
            .await
            .expect("Failed to drop database");
        conn.query_drop(format!("CREATE DATABASE {}", name))
            .await
            .expect("Failed to create database");
        drop(conn);
        pool.disconnect().await.ok();

        name
    }
}

/// Start MySQL container, return container and server URL.
pub async fn start_mysql() -> (ContainerAsync<GenericImage>, String) {
    let image = GenericImage::new("mysql", "8.0")
        .with_wait_for(WaitFor::seconds(5))
        .with_exposed_port(3306.tcp())
        .with_env_var("MYSQL_ROOT_PASSWORD", ROOT_PASSWORD);

    let container = image.start().await.expect("Failed to start MySQL");

    let port = container.get_host_port_ipv4(3306).await.unwrap();
    let url = format!("mysql://root:{}@127.0.0.1:{}", ROOT_PASSWORD, port);

    // The entrypoint restarts the server once after initialisation
    wait_for_mysql(&url, Duration::from_secs(90)).await;

    (container, url)
}

/// Wait for the server to answer a query.
async fn wait_for_mysql(url: &str, timeout: Duration) {
    let start = std::time::Instant::now();

    while start.elapsed() < timeout {
        let pool = mysql_async::Pool::new(url);
        if let Ok(mut conn) = pool.get_conn().await {
            if conn.query_drop("SELECT 1").await.is_ok() {
                drop(conn);
                pool.disconnect().await.ok();
                return;
            }
        }
        pool.disconnect().await.ok();
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("MySQL at {} not ready after {:?}", url, timeout);
}
