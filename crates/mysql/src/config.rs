//! MySQL configuration.

use etl_core::{Error, Result};
use mysql_async::{Opts, OptsBuilder, PoolConstraints, PoolOpts};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// MySQL connection configuration, used for both the source orders
/// database and the warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MySqlConfig {
    /// Server URL, e.g. `mysql://db:3306`
    #[validate(length(min = 1))]
    pub url: String,
    /// Database name
    #[validate(length(min = 1))]
    pub database: String,
    /// Username (optional, overrides any user in the URL)
    #[serde(default)]
    pub username: Option<String>,
    /// Password (optional, overrides any password in the URL)
    #[serde(default)]
    pub password: Option<String>,
    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    #[validate(range(min = 1, max = 256))]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    8
}

impl MySqlConfig {
    /// The orders database the dimensions are extracted from.
    pub fn source_default() -> Self {
        Self {
            url: "mysql://db:3306".to_string(),
            database: "ordersdb".to_string(),
            username: Some("root".to_string()),
            password: None,
            pool_size: default_pool_size(),
        }
    }

    /// The warehouse the star schema is exported to.
    pub fn warehouse_default() -> Self {
        Self {
            database: "datawarehouse".to_string(),
            ..Self::source_default()
        }
    }

    /// URL with any embedded password masked, safe for logs.
    pub fn redacted_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("****"));
                }
                parsed.to_string()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }

    /// Builds driver options from this configuration.
    pub fn opts(&self) -> Result<Opts> {
        let base = Opts::from_url(&self.url).map_err(|e| {
            Error::configuration(format!("invalid MySQL url {}: {}", self.redacted_url(), e))
        })?;

        let constraints = PoolConstraints::new(0, self.pool_size)
            .ok_or_else(|| Error::configuration("pool_size must be at least 1"))?;

        let mut builder = OptsBuilder::from_opts(base)
            .db_name(Some(self.database.clone()))
            .pool_opts(PoolOpts::default().with_constraints(constraints));

        if let Some(ref user) = self.username {
            builder = builder.user(Some(user.clone()));
        }

        if let Some(ref pass) = self.password {
            builder = builder.pass(Some(pass.clone()));
        }

        Ok(builder.into())
    }
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self::source_default()
    }
}
