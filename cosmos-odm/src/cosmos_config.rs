use crate::errors::{CosmosError, CosmosResult, ErrorKind};
use std::time::Duration;

pub const ENV_URI: &str = "COSMOS_URI";
pub const ENV_KEY: &str = "COSMOS_KEY";
pub const ENV_DATABASE: &str = "COSMOS_DATABASE";

/// How the client talks to the service. Passed through to the client unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    #[default]
    Gateway,
    Direct,
}

/// Read consistency requested from the service. Passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyLevel {
    Strong,
    BoundedStaleness,
    #[default]
    Session,
    ConsistentPrefix,
    Eventual,
}

/// Transport settings of the document client.
///
/// None of these values are interpreted by this crate; they are handed to
/// the [`DocumentClient`](crate::client::DocumentClient) as configured.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPolicy {
    pub connection_mode: ConnectionMode,
    pub request_timeout: Duration,
    pub max_pool_size: usize,
    pub max_retry_attempts_on_throttled_requests: u32,
    pub max_retry_wait_time: Duration,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        ConnectionPolicy {
            connection_mode: ConnectionMode::Gateway,
            request_timeout: Duration::from_secs(60),
            max_pool_size: 1000,
            max_retry_attempts_on_throttled_requests: 9,
            max_retry_wait_time: Duration::from_secs(30),
        }
    }
}

/// Account, database and transport configuration.
///
/// # Examples
///
/// ```rust
/// use cosmos_odm::cosmos_config::{CosmosConfig, ConsistencyLevel};
///
/// let config = CosmosConfig::builder()
///     .uri("https://localhost:8081")
///     .key("secret")
///     .database("people_db")
///     .consistency_level(ConsistencyLevel::Eventual)
///     .build()
///     .unwrap();
/// assert_eq!(config.database(), "people_db");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CosmosConfig {
    uri: String,
    key: String,
    database: String,
    connection_policy: ConnectionPolicy,
    consistency_level: ConsistencyLevel,
    populate_query_metrics: bool,
}

impl CosmosConfig {
    pub fn builder() -> CosmosConfigBuilder {
        CosmosConfigBuilder::new()
    }

    /// Reads `COSMOS_URI`, `COSMOS_KEY` and `COSMOS_DATABASE` from the environment.
    pub fn from_env() -> CosmosResult<CosmosConfig> {
        let read = |name: &str| -> CosmosResult<String> {
            std::env::var(name).map_err(|_| {
                log::error!("Environment variable {} is not set", name);
                CosmosError::new(
                    &format!("Environment variable {} is not set", name),
                    ErrorKind::InvalidConfiguration,
                )
            })
        };

        CosmosConfig::builder()
            .uri(&read(ENV_URI)?)
            .key(&read(ENV_KEY)?)
            .database(&read(ENV_DATABASE)?)
            .build()
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn connection_policy(&self) -> &ConnectionPolicy {
        &self.connection_policy
    }

    pub fn consistency_level(&self) -> ConsistencyLevel {
        self.consistency_level
    }

    pub fn populate_query_metrics(&self) -> bool {
        self.populate_query_metrics
    }
}

/// Builder for [`CosmosConfig`].
///
/// Follows the fluent style where the first validation error is captured
/// and reported by [`build`](CosmosConfigBuilder::build).
#[derive(Debug, Default)]
pub struct CosmosConfigBuilder {
    error: Option<CosmosError>,
    uri: Option<String>,
    key: Option<String>,
    database: Option<String>,
    connection_policy: ConnectionPolicy,
    consistency_level: ConsistencyLevel,
    populate_query_metrics: bool,
}

impl CosmosConfigBuilder {
    pub fn new() -> Self {
        CosmosConfigBuilder::default()
    }

    pub fn uri(mut self, uri: &str) -> Self {
        if self.error.is_none() {
            match non_empty("uri", uri) {
                Ok(uri) => self.uri = Some(uri),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        if self.error.is_none() {
            match non_empty("key", key) {
                Ok(key) => self.key = Some(key),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        if self.error.is_none() {
            match non_empty("database", database) {
                Ok(database) => self.database = Some(database),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    pub fn connection_policy(mut self, connection_policy: ConnectionPolicy) -> Self {
        self.connection_policy = connection_policy;
        self
    }

    pub fn consistency_level(mut self, consistency_level: ConsistencyLevel) -> Self {
        self.consistency_level = consistency_level;
        self
    }

    pub fn populate_query_metrics(mut self, populate_query_metrics: bool) -> Self {
        self.populate_query_metrics = populate_query_metrics;
        self
    }

    pub fn build(self) -> CosmosResult<CosmosConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }

        Ok(CosmosConfig {
            uri: required("uri", self.uri)?,
            key: required("key", self.key)?,
            database: required("database", self.database)?,
            connection_policy: self.connection_policy,
            consistency_level: self.consistency_level,
            populate_query_metrics: self.populate_query_metrics,
        })
    }
}

fn non_empty(name: &str, value: &str) -> CosmosResult<String> {
    let value = value.trim();
    if value.is_empty() {
        log::error!("Configuration value '{}' cannot be empty", name);
        return Err(CosmosError::new(
            &format!("Configuration value '{}' cannot be empty", name),
            ErrorKind::InvalidConfiguration,
        ));
    }
    Ok(value.to_string())
}

fn required(name: &str, value: Option<String>) -> CosmosResult<String> {
    value.ok_or_else(|| {
        log::error!("Configuration value '{}' is required", name);
        CosmosError::new(
            &format!("Configuration value '{}' is required", name),
            ErrorKind::InvalidConfiguration,
        )
    })
}
