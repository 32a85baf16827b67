use crate::client::{DocumentClientRef, InMemoryDocumentClient};
use crate::cosmos_config::CosmosConfig;
use crate::errors::CosmosResult;
use crate::operations::{CosmosTemplate, ReactiveCosmosTemplate};
use std::sync::Arc;

/// Pairs a [`CosmosConfig`] with a document client and hands out templates.
///
/// # Examples
///
/// ```rust
/// use cosmos_odm::cosmos_config::CosmosConfig;
/// use cosmos_odm::cosmos_factory::CosmosFactory;
///
/// let config = CosmosConfig::builder()
///     .uri("memory://local")
///     .key("unused")
///     .database("people_db")
///     .build()
///     .unwrap();
/// let factory = CosmosFactory::in_memory(config);
/// let template = factory.template().unwrap();
/// assert_eq!(template.database_name(), "people_db");
/// ```
#[derive(Clone)]
pub struct CosmosFactory {
    config: CosmosConfig,
    client: DocumentClientRef,
}

impl CosmosFactory {
    pub fn new(config: CosmosConfig, client: DocumentClientRef) -> Self {
        CosmosFactory { config, client }
    }

    /// Factory backed by an [`InMemoryDocumentClient`] carrying the
    /// transport settings of `config`.
    pub fn in_memory(config: CosmosConfig) -> Self {
        let client = Arc::new(InMemoryDocumentClient::from_config(&config));
        CosmosFactory::new(config, client)
    }

    pub fn config(&self) -> &CosmosConfig {
        &self.config
    }

    pub fn client(&self) -> DocumentClientRef {
        self.client.clone()
    }

    pub fn database(&self) -> &str {
        self.config.database()
    }

    /// Template bound to the configured database.
    pub fn template(&self) -> CosmosResult<CosmosTemplate> {
        log::debug!("Creating template for database {}", self.config.database());
        CosmosTemplate::new_with_metrics(
            self.client.clone(),
            self.config.database(),
            self.config.populate_query_metrics(),
        )
    }

    pub fn reactive_template(&self) -> CosmosResult<ReactiveCosmosTemplate> {
        Ok(ReactiveCosmosTemplate::new(self.template()?))
    }
}
