//! Repository registration.
//!
//! Applications usually hold one connection and one repository per entity type. This
//! module provides the token under which a repository is registered, an explicit
//! side-table from collection name to [`EntityConfig`], and a registry that builds and
//! hands out repositories on a shared connection.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    config::{EntityConfig, SchemaDescription},
    connection::StoreConnection,
    error::RepositoryResult,
    repository::Repository,
    validate::DocumentValidator,
};

/// Suffix appended to the collection name to form a repository token.
pub const TOKEN_SUFFIX: &str = "@MongoDbRepo";

/// The registration token of the repository for `store_name`.
pub fn repository_token(store_name: &str) -> String {
    format!("{store_name}{TOKEN_SUFFIX}")
}

/// Explicit mapping from collection name to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    configs: BTreeMap<String, Arc<EntityConfig>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `config`, returning the configuration it replaced.
    pub fn register(&mut self, config: EntityConfig) -> Option<Arc<EntityConfig>> {
        self.configs
            .insert(config.store_name().to_string(), Arc::new(config))
    }

    pub fn get(&self, store_name: &str) -> Option<Arc<EntityConfig>> {
        self.configs.get(store_name).cloned()
    }

    /// Resolves a repository token back to its configuration.
    pub fn get_by_token(&self, token: &str) -> Option<Arc<EntityConfig>> {
        token
            .strip_suffix(TOKEN_SUFFIX)
            .and_then(|store_name| self.get(store_name))
    }

    pub fn store_names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl FromIterator<EntityConfig> for ConfigRegistry {
    fn from_iter<I: IntoIterator<Item = EntityConfig>>(iter: I) -> Self {
        let mut registry = Self::new();
        for config in iter {
            registry.register(config);
        }
        registry
    }
}

/// One repository per token, all sharing one connection.
pub struct RepositoryRegistry<C: StoreConnection + ?Sized> {
    connection: Arc<C>,
    repositories: BTreeMap<String, Arc<Repository<C>>>,
}

impl<C: StoreConnection + ?Sized> RepositoryRegistry<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self { connection, repositories: BTreeMap::new() }
    }

    /// Builds a registry with a repository for each configuration.
    pub fn for_configs<I>(connection: Arc<C>, configs: I) -> Self
    where
        I: IntoIterator<Item = EntityConfig>,
    {
        let mut registry = Self::new(connection);
        for config in configs {
            registry.register(config);
        }
        registry
    }

    /// Builds a registry with a validating repository for each schema.
    ///
    /// # Errors
    ///
    /// Fails on the first schema whose description is missing or malformed.
    pub fn for_schemas<S, I>(connection: Arc<C>, schemas: I) -> RepositoryResult<Self>
    where
        S: SchemaDescription + DocumentValidator + 'static,
        I: IntoIterator<Item = Arc<S>>,
    {
        let mut registry = Self::new(connection);
        for schema in schemas {
            registry.register_schema(schema)?;
        }
        Ok(registry)
    }

    /// Builds and registers a repository for `config`, replacing any previous one with
    /// the same token.
    pub fn register(&mut self, config: EntityConfig) -> Arc<Repository<C>> {
        self.insert(Repository::new(config, Arc::clone(&self.connection)))
    }

    /// Builds and registers a validating repository for `schema`.
    pub fn register_schema<S>(&mut self, schema: Arc<S>) -> RepositoryResult<Arc<Repository<C>>>
    where
        S: SchemaDescription + DocumentValidator + 'static,
    {
        let repository = Repository::for_schema(schema, Arc::clone(&self.connection))?;
        Ok(self.insert(repository))
    }

    fn insert(&mut self, repository: Repository<C>) -> Arc<Repository<C>> {
        let repository = Arc::new(repository);
        self.repositories
            .insert(repository.token(), Arc::clone(&repository));
        repository
    }

    /// Looks a repository up by token.
    pub fn get(&self, token: &str) -> Option<Arc<Repository<C>>> {
        self.repositories.get(token).cloned()
    }

    /// Looks a repository up by collection name.
    pub fn repository(&self, store_name: &str) -> Option<Arc<Repository<C>>> {
        self.get(&repository_token(store_name))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}
