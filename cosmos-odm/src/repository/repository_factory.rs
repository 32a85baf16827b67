use crate::errors::CosmosResult;
use crate::mapping::CosmosEntity;
use crate::operations::{CosmosOperations, CosmosTemplate, ReactiveCosmosTemplate};
use crate::repository::{ReactiveCosmosRepository, SimpleCosmosRepository};
use dashmap::DashSet;
use parking_lot::Mutex;
use std::sync::Arc;

/// Creates repositories bound to one template.
///
/// The container of an entity is created on the first request for its
/// repository when the entity enables auto-creation. Containers already
/// ensured by this factory are not checked again.
#[derive(Clone)]
pub struct CosmosRepositoryFactory {
    inner: Arc<RepositoryFactoryInner>,
}

impl CosmosRepositoryFactory {
    pub fn new(template: CosmosTemplate) -> Self {
        CosmosRepositoryFactory {
            inner: Arc::new(RepositoryFactoryInner {
                template,
                ensured: DashSet::new(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn template(&self) -> &CosmosTemplate {
        &self.inner.template
    }

    pub fn repository<T: CosmosEntity>(&self) -> CosmosResult<SimpleCosmosRepository<T>> {
        self.inner.ensure_container::<T>()?;
        Ok(SimpleCosmosRepository::new(self.inner.template.clone()))
    }

    /// Deletes the container of `T` with all its documents.
    pub fn destroy_repository<T: CosmosEntity>(&self) -> CosmosResult<()> {
        self.inner.destroy_container::<T>()
    }
}

/// Reactive counterpart of [`CosmosRepositoryFactory`].
#[derive(Clone)]
pub struct ReactiveCosmosRepositoryFactory {
    factory: CosmosRepositoryFactory,
    template: ReactiveCosmosTemplate,
}

impl ReactiveCosmosRepositoryFactory {
    pub fn new(template: ReactiveCosmosTemplate) -> Self {
        ReactiveCosmosRepositoryFactory {
            factory: CosmosRepositoryFactory::new(template.template().clone()),
            template,
        }
    }

    /// Container creation runs eagerly, like the synchronous factory.
    pub fn repository<T: CosmosEntity>(&self) -> CosmosResult<ReactiveCosmosRepository<T>> {
        self.factory.inner.ensure_container::<T>()?;
        Ok(ReactiveCosmosRepository::new(self.template.clone()))
    }

    pub fn destroy_repository<T: CosmosEntity>(&self) -> CosmosResult<()> {
        self.factory.destroy_repository::<T>()
    }
}

struct RepositoryFactoryInner {
    template: CosmosTemplate,
    ensured: DashSet<String>,
    lock: Mutex<()>,
}

impl RepositoryFactoryInner {
    fn ensure_container<T: CosmosEntity>(&self) -> CosmosResult<()> {
        let info = T::entity_information();
        if !info.auto_create_container() || self.ensured.contains(info.container_name()) {
            return Ok(());
        }

        let _guard = self.lock.lock();
        if self.ensured.contains(info.container_name()) {
            return Ok(());
        }
        self.template.create_container_if_not_exists(info)?;
        self.ensured.insert(info.container_name().to_string());
        Ok(())
    }

    fn destroy_container<T: CosmosEntity>(&self) -> CosmosResult<()> {
        let container = T::entity_information().container_name();
        let _guard = self.lock.lock();
        self.template.delete_container(container)?;
        self.ensured.remove(container);
        Ok(())
    }
}
