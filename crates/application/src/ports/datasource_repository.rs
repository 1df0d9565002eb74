//! Datasource inventory port

use std::sync::Arc;

use async_trait::async_trait;

use varscope_domain::DatasourceResource;

use super::RepositoryError;

/// Provider of the datasource inventory.
#[async_trait]
pub trait DatasourceRepository: Send + Sync {
    /// Lists every datasource, global and per project.
    async fn list_all(&self) -> Result<Vec<DatasourceResource>, RepositoryError>;
}

#[async_trait]
impl<T: DatasourceRepository + ?Sized> DatasourceRepository for Arc<T> {
    async fn list_all(&self) -> Result<Vec<DatasourceResource>, RepositoryError> {
        (**self).list_all().await
    }
}
