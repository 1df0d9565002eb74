//! Variable repository port
//!
//! Defines the interface for the resource store that owns persisted
//! variables.

use std::sync::Arc;

use async_trait::async_trait;

use varscope_domain::Variable;

/// Errors that can occur during resource store operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport error talking to a remote store.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store rejected the resource.
    #[error("Invalid resource: {0}")]
    Invalid(String),
}

/// Repository trait for variable CRUD.
#[async_trait]
pub trait VariableRepository: Send + Sync {
    /// Lists every global variable.
    async fn list_global(&self) -> Result<Vec<Variable>, RepositoryError>;

    /// Lists the variables of one project.
    ///
    /// # Arguments
    /// * `project` - Project name
    async fn list_project(&self, project: &str) -> Result<Vec<Variable>, RepositoryError>;

    /// Creates or replaces a variable.
    ///
    /// The scope is taken from `variable.metadata.project`.
    ///
    /// # Errors
    /// Returns an error if the store rejects or cannot persist the variable.
    async fn save(&self, variable: &Variable) -> Result<(), RepositoryError>;

    /// Deletes a variable.
    ///
    /// # Errors
    /// Returns `RepositoryError::NotFound` if the variable doesn't exist.
    async fn delete(&self, variable: &Variable) -> Result<(), RepositoryError>;

    /// Finds a variable by name in the given scope.
    ///
    /// # Arguments
    /// * `project` - Project name, or `None` for the global scope
    /// * `name` - Variable name
    async fn find(
        &self,
        project: Option<&str>,
        name: &str,
    ) -> Result<Option<Variable>, RepositoryError> {
        let variables = match project {
            Some(project) => self.list_project(project).await?,
            None => self.list_global().await?,
        };
        Ok(variables.into_iter().find(|v| v.name() == name))
    }
}

#[async_trait]
impl<T: VariableRepository + ?Sized> VariableRepository for Arc<T> {
    async fn list_global(&self) -> Result<Vec<Variable>, RepositoryError> {
        (**self).list_global().await
    }

    async fn list_project(&self, project: &str) -> Result<Vec<Variable>, RepositoryError> {
        (**self).list_project(project).await
    }

    async fn save(&self, variable: &Variable) -> Result<(), RepositoryError> {
        (**self).save(variable).await
    }

    async fn delete(&self, variable: &Variable) -> Result<(), RepositoryError> {
        (**self).delete(variable).await
    }
}
