//! Query-execution capability port
//!
//! Plugins are loaded remotely, so obtaining the capability is itself
//! asynchronous and takes part in the readiness join of the view that needs
//! it.

use std::sync::Arc;

use async_trait::async_trait;

use varscope_domain::{AbsoluteTimeRange, DatasourceResource, VariableDefinition, VariableStore};

/// Errors raised by plugins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// The plugin bundle could not be loaded.
    #[error("Failed to load plugins: {0}")]
    Load(String),

    /// No plugin handles the requested variable or datasource kind.
    #[error("No plugin for {0}")]
    Unsupported(String),

    /// The query failed.
    #[error("Query failed: {0}")]
    Query(String),
}

/// Everything a variable query may need to run.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    /// Datasource the query targets, if the variable names one.
    pub datasource: Option<&'a DatasourceResource>,
    /// Concrete time window.
    pub window: AbsoluteTimeRange,
    /// Other variables visible to the query.
    pub variables: &'a VariableStore,
}

/// Ability to evaluate variable queries.
#[async_trait]
pub trait QueryCapability: Send + Sync {
    /// Returns the options of `definition`.
    ///
    /// # Errors
    /// Returns `PluginError::Unsupported` if no plugin handles the
    /// definition, or `PluginError::Query` if evaluation fails.
    async fn list_values(
        &self,
        definition: &VariableDefinition,
        context: QueryContext<'_>,
    ) -> Result<Vec<String>, PluginError>;
}

/// Loads the query capability once per session.
#[async_trait]
pub trait PluginLoader: Send + Sync {
    /// Loads the capability.
    ///
    /// # Errors
    /// Returns `PluginError::Load` if the plugins cannot be fetched.
    async fn load(&self) -> Result<Arc<dyn QueryCapability>, PluginError>;
}
