//! Collaborators shared by the scoped views

use std::sync::Arc;

use crate::ports::{Clock, PluginLoader, QueryParamStore};

use super::compose_context::ResolutionContextComposer;

/// Ports a view needs to load, resolve and persist variables.
#[derive(Clone)]
pub struct ViewServices<R, D> {
    /// Variable resource store.
    pub variables: R,
    /// Datasource resource store.
    pub datasources: D,
    /// Provider of the query capability.
    pub plugins: Arc<dyn PluginLoader>,
    /// Shareable parameters of the host.
    pub params: Arc<dyn QueryParamStore>,
    /// Source of "now".
    pub clock: Arc<dyn Clock>,
}

impl<R, D> ViewServices<R, D> {
    /// Returns a composer bound to the host parameters and clock.
    #[must_use]
    pub fn composer(&self) -> ResolutionContextComposer {
        ResolutionContextComposer::new(Arc::clone(&self.params), Arc::clone(&self.clock))
    }
}
