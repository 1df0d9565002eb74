//! Read-only exploration of the variables visible to a project

use std::sync::Arc;

use varscope_domain::{
    DomainError, Fault, FetchKind, GateState, LoadGate, ResolvedVariable, TimeRange,
    generate_session_id,
};

use crate::error::{ApplicationError, ApplicationResult, ensure_ready};
use crate::ports::{CancellationReceiver, DatasourceRepository, QueryCapability, VariableRepository};

use super::compose_context::ResolvedContext;
use super::evaluation::evaluate_options;
use super::load_scopes::{LoadScopes, guarded};
use super::merge_scopes::ScopeMerger;
use super::services::ViewServices;

/// Exploration view over the merged global and project variables.
///
/// The view is usable only once every tracked fetch settled. A fault at any
/// stage replaces it with a fallback until it is opened again.
pub struct ProjectExplore {
    project: Option<String>,
    gate: LoadGate,
    context: Option<ResolvedContext>,
    capability: Option<Arc<dyn QueryCapability>>,
    session_id: String,
}

impl ProjectExplore {
    /// Loads and resolves the view.
    ///
    /// Global variables, project variables, datasources and the plugin
    /// capability are fetched concurrently. A failed fetch or composition
    /// does not return an error: the returned view is faulted.
    ///
    /// # Errors
    /// Returns `ApplicationError::Cancelled` if the view was torn down
    /// before every fetch settled.
    pub async fn open<R, D>(
        services: &ViewServices<R, D>,
        project: Option<&str>,
        initial_time_range: TimeRange,
        cancel: &CancellationReceiver,
    ) -> ApplicationResult<Self>
    where
        R: VariableRepository + Clone,
        D: DatasourceRepository + Clone,
    {
        let session_id = generate_session_id();
        let load_scopes = LoadScopes::new(services.variables.clone(), services.datasources.clone());
        let gate = LoadGate::new(FetchKind::ALL);

        let (scopes, plugins) = tokio::join!(
            load_scopes.fetch(project, cancel),
            guarded(services.plugins.load(), cancel),
        );
        let (Some(scopes), Some(plugins)) = (scopes, plugins) else {
            tracing::warn!(session = %session_id, "Explore view torn down while loading");
            return Err(ApplicationError::Cancelled);
        };
        if cancel.is_cancelled() {
            return Err(ApplicationError::Cancelled);
        }

        let mut view = Self {
            project: None,
            gate,
            context: None,
            capability: None,
            session_id,
        };
        view.gate.settle(
            FetchKind::Plugins,
            plugins.as_ref().map(|_| ()).map_err(ToString::to_string),
        );
        let snapshot = match scopes.settle(&mut view.gate) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(session = %view.session_id, error = %e, "Explore view faulted");
                return Ok(view);
            }
        };
        view.project = snapshot.project.clone();
        let Ok(capability) = plugins else {
            return Ok(view);
        };
        view.capability = Some(capability);

        let bundles = ScopeMerger::merge(
            snapshot.project.as_deref(),
            &snapshot.global_variables,
            &snapshot.project_variables,
        );
        match services.composer().compose(
            snapshot.project.as_deref(),
            snapshot.datasources,
            initial_time_range,
            bundles,
        ) {
            Ok(context) => {
                tracing::info!(
                    session = %view.session_id,
                    project = ?view.project,
                    variables = context.variables().names().len(),
                    "Explore view ready"
                );
                view.context = Some(context);
            }
            Err(e) => {
                if let Some(fault) = e.to_fault() {
                    view.gate.raise(fault);
                }
            }
        }
        Ok(view)
    }

    /// Returns the readiness of the view.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    /// Returns the selected project, if any.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Returns the message the fallback shows, if the view is faulted.
    #[must_use]
    pub fn fallback_message(&self) -> Option<String> {
        match self.gate.state() {
            GateState::Faulted { fault } => Some(fault.to_string()),
            _ => None,
        }
    }

    /// Returns the resolution context.
    ///
    /// # Errors
    /// Returns an error unless the view is ready.
    pub fn context(&self) -> ApplicationResult<&ResolvedContext> {
        ensure_ready(&self.gate)?;
        self.context.as_ref().ok_or(ApplicationError::NotReady)
    }

    /// Returns the resolution context for changes of the time range or of
    /// selected values.
    ///
    /// # Errors
    /// Returns an error unless the view is ready.
    pub fn context_mut(&mut self) -> ApplicationResult<&mut ResolvedContext> {
        ensure_ready(&self.gate)?;
        self.context.as_mut().ok_or(ApplicationError::NotReady)
    }

    /// Returns every visible variable, one per name, with the scope it
    /// resolved from.
    ///
    /// # Errors
    /// Returns an error unless the view is ready.
    pub fn variables(&self) -> ApplicationResult<Vec<ResolvedVariable>> {
        Ok(self.context()?.variables().resolve_all())
    }

    /// Computes the options of variable `name`.
    ///
    /// A failed evaluation faults the whole view.
    ///
    /// # Errors
    /// Returns `ApplicationError::Domain` if `name` is not visible, the
    /// evaluation error, or an error if the view is not ready.
    pub async fn evaluate(&mut self, name: &str) -> ApplicationResult<Vec<String>> {
        let context = self.context()?;
        let resolved = context.variables().resolve(name).ok_or_else(|| {
            ApplicationError::Domain(DomainError::InvalidVariable(format!(
                "unknown variable '{name}'"
            )))
        })?;
        let capability = self.capability.as_ref().ok_or(ApplicationError::NotReady)?;

        let result = evaluate_options(capability.as_ref(), &resolved.definition, context).await;
        if let Err(e) = &result {
            tracing::warn!(session = %self.session_id, variable = name, error = %e, "Render fault");
            self.gate.raise(Fault::render(e.to_string()));
        }
        result
    }
}
