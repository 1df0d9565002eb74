//! Load the variable scopes and datasource inventory concurrently

use std::future::Future;

use varscope_domain::{DatasourceResource, FetchKind, LoadGate, Variable};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{CancellationReceiver, DatasourceRepository, RepositoryError, VariableRepository};

use super::merge_scopes::selected_project;

/// Runs `fetch` until it settles or the view is torn down.
///
/// Returns `None` if the view was torn down first, or if it was torn down
/// while the settlement was in flight.
pub async fn guarded<T, F>(fetch: F, cancel: &CancellationReceiver) -> Option<T>
where
    F: Future<Output = T>,
{
    let mut cancel = cancel.clone();
    let outcome = tokio::select! {
        outcome = fetch => Some(outcome),
        () = cancel.cancelled() => None,
    };
    outcome.filter(|_| !cancel.is_cancelled())
}

/// Raw outcome of the three scope fetches.
#[derive(Debug)]
pub struct ScopeFetch {
    project: Option<String>,
    global: Result<Vec<Variable>, RepositoryError>,
    project_variables: Result<Vec<Variable>, RepositoryError>,
    datasources: Result<Vec<DatasourceResource>, RepositoryError>,
}

/// The settled inputs of a scoped view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSnapshot {
    /// Selected project, if any.
    pub project: Option<String>,
    /// Global variables.
    pub global_variables: Vec<Variable>,
    /// Variables of the selected project.
    pub project_variables: Vec<Variable>,
    /// Full datasource inventory.
    pub datasources: Vec<DatasourceResource>,
}

impl ScopeFetch {
    /// Feeds every settlement into `gate` and returns the snapshot once the
    /// three fetches succeeded.
    ///
    /// # Errors
    /// Returns `ApplicationError::Fetch` for the first rejected fetch; the
    /// gate is then faulted.
    pub fn settle(self, gate: &mut LoadGate) -> ApplicationResult<ScopeSnapshot> {
        gate.settle(FetchKind::GlobalVariables, outcome(&self.global));
        gate.settle(FetchKind::ProjectVariables, outcome(&self.project_variables));
        gate.settle(FetchKind::Datasources, outcome(&self.datasources));

        let fetch_error = |kind: FetchKind, e: RepositoryError| {
            tracing::warn!(fetch = %kind, error = %e, "Scope fetch failed");
            ApplicationError::Fetch {
                kind,
                message: e.to_string(),
            }
        };
        let global_variables = self
            .global
            .map_err(|e| fetch_error(FetchKind::GlobalVariables, e))?;
        let project_variables = self
            .project_variables
            .map_err(|e| fetch_error(FetchKind::ProjectVariables, e))?;
        let datasources = self
            .datasources
            .map_err(|e| fetch_error(FetchKind::Datasources, e))?;

        Ok(ScopeSnapshot {
            project: self.project,
            global_variables,
            project_variables,
            datasources,
        })
    }
}

fn outcome<T>(result: &Result<T, RepositoryError>) -> Result<(), String> {
    result.as_ref().map(|_| ()).map_err(ToString::to_string)
}

/// Fetches global variables, project variables and datasources.
pub struct LoadScopes<V, D> {
    variables: V,
    datasources: D,
}

impl<V: VariableRepository, D: DatasourceRepository> LoadScopes<V, D> {
    /// Creates a new `LoadScopes` use case.
    pub const fn new(variables: V, datasources: D) -> Self {
        Self {
            variables,
            datasources,
        }
    }

    /// Issues the three fetches concurrently.
    ///
    /// With no project selected the project fetch settles immediately with
    /// an empty list. Returns `None` if the view was torn down before every
    /// fetch settled.
    pub async fn fetch(
        &self,
        project: Option<&str>,
        cancel: &CancellationReceiver,
    ) -> Option<ScopeFetch> {
        let project = selected_project(project);

        let global = self.variables.list_global();
        let project_variables = async {
            match project {
                Some(project) => self.variables.list_project(project).await,
                None => Ok(Vec::new()),
            }
        };
        let datasources = self.datasources.list_all();

        let (global, project_variables, datasources) = tokio::join!(
            guarded(global, cancel),
            guarded(project_variables, cancel),
            guarded(datasources, cancel),
        );

        if cancel.is_cancelled() {
            tracing::warn!("View torn down while loading scopes, ignoring results");
            return None;
        }

        Some(ScopeFetch {
            project: project.map(ToString::to_string),
            global: global?,
            project_variables: project_variables?,
            datasources: datasources?,
        })
    }

    /// Fetches and settles into `gate` in one step.
    ///
    /// # Errors
    /// Returns `ApplicationError::Cancelled` if the view was torn down, or
    /// `ApplicationError::Fetch` if a fetch failed.
    pub async fn execute(
        &self,
        project: Option<&str>,
        gate: &mut LoadGate,
        cancel: &CancellationReceiver,
    ) -> ApplicationResult<ScopeSnapshot> {
        let fetched = self
            .fetch(project, cancel)
            .await
            .ok_or(ApplicationError::Cancelled)?;
        fetched.settle(gate)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;
    use crate::ports::CancellationToken;
    use crate::test_support::{MockDatasources, MockRepository};
    use crate::use_cases::ScopeMerger;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use varscope_domain::{GateState, VariableScope, VariableSpec, VariableStore};

    const SCOPES: [FetchKind; 3] = [
        FetchKind::GlobalVariables,
        FetchKind::ProjectVariables,
        FetchKind::Datasources,
    ];

    fn region_repository() -> MockRepository {
        MockRepository::with(vec![
            Variable::global("region", VariableSpec::text("global")),
            Variable::project("infra", "region", VariableSpec::text("project")),
        ])
    }

    #[tokio::test]
    async fn test_execute_settles_gate() {
        let use_case = LoadScopes::new(region_repository(), MockDatasources::default());
        let (_token, cancel) = CancellationToken::new();
        let mut gate = LoadGate::new(SCOPES);

        let snapshot = use_case
            .execute(Some("infra"), &mut gate, &cancel)
            .await
            .expect("Should load");

        assert_eq!(gate.state(), GateState::Ready);
        assert_eq!(snapshot.global_variables.len(), 1);
        assert_eq!(snapshot.project_variables.len(), 1);
        assert_eq!(snapshot.project.as_deref(), Some("infra"));
    }

    #[tokio::test]
    async fn test_merge_ignores_completion_order() {
        let (_token, cancel) = CancellationToken::new();
        let delays = [(30, 0), (0, 30)];
        let mut results = Vec::new();

        for (global_delay, project_delay) in delays {
            let repository = region_repository();
            repository.set_delays(
                Duration::from_millis(global_delay),
                Duration::from_millis(project_delay),
            );
            let use_case = LoadScopes::new(repository, MockDatasources::default());
            let mut gate = LoadGate::new(SCOPES);
            let snapshot = use_case
                .execute(Some("infra"), &mut gate, &cancel)
                .await
                .expect("Should load");

            let store = VariableStore::with_external(ScopeMerger::merge(
                snapshot.project.as_deref(),
                &snapshot.global_variables,
                &snapshot.project_variables,
            ));
            results.push(store.resolve("region").expect("Should resolve"));
        }

        assert_eq!(results[0], results[1]);
        assert_eq!(results[0].scope, VariableScope::Project);
    }

    #[tokio::test]
    async fn test_failed_fetch_faults_gate() {
        let repository = region_repository();
        repository.fail_project_listing("503 Service Unavailable");
        let use_case = LoadScopes::new(repository, MockDatasources::default());
        let (_token, cancel) = CancellationToken::new();
        let mut gate = LoadGate::new(SCOPES);

        let result = use_case.execute(Some("infra"), &mut gate, &cancel).await;

        assert!(matches!(
            result,
            Err(ApplicationError::Fetch {
                kind: FetchKind::ProjectVariables,
                ..
            })
        ));
        assert!(gate.state().is_faulted());
    }

    #[tokio::test]
    async fn test_no_project_skips_project_fetch() {
        let repository = region_repository();
        repository.fail_project_listing("must not be called");
        let use_case = LoadScopes::new(repository, MockDatasources::default());
        let (_token, cancel) = CancellationToken::new();
        let mut gate = LoadGate::new(SCOPES);

        let snapshot = use_case
            .execute(Some("none"), &mut gate, &cancel)
            .await
            .expect("Should load");

        assert!(snapshot.project_variables.is_empty());
        assert!(snapshot.project.is_none());
        assert!(gate.is_ready());
    }

    #[tokio::test]
    async fn test_teardown_ignores_settlements() {
        let repository = region_repository();
        repository.set_delays(Duration::from_millis(200), Duration::ZERO);
        let use_case = LoadScopes::new(repository, MockDatasources::default());
        let (token, cancel) = CancellationToken::new();
        let mut gate = LoadGate::new(SCOPES);

        let teardown = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(token);
        };
        let (result, ()) = tokio::join!(
            use_case.execute(Some("infra"), &mut gate, &cancel),
            teardown
        );

        assert!(matches!(result, Err(ApplicationError::Cancelled)));
        assert_eq!(gate.pending().len(), 3);
    }
}
