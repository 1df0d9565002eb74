//! Hand-written port doubles shared by the use case tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::significant_drop_tightening)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use varscope_domain::{DatasourceResource, EditorAction, Variable, VariableDefinition};

use crate::ports::{
    Clock, DatasourceRepository, EditorObserver, PluginError, PluginLoader, QueryCapability,
    QueryContext, QueryParamStore, RepositoryError, VariableRepository,
};

#[derive(Default)]
struct RepositoryState {
    variables: Vec<Variable>,
    global_delay: Duration,
    project_delay: Duration,
    fail_project: Option<String>,
    fail_save: Option<String>,
    fail_delete: Option<String>,
    saves: usize,
    deletes: usize,
}

#[derive(Clone, Default)]
pub struct MockRepository {
    state: Arc<Mutex<RepositoryState>>,
}

impl MockRepository {
    pub fn with(variables: Vec<Variable>) -> Self {
        let repository = Self::default();
        repository.state.lock().expect("Lock poisoned").variables = variables;
        repository
    }

    pub fn set_delays(&self, global: Duration, project: Duration) {
        let mut state = self.state.lock().expect("Lock poisoned");
        state.global_delay = global;
        state.project_delay = project;
    }

    pub fn fail_project_listing(&self, message: &str) {
        self.state.lock().expect("Lock poisoned").fail_project = Some(message.to_string());
    }

    pub fn fail_saves(&self, message: Option<&str>) {
        self.state.lock().expect("Lock poisoned").fail_save = message.map(ToString::to_string);
    }

    pub fn fail_deletes(&self, message: Option<&str>) {
        self.state.lock().expect("Lock poisoned").fail_delete = message.map(ToString::to_string);
    }

    pub fn variables(&self) -> Vec<Variable> {
        self.state.lock().expect("Lock poisoned").variables.clone()
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().expect("Lock poisoned").saves
    }

    pub fn delete_count(&self) -> usize {
        self.state.lock().expect("Lock poisoned").deletes
    }
}

#[async_trait]
impl VariableRepository for MockRepository {
    async fn list_global(&self) -> Result<Vec<Variable>, RepositoryError> {
        let (delay, variables) = {
            let state = self.state.lock().expect("Lock poisoned");
            (state.global_delay, state.variables.clone())
        };
        tokio::time::sleep(delay).await;
        Ok(variables
            .into_iter()
            .filter(|v| v.project_name().is_none())
            .collect())
    }

    async fn list_project(&self, project: &str) -> Result<Vec<Variable>, RepositoryError> {
        let (delay, failure, variables) = {
            let state = self.state.lock().expect("Lock poisoned");
            (
                state.project_delay,
                state.fail_project.clone(),
                state.variables.clone(),
            )
        };
        tokio::time::sleep(delay).await;
        if let Some(message) = failure {
            return Err(RepositoryError::Transport(message));
        }
        Ok(variables
            .into_iter()
            .filter(|v| v.project_name() == Some(project))
            .collect())
    }

    async fn save(&self, variable: &Variable) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("Lock poisoned");
        if let Some(message) = &state.fail_save {
            return Err(RepositoryError::Transport(message.clone()));
        }
        state.saves += 1;
        state.variables.retain(|v| v.metadata != variable.metadata);
        state.variables.push(variable.clone());
        Ok(())
    }

    async fn delete(&self, variable: &Variable) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("Lock poisoned");
        if let Some(message) = &state.fail_delete {
            return Err(RepositoryError::Transport(message.clone()));
        }
        let before = state.variables.len();
        state.variables.retain(|v| v.metadata != variable.metadata);
        if state.variables.len() == before {
            return Err(RepositoryError::NotFound(variable.name().to_string()));
        }
        state.deletes += 1;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockDatasources {
    datasources: Arc<Mutex<Result<Vec<DatasourceResource>, String>>>,
}

impl Default for MockDatasources {
    fn default() -> Self {
        Self::with(vec![
            DatasourceResource::global("prom", "PrometheusDatasource").as_default(),
        ])
    }
}

impl MockDatasources {
    pub fn with(datasources: Vec<DatasourceResource>) -> Self {
        Self {
            datasources: Arc::new(Mutex::new(Ok(datasources))),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            datasources: Arc::new(Mutex::new(Err(message.to_string()))),
        }
    }
}

#[async_trait]
impl DatasourceRepository for MockDatasources {
    async fn list_all(&self) -> Result<Vec<DatasourceResource>, RepositoryError> {
        self.datasources
            .lock()
            .expect("Lock poisoned")
            .clone()
            .map_err(RepositoryError::Transport)
    }
}

#[derive(Default)]
pub struct MockObserver {
    actions: Mutex<Vec<EditorAction>>,
    closed: AtomicUsize,
}

impl MockObserver {
    pub fn actions(&self) -> Vec<EditorAction> {
        self.actions.lock().expect("Lock poisoned").clone()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl EditorObserver for MockObserver {
    fn action_changed(&self, action: EditorAction) {
        self.actions.lock().expect("Lock poisoned").push(action);
    }

    fn closed(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Lists the comma-separated values of the query, or fails when the query
/// is `fail`.
pub struct SplitCapability;

#[async_trait]
impl QueryCapability for SplitCapability {
    async fn list_values(
        &self,
        definition: &VariableDefinition,
        context: QueryContext<'_>,
    ) -> Result<Vec<String>, PluginError> {
        if definition.spec.query == "fail" {
            return Err(PluginError::Query("query failed".to_string()));
        }
        if definition.spec.datasource.is_some() && context.datasource.is_none() {
            return Err(PluginError::Unsupported("missing datasource".to_string()));
        }
        Ok(definition
            .spec
            .query
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect())
    }
}

pub struct MockPluginLoader {
    failure: Option<String>,
}

impl MockPluginLoader {
    pub fn working() -> Arc<Self> {
        Arc::new(Self { failure: None })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl PluginLoader for MockPluginLoader {
    async fn load(&self) -> Result<Arc<dyn QueryCapability>, PluginError> {
        match &self.failure {
            Some(message) => Err(PluginError::Load(message.clone())),
            None => Ok(Arc::new(SplitCapability)),
        }
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_millis(millis: i64) -> Arc<Self> {
        Arc::new(Self(Utc.timestamp_millis_opt(millis).single().expect("valid")))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
pub struct MemoryParams {
    params: Mutex<Vec<(String, String)>>,
}

impl MemoryParams {
    pub fn with(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            params: Mutex::new(
                pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            ),
        })
    }
}

impl QueryParamStore for MemoryParams {
    fn params(&self) -> Vec<(String, String)> {
        self.params.lock().expect("Lock poisoned").clone()
    }

    fn remove_where(&self, predicate: &dyn Fn(&str) -> bool) {
        self.params
            .lock()
            .expect("Lock poisoned")
            .retain(|(k, _)| !predicate(k));
    }

    fn append(&self, params: Vec<(String, String)>) {
        self.params.lock().expect("Lock poisoned").extend(params);
    }
}
