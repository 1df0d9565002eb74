//! Command handlers
//!
//! Each handler drives one of the application views the way an interactive
//! host would, then prints a serializable report.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use varscope_application::ApplicationError;
use varscope_application::ports::{
    CancellationToken, DatasourceRepository, EditorObserver, RepositoryError, VariableRepository,
};
use varscope_application::use_cases::{
    GLOBAL_SOURCE, ProjectExplore, SessionOptions, ValidationScope, VariableEditor, ViewServices,
    selected_project,
};
use varscope_domain::{
    DraftChange, EditorAction, GateState, ResolvedVariable, TimeRange, Variable, VariableScope,
    VariableSpec,
};
use varscope_infrastructure::UrlQueryParamStore;

use crate::cli::OutputFormat;

/// Services over type-erased stores, so file and HTTP backends share one
/// code path.
pub type Services = ViewServices<Arc<dyn VariableRepository>, Arc<dyn DatasourceRepository>>;

/// Errors surfaced by a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A use case failed.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// The resource store failed outside a use case.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// No variable with that name exists in the scope.
    #[error("Variable '{name}' not found in {scope}")]
    NotFound {
        /// Variable name.
        name: String,
        /// Scope label.
        scope: String,
    },

    /// The view replaced itself with its fallback.
    #[error("View unavailable: {0}")]
    Faulted(String),

    /// The report could not be rendered or written.
    #[error("Cannot write output: {0}")]
    Output(String),
}

/// Observer that records editor notifications in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl EditorObserver for LoggingObserver {
    fn action_changed(&self, action: EditorAction) {
        tracing::debug!(?action, "Editor mode changed");
    }

    fn closed(&self) {
        tracing::debug!("Editor closed");
    }
}

#[derive(Debug, Serialize)]
struct VariableRow {
    name: String,
    scope: VariableScope,
    source: String,
    spec: VariableSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
}

impl VariableRow {
    fn new(resolved: ResolvedVariable, options: Option<Vec<String>>) -> Self {
        Self {
            name: resolved.definition.name,
            scope: resolved.scope,
            source: resolved.source,
            spec: resolved.definition.spec,
            options,
        }
    }
}

#[derive(Debug, Serialize)]
struct ExploreReport {
    project: Option<String>,
    link: String,
    variables: Vec<VariableRow>,
}

#[derive(Debug, Serialize)]
struct ShowReport<'a> {
    variable: &'a Variable,
    scope: VariableScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteReport<'a> {
    name: &'a str,
    project: Option<&'a str>,
    deleted: bool,
}

/// Everything a command needs, resolved from configuration and flags.
pub struct Session {
    services: Services,
    link: Arc<UrlQueryParamStore>,
    time_range: TimeRange,
    default_project: Option<String>,
    format: OutputFormat,
}

impl Session {
    /// Creates a session.
    ///
    /// `link` must be the same store `services.params` points at, so
    /// reports can print the link the view wrote back.
    #[must_use]
    pub const fn new(
        services: Services,
        link: Arc<UrlQueryParamStore>,
        time_range: TimeRange,
        default_project: Option<String>,
        format: OutputFormat,
    ) -> Self {
        Self {
            services,
            link,
            time_range,
            default_project,
            format,
        }
    }

    fn project<'a>(&'a self, project: Option<&'a str>) -> Option<&'a str> {
        selected_project(project.or(self.default_project.as_deref()))
    }

    /// Prints the variables visible to `project`.
    ///
    /// # Errors
    /// Returns `CliError::Faulted` if the view faulted while loading or
    /// evaluating.
    pub async fn explore(
        &self,
        project: Option<&str>,
        values: bool,
        out: &mut dyn Write,
    ) -> Result<(), CliError> {
        let (_token, cancel) = CancellationToken::new();
        let mut view = ProjectExplore::open(
            &self.services,
            self.project(project),
            self.time_range.clone(),
            &cancel,
        )
        .await?;
        if let Some(message) = view.fallback_message() {
            return Err(CliError::Faulted(message));
        }

        let variables = view.variables()?;
        let mut rows = Vec::with_capacity(variables.len());
        for variable in variables {
            let options = if values {
                match view.evaluate(variable.name()).await {
                    Ok(options) => Some(options),
                    Err(e) => {
                        return Err(view.fallback_message().map_or(
                            CliError::Application(e),
                            CliError::Faulted,
                        ));
                    }
                }
            } else {
                None
            };
            rows.push(VariableRow::new(variable, options));
        }

        let report = ExploreReport {
            project: view.project().map(ToString::to_string),
            link: self.link.url().to_string(),
            variables: rows,
        };
        self.emit(out, &report)
    }

    /// Prints one variable with a preview of its options.
    ///
    /// # Errors
    /// Returns `CliError::NotFound` if the variable does not exist.
    pub async fn show(
        &self,
        name: &str,
        project: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<(), CliError> {
        let project = self.project(project);
        let variable = self.find(project, name).await?;
        let editor = self.editor(variable, EditorAction::Read).await?;

        let (options, preview_error) = match editor.preview().await {
            Ok(options) => (Some(options), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let variable = editor.controller().original();
        let report = ShowReport {
            variable,
            scope: variable.scope(),
            options,
            preview_error,
        };
        self.emit(out, &report)
    }

    /// Sets the query of a variable and commits it. An unknown name creates
    /// a text variable.
    ///
    /// # Errors
    /// Returns an error if validation or the save fails.
    pub async fn set(
        &self,
        name: &str,
        query: &str,
        project: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<(), CliError> {
        let project = self.project(project);
        let (variable, action) = match self.services.variables.find(project, name).await? {
            Some(variable) => (variable, EditorAction::Update),
            None => {
                let spec = VariableSpec::text("");
                let variable = match project {
                    Some(project) => Variable::project(project, name, spec),
                    None => Variable::global(name, spec),
                };
                (variable, EditorAction::Create)
            }
        };

        let mut editor = self.editor(variable, action).await?;
        editor.edit(DraftChange::SetQuery(query.to_string()))?;
        let saved = editor.commit().await?;
        self.emit(out, &saved)
    }

    /// Deletes a variable. Without `confirm` the deletion is requested and
    /// cancelled, leaving the store untouched.
    ///
    /// # Errors
    /// Returns an error if the variable does not exist or the store rejects
    /// the deletion.
    pub async fn delete(
        &self,
        name: &str,
        project: Option<&str>,
        confirm: bool,
        out: &mut dyn Write,
    ) -> Result<(), CliError> {
        let project = self.project(project);
        let variable = self.find(project, name).await?;
        let mut editor = self.editor(variable, EditorAction::Update).await?;

        editor.request_delete()?;
        if confirm {
            editor.confirm_delete().await?;
        } else {
            editor.cancel_delete();
            tracing::info!(variable = name, "Deletion not confirmed");
        }

        let report = DeleteReport {
            name,
            project,
            deleted: confirm,
        };
        self.emit(out, &report)
    }

    async fn find(&self, project: Option<&str>, name: &str) -> Result<Variable, CliError> {
        self.services
            .variables
            .find(project, name)
            .await?
            .ok_or_else(|| CliError::NotFound {
                name: name.to_string(),
                scope: project.map_or_else(
                    || GLOBAL_SOURCE.to_string(),
                    |p| format!("project '{p}'"),
                ),
            })
    }

    async fn editor(
        &self,
        variable: Variable,
        action: EditorAction,
    ) -> Result<VariableEditor<Arc<dyn VariableRepository>>, CliError> {
        let (_token, cancel) = CancellationToken::new();
        let options = SessionOptions {
            action,
            read_only: false,
            validation: ValidationScope::builtin(),
        };
        let editor = VariableEditor::open(
            &self.services,
            variable,
            options,
            self.time_range.clone(),
            Arc::new(LoggingObserver),
            &cancel,
        )
        .await?;

        if let GateState::Faulted { fault } = editor.state() {
            return Err(CliError::Faulted(fault.to_string()));
        }
        Ok(editor)
    }

    fn emit<T: Serialize>(&self, out: &mut dyn Write, value: &T) -> Result<(), CliError> {
        let rendered = match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))?
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(value).map_err(|e| CliError::Output(e.to_string()))?
            }
        };
        writeln!(out, "{}", rendered.trim_end()).map_err(|e| CliError::Output(e.to_string()))
    }
}
