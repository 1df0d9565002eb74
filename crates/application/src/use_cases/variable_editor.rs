//! Variable editor view
//!
//! Hosts one [`DraftController`] inside an editing resolution context. The
//! editor tracks the datasource inventory and the plugin capability; the
//! variables of the surrounding scopes are deliberately not loaded, so the
//! edited variable cannot resolve against itself.

use std::sync::Arc;

use varscope_domain::{
    DeletionDialog, DismissOutcome, Draft, DraftChange, EditorAction, FetchKind, GateState,
    LoadGate, TimeRange, Variable,
};

use crate::error::{ApplicationError, ApplicationResult, ensure_ready};
use crate::ports::{
    CancellationReceiver, DatasourceRepository, EditorObserver, QueryCapability,
    VariableRepository,
};

use super::compose_context::ResolvedContext;
use super::deletion_workflow::DeletionWorkflow;
use super::draft_controller::{DraftController, SessionOptions};
use super::evaluation::evaluate_options;
use super::load_scopes::guarded;
use super::services::ViewServices;

/// Editing view of one variable.
pub struct VariableEditor<R> {
    gate: LoadGate,
    context: Option<ResolvedContext>,
    capability: Option<Arc<dyn QueryCapability>>,
    controller: DraftController<R>,
    deletion: Option<DeletionWorkflow<R>>,
}

impl<R: VariableRepository + Clone> VariableEditor<R> {
    /// Opens the editor on `variable`.
    ///
    /// A variable being created has nothing to delete, so the delete
    /// affordance is only offered for other modes. A failed fetch or
    /// composition faults the returned editor.
    ///
    /// # Errors
    /// Returns `ApplicationError::Cancelled` if the view was torn down
    /// before every fetch settled.
    pub async fn open<D>(
        services: &ViewServices<R, D>,
        variable: Variable,
        options: SessionOptions,
        initial_time_range: TimeRange,
        observer: Arc<dyn EditorObserver>,
        cancel: &CancellationReceiver,
    ) -> ApplicationResult<Self>
    where
        D: DatasourceRepository,
    {
        let mut gate = LoadGate::new([FetchKind::Datasources, FetchKind::Plugins]);
        let (datasources, plugins) = tokio::join!(
            guarded(services.datasources.list_all(), cancel),
            guarded(services.plugins.load(), cancel),
        );
        let (Some(datasources), Some(plugins)) = (datasources, plugins) else {
            tracing::warn!(variable = variable.name(), "Editor torn down while loading");
            return Err(ApplicationError::Cancelled);
        };
        if cancel.is_cancelled() {
            return Err(ApplicationError::Cancelled);
        }

        gate.settle(
            FetchKind::Datasources,
            datasources.as_ref().map(|_| ()).map_err(ToString::to_string),
        );
        gate.settle(
            FetchKind::Plugins,
            plugins.as_ref().map(|_| ()).map_err(ToString::to_string),
        );

        let deletion = (options.action != EditorAction::Create)
            .then(|| DeletionWorkflow::new(services.variables.clone(), variable.clone()));
        let project = variable.project_name().map(ToString::to_string);
        let controller =
            DraftController::begin(services.variables.clone(), observer, variable, options);

        let mut editor = Self {
            gate,
            context: None,
            capability: plugins.ok(),
            controller,
            deletion,
        };

        if let Ok(datasources) = datasources {
            match services.composer().for_editing(
                project.as_deref(),
                datasources,
                initial_time_range,
            ) {
                Ok(context) => editor.context = Some(context),
                Err(e) => {
                    if let Some(fault) = e.to_fault() {
                        editor.gate.raise(fault);
                    }
                }
            }
        }
        if let GateState::Faulted { fault } = editor.gate.state() {
            tracing::warn!(
                session = editor.controller.session_id(),
                %fault,
                "Editor faulted"
            );
        }
        Ok(editor)
    }

    /// Returns the readiness of the editor.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    /// Returns the draft controller.
    #[must_use]
    pub const fn controller(&self) -> &DraftController<R> {
        &self.controller
    }

    /// Returns the live draft, if the session is open.
    #[must_use]
    pub const fn draft(&self) -> Option<&Draft> {
        self.controller.draft()
    }

    /// Returns true until the session ended.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.controller.is_open()
    }

    /// Returns the editing resolution context.
    ///
    /// # Errors
    /// Returns an error unless the editor is ready.
    pub fn context(&self) -> ApplicationResult<&ResolvedContext> {
        ensure_ready(&self.gate)?;
        self.context.as_ref().ok_or(ApplicationError::NotReady)
    }

    /// Switches the editor mode.
    ///
    /// # Errors
    /// See [`DraftController::set_action`].
    pub fn set_action(&mut self, action: EditorAction) -> ApplicationResult<()> {
        ensure_ready(&self.gate)?;
        self.controller.set_action(action)
    }

    /// Applies `change` to the draft.
    ///
    /// # Errors
    /// See [`DraftController::edit`].
    pub fn edit(&mut self, change: DraftChange) -> ApplicationResult<&Draft> {
        ensure_ready(&self.gate)?;
        self.controller.edit(change)
    }

    /// Saves the draft.
    ///
    /// # Errors
    /// See [`DraftController::commit`].
    pub async fn commit(&mut self) -> ApplicationResult<Variable> {
        ensure_ready(&self.gate)?;
        self.controller.commit().await
    }

    /// Abandons the draft.
    ///
    /// Allowed whatever the readiness, so a faulted editor can always be
    /// closed.
    ///
    /// # Errors
    /// See [`DraftController::discard`].
    pub fn discard(&mut self) -> ApplicationResult<()> {
        self.controller.discard()
    }

    /// Handles a click outside the editor.
    #[must_use]
    pub const fn dismiss_outside(&self) -> DismissOutcome {
        self.controller.dismiss_outside()
    }

    /// Evaluates the draft's options in the editing context.
    ///
    /// Preview failures are shown inline and do not fault the editor.
    ///
    /// # Errors
    /// Returns `ApplicationError::Plugin` if evaluation fails, or an error
    /// if the editor is not ready or closed.
    pub async fn preview(&self) -> ApplicationResult<Vec<String>> {
        let context = self.context()?;
        let capability = self.capability.as_ref().ok_or(ApplicationError::NotReady)?;
        let draft = self.controller.draft().ok_or(ApplicationError::SessionClosed)?;
        evaluate_options(capability.as_ref(), draft.definition(), context).await
    }

    /// Returns the delete confirmation state.
    #[must_use]
    pub fn deletion_dialog(&self) -> DeletionDialog {
        self.deletion
            .as_ref()
            .map(|d| d.dialog().clone())
            .unwrap_or_default()
    }

    /// Opens the delete confirmation.
    ///
    /// # Errors
    /// Returns `ApplicationError::ReadOnly` for read-only sessions or
    /// variables being created, `ApplicationError::SessionClosed` once the
    /// session ended, and the fault of a faulted editor.
    pub fn request_delete(&mut self) -> ApplicationResult<()> {
        ensure_ready(&self.gate)?;
        if !self.controller.is_open() {
            return Err(ApplicationError::SessionClosed);
        }
        if self.controller.is_read_only() {
            return Err(ApplicationError::ReadOnly);
        }
        self.deletion
            .as_mut()
            .ok_or(ApplicationError::ReadOnly)?
            .request()
    }

    /// Closes the delete confirmation without deleting.
    pub fn cancel_delete(&mut self) {
        if let Some(deletion) = self.deletion.as_mut() {
            deletion.cancel();
        }
    }

    /// Deletes the variable and ends the session.
    ///
    /// # Errors
    /// Returns `ApplicationError::Commit` if the delete is rejected; the
    /// confirmation and the session then stay open. A faulted editor
    /// deletes nothing.
    pub async fn confirm_delete(&mut self) -> ApplicationResult<()> {
        ensure_ready(&self.gate)?;
        let deletion = self
            .deletion
            .as_mut()
            .ok_or(ApplicationError::NotConfirming)?;
        deletion.confirm().await?;
        self.controller.finish();
        Ok(())
    }
}
