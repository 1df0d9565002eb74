//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the variable workflows and the
//! collaborators they depend on. Each port is a trait that can be
//! implemented by adapters in the infrastructure layer.

mod cancellation;
mod clock;
mod datasource_repository;
mod observer;
mod plugin;
mod query_params;
mod validator;
mod variable_repository;

pub use cancellation::{CancellationReceiver, CancellationToken};
pub use clock::Clock;
pub use datasource_repository::DatasourceRepository;
pub use observer::{EditorObserver, NoopObserver};
pub use plugin::{PluginError, PluginLoader, QueryCapability, QueryContext};
pub use query_params::QueryParamStore;
pub use validator::Validator;
pub use variable_repository::{RepositoryError, VariableRepository};
