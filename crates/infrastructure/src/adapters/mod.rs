//! Port adapters.

mod http_resource_store;
mod static_plugins;
mod system_clock;
mod url_query_params;

pub use http_resource_store::{HttpRepositoryError, HttpResourceStore};
pub use static_plugins::{StaticPluginLoader, StaticQueryCapability};
pub use system_clock::SystemClock;
pub use url_query_params::UrlQueryParamStore;
