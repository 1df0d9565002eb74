//! varscope Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports defined in
//! the application layer: resource stores on disk and over HTTP, the
//! shareable query-parameter store, the built-in plugin and the clock.

pub mod adapters;
pub mod persistence;
pub mod serialization;

pub use adapters::{
    HttpRepositoryError, HttpResourceStore, StaticPluginLoader, StaticQueryCapability,
    SystemClock, UrlQueryParamStore,
};
pub use persistence::FileResourceStore;
pub use serialization::{from_json_bytes, to_json_stable_bytes};
