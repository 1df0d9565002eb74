//! Shareable query parameter port

/// Read/write access to the host's addressable state (the query string of
/// a shareable link).
///
/// Implementations use interior mutability so a store can be shared
/// between the contexts of one view.
pub trait QueryParamStore: Send + Sync {
    /// Returns every parameter in order.
    fn params(&self) -> Vec<(String, String)>;

    /// Removes every parameter whose key matches `predicate`.
    fn remove_where(&self, predicate: &dyn Fn(&str) -> bool);

    /// Appends parameters.
    fn append(&self, params: Vec<(String, String)>);

    /// Returns the values of `key`.
    fn get(&self, key: &str) -> Vec<String> {
        self.params()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    /// Replaces every parameter matching `predicate` with `params`.
    fn replace(&self, predicate: &dyn Fn(&str) -> bool, params: Vec<(String, String)>) {
        self.remove_where(predicate);
        self.append(params);
    }
}
