//! Query parameter store over a shareable URL

use std::sync::{Mutex, MutexGuard, PoisonError};

use url::Url;
use varscope_application::ports::QueryParamStore;

/// Keeps the host's shareable state in the query string of a URL.
///
/// Every write re-encodes the whole query, so [`Self::url`] is always a
/// link that reproduces the current view.
#[derive(Debug)]
pub struct UrlQueryParamStore {
    url: Mutex<Url>,
}

impl UrlQueryParamStore {
    /// Creates a store over `url`.
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self {
            url: Mutex::new(url),
        }
    }

    /// Parses `url` and creates a store over it.
    ///
    /// # Errors
    /// Returns an error if `url` is not a valid absolute URL.
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Url::parse(url).map(Self::new)
    }

    /// Returns the current URL.
    #[must_use]
    pub fn url(&self) -> Url {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Url> {
        self.url.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(url: &mut Url, params: &[(String, String)]) {
        if params.is_empty() {
            url.set_query(None);
            return;
        }
        match serde_urlencoded::to_string(params) {
            Ok(query) => url.set_query(Some(&query)),
            Err(e) => tracing::warn!(error = %e, "Failed to encode query parameters"),
        }
    }
}

impl QueryParamStore for UrlQueryParamStore {
    fn params(&self) -> Vec<(String, String)> {
        self.lock().query_pairs().into_owned().collect()
    }

    fn remove_where(&self, predicate: &dyn Fn(&str) -> bool) {
        let mut url = self.lock();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .into_owned()
            .filter(|(key, _)| !predicate(key))
            .collect();
        Self::write(&mut url, &kept);
    }

    fn append(&self, params: Vec<(String, String)>) {
        let mut url = self.lock();
        let mut all: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        all.extend(params);
        Self::write(&mut url, &all);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store(url: &str) -> UrlQueryParamStore {
        UrlQueryParamStore::parse(url).expect("valid url")
    }

    #[test]
    fn test_reads_repeated_params() {
        let store = store("https://dash.example.com/explore?var-region=eu&var-region=us&start=1h");

        assert_eq!(store.get("var-region"), vec!["eu", "us"]);
        assert_eq!(store.get("start"), vec!["1h"]);
        assert!(store.get("end").is_empty());
    }

    #[test]
    fn test_replace_keeps_other_params() {
        let store = store("https://dash.example.com/explore?project=infra&start=1h");

        store.replace(
            &|key| key == "start" || key == "end",
            vec![
                ("start".to_string(), "1000".to_string()),
                ("end".to_string(), "5000".to_string()),
            ],
        );

        assert_eq!(
            store.url().as_str(),
            "https://dash.example.com/explore?project=infra&start=1000&end=5000"
        );
    }

    #[test]
    fn test_values_are_encoded() {
        let store = store("https://dash.example.com/explore");

        store.append(vec![("var-query".to_string(), "up{job=\"a b\"}".to_string())]);

        assert_eq!(store.get("var-query"), vec!["up{job=\"a b\"}"]);
        assert!(!store.url().as_str().contains(' '));
    }

    #[test]
    fn test_removing_everything_drops_the_query() {
        let store = store("https://dash.example.com/explore?start=1h");

        store.remove_where(&|_| true);

        assert_eq!(store.url().as_str(), "https://dash.example.com/explore");
        assert!(store.params().is_empty());
    }
}
