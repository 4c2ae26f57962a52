//! Request query parameters as seen by the list builder.

use std::collections::HashMap;

use url::form_urlencoded;

/// "Get value or default" lookups over request parameters.
///
/// An empty value is indistinguishable from an absent one for every filter
/// decision made by the builder; use [`ParamSource::non_empty`] for that check.
pub trait ParamSource {
    /// First value for `key`, if the key is present at all.
    fn param(&self, key: &str) -> Option<&str>;

    fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.param(key).filter(|v| !v.is_empty())
    }
}

impl ParamSource for HashMap<String, String> {
    fn param(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Path plus decoded query pairs of one inbound request, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    path: String,
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new(path: impl Into<String>, pairs: Vec<(String, String)>) -> Self {
        Self {
            path: path.into(),
            pairs,
        }
    }

    /// Split a request target (`/path?a=1&b=2`) into path and decoded pairs.
    pub fn parse(target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };
        Self::from_parts(path, Some(query))
    }

    pub fn from_parts(path: &str, query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self::new(path, pairs)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Parse a pagination window value. Anything that is not a non-negative
    /// integer coerces to zero.
    pub(crate) fn window_value(&self, key: &str, default: u64) -> u64 {
        match self.param(key) {
            Some(raw) => parse_window(raw),
            None => default,
        }
    }
}

impl ParamSource for RequestParams {
    fn param(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn parse_window(raw: &str) -> u64 {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

#[cfg(feature = "axum")]
mod extract {
    use super::RequestParams;
    use axum::extract::FromRequestParts;
    use axum::http::request::Parts;
    use std::convert::Infallible;

    /// Usage in handlers:
    ///   async fn list_tasks(params: RequestParams, /* ... */) { /* ... */ }
    impl<S> FromRequestParts<S> for RequestParams
    where
        S: Send + Sync,
    {
        type Rejection = Infallible;

        #[allow(clippy::manual_async_fn)]
        fn from_request_parts(
            parts: &mut Parts,
            _state: &S,
        ) -> impl core::future::Future<Output = Result<Self, Self::Rejection>> + Send {
            let params = RequestParams::from_parts(parts.uri.path(), parts.uri.query());
            async move { Ok(params) }
        }
    }
}
