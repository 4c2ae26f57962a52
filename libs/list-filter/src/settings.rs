use serde::{Deserialize, Serialize};

pub const DEFAULT_API_PREFIX: &str = "http://127.0.0.1:8080";
pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_ORDER: &str = "id DESC";

/// Process-wide listing settings, resolved once by the configuration loader
/// and handed to every [`crate::ListFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListSettings {
    /// Base URL prepended to generated next-page links.
    pub api_prefix: String,
    /// Page size used when the request carries no `limit`.
    pub default_limit: u64,
    /// Upper bound for the page size; unbounded when `None`.
    pub max_limit: Option<u64>,
    /// Sort clause used when neither the request nor the caller sets one.
    pub default_order: String,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
            default_order: DEFAULT_ORDER.to_string(),
        }
    }
}

impl ListSettings {
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_max_limit(mut self, max: u64) -> Self {
        self.max_limit = Some(max);
        self
    }

    pub(crate) fn clamp_limit(&self, limit: u64) -> u64 {
        match self.max_limit {
            Some(max) if limit > max => max,
            _ => limit,
        }
    }
}
