use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::params::{ParamSource, RequestParams};

/// Link to the page after the current one.
///
/// Every original query parameter is carried over, `offset` is advanced by
/// `limit`, and each equality filter that is non-empty on the request is set
/// explicitly to its first value. Keys are emitted in sorted order.
pub fn next_url(
    api_prefix: &str,
    params: &RequestParams,
    offset: u64,
    limit: u64,
    filters: &[String],
) -> String {
    let mut query: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (k, v) in params.pairs() {
        query.entry(k.as_str()).or_default().push(v.clone());
    }

    query.insert("offset", vec![offset.saturating_add(limit).to_string()]);

    for filter in filters {
        if let Some(v) = params.non_empty(filter) {
            query.insert(filter.as_str(), vec![v.to_string()]);
        }
    }

    let mut ser = form_urlencoded::Serializer::new(String::new());
    for (k, values) in &query {
        for v in values {
            ser.append_pair(k, v);
        }
    }

    format!("{}{}?{}", api_prefix, params.path(), ser.finish())
}
