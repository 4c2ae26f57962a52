use serde::{Deserialize, Serialize};

/// Pagination metadata placed next to the data in list responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub next: String,
    pub limit: u64,
    pub total_count: u64,
}

/// Response envelope: `{ "data": [...], "meta": { ... } }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

/// Outcome of [`crate::ListFilter::find`].
#[derive(Clone, Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// Matching rows ignoring limit and offset.
    pub rows_count: u64,
    pub offset: u64,
    pub limit: u64,
    pub next_url: String,
}

impl<T> Listing<T> {
    pub fn meta(&self) -> ListMeta {
        ListMeta {
            next: self.next_url.clone(),
            limit: self.limit,
            total_count: self.rows_count,
        }
    }

    /// Map items while preserving pagination state (Model->DTO convenience)
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        Listing {
            items: self.items.into_iter().map(f).collect(),
            rows_count: self.rows_count,
            offset: self.offset,
            limit: self.limit,
            next_url: self.next_url,
        }
    }

    pub fn into_response(self) -> ListResponse<T> {
        let meta = self.meta();
        ListResponse {
            data: self.items,
            meta,
        }
    }
}
