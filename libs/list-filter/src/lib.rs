//! Request-driven list filtering for SeaORM selects.
//!
//! A [`ListFilter`] is built per inbound request from its query parameters,
//! configured with chained calls, and consumed by a single [`ListFilter::find`]
//! which runs one COUNT and one paged fetch and computes the next-page link.
//!
//! ```ignore
//! let listing = ListFilter::<task::Entity>::new(params, &settings)
//!     .apply_access_filter(|q| q.filter(task::Column::OwnerId.eq(uid)))
//!     .filters(["status", "project_id"])
//!     .likes(["title"])
//!     .alias("owner", "owner_id")
//!     .find::<TaskRow, _>(&db)
//!     .await?;
//! ```

pub mod builder;
pub mod column;
pub mod error;
pub mod next_link;
pub mod order;
pub mod page;
pub mod params;
pub mod settings;

pub use builder::{ComposedQuery, ListFilter};
pub use column::ColumnPath;
pub use error::{ListError, ListResult};
pub use next_link::next_url;
pub use order::{OrderBy, OrderKey};
pub use page::{ListMeta, ListResponse, Listing};
pub use params::{ParamSource, RequestParams};
pub use settings::ListSettings;
