//! Task listing service: a single paginated, filterable list endpoint
//! backed by SeaORM and served with axum.

pub mod entity;
pub mod problem;
pub mod routes;
pub mod schema;

pub use routes::{router, AppState};
