use crate::{
    entity::{project, task},
    problem::{self, ProblemResponse},
};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use list_filter::{ListFilter, ListResponse, ListSettings, RequestParams};
use sea_orm::{ColumnTrait, DatabaseConnection, FromQueryResult, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const TASKS_PATH: &str = "/api/v1/tasks";

/// Callers identified by this header only see their own tasks.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub listing: Arc<ListSettings>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, listing: ListSettings) -> Self {
        Self {
            db,
            listing: Arc::new(listing),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(TASKS_PATH, get(list_tasks))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A task row with the preloaded project columns.
#[derive(Debug, FromQueryResult)]
struct TaskRow {
    id: i64,
    title: String,
    status: String,
    priority: i32,
    owner_id: i64,
    project_id: i64,
    projects_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub priority: i32,
    pub owner_id: i64,
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: i64,
    pub name: String,
}

impl From<TaskRow> for TaskDto {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            status: row.status,
            priority: row.priority,
            owner_id: row.owner_id,
            project: row.projects_name.map(|name| ProjectRef {
                id: row.project_id,
                name,
            }),
        }
    }
}

fn caller_id(headers: &HeaderMap) -> Result<Option<i64>, ProblemResponse> {
    let Some(raw) = headers.get(USER_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .map(Some)
        .ok_or_else(|| problem::bad_request(format!("{USER_HEADER} must be an integer")))
}

/// `GET /api/v1/tasks`: filter by `status`, `project_id`, `owner` and
/// substring `title`; paginate with `offset`/`limit`; sort with `order`.
async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: RequestParams,
) -> Result<Json<ListResponse<TaskDto>>, ProblemResponse> {
    let caller = caller_id(&headers)?;
    let path = params.path().to_owned();

    let listing = ListFilter::<task::Entity>::new(params, &state.listing)
        .apply_access_filter(|q| match caller {
            Some(uid) => q.filter(task::Column::OwnerId.eq(uid)),
            None => q,
        })
        .filters(["status", "project_id"])
        .likes(["title"])
        .alias("owner", "owner_id")
        .preload::<project::Entity>()
        .find::<TaskRow, _>(&state.db)
        .await
        .map_err(|e| problem::from_list_error(&e, &path))?;

    Ok(Json(listing.map_items(TaskDto::from).into_response()))
}
