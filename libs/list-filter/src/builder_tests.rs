use super::*;
use crate::error::ListError;
use sea_orm::{
    ColumnTrait, Database, DatabaseConnection, DbBackend, QueryTrait, RelationTrait,
};
use std::collections::BTreeSet;
use tracing_test::traced_test;

mod project {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "projects")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::task::Entity")]
        Task,
    }

    impl Related<super::task::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Task.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

mod task {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "tasks")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub title: String,
        pub status: String,
        pub owner_id: i64,
        pub project_id: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::project::Entity",
            from = "Column::ProjectId",
            to = "super::project::Column::Id"
        )]
        Project,
    }

    impl Related<super::project::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Project.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

fn builder(target: &str) -> ListFilter<task::Entity> {
    ListFilter::new(RequestParams::parse(target), &ListSettings::default())
}

fn sql(select: &Select<task::Entity>) -> String {
    select.build(DbBackend::Sqlite).to_string()
}

fn page_sql(f: &ListFilter<task::Entity>) -> String {
    sql(&f.compose().unwrap().page)
}

fn count_sql(f: &ListFilter<task::Entity>) -> String {
    sql(&f.compose().unwrap().filtered)
}

#[test]
fn window_defaults_and_request_values() {
    let f = builder("/tasks");
    assert_eq!((f.offset(), f.limit()), (0, 10));

    let f = builder("/tasks?offset=30&limit=15");
    assert_eq!((f.offset(), f.limit()), (30, 15));

    let f = builder("/tasks?offset=x&limit=");
    assert_eq!((f.offset(), f.limit()), (0, 0));
}

#[test]
fn max_limit_clamps_request() {
    let settings = ListSettings::default().with_max_limit(50);
    let f = ListFilter::<task::Entity>::new(RequestParams::parse("/t?limit=500"), &settings);
    assert_eq!(f.limit(), 50);
}

#[test]
fn status_scenario() {
    let f = builder("/tasks?offset=0&limit=10&status=active").filters(["status"]);

    let count = count_sql(&f);
    assert!(count.contains(r#"WHERE "tasks"."status" = 'active'"#), "{count}");
    assert!(!count.contains("LIMIT"), "{count}");
    assert!(!count.contains("ORDER BY"), "{count}");

    let page = page_sql(&f);
    assert!(page.contains(r#"WHERE "tasks"."status" = 'active'"#), "{page}");
    assert!(page.ends_with("LIMIT 10 OFFSET 0"), "{page}");
}

#[test]
fn absent_or_empty_filter_adds_nothing() {
    for target in ["/tasks", "/tasks?status=", "/tasks?status=&title="] {
        let f = builder(target).filters(["status"]).likes(["title"]);
        let count = count_sql(&f);
        assert!(!count.contains("WHERE"), "{target}: {count}");
    }
}

#[test]
fn default_order_is_id_desc() {
    let page = page_sql(&builder("/tasks"));
    assert!(page.contains(r#"ORDER BY "tasks"."id" DESC"#), "{page}");
}

#[test]
fn order_from_request_then_explicit_override() {
    let f = builder("/tasks?order=title%20asc");
    assert!(page_sql(&f).contains(r#"ORDER BY "tasks"."title" ASC"#));

    let f = f.order("projects.name desc, id");
    let page = page_sql(&f);
    assert!(
        page.contains(r#"ORDER BY "projects"."name" DESC, "tasks"."id" ASC"#),
        "{page}"
    );
}

#[test]
fn bad_order_surfaces_at_compose() {
    let f = builder("/tasks?order=id%3B%20DROP%20TABLE%20tasks");
    assert!(matches!(f.compose(), Err(ListError::InvalidOrder(_))));
}

#[test]
fn like_wildcards_both_sides() {
    let f = builder("/tasks?title=cat").like("title");
    let count = count_sql(&f);
    assert!(count.contains(r#""tasks"."title" LIKE '%cat%'"#), "{count}");
}

#[test]
fn explicit_equality_ignores_request() {
    let f = builder("/tasks?owner_id=99").where_eq("owner_id", 7i64);
    let count = count_sql(&f);
    assert!(count.contains(r#""tasks"."owner_id" = 7"#), "{count}");
    assert!(!count.contains("99"), "{count}");
}

#[test]
fn map_shaped_state_is_last_write_wins() {
    let f = builder("/tasks")
        .where_eq("owner_id", 1i64)
        .where_eq("owner_id", 2i64)
        .where_raw("LENGTH(title) > ?", 3)
        .where_raw("LENGTH(title) > ?", 5);
    let count = count_sql(&f);
    assert!(count.contains(r#""tasks"."owner_id" = 2"#), "{count}");
    assert!(!count.contains(r#""tasks"."owner_id" = 1"#), "{count}");
    assert!(count.contains("LENGTH(title) > 5"), "{count}");
    assert!(!count.contains("LENGTH(title) > 3"), "{count}");
}

#[test]
fn list_shaped_state_keeps_duplicates() {
    let f = builder("/tasks?status=open").filters(["status", "status"]);
    let count = count_sql(&f);
    assert_eq!(count.matches(r#""tasks"."status" = 'open'"#).count(), 2, "{count}");
}

#[test]
fn alias_maps_param_to_field() {
    let f = builder("/tasks?q=foo").alias("q", "title");
    let count = count_sql(&f);
    assert!(count.contains(r#""tasks"."title" = 'foo'"#), "{count}");
    assert!(!count.contains(r#""q""#), "{count}");
}

#[test]
fn constraints_apply_in_configured_order() {
    let f = builder("/tasks?status=open&title=x&q=y")
        .filters(["status"])
        .where_eq("owner_id", 1i64)
        .like("title")
        .where_raw("project_id > ?", 0)
        .alias("q", "title");
    let count = count_sql(&f);
    let where_clause = &count[count.find("WHERE").unwrap()..];

    let pos = |needle: &str| {
        where_clause
            .find(needle)
            .unwrap_or_else(|| panic!("{needle} in {where_clause}"))
    };
    assert!(pos(r#""tasks"."status""#) < pos(r#""tasks"."owner_id""#));
    assert!(pos(r#""tasks"."owner_id""#) < pos("LIKE"));
    assert!(pos("LIKE") < pos("project_id > 0"));
    assert!(pos("project_id > 0") < pos(r#""tasks"."title" = 'y'"#));
}

#[test]
fn access_filter_applies_before_predicates() {
    let f = builder("/tasks?status=open")
        .apply_access_filter(|q| q.filter(task::Column::OwnerId.eq(42)))
        .filters(["status"]);
    let count = count_sql(&f);
    let owner = count.find(r#""tasks"."owner_id" = 42"#).unwrap();
    let status = count.find(r#""tasks"."status" = 'open'"#).unwrap();
    assert!(owner < status, "{count}");
}

#[test]
fn joins_constrain_count_and_preloads_only_the_page() {
    let f = builder("/tasks")
        .preload::<project::Entity>()
        .join::<project::Entity>();

    let count = count_sql(&f);
    assert!(
        count.contains(r#"INNER JOIN "projects" ON "tasks"."project_id" = "projects"."id""#),
        "{count}"
    );
    assert!(!count.contains("LEFT JOIN"), "{count}");
    assert!(!count.contains("projects_name"), "{count}");

    let page = page_sql(&f);
    assert!(
        page.contains(
            r#"LEFT JOIN "projects" AS "preload_projects" ON "tasks"."project_id" = "preload_projects"."id""#
        ),
        "{page}"
    );
    assert!(
        page.contains(r#""preload_projects"."name" AS "projects_name""#),
        "{page}"
    );
    assert!(page.contains(r#""preload_projects"."id" AS "projects_id""#), "{page}");
}

#[test]
fn relation_values_and_builders_join_alike() {
    let by_type = count_sql(&builder("/tasks").join::<project::Entity>());
    let by_value = count_sql(&builder("/tasks").joins([task::Relation::Project]));
    let by_fn = count_sql(&builder("/tasks").join_with(|| task::Relation::Project.def()));
    assert_eq!(by_type, by_value);
    assert_eq!(by_type, by_fn);
}

#[test]
fn compose_is_repeatable() {
    let f = builder("/tasks")
        .join::<project::Entity>()
        .preload::<project::Entity>();
    assert_eq!(page_sql(&f), page_sql(&f));
    assert_eq!(count_sql(&f), count_sql(&f));
}

#[test]
fn to_many_preload_is_rejected() {
    let f = ListFilter::<project::Entity>::new(
        RequestParams::parse("/projects"),
        &ListSettings::default(),
    )
    .preload::<task::Entity>();
    assert!(matches!(
        f.compose(),
        Err(ListError::InvalidPreload(t)) if t == "tasks"
    ));

    let f = ListFilter::<project::Entity>::new(
        RequestParams::parse("/projects"),
        &ListSettings::default(),
    )
    .preload_with::<task::Entity, _>(|| task::Relation::Project.def().rev());
    let err = f.compose().unwrap_err();
    assert!(matches!(err, ListError::InvalidPreload(_)));
    assert!(!err.is_client_error());
}

#[test]
fn unsafe_field_name_is_rejected() {
    let f = builder("/tasks?x=1").filters(["status = 1 OR 1"]);
    // parameter absent: nothing to check yet
    assert!(f.compose().is_ok());

    let f = builder("/tasks").where_eq("status = 1 OR 1", 1);
    assert!(matches!(f.compose(), Err(ListError::InvalidField(_))));
}

async fn seeded_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect sqlite");
    for stmt in [
        "CREATE TABLE projects (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            owner_id INTEGER NOT NULL,
            project_id INTEGER NOT NULL
        )",
        "INSERT INTO projects (id, name) VALUES (1, 'alpha'), (2, 'beta')",
        "INSERT INTO tasks (id, title, status, owner_id, project_id) VALUES
            (1, 'write docs', 'active', 1, 1),
            (2, 'fix cat bug', 'active', 1, 2),
            (3, 'release', 'done', 2, 1),
            (4, 'feed the cat', 'active', 2, 2),
            (5, 'plan', 'active', 1, 1)",
    ] {
        db.execute_unprepared(stmt).await.expect("seed");
    }
    db
}

#[tokio::test]
#[traced_test]
async fn find_counts_ignoring_window() {
    let db = seeded_db().await;

    let listing = builder("/api/v1/tasks?offset=0&limit=2&status=active")
        .filters(["status"])
        .find_models(&db)
        .await
        .unwrap();

    assert_eq!(listing.rows_count, 4);
    assert_eq!(
        listing.items.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![5, 4]
    );
    assert_eq!(
        listing.next_url,
        "http://127.0.0.1:8080/api/v1/tasks?limit=2&offset=2&status=active"
    );
    assert_eq!(listing.meta().total_count, 4);
    assert!(logs_contain("list query executed"));
}

#[tokio::test]
async fn find_into_projection_with_preload() {
    #[derive(Debug, FromQueryResult)]
    struct Row {
        id: i64,
        title: String,
        projects_name: Option<String>,
    }

    let db = seeded_db().await;
    let listing = builder("/tasks?title=cat&order=id")
        .like("title")
        .preload::<project::Entity>()
        .find::<Row, _>(&db)
        .await
        .unwrap();

    assert_eq!(listing.rows_count, 2);
    let got: Vec<_> = listing
        .items
        .iter()
        .map(|r| (r.id, r.title.as_str(), r.projects_name.as_deref()))
        .collect();
    assert_eq!(
        got,
        vec![
            (2, "fix cat bug", Some("beta")),
            (4, "feed the cat", Some("beta")),
        ]
    );
}

#[tokio::test]
async fn preload_keeps_one_row_per_entity() {
    let db = seeded_db().await;

    let plain = builder("/tasks").find_models(&db).await.unwrap();
    let preloaded = builder("/tasks")
        .preload::<project::Entity>()
        .find_models(&db)
        .await
        .unwrap();

    assert_eq!(preloaded.rows_count, plain.rows_count);
    let ids: Vec<i64> = preloaded.items.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![5, 4, 3, 2, 1]);
    assert_eq!(ids.iter().collect::<BTreeSet<_>>().len(), ids.len());
}

#[tokio::test]
async fn to_many_preload_fails_before_querying() {
    let db = seeded_db().await;
    let err = ListFilter::<project::Entity>::new(
        RequestParams::parse("/projects"),
        &ListSettings::default(),
    )
    .preload_with::<task::Entity, _>(|| task::Relation::Project.def().rev())
    .find_models(&db)
    .await
    .unwrap_err();
    assert!(matches!(err, ListError::InvalidPreload(_)));
}

#[tokio::test]
async fn preload_and_join_on_the_same_relation() {
    #[derive(Debug, FromQueryResult)]
    struct Row {
        id: i64,
        projects_name: Option<String>,
    }

    let db = seeded_db().await;
    let listing = builder("/tasks")
        .preload::<project::Entity>()
        .join::<project::Entity>()
        .where_raw("projects.name = ?", "alpha")
        .find::<Row, _>(&db)
        .await
        .unwrap();

    assert_eq!(listing.rows_count, 3);
    assert_eq!(
        listing.items.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![5, 3, 1]
    );
    assert!(listing
        .items
        .iter()
        .all(|r| r.projects_name.as_deref() == Some("alpha")));
}

#[tokio::test]
async fn join_constrains_count() {
    let db = seeded_db().await;
    let listing = builder("/tasks")
        .joins([task::Relation::Project])
        .where_raw("projects.name = ?", "alpha")
        .find_models(&db)
        .await
        .unwrap();
    assert_eq!(listing.rows_count, 3);
    assert!(listing.items.iter().all(|t| t.project_id == 1));
}

#[tokio::test]
async fn db_errors_propagate() {
    let db = seeded_db().await;
    let err = builder("/tasks?nope=1")
        .filters(["nope"])
        .find_models(&db)
        .await
        .unwrap_err();
    assert!(matches!(err, ListError::Db(_)));
    assert!(!err.is_client_error());
}
