use crate::entity::{project, task};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    Schema,
};

/// Create the `projects` and `tasks` tables if they are missing.
pub async fn bootstrap(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut projects = schema.create_table_from_entity(project::Entity);
    projects.if_not_exists();
    db.execute(backend.build(&projects)).await?;

    let mut tasks = schema.create_table_from_entity(task::Entity);
    tasks.if_not_exists();
    db.execute(backend.build(&tasks)).await?;

    tracing::debug!("schema ready");
    Ok(())
}

/// Insert a small demo data set. Does nothing when tasks already exist.
pub async fn seed_demo(db: &DatabaseConnection) -> Result<(), DbErr> {
    if task::Entity::find().count(db).await? > 0 {
        tracing::debug!("tasks table not empty, skipping seed");
        return Ok(());
    }

    let projects = [(1, "alpha"), (2, "beta")].map(|(id, name)| project::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
    });
    project::Entity::insert_many(projects).exec(db).await?;

    let tasks = [
        (1, "write docs", "active", 2, 1, 1),
        (2, "fix cat bug", "active", 3, 1, 2),
        (3, "release", "done", 1, 2, 1),
        (4, "feed the cat", "active", 1, 2, 2),
        (5, "plan sprint", "active", 2, 1, 1),
        (6, "retro", "done", 1, 1, 2),
    ]
    .map(
        |(id, title, status, priority, owner_id, project_id)| task::ActiveModel {
            id: Set(id),
            title: Set(title.to_owned()),
            status: Set(status.to_owned()),
            priority: Set(priority),
            owner_id: Set(owner_id),
            project_id: Set(project_id),
        },
    );
    task::Entity::insert_many(tasks).exec(db).await?;

    tracing::info!("demo data seeded");
    Ok(())
}
