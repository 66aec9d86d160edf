//! Adapter queries and constraints against `PostgreSQL`.

use super::helpers::{BoxError, PgApp, TestSchema};
use crate::clock_helpers::instant;
use tasklane::project::{
    ports::ProjectRepositoryError,
    services::{CreateProjectRequest, ProjectServiceError},
};
use tasklane::task::{
    domain::TaskStatus,
    ports::TaskRepository,
    services::{CreateTaskRequest, UpdateTaskRequest},
};

#[tokio::test(flavor = "multi_thread")]
async fn task_round_trips_every_field() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let project = app.project("Operations").await?;

    let created = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal")
                .with_deadline("2025-01-01")
                .with_status("in_progress"),
        )
        .await?;
    let loaded = app.tasks.get_task(created.id()).await?;

    assert_eq!(loaded, created);
    schema.drop_schema().await
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_project_name_is_rejected() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    app.project("Operations").await?;

    let result = app
        .projects
        .create_project(CreateProjectRequest::new("Operations"))
        .await;

    assert!(matches!(
        result,
        Err(ProjectServiceError::Repository(ProjectRepositoryError::DuplicateName(_)))
    ));
    schema.drop_schema().await
}

#[tokio::test(flavor = "multi_thread")]
async fn overdue_query_uses_strict_midnight_cutoff() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let project = app.project("Operations").await?;
    let mut ids = Vec::new();
    for (title, deadline, status) in [
        ("Later", "2025-01-01", "todo"),
        ("Earlier", "2024-12-31", "in_progress"),
        ("Due now", "2025-01-02", "todo"),
        ("Done", "2024-12-30", "done"),
    ] {
        let task = app
            .tasks
            .create_task(
                CreateTaskRequest::new(project.id(), title, "Scheduled chore")
                    .with_deadline(deadline)
                    .with_status(status),
            )
            .await?;
        ids.push(task.id());
    }
    app.tasks
        .create_task(CreateTaskRequest::new(project.id(), "Undated", "No rush"))
        .await?;

    let overdue: Vec<_> = app
        .task_store
        .find_overdue(instant("2025-01-02T00:00:00Z")?)
        .await?
        .iter()
        .map(|task| task.id())
        .collect();

    assert_eq!(overdue, vec![ids[1], ids[0]]);
    schema.drop_schema().await
}

#[tokio::test(flavor = "multi_thread")]
async fn conditional_close_only_applies_once() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let project = app.project("Operations").await?;
    let task = app
        .tasks
        .create_task(CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal"))
        .await?;
    let first_close = instant("2025-01-02T00:00:00Z")?;

    let first = app.task_store.close_if_not_done(task.id(), first_close).await?;
    let second = app
        .task_store
        .close_if_not_done(task.id(), instant("2025-01-03T00:00:00Z")?)
        .await?;
    let stored = app.tasks.get_task(task.id()).await?;

    assert!(first);
    assert!(!second);
    assert_eq!(stored.status(), TaskStatus::Done);
    assert_eq!(stored.closed_at(), Some(first_close));
    schema.drop_schema().await
}

#[tokio::test(flavor = "multi_thread")]
async fn reopening_clears_close_time_in_storage() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let project = app.project("Operations").await?;
    let task = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal")
                .with_status("done"),
        )
        .await?;

    app.tasks
        .update_task(UpdateTaskRequest::new(task.id()).with_status("todo"))
        .await?;
    let stored = app.tasks.get_task(task.id()).await?;

    assert_eq!(stored.status(), TaskStatus::Todo);
    assert_eq!(stored.closed_at(), None);
    schema.drop_schema().await
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_project_removes_its_tasks() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let project = app.project("Operations").await?;
    let other = app.project("Home").await?;
    for title in ["First", "Second"] {
        app.tasks
            .create_task(CreateTaskRequest::new(project.id(), title, "Chore"))
            .await?;
    }
    app.tasks
        .create_task(CreateTaskRequest::new(other.id(), "Paint fence", "Two coats"))
        .await?;

    let removed = app.projects.delete_project(project.id()).await?;

    assert_eq!(removed, 2);
    assert_eq!(app.tasks.count_by_project(other.id()).await?, 1);
    assert_eq!(app.projects.project_count().await?, 1);
    schema.drop_schema().await
}

#[tokio::test(flavor = "multi_thread")]
async fn status_listing_filters_by_project_in_storage() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let operations = app.project("Operations").await?;
    let finance = app.project("Finance").await?;
    let mine = app
        .tasks
        .create_task(CreateTaskRequest::new(operations.id(), "Renew domain", "Registrar renewal"))
        .await?;
    app.tasks
        .create_task(CreateTaskRequest::new(finance.id(), "File taxes", "Quarterly filing"))
        .await?;
    app.tasks
        .create_task(
            CreateTaskRequest::new(operations.id(), "Rotate keys", "Yearly rotation")
                .with_status("done"),
        )
        .await?;

    let listed = app.tasks.list_by_status(operations.id(), "todo").await?;

    assert_eq!(listed, vec![mine]);
    schema.drop_schema().await
}
