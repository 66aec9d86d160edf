//! Autoclose sweeps against `PostgreSQL`.

use super::helpers::{BoxError, PgApp, TestSchema};
use crate::clock_helpers::instant;
use diesel::connection::SimpleConnection;
use std::sync::Arc;
use std::time::Duration;
use tasklane::autoclose::AutocloseService;
use tasklane::task::{
    adapters::postgres::PostgresTaskRepository, domain::TaskStatus, services::CreateTaskRequest,
};

#[tokio::test(flavor = "multi_thread")]
async fn sweep_closes_overdue_tasks_and_is_idempotent() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let project = app.project("Operations").await?;
    let overdue = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal")
                .with_deadline("2025-01-01"),
        )
        .await?;
    app.clock.set(instant("2024-12-31")?);
    let done = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "File taxes", "Quarterly filing")
                .with_deadline("2025-01-01")
                .with_status("done"),
        )
        .await?;
    let now = instant("2025-01-02T00:00:00Z")?;

    let first = app.autoclose.run_sweep(now).await?;
    let second = app.autoclose.run_sweep(now).await?;

    assert_eq!(first.closed(), [overdue.id()]);
    assert!(first.is_clean());
    assert_eq!(second.candidate_count(), 0);
    let closed = app.tasks.get_task(overdue.id()).await?;
    assert_eq!(closed.status(), TaskStatus::Done);
    assert_eq!(closed.closed_at(), Some(now));
    assert_eq!(
        app.tasks.get_task(done.id()).await?.closed_at(),
        Some(instant("2024-12-31")?)
    );
    schema.drop_schema().await
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_sweeps_close_each_task_once() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let project = app.project("Operations").await?;
    for day in 1..=5 {
        app.tasks
            .create_task(
                CreateTaskRequest::new(project.id(), format!("Chore {day}"), "Routine")
                    .with_deadline(format!("2024-12-0{day}")),
            )
            .await?;
    }
    let now = instant("2025-01-02T00:00:00Z")?;

    let (left, right) = tokio::join!(app.autoclose.run_sweep(now), app.autoclose.run_sweep(now));
    let (left, right) = (left?, right?);

    assert_eq!(left.closed_count() + right.closed_count(), 5);
    assert!(left.is_clean() && right.is_clean());
    schema.drop_schema().await
}

#[tokio::test(flavor = "multi_thread")]
async fn sweep_blocked_by_row_lock_fails_without_closing_later() -> Result<(), BoxError> {
    let schema = TestSchema::create().await?;
    let app = PgApp::new(&schema)?;
    let project = app.project("Operations").await?;
    let task = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal")
                .with_deadline("2025-01-01"),
        )
        .await?;
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let pool = schema.pool();
    let task_id = task.id();
    let holder = tokio::task::spawn_blocking(move || -> Result<(), BoxError> {
        let mut conn = pool.get()?;
        conn.batch_execute(&format!(
            "BEGIN; SELECT 1 FROM tasks WHERE id = '{task_id}' FOR UPDATE"
        ))?;
        locked_tx
            .send(())
            .map_err(|()| "sweep side stopped waiting")?;
        std::thread::sleep(Duration::from_secs(3));
        conn.batch_execute("ROLLBACK")?;
        Ok(())
    });
    locked_rx.await?;
    let store = PostgresTaskRepository::with_statement_timeout(
        schema.pool(),
        Duration::from_millis(500),
    );
    let autoclose = AutocloseService::new(Arc::new(store), Duration::from_secs(2));

    let report = autoclose.run_sweep(instant("2025-01-02T00:00:00Z")?).await?;
    holder.await??;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(report.failed_ids(), [task.id()]);
    assert!(report.closed().is_empty());
    let stored = app.tasks.get_task(task.id()).await?;
    assert_eq!(stored.status(), TaskStatus::Todo);
    assert_eq!(stored.closed_at(), None);
    schema.drop_schema().await
}
