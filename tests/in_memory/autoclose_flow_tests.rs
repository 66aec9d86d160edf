//! Sweeps over tasks created and edited through the management services.

use super::helpers::{App, app};
use crate::clock_helpers::instant;
use rstest::rstest;
use tasklane::task::{
    domain::TaskStatus,
    services::{CreateTaskRequest, UpdateTaskRequest},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sweep_closes_only_eligible_tasks(app: App) -> Result<(), eyre::Report> {
    let project = app.project("Operations").await;
    let overdue = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal")
                .with_deadline("2025-01-01"),
        )
        .await?;
    let already_done = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "File taxes", "Quarterly filing")
                .with_deadline("2025-01-01")
                .with_status("done"),
        )
        .await?;
    let undated = app
        .tasks
        .create_task(CreateTaskRequest::new(project.id(), "Tidy wiki", "No rush"))
        .await?;
    let future = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Plan offsite", "Book venue")
                .with_deadline("2025-01-03"),
        )
        .await?;
    let now = instant("2025-01-02")?;

    let report = app.autoclose.run_sweep(now).await?;

    eyre::ensure!(report.closed() == [overdue.id()]);
    eyre::ensure!(report.is_clean());

    let closed = app.tasks.get_task(overdue.id()).await?;
    eyre::ensure!(closed.status() == TaskStatus::Done);
    eyre::ensure!(closed.closed_at() == Some(now));
    eyre::ensure!(app.tasks.get_task(already_done.id()).await? == already_done);
    eyre::ensure!(app.tasks.get_task(undated.id()).await? == undated);
    eyre::ensure!(app.tasks.get_task(future.id()).await? == future);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overdue_listing_matches_what_the_sweep_closes(app: App) -> Result<(), eyre::Report> {
    let project = app.project("Operations").await;
    for (title, deadline) in [("First", "2024-12-30"), ("Second", "2024-12-31"), ("Third", "2025-02-01")] {
        app.tasks
            .create_task(
                CreateTaskRequest::new(project.id(), title, "Scheduled chore")
                    .with_deadline(deadline),
            )
            .await?;
    }
    let now = instant("2025-01-01T12:00:00Z")?;

    let preview: Vec<_> = app
        .tasks
        .list_overdue(now, None)
        .await?
        .iter()
        .map(|task| task.id())
        .collect();
    let report = app.autoclose.run_sweep(now).await?;

    eyre::ensure!(preview.len() == 2);
    eyre::ensure!(report.closed() == preview.as_slice());
    eyre::ensure!(app.tasks.list_overdue(now, None).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rescheduled_task_is_left_open(app: App) -> Result<(), eyre::Report> {
    let project = app.project("Operations").await;
    let task = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal")
                .with_deadline("2025-01-01"),
        )
        .await?;
    app.tasks
        .update_task(UpdateTaskRequest::new(task.id()).with_deadline("2025-03-01"))
        .await?;

    let report = app.autoclose.run_sweep(instant("2025-01-02")?).await?;

    eyre::ensure!(report.closed_count() == 0);
    eyre::ensure!(app.tasks.get_task(task.id()).await?.status() == TaskStatus::Todo);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopened_task_is_closed_again_by_a_later_sweep(app: App) -> Result<(), eyre::Report> {
    let project = app.project("Operations").await;
    let task = app
        .tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal")
                .with_deadline("2025-01-01"),
        )
        .await?;
    let first_sweep = instant("2025-01-02")?;
    app.autoclose.run_sweep(first_sweep).await?;

    app.clock.set(instant("2025-01-03")?);
    let reopened = app
        .tasks
        .update_task(UpdateTaskRequest::new(task.id()).with_status("in_progress"))
        .await?;
    eyre::ensure!(reopened.closed_at().is_none());

    let second_sweep = instant("2025-01-04")?;
    let report = app.autoclose.run_sweep(second_sweep).await?;

    eyre::ensure!(report.closed() == [task.id()]);
    eyre::ensure!(app.tasks.get_task(task.id()).await?.closed_at() == Some(second_sweep));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_project_tasks_are_not_swept(app: App) -> Result<(), eyre::Report> {
    let project = app.project("Operations").await;
    app.tasks
        .create_task(
            CreateTaskRequest::new(project.id(), "Renew domain", "Registrar renewal")
                .with_deadline("2025-01-01"),
        )
        .await?;
    app.projects.delete_project(project.id()).await?;

    let report = app.autoclose.run_sweep(instant("2025-01-02")?).await?;

    eyre::ensure!(report.candidate_count() == 0);
    Ok(())
}
