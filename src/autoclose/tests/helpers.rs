//! Test doubles and builders for autoclose tests.

use crate::project::domain::ProjectId;
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Deadline, NewTask, Task, TaskDescription, TaskId, TaskStatus, TaskTitle},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::test_support::ManualClock;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Builds and stores a task created at `created_at`.
pub async fn seed_task(
    repository: &impl TaskRepository,
    created_at: DateTime<Utc>,
    deadline: Option<NaiveDate>,
    status: TaskStatus,
) -> Task {
    let clock = ManualClock::new(created_at);
    let task = Task::new(
        NewTask {
            project_id: ProjectId::new(),
            title: TaskTitle::new("Seeded task").expect("valid title"),
            description: TaskDescription::new("Seeded for autoclose tests")
                .expect("valid description"),
            deadline: deadline.map(Deadline::new),
            status,
        },
        &clock,
    );
    repository.store(&task).await.expect("store seeded task");
    task
}

/// Task repository that injects failures into the autoclose capabilities.
#[derive(Debug, Default)]
pub struct FaultyTaskRepository {
    pub inner: InMemoryTaskRepository,
    pub fail_select: bool,
    pub stall_select: bool,
    pub fail_close: HashSet<TaskId>,
    pub stall_close: HashSet<TaskId>,
    /// Tasks a "user" completes between selection and the sweep's write.
    pub completed_concurrently: HashSet<TaskId>,
    pub close_attempts: Mutex<Vec<TaskId>>,
}

impl FaultyTaskRepository {
    pub fn attempts(&self) -> Vec<TaskId> {
        self.close_attempts
            .lock()
            .expect("attempt log lock poisoned")
            .clone()
    }
}

fn injected() -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other("injected failure"))
}

#[async_trait]
impl TaskRepository for FaultyTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        self.inner.store(task).await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        self.inner.update(task).await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.find_by_project(project_id).await
    }

    async fn find_by_status(
        &self,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.find_by_status(project_id, status).await
    }

    async fn count_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<usize> {
        self.inner.count_by_project(project_id).await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<bool> {
        self.inner.delete(id).await
    }

    async fn delete_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<usize> {
        self.inner.delete_by_project(project_id).await
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<Task>> {
        if self.stall_select {
            std::future::pending::<()>().await;
        }
        if self.fail_select {
            return Err(injected());
        }
        self.inner.find_overdue(now).await
    }

    async fn close_if_not_done(
        &self,
        id: TaskId,
        closed_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        self.close_attempts
            .lock()
            .expect("attempt log lock poisoned")
            .push(id);
        if self.stall_close.contains(&id) {
            std::future::pending::<()>().await;
        }
        if self.fail_close.contains(&id) {
            return Err(injected());
        }
        if self.completed_concurrently.contains(&id) {
            let user_closed_at = closed_at - chrono::Duration::seconds(1);
            self.inner.close_if_not_done(id, user_closed_at).await?;
        }
        self.inner.close_if_not_done(id, closed_at).await
    }
}

/// Task repository whose overdue selection blocks until released.
#[derive(Debug, Default)]
pub struct GatedTaskRepository {
    pub inner: InMemoryTaskRepository,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[async_trait]
impl TaskRepository for GatedTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        self.inner.store(task).await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        self.inner.update(task).await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.find_by_project(project_id).await
    }

    async fn find_by_status(
        &self,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.find_by_status(project_id, status).await
    }

    async fn count_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<usize> {
        self.inner.count_by_project(project_id).await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<bool> {
        self.inner.delete(id).await
    }

    async fn delete_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<usize> {
        self.inner.delete_by_project(project_id).await
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<Task>> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.find_overdue(now).await
    }

    async fn close_if_not_done(
        &self,
        id: TaskId,
        closed_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        self.inner.close_if_not_done(id, closed_at).await
    }
}
