//! In-memory repository for tasks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::project::domain::ProjectId;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    project_index: HashMap<ProjectId, Vec<TaskId>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Clones the matching tasks ordered by creation time.
fn collect_sorted<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<Task> {
    let mut found: Vec<Task> = tasks.cloned().collect();
    found.sort_by_key(|task| (task.created_at(), task.id()));
    found
}

/// Removes a task ID from the project index, cleaning up the entry if empty.
fn remove_from_project_index(state: &mut InMemoryTaskState, task: &Task) {
    let project_id = task.project_id();
    if let Some(ids) = state.project_index.get_mut(&project_id) {
        ids.retain(|id| *id != task.id());
        if ids.is_empty() {
            state.project_index.remove(&project_id);
        }
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }

        state
            .project_index
            .entry(task.project_id())
            .or_default()
            .push(task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let old_task = state
            .tasks
            .get(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?
            .clone();

        if old_task.project_id() != task.project_id() {
            remove_from_project_index(&mut state, &old_task);
            state
                .project_index
                .entry(task.project_id())
                .or_default()
                .push(task.id());
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let ids = state
            .project_index
            .get(&project_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(collect_sorted(ids.iter().filter_map(|id| state.tasks.get(id))))
    }

    async fn find_by_status(
        &self,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let ids = state
            .project_index
            .get(&project_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(collect_sorted(
            ids.iter()
                .filter_map(|id| state.tasks.get(id))
                .filter(|task| task.status() == status),
        ))
    }

    async fn count_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.project_index.get(&project_id).map_or(0, Vec::len))
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let Some(removed) = state.tasks.remove(&id) else {
            return Ok(false);
        };
        remove_from_project_index(&mut state, &removed);
        Ok(true)
    }

    async fn delete_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<usize> {
        let mut state = self.state.write().map_err(lock_error)?;
        let ids = state.project_index.remove(&project_id).unwrap_or_default();
        let removed = ids
            .into_iter()
            .filter_map(|id| state.tasks.remove(&id))
            .count();
        Ok(removed)
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut overdue = collect_sorted(
            state.tasks.values().filter(|task| task.is_overdue_at(now)),
        );
        // Stable sort keeps creation order within a deadline.
        overdue.sort_by_key(Task::deadline);
        Ok(overdue)
    }

    async fn close_if_not_done(
        &self,
        id: TaskId,
        closed_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        Ok(state
            .tasks
            .get_mut(&id)
            .is_some_and(|task| task.close_if_not_done(closed_at)))
    }
}
