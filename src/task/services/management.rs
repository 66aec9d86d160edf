//! Service layer for task creation, lookup, update, and removal.

use crate::config::LimitsConfig;
use crate::project::{
    domain::ProjectId,
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::task::{
    domain::{
        Deadline, NewTask, ParseTaskStatusError, Task, TaskDescription, TaskDomainError, TaskId,
        TaskStatus, TaskTitle,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    project_id: ProjectId,
    title: String,
    description: String,
    deadline: Option<String>,
    status: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required task fields.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: description.into(),
            deadline: None,
            status: None,
        }
    }

    /// Sets a `YYYY-MM-DD` deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Sets the initial status; defaults to `todo`.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Request payload for updating a task. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    task_id: TaskId,
    title: Option<String>,
    description: Option<String>,
    deadline: Option<String>,
    status: Option<String>,
}

impl UpdateTaskRequest {
    /// Creates an empty update for the given task.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            title: None,
            description: None,
            deadline: None,
            status: None,
        }
    }

    /// Sets a new title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets a new description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets a new deadline; a blank value clears it.
    #[must_use]
    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Sets a new status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The supplied status is not recognized.
    #[error(transparent)]
    InvalidStatus(#[from] ParseTaskStatusError),

    /// The owning project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The project already holds the configured maximum of tasks.
    #[error("cannot add task to project {project_id}, maximum of {max} tasks reached")]
    TaskLimitReached {
        /// Project that is full.
        project_id: ProjectId,
        /// Configured maximum.
        max: usize,
    },

    /// Task repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// Project repository operation failed.
    #[error(transparent)]
    ProjectRepository(#[from] ProjectRepositoryError),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task management service.
#[derive(Clone)]
pub struct TaskService<T, P, C>
where
    T: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    projects: Arc<P>,
    clock: Arc<C>,
    limits: LimitsConfig,
    creating: Arc<Mutex<()>>,
}

impl<T, P, C> TaskService<T, P, C>
where
    T: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task service.
    ///
    /// Clones share one creation lock, so the per-project limit holds across
    /// them. Services built separately, or in other processes, can still race
    /// past it.
    #[must_use]
    pub fn new(tasks: Arc<T>, projects: Arc<P>, clock: Arc<C>, limits: LimitsConfig) -> Self {
        Self {
            tasks,
            projects,
            clock,
            limits,
            creating: Arc::new(Mutex::new(())),
        }
    }

    /// Creates a task inside an existing project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] or
    /// [`TaskServiceError::InvalidStatus`] for invalid input,
    /// [`TaskServiceError::ProjectNotFound`] when the project is missing, and
    /// [`TaskServiceError::TaskLimitReached`] when the project is full.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskServiceResult<Task> {
        let CreateTaskRequest {
            project_id,
            title,
            description,
            deadline,
            status,
        } = request;

        let new_task = NewTask {
            project_id,
            title: TaskTitle::new(title)?,
            description: TaskDescription::new(description)?,
            deadline: deadline
                .as_deref()
                .map(Deadline::parse)
                .transpose()?
                .flatten(),
            status: status
                .as_deref()
                .map(TaskStatus::try_from)
                .transpose()?
                .unwrap_or_default(),
        };

        self.require_project(project_id).await?;
        let _creating = self.creating.lock().await;
        let max = self.limits.max_tasks_per_project;
        if self.tasks.count_by_project(project_id).await? >= max {
            return Err(TaskServiceError::TaskLimitReached { project_id, max });
        }

        let task = Task::new(new_task, &*self.clock);
        self.tasks.store(&task).await?;
        Ok(task)
    }

    /// Retrieves a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task does not exist.
    pub async fn get_task(&self, task_id: TaskId) -> TaskServiceResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }

    /// Lists the tasks of a project ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::ProjectNotFound`] when the project does not
    /// exist.
    pub async fn list_by_project(&self, project_id: ProjectId) -> TaskServiceResult<Vec<Task>> {
        self.require_project(project_id).await?;
        Ok(self.tasks.find_by_project(project_id).await?)
    }

    /// Lists the tasks of a project with the given status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::InvalidStatus`] for an unknown status and
    /// [`TaskServiceError::ProjectNotFound`] when the project does not exist.
    pub async fn list_by_status(
        &self,
        project_id: ProjectId,
        status: &str,
    ) -> TaskServiceResult<Vec<Task>> {
        let parsed = TaskStatus::try_from(status)?;
        self.require_project(project_id).await?;
        Ok(self.tasks.find_by_status(project_id, parsed).await?)
    }

    /// Lists tasks of a project whose title or description contains `query`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::ProjectNotFound`] when the project does not
    /// exist.
    pub async fn search_tasks(
        &self,
        project_id: ProjectId,
        query: &str,
    ) -> TaskServiceResult<Vec<Task>> {
        let needle = query.trim();
        let tasks = self.list_by_project(project_id).await?;
        Ok(tasks.into_iter().filter(|task| task.matches(needle)).collect())
    }

    /// Lists tasks overdue at `now`, optionally restricted to one project.
    ///
    /// This is a read-only view of what the next sweep would close.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when lookup fails.
    pub async fn list_overdue(
        &self,
        now: DateTime<Utc>,
        project_id: Option<ProjectId>,
    ) -> TaskServiceResult<Vec<Task>> {
        let overdue = self.tasks.find_overdue(now).await?;
        Ok(overdue
            .into_iter()
            .filter(|task| project_id.is_none_or(|id| task.project_id() == id))
            .collect())
    }

    /// Returns the number of tasks in a project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when counting fails.
    pub async fn count_by_project(&self, project_id: ProjectId) -> TaskServiceResult<usize> {
        Ok(self.tasks.count_by_project(project_id).await?)
    }

    /// Applies a task update.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task does not exist
    /// and [`TaskServiceError::Domain`] or [`TaskServiceError::InvalidStatus`]
    /// for invalid input.
    pub async fn update_task(&self, request: UpdateTaskRequest) -> TaskServiceResult<Task> {
        let UpdateTaskRequest {
            task_id,
            title,
            description,
            deadline,
            status,
        } = request;

        let new_title = title.map(TaskTitle::new).transpose()?;
        let new_description = description.map(TaskDescription::new).transpose()?;
        let new_deadline = deadline.as_deref().map(Deadline::parse).transpose()?;
        let new_status = status.as_deref().map(TaskStatus::try_from).transpose()?;

        let mut task = self.get_task(task_id).await?;
        let clock = &*self.clock;
        if let Some(valid_title) = new_title {
            task.retitle(valid_title, clock);
        }
        if let Some(valid_description) = new_description {
            task.describe(valid_description, clock);
        }
        if let Some(valid_deadline) = new_deadline {
            task.reschedule(valid_deadline, clock);
        }
        if let Some(valid_status) = new_status {
            task.set_status(valid_status, clock);
        }
        self.tasks.update(&task).await?;
        Ok(task)
    }

    /// Marks a task as `done`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task does not exist.
    pub async fn mark_done(&self, task_id: TaskId) -> TaskServiceResult<Task> {
        let mut task = self.get_task(task_id).await?;
        task.set_status(TaskStatus::Done, &*self.clock);
        self.tasks.update(&task).await?;
        Ok(task)
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task does not exist.
    pub async fn delete_task(&self, task_id: TaskId) -> TaskServiceResult<()> {
        if !self.tasks.delete(task_id).await? {
            return Err(TaskServiceError::TaskNotFound(task_id));
        }
        Ok(())
    }

    async fn require_project(&self, project_id: ProjectId) -> TaskServiceResult<()> {
        self.projects
            .find_by_id(project_id)
            .await?
            .map(|_| ())
            .ok_or(TaskServiceError::ProjectNotFound(project_id))
    }
}
