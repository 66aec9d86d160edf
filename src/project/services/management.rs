//! Service layer for project creation, lookup, update, and removal.

use crate::config::LimitsConfig;
use crate::project::{
    domain::{Project, ProjectDescription, ProjectDomainError, ProjectId, ProjectName},
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    name: String,
    description: Option<String>,
}

impl CreateProjectRequest {
    /// Creates a request with the required project name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Sets the project description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request payload for updating a project. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProjectRequest {
    project_id: ProjectId,
    name: Option<String>,
    description: Option<String>,
}

impl UpdateProjectRequest {
    /// Creates an empty update for the given project.
    #[must_use]
    pub const fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            name: None,
            description: None,
        }
    }

    /// Sets a new name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a new description; a blank value clears it.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Service-level errors for project operations.
#[derive(Debug, Error)]
pub enum ProjectServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ProjectDomainError),

    /// The project does not exist.
    #[error("project not found: {0}")]
    NotFound(ProjectId),

    /// The configured project limit has been reached.
    #[error("cannot create project, maximum of {max} projects reached")]
    LimitReached {
        /// Configured maximum.
        max: usize,
    },

    /// Project repository operation failed.
    #[error(transparent)]
    Repository(#[from] ProjectRepositoryError),

    /// Task repository operation failed while cascading a deletion.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),
}

/// Result type for project service operations.
pub type ProjectServiceResult<T> = Result<T, ProjectServiceError>;

/// Project management service.
#[derive(Clone)]
pub struct ProjectService<P, T, C>
where
    P: ProjectRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    projects: Arc<P>,
    tasks: Arc<T>,
    clock: Arc<C>,
    limits: LimitsConfig,
    creating: Arc<Mutex<()>>,
}

impl<P, T, C> ProjectService<P, T, C>
where
    P: ProjectRepository,
    T: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new project service.
    ///
    /// Clones share one creation lock, so the project limit holds across
    /// them. Services built separately, or in other processes, can still race
    /// past it.
    #[must_use]
    pub fn new(projects: Arc<P>, tasks: Arc<T>, clock: Arc<C>, limits: LimitsConfig) -> Self {
        Self {
            projects,
            tasks,
            clock,
            limits,
            creating: Arc::new(Mutex::new(())),
        }
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::LimitReached`] when the project limit is
    /// reached, [`ProjectServiceError::Domain`] for invalid input, and
    /// [`ProjectServiceError::Repository`] when the name is taken or
    /// persistence fails.
    pub async fn create_project(
        &self,
        request: CreateProjectRequest,
    ) -> ProjectServiceResult<Project> {
        let _creating = self.creating.lock().await;
        let max = self.limits.max_projects;
        if self.projects.count().await? >= max {
            return Err(ProjectServiceError::LimitReached { max });
        }

        let name = ProjectName::new(request.name)?;
        let description = request
            .description
            .map(ProjectDescription::parse)
            .transpose()?
            .flatten();

        let project = Project::new(name, description, &*self.clock);
        self.projects.store(&project).await?;
        Ok(project)
    }

    /// Retrieves a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotFound`] when the project does not
    /// exist.
    pub async fn get_project(&self, project_id: ProjectId) -> ProjectServiceResult<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or(ProjectServiceError::NotFound(project_id))
    }

    /// Lists all projects ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when lookup fails.
    pub async fn list_projects(&self) -> ProjectServiceResult<Vec<Project>> {
        Ok(self.projects.list().await?)
    }

    /// Lists projects whose name or description contains `query`, ignoring
    /// case.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when lookup fails.
    pub async fn search_projects(&self, query: &str) -> ProjectServiceResult<Vec<Project>> {
        let needle = query.trim();
        let projects = self.projects.list().await?;
        Ok(projects
            .into_iter()
            .filter(|project| project.matches(needle))
            .collect())
    }

    /// Returns the number of projects.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when counting fails.
    pub async fn project_count(&self) -> ProjectServiceResult<usize> {
        Ok(self.projects.count().await?)
    }

    /// Applies a project update.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotFound`] when the project does not
    /// exist, [`ProjectServiceError::Domain`] for invalid input, and
    /// [`ProjectServiceError::Repository`] when the new name is taken.
    pub async fn update_project(
        &self,
        request: UpdateProjectRequest,
    ) -> ProjectServiceResult<Project> {
        let UpdateProjectRequest {
            project_id,
            name,
            description,
        } = request;

        let new_name = name.map(ProjectName::new).transpose()?;
        let new_description = description.map(ProjectDescription::parse).transpose()?;

        let mut project = self.get_project(project_id).await?;
        if let Some(valid_name) = new_name {
            project.rename(valid_name, &*self.clock);
        }
        if let Some(valid_description) = new_description {
            project.set_description(valid_description, &*self.clock);
        }
        self.projects.update(&project).await?;
        Ok(project)
    }

    /// Deletes a project together with all of its tasks.
    ///
    /// Returns the number of tasks removed.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotFound`] when the project does not
    /// exist.
    pub async fn delete_project(&self, project_id: ProjectId) -> ProjectServiceResult<usize> {
        self.get_project(project_id).await?;
        let removed_tasks = self.tasks.delete_by_project(project_id).await?;
        if !self.projects.delete(project_id).await? {
            return Err(ProjectServiceError::NotFound(project_id));
        }
        Ok(removed_tasks)
    }
}
