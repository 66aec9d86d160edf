//! In-memory repository for projects.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::project::{
    domain::{Project, ProjectId, ProjectName},
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};

/// Thread-safe in-memory project repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectRepository {
    state: Arc<RwLock<InMemoryProjectState>>,
}

#[derive(Debug, Default)]
struct InMemoryProjectState {
    projects: HashMap<ProjectId, Project>,
    name_index: HashMap<ProjectName, ProjectId>,
}

impl InMemoryProjectRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> ProjectRepositoryError {
    ProjectRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.projects.contains_key(&project.id()) {
            return Err(ProjectRepositoryError::DuplicateProject(project.id()));
        }
        if state.name_index.contains_key(project.name()) {
            return Err(ProjectRepositoryError::DuplicateName(project.name().clone()));
        }

        state.name_index.insert(project.name().clone(), project.id());
        state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let old_name = state
            .projects
            .get(&project.id())
            .ok_or(ProjectRepositoryError::NotFound(project.id()))?
            .name()
            .clone();

        let name_owner = state.name_index.get(project.name()).copied();
        if name_owner.is_some_and(|owner| owner != project.id()) {
            return Err(ProjectRepositoryError::DuplicateName(project.name().clone()));
        }

        state.name_index.remove(&old_name);
        state.name_index.insert(project.name().clone(), project.id());
        state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.projects.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &ProjectName) -> ProjectRepositoryResult<Option<Project>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .name_index
            .get(name)
            .and_then(|id| state.projects.get(id))
            .cloned())
    }

    async fn list(&self) -> ProjectRepositoryResult<Vec<Project>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut projects: Vec<Project> = state.projects.values().cloned().collect();
        projects.sort_by_key(|project| (project.created_at(), project.id().into_inner()));
        Ok(projects)
    }

    async fn count(&self) -> ProjectRepositoryResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.projects.len())
    }

    async fn delete(&self, id: ProjectId) -> ProjectRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let Some(removed) = state.projects.remove(&id) else {
            return Ok(false);
        };
        state.name_index.remove(removed.name());
        Ok(true)
    }
}
