//! The authoritative in-memory project store.
//!
//! One keyed map owns the canonical aggregate for every project id. Each
//! entry sits behind its own `RwLock`, so two writers targeting the same
//! project serialize against each other while writers on different projects
//! proceed in parallel. Readers always receive a cloned snapshot taken under
//! the entry's read lock, never a view into a half-applied mutation.
//!
//! Nothing here is durable; the map lives exactly as long as the process.
//! Durability, where wanted, is layered on externally by consuming the same
//! event stream the hub fans out.

use std::sync::Arc;

use dashmap::DashMap;
use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::NetsimError;
use crate::events::{self, SimulationEvent};

use super::{
    normalize, CreateProjectRequest, Project, ProjectSummary, UpdateProjectRequest,
};

type Entry = Arc<RwLock<Project>>;

/// Keyed map of project id -> aggregate, with per-key write serialization.
///
/// `Clone` is cheap; all state is behind an `Arc`.
#[derive(Clone, Default)]
pub struct ProjectStore {
    projects: Arc<DashMap<Uuid, Entry>>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized snapshots of every project, ordered by creation time.
    pub async fn list(&self) -> Vec<Project> {
        let entries = self.collect_entries();
        let mut projects = Vec::with_capacity(entries.len());
        for entry in entries {
            projects.push(normalize(entry.read().await.clone()));
        }
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        projects
    }

    /// Condensed listing rows for every project.
    pub async fn summaries(&self) -> Vec<ProjectSummary> {
        self.list()
            .await
            .iter()
            .map(ProjectSummary::from)
            .collect()
    }

    /// Normalized snapshot of one project.
    pub async fn get(&self, id: Uuid) -> Option<Project> {
        let entry = self.entry(id)?;
        let project = entry.read().await.clone();
        Some(normalize(project))
    }

    /// Create a project from a request, generating its id and timestamps.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateProjectRequest) -> Project {
        let mut project = Project::new(request.name);
        project.description = request.description;
        project.tags = request.tags.unwrap_or_default();
        project.topology = request.topology.unwrap_or_default();
        let project = normalize(project);

        self.projects
            .insert(project.id, Arc::new(RwLock::new(project.clone())));

        counter!("netsim_projects_created_total").increment(1);
        debug!(project_id = %project.id, "Project created");
        project
    }

    /// Merge the supplied fields over an existing project.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateProjectRequest,
    ) -> Result<Project, NetsimError> {
        let entry = self
            .entry(id)
            .ok_or_else(|| NetsimError::project_not_found(id))?;

        let mut guard = entry.write().await;
        // The entry can be deleted while we waited for the lock.
        if !self.projects.contains_key(&id) {
            return Err(NetsimError::project_not_found(id));
        }

        let mut project = guard.clone();
        if let Some(name) = request.name {
            project.name = name;
        }
        if let Some(description) = request.description {
            project.description = Some(description);
        }
        if let Some(tags) = request.tags {
            project.tags = tags;
        }
        if let Some(topology) = request.topology {
            project.topology = topology;
        }
        if let Some(simulation) = request.simulation {
            project.simulation = simulation;
        }
        if let Some(playback) = request.playback {
            project.playback = playback;
        }
        project.updated_at = chrono::Utc::now();

        let project = normalize(project);
        *guard = project.clone();

        counter!("netsim_projects_updated_total").increment(1);
        debug!(project_id = %id, "Project updated");
        Ok(project)
    }

    /// Remove a project. Returns whether anything was removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> bool {
        let removed = self.projects.remove(&id).is_some();
        if removed {
            counter!("netsim_projects_deleted_total").increment(1);
            debug!(project_id = %id, "Project deleted");
        }
        removed
    }

    /// Fold one event into a project via the reducer and store the result.
    ///
    /// The write lock is held across normalize, reduce, and store, so two
    /// events racing for the same project land in some serialized order with
    /// neither application lost.
    #[instrument(skip(self, event), fields(kind = event.kind_tag()))]
    pub async fn record_event(
        &self,
        id: Uuid,
        event: SimulationEvent,
    ) -> Result<Project, NetsimError> {
        let entry = self
            .entry(id)
            .ok_or_else(|| NetsimError::project_not_found(id))?;

        let mut guard = entry.write().await;
        if !self.projects.contains_key(&id) {
            return Err(NetsimError::project_not_found(id));
        }

        let current = normalize(guard.clone());
        let next = events::apply(&current, &event);
        *guard = next.clone();

        counter!("netsim_events_applied_total", "kind" => event.kind_tag()).increment(1);
        debug!(project_id = %id, event_id = %event.id, "Event applied");
        Ok(next)
    }

    /// Replace the entire map, normalizing every seeded aggregate.
    /// Used for bootstrap and bulk import.
    #[instrument(skip(self, projects), fields(count = projects.len()))]
    pub async fn replace_all(&self, projects: Vec<Project>) {
        self.projects.clear();
        for project in projects {
            let project = normalize(project);
            self.projects
                .insert(project.id, Arc::new(RwLock::new(project)));
        }
    }

    /// Number of projects currently held.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.len() == 0
    }

    fn entry(&self, id: Uuid) -> Option<Entry> {
        self.projects.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    // Clone the Arcs out before any await: dashmap shard guards must not be
    // held across suspension points.
    fn collect_entries(&self) -> Vec<Entry> {
        self.projects
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
