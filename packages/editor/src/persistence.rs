//! # Persistence Adapter
//!
//! The editor never stores anything itself. Projects are records keyed by a
//! [`ProjectId`] holding the node map plus metadata (title, slug, published
//! flag, timestamps) that the editor does not interpret.
//!
//! Adapters do not retry and do not queue writes; failures are returned to
//! the caller as [`PersistenceError`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::id_generator::generate_id;
use crate::node::NodeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(generate_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Project not found: {0}")]
    NotFound(ProjectId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage failure: {0}")]
    Backend(String),
}

/// Stored project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub title: String,
    pub slug: String,
    /// Template the project was seeded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub nodes: NodeMap,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            slug: self.slug.clone(),
            published: self.published,
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry (dashboard view)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub title: String,
    pub slug: String,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}

/// Storage boundary used by the editor
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Full record of a project
    async fn fetch(&self, id: &ProjectId) -> Result<ProjectRecord, PersistenceError>;

    /// Node map of a project
    async fn load(&self, id: &ProjectId) -> Result<NodeMap, PersistenceError> {
        Ok(self.fetch(id).await?.nodes)
    }

    /// Replace a project's node map
    async fn save(&self, id: &ProjectId, nodes: NodeMap) -> Result<(), PersistenceError>;

    /// Store a new project and return its id
    async fn create(
        &self,
        title: &str,
        template_id: Option<&str>,
        nodes: NodeMap,
    ) -> Result<ProjectId, PersistenceError>;

    async fn set_published(&self, id: &ProjectId, published: bool) -> Result<(), PersistenceError>;

    /// All projects, most recently updated first
    async fn list(&self) -> Result<Vec<ProjectSummary>, PersistenceError>;

    async fn delete(&self, id: &ProjectId) -> Result<(), PersistenceError>;
}

/// URL-safe slug of a title: lowercase, `[a-z0-9-]` only, no repeated or
/// edge dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' };
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("page");
    }
    slug
}

/// First of `base`, `base-1`, `base-2`, ... not in `taken`
fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut counter = 0;
    while taken.contains(&candidate) {
        counter += 1;
        candidate = format!("{}-{}", base, counter);
    }
    candidate
}

fn new_record(
    title: &str,
    template_id: Option<&str>,
    nodes: NodeMap,
    taken: &HashSet<String>,
) -> ProjectRecord {
    let now = Utc::now();
    ProjectRecord {
        id: ProjectId::generate(),
        title: title.to_string(),
        slug: unique_slug(&slugify(title), taken),
        template_id: template_id.map(str::to_string),
        nodes,
        published: false,
        created_at: now,
        updated_at: now,
    }
}

fn sort_summaries(mut summaries: Vec<ProjectSummary>) -> Vec<ProjectSummary> {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
    summaries
}

/// In-process store, used by tests and as a scratch backend
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    records: RwLock<HashMap<ProjectId, ProjectRecord>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryAdapter {
    async fn fetch(&self, id: &ProjectId) -> Result<ProjectRecord, PersistenceError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))
    }

    async fn save(&self, id: &ProjectId, nodes: NodeMap) -> Result<(), PersistenceError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        record.nodes = nodes;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn create(
        &self,
        title: &str,
        template_id: Option<&str>,
        nodes: NodeMap,
    ) -> Result<ProjectId, PersistenceError> {
        let mut records = self.records.write().await;
        let taken: HashSet<String> = records.values().map(|r| r.slug.clone()).collect();
        let record = new_record(title, template_id, nodes, &taken);
        let id = record.id.clone();
        records.insert(id.clone(), record);
        Ok(id)
    }

    async fn set_published(&self, id: &ProjectId, published: bool) -> Result<(), PersistenceError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        record.published = published;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ProjectSummary>, PersistenceError> {
        let records = self.records.read().await;
        Ok(sort_summaries(records.values().map(ProjectRecord::summary).collect()))
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), PersistenceError> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))
    }
}

/// One JSON file per project in a directory
#[derive(Debug, Clone)]
pub struct FileAdapter {
    dir: PathBuf,
}

impl FileAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ProjectId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn write(&self, record: &ProjectRecord) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&record.id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(record)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(project = %record.id, path = %path.display(), "Wrote project");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ProjectRecord>, PersistenceError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<ProjectRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable project file"),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl PersistenceAdapter for FileAdapter {
    async fn fetch(&self, id: &ProjectId) -> Result<ProjectRecord, PersistenceError> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(id.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, id: &ProjectId, nodes: NodeMap) -> Result<(), PersistenceError> {
        let mut record = self.fetch(id).await?;
        record.nodes = nodes;
        record.updated_at = Utc::now();
        self.write(&record).await
    }

    async fn create(
        &self,
        title: &str,
        template_id: Option<&str>,
        nodes: NodeMap,
    ) -> Result<ProjectId, PersistenceError> {
        let taken: HashSet<String> = self.read_all().await?.into_iter().map(|r| r.slug).collect();
        let record = new_record(title, template_id, nodes, &taken);
        self.write(&record).await?;
        info!(project = %record.id, slug = %record.slug, "Created project");
        Ok(record.id)
    }

    async fn set_published(&self, id: &ProjectId, published: bool) -> Result<(), PersistenceError> {
        let mut record = self.fetch(id).await?;
        record.published = published;
        record.updated_at = Utc::now();
        self.write(&record).await
    }

    async fn list(&self) -> Result<Vec<ProjectSummary>, PersistenceError> {
        Ok(sort_summaries(
            self.read_all().await?.iter().map(ProjectRecord::summary).collect(),
        ))
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(PersistenceError::NotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }
}
