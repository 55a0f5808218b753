pub mod add;
pub mod delete;
pub mod init;
pub mod list;
pub mod new;
pub mod publish;
pub mod set;
pub mod show;
pub mod templates;

pub use add::{add, AddArgs};
pub use delete::{delete, DeleteArgs};
pub use init::{init, InitArgs};
pub use list::list;
pub use new::{new, NewArgs};
pub use publish::{publish, PublishArgs};
pub use set::{set, SetArgs};
pub use show::{show, ShowArgs};
pub use templates::templates;

use crate::config::Config;
use anyhow::{anyhow, Result};
use litebuilder_editor::{
    EditSession, FileAdapter, PersistenceAdapter, PersistenceError, ProjectId, TemplateLibrary,
};

/// Project store for the current directory
pub struct Store {
    pub config: Config,
    pub adapter: FileAdapter,
    pub library: TemplateLibrary,
}

impl Store {
    pub fn open(cwd: &str) -> Result<Self> {
        let config = Config::load(cwd)?;
        let adapter = FileAdapter::new(config.get_projects_dir(cwd));
        let library = TemplateLibrary::builtin()?;
        Ok(Self {
            config,
            adapter,
            library,
        })
    }

    /// Look a project up by id, then by slug
    pub async fn resolve(&self, project: &str) -> Result<ProjectId> {
        let id = ProjectId::new(project);
        match self.adapter.fetch(&id).await {
            Ok(_) => return Ok(id),
            Err(PersistenceError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        self.adapter
            .list()
            .await?
            .into_iter()
            .find(|p| p.slug == project)
            .map(|p| p.id)
            .ok_or_else(|| anyhow!("No project with id or slug '{}'", project))
    }

    /// Edit session bound to a stored project
    pub async fn session(&self, project: &str) -> Result<EditSession> {
        let id = self.resolve(project).await?;
        let mut session = EditSession::new("cli");
        session.open(&self.adapter, &id).await?;
        Ok(session)
    }
}
