//! Save / load flows through the persistence adapters

use async_trait::async_trait;
use litebuilder_editor::{
    EditSession, EditorError, FileAdapter, MemoryAdapter, Node, NodeKind, NodeMap, NodePatch,
    PersistenceAdapter, PersistenceError, ProjectId, ProjectRecord, ProjectSummary,
    TemplateLibrary,
};

/// Adapter whose every call fails
struct OfflineAdapter;

#[async_trait]
impl PersistenceAdapter for OfflineAdapter {
    async fn fetch(&self, _id: &ProjectId) -> Result<ProjectRecord, PersistenceError> {
        Err(PersistenceError::Backend("offline".to_string()))
    }

    async fn save(&self, _id: &ProjectId, _nodes: NodeMap) -> Result<(), PersistenceError> {
        Err(PersistenceError::Backend("offline".to_string()))
    }

    async fn create(
        &self,
        _title: &str,
        _template_id: Option<&str>,
        _nodes: NodeMap,
    ) -> Result<ProjectId, PersistenceError> {
        Err(PersistenceError::Backend("offline".to_string()))
    }

    async fn set_published(&self, _id: &ProjectId, _published: bool) -> Result<(), PersistenceError> {
        Err(PersistenceError::Backend("offline".to_string()))
    }

    async fn list(&self) -> Result<Vec<ProjectSummary>, PersistenceError> {
        Err(PersistenceError::Backend("offline".to_string()))
    }

    async fn delete(&self, _id: &ProjectId) -> Result<(), PersistenceError> {
        Err(PersistenceError::Backend("offline".to_string()))
    }
}

fn seeded(template: &str) -> EditSession {
    let library = TemplateLibrary::builtin().unwrap();
    let mut session = EditSession::new("persist");
    session.load_template(&library, template).unwrap();
    session
}

#[tokio::test]
async fn test_create_edit_save_reopen() -> anyhow::Result<()> {
    let adapter = MemoryAdapter::new();
    let mut session = seeded("template1");
    let project_id = session.create_project(&adapter, "My Launch Page").await?;
    assert!(!session.document().unwrap().is_dirty());

    session.update_node("hero-title", NodePatch::content("Launch day"))?;
    assert!(session.document().unwrap().is_dirty());
    session.save(&adapter).await?;
    assert!(!session.document().unwrap().is_dirty());

    let mut reopened = EditSession::new("other");
    reopened.open(&adapter, &project_id).await?;
    let title = reopened.document().unwrap().get("hero-title").unwrap();
    assert_eq!(title.content.as_deref(), Some("Launch day"));
    assert_eq!(reopened.project_id(), Some(&project_id));

    let record = adapter.fetch(&project_id).await?;
    assert_eq!(record.slug, "my-launch-page");
    assert_eq!(record.template_id.as_deref(), Some("template1"));
    assert!(!record.published);
    Ok(())
}

#[tokio::test]
async fn test_save_is_a_snapshot() -> anyhow::Result<()> {
    let adapter = MemoryAdapter::new();
    let mut session = seeded("template1");
    let project_id = session.create_project(&adapter, "Snapshot").await?;

    session.update_node("cta-title", NodePatch::content("before save"))?;
    let request = session.save_request()?;

    // edit lands while the save is in flight
    session.update_node("cta-title", NodePatch::content("after save"))?;

    let receipt = request.send(&adapter).await?;
    assert!(!session.mark_saved(&receipt));
    assert!(session.document().unwrap().is_dirty());

    let stored = adapter.load(&project_id).await?;
    assert_eq!(stored["cta-title"].content.as_deref(), Some("before save"));

    session.save(&adapter).await?;
    let stored = adapter.load(&project_id).await?;
    assert_eq!(stored["cta-title"].content.as_deref(), Some("after save"));
    assert!(!session.document().unwrap().is_dirty());
    Ok(())
}

#[tokio::test]
async fn test_adapter_failure_keeps_edits() {
    let adapter = OfflineAdapter;
    let mut session = seeded("template1");

    let err = session.create_project(&adapter, "Nope").await.unwrap_err();
    assert!(matches!(err, EditorError::Persistence(PersistenceError::Backend(_))));
    assert!(session.project_id().is_none());

    session
        .add_node(Node::create(NodeKind::Text, NodePatch::content("kept")))
        .unwrap();
    let err = session.open(&adapter, &ProjectId::new("abc")).await.unwrap_err();
    assert!(err.to_string().contains("offline"));
    assert_eq!(session.document().unwrap().len(), 14);
    assert!(session.document().unwrap().is_dirty());
}

#[tokio::test]
async fn test_publish_and_list() -> anyhow::Result<()> {
    let adapter = MemoryAdapter::new();
    let mut first = seeded("template1");
    let mut second = seeded("template2");
    let first_id = first.create_project(&adapter, "Same Title").await?;
    let second_id = second.create_project(&adapter, "Same Title").await?;

    first.set_published(&adapter, true).await?;

    let listing = adapter.list().await?;
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].id, first_id);
    assert!(listing[0].published);

    let slugs: Vec<&str> = listing.iter().map(|p| p.slug.as_str()).collect();
    assert!(slugs.contains(&"same-title"));
    assert!(slugs.contains(&"same-title-1"));

    adapter.delete(&second_id).await?;
    assert!(matches!(
        adapter.fetch(&second_id).await,
        Err(PersistenceError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_file_adapter_roundtrip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let adapter = FileAdapter::new(dir.path().join("projects"));

    let mut session = seeded("simple-landing-page");
    let project_id = session.create_project(&adapter, "File Backed").await?;
    session.delete_subtree("lp-social-proof")?;
    session.save(&adapter).await?;

    assert!(dir
        .path()
        .join("projects")
        .join(format!("{}.json", project_id))
        .exists());

    // stray files in the directory are skipped
    std::fs::write(dir.path().join("projects").join("notes.json"), "not a project")?;

    let listing = adapter.list().await?;
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].slug, "file-backed");

    let mut reopened = EditSession::new("reader");
    reopened.open(&adapter, &project_id).await?;
    let doc = reopened.document().unwrap();
    assert!(!doc.contains("lp-social-proof"));
    assert_eq!(doc.len(), session.document().unwrap().len());

    let missing = adapter.load(&ProjectId::new("missing")).await;
    assert!(matches!(missing, Err(PersistenceError::NotFound(_))));
    Ok(())
}
