//! # Edit Session Management
//!
//! An EditSession is one user's view of a page: the document plus the
//! session-only state that never gets persisted (selection, pending
//! insertion target, clipboard, and the project it is bound to).
//!
//! The session is where the ambient UI state becomes an explicit
//! [`Placement`]:
//!
//! 1. pending insertion target → after that node
//! 2. selected container → last child of it
//! 3. selected leaf → after it
//! 4. otherwise → last child of root

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::document::Document;
use crate::id_generator::generate_id;
use crate::mutations::{Mutation, MutationOutcome, MutationResult, Placement};
use crate::node::{Node, NodeId, NodeMap, NodePatch};
use crate::persistence::{PersistenceAdapter, ProjectId};
use crate::sections::{Section, SectionKind};
use crate::templates::TemplateLibrary;
use crate::EditorError;

/// Copied node (and, for deep copies, everything below it)
#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    pub root: Node,
    pub descendants: Vec<Node>,
}

impl Clipboard {
    /// Copy with every id replaced by a fresh one
    fn instantiate(&self) -> (Node, Vec<Node>) {
        let mut ids: HashMap<&str, NodeId> = HashMap::new();
        for node in std::iter::once(&self.root).chain(&self.descendants) {
            ids.insert(node.id.as_str(), generate_id());
        }

        let remap = |node: &Node| {
            let mut copy = node.clone();
            copy.id = ids[node.id.as_str()].clone();
            if let Some(children) = copy.children.as_mut() {
                *children = children
                    .iter()
                    .filter_map(|c| ids.get(c.as_str()).cloned())
                    .collect();
            }
            copy
        };

        (remap(&self.root), self.descendants.iter().map(remap).collect())
    }
}

/// Snapshot of a document taken for saving
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub project_id: ProjectId,
    /// Document version the snapshot was taken at
    pub version: u64,
    pub nodes: NodeMap,
}

impl SaveRequest {
    /// Send the snapshot. Edits made to the session after the snapshot was
    /// taken are not part of this save.
    pub async fn send(self, adapter: &dyn PersistenceAdapter) -> Result<SaveReceipt, EditorError> {
        adapter.save(&self.project_id, self.nodes).await?;
        info!(project = %self.project_id, version = self.version, "Saved project");
        Ok(SaveReceipt {
            project_id: self.project_id,
            version: self.version,
        })
    }
}

/// Acknowledgement of a completed save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub project_id: ProjectId,
    pub version: u64,
}

/// Single edit session
#[derive(Debug)]
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    document: Option<Document>,

    project_id: Option<ProjectId>,

    template_id: Option<String>,

    selection: Option<NodeId>,

    insertion_target: Option<NodeId>,

    clipboard: Option<Clipboard>,
}

impl EditSession {
    /// Create new edit session with no document loaded
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            document: None,
            project_id: None,
            template_id: None,
            selection: None,
            insertion_target: None,
            clipboard: None,
        }
    }

    /// Create a session around an existing document
    pub fn with_document(id: impl Into<String>, document: Document) -> Self {
        let mut session = Self::new(id);
        session.document = Some(document);
        session
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn insertion_target(&self) -> Option<&str> {
        self.insertion_target.as_deref()
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    /// Replace the document wholesale. Selection and insertion target reset.
    pub fn load_nodes(&mut self, nodes: NodeMap) -> Result<(), EditorError> {
        self.document = Some(Document::from_nodes(nodes)?);
        self.selection = None;
        self.insertion_target = None;
        Ok(())
    }

    /// Seed the document from a template (unknown ids use the default)
    pub fn load_template(&mut self, library: &TemplateLibrary, template_id: &str) -> Result<(), EditorError> {
        let resolved = library.resolve_id(template_id).to_string();
        self.load_nodes(library.get(&resolved))?;
        debug!(session = %self.id, template = %resolved, "Seeded from template");
        self.template_id = Some(resolved);
        Ok(())
    }

    /// Throw away all edits and re-seed from the session's template
    pub fn reset_to_template(&mut self, library: &TemplateLibrary) -> Result<(), EditorError> {
        let template_id = self.template_id.clone().ok_or(EditorError::NoTemplate)?;
        let mut document = Document::from_nodes(library.get(&template_id))?;
        if let Some(previous) = &self.document {
            // keep counting so saves captured before the reset stay stale
            document.version = previous.version + 1;
            document.mark_dirty();
        }
        self.document = Some(document);
        self.selection = None;
        self.insertion_target = None;
        Ok(())
    }

    /// Load a stored project and bind the session to it
    pub async fn open(
        &mut self,
        adapter: &dyn PersistenceAdapter,
        project_id: &ProjectId,
    ) -> Result<(), EditorError> {
        let nodes = adapter.load(project_id).await?;
        self.load_nodes(nodes)?;
        self.project_id = Some(project_id.clone());
        info!(session = %self.id, project = %project_id, "Opened project");
        Ok(())
    }

    /// Store the current document as a new project and bind to it
    pub async fn create_project(
        &mut self,
        adapter: &dyn PersistenceAdapter,
        title: &str,
    ) -> Result<ProjectId, EditorError> {
        let document = self.document.as_ref().ok_or(EditorError::NotLoaded)?;
        let version = document.version;
        let project_id = adapter
            .create(title, self.template_id.as_deref(), document.snapshot())
            .await?;

        if let Some(document) = self.document.as_mut() {
            document.mark_saved(version);
        }
        self.project_id = Some(project_id.clone());
        Ok(project_id)
    }

    /// Snapshot the document for saving to the bound project
    pub fn save_request(&self) -> Result<SaveRequest, EditorError> {
        let document = self.document.as_ref().ok_or(EditorError::NotLoaded)?;
        let project_id = self.project_id.clone().ok_or(EditorError::NoProject)?;
        Ok(SaveRequest {
            project_id,
            version: document.version,
            nodes: document.snapshot(),
        })
    }

    /// Record a finished save. Returns whether the document is now clean.
    pub fn mark_saved(&mut self, receipt: &SaveReceipt) -> bool {
        if self.project_id.as_ref() != Some(&receipt.project_id) {
            return false;
        }
        match self.document.as_mut() {
            Some(document) => document.mark_saved(receipt.version),
            None => false,
        }
    }

    /// Snapshot, save, and record the receipt in one go
    pub async fn save(&mut self, adapter: &dyn PersistenceAdapter) -> Result<SaveReceipt, EditorError> {
        let receipt = self.save_request()?.send(adapter).await?;
        self.mark_saved(&receipt);
        Ok(receipt)
    }

    pub async fn set_published(
        &self,
        adapter: &dyn PersistenceAdapter,
        published: bool,
    ) -> Result<(), EditorError> {
        let project_id = self.project_id.as_ref().ok_or(EditorError::NoProject)?;
        adapter.set_published(project_id, published).await?;
        info!(project = %project_id, published, "Updated publish state");
        Ok(())
    }

    /// Replace selection. The id is not checked against the document.
    pub fn select_node(&mut self, id: Option<&str>) {
        self.selection = id.map(str::to_string);
    }

    /// Replace the pending "insert after" target. Not checked either.
    pub fn set_insertion_target(&mut self, id: Option<&str>) {
        self.insertion_target = id.map(str::to_string);
    }

    /// Placement the next add or paste will use
    pub fn placement(&self) -> Result<Placement, EditorError> {
        let document = self.document.as_ref().ok_or(EditorError::NotLoaded)?;

        if let Some(target) = &self.insertion_target {
            return Ok(Placement::AfterSibling(target.clone()));
        }

        Ok(match &self.selection {
            Some(selected) => match document.get(selected) {
                Some(node) if node.is_container() => Placement::InsideContainer(selected.clone()),
                _ => Placement::AfterSibling(selected.clone()),
            },
            None => Placement::AppendToRoot,
        })
    }

    /// Add a node where the current selection / insertion target says,
    /// then select it.
    pub fn add_node(&mut self, node: Node) -> Result<MutationResult, EditorError> {
        let placement = self.placement()?;
        self.add_node_at(node, placement)
    }

    /// Add a node at an explicit placement, then select it
    pub fn add_node_at(&mut self, node: Node, placement: Placement) -> Result<MutationResult, EditorError> {
        let node_id = node.id.clone();
        let result = self.apply(Mutation::AddNode { node, placement })?;
        self.after_insert(node_id);
        Ok(result)
    }

    /// Insert a prebuilt section at the current placement and select it
    pub fn add_section(&mut self, kind: SectionKind) -> Result<MutationResult, EditorError> {
        let placement = self.placement()?;
        let section = Section::build(kind);
        let node_id = section.root.id.clone();
        let result = self.apply(Mutation::InsertSubtree {
            root: section.root,
            descendants: section.descendants,
            placement,
        })?;
        self.after_insert(node_id);
        Ok(result)
    }

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<MutationResult, EditorError> {
        self.apply(Mutation::UpdateNode {
            node_id: id.to_string(),
            patch,
        })
    }

    /// Delete one node entry; its descendants become orphans
    pub fn delete_node(&mut self, id: &str) -> Result<MutationResult, EditorError> {
        let result = self.apply(Mutation::DeleteNode {
            node_id: id.to_string(),
        })?;
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
        }
        Ok(result)
    }

    /// Delete a node and everything below it
    pub fn delete_subtree(&mut self, id: &str) -> Result<MutationResult, EditorError> {
        let result = self.apply(Mutation::DeleteSubtree {
            node_id: id.to_string(),
        })?;
        if let MutationOutcome::Removed { removed, .. } = &result.outcome {
            if let Some(selected) = &self.selection {
                if removed.contains(selected) {
                    self.selection = None;
                }
            }
        }
        Ok(result)
    }

    pub fn move_node(&mut self, id: &str, placement: Placement) -> Result<MutationResult, EditorError> {
        self.apply(Mutation::MoveNode {
            node_id: id.to_string(),
            placement,
        })
    }

    /// Copy a node without its children (containers paste empty)
    pub fn copy_node(&mut self, id: &str) -> Result<bool, EditorError> {
        let document = self.document.as_ref().ok_or(EditorError::NotLoaded)?;
        let Some(node) = document.get(id) else {
            return Ok(false);
        };

        let mut root = node.clone();
        if let Some(children) = root.children.as_mut() {
            children.clear();
        }
        self.clipboard = Some(Clipboard {
            root,
            descendants: Vec::new(),
        });
        Ok(true)
    }

    /// Copy a node together with its whole subtree
    pub fn copy_subtree(&mut self, id: &str) -> Result<bool, EditorError> {
        let document = self.document.as_ref().ok_or(EditorError::NotLoaded)?;
        let Some(root) = document.get(id) else {
            return Ok(false);
        };

        let mut descendants = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([root.id.as_str()]);
        let mut stack: Vec<&NodeId> = root.children().iter().rev().collect();
        while let Some(child_id) = stack.pop() {
            if !seen.insert(child_id.as_str()) {
                continue;
            }
            if let Some(child) = document.get(child_id) {
                stack.extend(child.children().iter().rev());
                descendants.push(child.clone());
            }
        }

        let mut root = root.clone();
        // drop references to ids that were missing from the document
        if let Some(children) = root.children.as_mut() {
            children.retain(|c| descendants.iter().any(|d| &d.id == c));
        }
        for node in descendants.iter_mut() {
            if let Some(children) = node.children.as_mut() {
                children.retain(|c| document.contains(c));
            }
        }

        self.clipboard = Some(Clipboard { root, descendants });
        Ok(true)
    }

    /// Paste the clipboard with fresh ids at the current placement
    pub fn paste(&mut self) -> Result<MutationResult, EditorError> {
        let clipboard = self.clipboard.as_ref().ok_or(EditorError::EmptyClipboard)?;
        let (root, descendants) = clipboard.instantiate();
        let placement = self.placement()?;
        let node_id = root.id.clone();

        let mutation = if descendants.is_empty() {
            Mutation::AddNode { node: root, placement }
        } else {
            Mutation::InsertSubtree {
                root,
                descendants,
                placement,
            }
        };
        let result = self.apply(mutation)?;
        self.after_insert(node_id);
        Ok(result)
    }

    fn after_insert(&mut self, node_id: NodeId) {
        self.selection = Some(node_id);
        self.insertion_target = None;
    }

    fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NotLoaded)?;
        let result = document.apply(mutation)?;
        debug!(session = %self.id, version = result.version, outcome = ?result.outcome, "Applied mutation");
        Ok(result)
    }
}
