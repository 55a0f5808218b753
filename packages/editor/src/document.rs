//! # Document Handle
//!
//! Owns the node map of one page and a `child → parent` index that is kept in
//! step with every mutation, so locating a node's container never needs a scan
//! of every children list.
//!
//! ## Lifecycle
//!
//! ```text
//! Template / Adapter → Document::from_nodes → apply(Mutation)* → snapshot → Adapter
//! ```

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::mutations::{Mutation, MutationError, MutationResult, Placement};
use crate::node::{Node, NodeId, NodeMap, ROOT_ID};
use crate::EditorError;

/// Editable page document
#[derive(Debug, Clone)]
pub struct Document {
    /// Current version number (increments on each applied mutation)
    pub version: u64,

    nodes: NodeMap,

    parents: HashMap<NodeId, NodeId>,

    dirty: bool,
}

/// Resolved insertion point
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub parent: NodeId,
    pub index: usize,
}

impl Document {
    /// Create a document from a node map (template seed or loaded project).
    ///
    /// The map must contain a `root` node and every entry must be keyed by its
    /// own id. Dangling child references and ids listed by more than one
    /// parent are tolerated and logged; the first parent in key order owns a
    /// shared id.
    pub fn from_nodes(mut nodes: NodeMap) -> Result<Self, EditorError> {
        if let Some((key, node)) = nodes.iter().find(|(key, node)| **key != node.id) {
            return Err(EditorError::InvalidDocument(format!(
                "entry {} holds node {}",
                key, node.id
            )));
        }

        let root = nodes
            .get_mut(ROOT_ID)
            .ok_or_else(|| EditorError::InvalidDocument("missing root node".to_string()))?;
        if root.children.is_none() {
            root.children = Some(Vec::new());
        }

        let mut parents = HashMap::new();
        for (parent_id, node) in &nodes {
            for child_id in node.children() {
                if !nodes.contains_key(child_id) {
                    warn!(parent = %parent_id, child = %child_id, "Dangling child reference");
                    continue;
                }
                if let Some(existing) = parents.get(child_id) {
                    warn!(
                        child = %child_id,
                        first_parent = %existing,
                        other_parent = %parent_id,
                        "Node listed by more than one parent"
                    );
                    continue;
                }
                parents.insert(child_id.clone(), parent_id.clone());
            }
        }

        debug!(nodes = nodes.len(), "Document loaded");

        Ok(Self {
            version: 0,
            nodes,
            parents,
            dirty: false,
        })
    }

    /// Document holding only an empty root container
    pub fn root_only() -> Self {
        let mut nodes = NodeMap::new();
        nodes.insert(
            ROOT_ID.to_string(),
            Node::new(ROOT_ID, crate::node::NodeKind::Container),
        );
        Self {
            version: 0,
            nodes,
            parents: HashMap::new(),
            dirty: false,
        }
    }

    /// Apply a mutation
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, MutationError> {
        let outcome = mutation.apply(self)?;

        if outcome.is_change() {
            self.version += 1;
            self.dirty = true;
        }

        Ok(MutationResult {
            version: self.version,
            outcome,
        })
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(ROOT_ID)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Container currently listing `id`
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    /// Owned copy of the node map, as handed to persistence
    pub fn snapshot(&self) -> NodeMap {
        self.nodes.clone()
    }

    pub fn into_nodes(self) -> NodeMap {
        self.nodes
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag if nothing changed since `version` was captured
    pub fn mark_saved(&mut self, version: u64) -> bool {
        if self.version == version {
            self.dirty = false;
        }
        !self.dirty
    }

    /// Depth-first pre-order walk from root with depths.
    ///
    /// Missing child ids are skipped and each node is visited at most once.
    pub fn walk(&self) -> Vec<(usize, &Node)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        if let Some(root) = self.root() {
            self.walk_from(root, 0, &mut seen, &mut out);
        }
        out
    }

    fn walk_from<'a>(
        &'a self,
        node: &'a Node,
        depth: usize,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<(usize, &'a Node)>,
    ) {
        if !seen.insert(node.id.as_str()) {
            return;
        }
        out.push((depth, node));
        for child_id in node.children() {
            if let Some(child) = self.nodes.get(child_id) {
                self.walk_from(child, depth + 1, seen, out);
            }
        }
    }

    /// Ids reachable from root
    pub fn reachable(&self) -> HashSet<&str> {
        self.walk().into_iter().map(|(_, n)| n.id.as_str()).collect()
    }

    /// Entries present in the map but not reachable from root
    pub fn orphans(&self) -> Vec<NodeId> {
        let reachable = self.reachable();
        self.nodes
            .keys()
            .filter(|id| !reachable.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// Full scan of the structural invariants
    pub fn check_integrity(&self) -> IntegrityReport {
        let mut report = IntegrityReport {
            missing_root: !self.nodes.contains_key(ROOT_ID),
            ..IntegrityReport::default()
        };

        let mut listed: HashMap<&str, usize> = HashMap::new();
        for (parent_id, node) in &self.nodes {
            for child_id in node.children() {
                if !self.nodes.contains_key(child_id) {
                    report.dangling.push(DanglingReference {
                        parent: parent_id.clone(),
                        child: child_id.clone(),
                    });
                }
                *listed.entry(child_id.as_str()).or_default() += 1;
            }
        }

        let mut multi: Vec<NodeId> = listed
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id.to_string())
            .collect();
        multi.sort();
        report.multi_parent = multi;
        report.orphans = self.orphans();
        report
    }

    // Structural primitives used by the mutation engine. Each keeps the
    // parent index in step with the children lists.

    pub(crate) fn nodes_mut(&mut self) -> &mut NodeMap {
        &mut self.nodes
    }

    /// Turn a placement into a concrete slot. Anchors that are missing, not
    /// containers, or cut off from root fall back to appending under root.
    pub(crate) fn resolve(&self, placement: &Placement) -> Slot {
        match placement {
            Placement::AfterSibling(sibling) => {
                let parent = self
                    .parents
                    .get(sibling)
                    .filter(|parent| self.reaches_root(parent))
                    .and_then(|parent| Some((parent, self.nodes.get(parent)?)));
                if let Some((parent, parent_node)) = parent {
                    let children = parent_node.children();
                    let index = children
                        .iter()
                        .position(|c| c == sibling)
                        .map(|i| i + 1)
                        .unwrap_or(children.len());
                    return Slot {
                        parent: parent.clone(),
                        index,
                    };
                }
                warn!(sibling = %sibling, "Sibling is not on the page, appending to root");
            }
            Placement::InsideContainer(container) => match self.nodes.get(container) {
                Some(node) if node.is_container() && self.reaches_root(container) => {
                    return Slot {
                        parent: container.clone(),
                        index: node.children().len(),
                    };
                }
                Some(node) if node.is_container() => {
                    warn!(container = %container, "Container is unreachable, appending to root")
                }
                _ => warn!(container = %container, "Not a container, appending to root"),
            },
            Placement::AppendToRoot => {}
        }

        Slot {
            parent: ROOT_ID.to_string(),
            index: self.nodes.get(ROOT_ID).map(|r| r.children().len()).unwrap_or(0),
        }
    }

    /// Insert `child` into the slot's parent. Returns the index actually used.
    pub(crate) fn attach(&mut self, child: &str, slot: &Slot) -> Result<usize, MutationError> {
        let parent = self
            .nodes
            .get_mut(&slot.parent)
            .ok_or_else(|| MutationError::ParentNotFound(slot.parent.clone()))?;
        let children = parent.children.get_or_insert_with(Vec::new);
        let index = slot.index.min(children.len());
        children.insert(index, child.to_string());
        self.parents.insert(child.to_string(), slot.parent.clone());
        Ok(index)
    }

    /// Remove `child` from its parent's list, and from any other list still
    /// naming it. Returns the slot in the indexed parent.
    pub(crate) fn detach(&mut self, child: &str) -> Option<Slot> {
        let slot = self.parents.remove(child).and_then(|parent| {
            let children = self.nodes.get_mut(&parent)?.children.as_mut()?;
            let index = children.iter().position(|c| c == child)?;
            children.remove(index);
            Some(Slot { parent, index })
        });
        self.strip_references([child]);
        slot
    }

    /// Drop every children-list entry naming one of `ids`. Full scan.
    pub(crate) fn strip_references<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        let ids: HashSet<&str> = ids.into_iter().collect();
        let mut stripped = 0;
        for (parent_id, node) in self.nodes.iter_mut() {
            let Some(children) = node.children.as_mut() else {
                continue;
            };
            let before = children.len();
            children.retain(|c| !ids.contains(c.as_str()));
            if children.len() < before {
                debug!(parent = %parent_id, count = before - children.len(), "Dropped stale child references");
                stripped += before - children.len();
            }
        }
        stripped
    }

    /// First node in key order whose children list names `child`
    pub(crate) fn listing_parent(&self, child: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.children().iter().any(|c| c == child))
            .map(|(id, _)| id.clone())
    }

    pub(crate) fn set_parent(&mut self, child: &str, parent: &str) {
        self.parents.insert(child.to_string(), parent.to_string());
    }

    pub(crate) fn forget_parent(&mut self, child: &str) {
        self.parents.remove(child);
    }

    /// Whether `id` is root or hangs below it through the parent index
    pub(crate) fn reaches_root(&self, id: &str) -> bool {
        self.is_within(ROOT_ID, id)
    }

    /// Whether `candidate` is `ancestor` or lies below it
    pub(crate) fn is_within(&self, ancestor: &str, candidate: &str) -> bool {
        let mut current = candidate;
        // bounded so corrupt loaded data cannot loop forever
        for _ in 0..=self.nodes.len() {
            if current == ancestor {
                return true;
            }
            match self.parents.get(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::root_only()
    }
}

/// Child reference to an id absent from the map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub parent: NodeId,
    pub child: NodeId,
}

/// Result of [`Document::check_integrity`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub missing_root: bool,
    pub dangling: Vec<DanglingReference>,
    pub multi_parent: Vec<NodeId>,
    pub orphans: Vec<NodeId>,
}

impl IntegrityReport {
    /// Strict tree with no dangling references. Orphans are allowed.
    pub fn is_consistent(&self) -> bool {
        !self.missing_root && self.dangling.is_empty() && self.multi_parent.is_empty()
    }

    pub fn has_orphans(&self) -> bool {
        !self.orphans.is_empty()
    }
}
