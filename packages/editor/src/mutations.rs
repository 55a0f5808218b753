//! # Document Mutations
//!
//! Every change to a page goes through a [`Mutation`]. Placement is always an
//! explicit [`Placement`] value; the ambient selection and insertion target of
//! an editing session are turned into one by [`crate::EditSession`].
//!
//! ## Mutation Semantics
//!
//! ### AddNode / InsertSubtree
//! - Never fail on placement: a sibling without a parent, a container that
//!   is missing (or not a container), or any anchor no longer reachable from
//!   root self-corrects to appending under root
//! - Reject ids that already exist in the document
//!
//! ### UpdateNode
//! - Shallow merge of content fields, key-by-key merge of styles
//! - Missing node is a no-op
//!
//! ### DeleteNode
//! - Removes only the entry and every children-list reference to it; its
//!   descendants stay in the map, unreachable
//! - Missing node is a no-op, `root` is refused
//!
//! ### DeleteSubtree
//! - Removes the node and everything below it
//!
//! ### MoveNode
//! - Relocates an existing node; fails if it would move a node into itself

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::document::{Document, Slot};
use crate::node::{Node, NodeId, NodePatch, ROOT_ID};

/// Where a new or moved node goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Immediately after this node, in the same container
    AfterSibling(NodeId),
    /// As the last child of this container
    InsideContainer(NodeId),
    /// As the last child of root
    AppendToRoot,
}

/// Structural operations on a page document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert a node. Ids in its `children` must be existing unparented nodes.
    AddNode { node: Node, placement: Placement },

    /// Insert a prebuilt subtree in one step
    InsertSubtree {
        root: Node,
        descendants: Vec<Node>,
        placement: Placement,
    },

    /// Merge changes into a node
    UpdateNode { node_id: NodeId, patch: NodePatch },

    /// Remove a node entry, orphaning its descendants
    DeleteNode { node_id: NodeId },

    /// Remove a node and all descendants
    DeleteSubtree { node_id: NodeId },

    /// Relocate a node
    MoveNode { node_id: NodeId, placement: Placement },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node already exists: {0}")]
    DuplicateId(NodeId),

    #[error("Parent not found: {0}")]
    ParentNotFound(NodeId),

    #[error("The root node cannot be removed or moved")]
    RootProtected,

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// What a mutation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Inserted {
        node_id: NodeId,
        parent_id: NodeId,
        index: usize,
    },
    Updated {
        node_id: NodeId,
    },
    Removed {
        removed: Vec<NodeId>,
        /// Entries left in the map without a parent
        orphaned: Vec<NodeId>,
    },
    Moved {
        node_id: NodeId,
        parent_id: NodeId,
        index: usize,
    },
    /// Target id absent; nothing changed
    Noop,
}

impl MutationOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, MutationOutcome::Noop)
    }
}

/// Result of applying a mutation
#[derive(Debug, Clone)]
pub struct MutationResult {
    /// New version number
    pub version: u64,

    pub outcome: MutationOutcome,
}

impl Mutation {
    /// Apply mutation to a document. Prefer [`Document::apply`], which also
    /// tracks versions.
    pub fn apply(&self, doc: &mut Document) -> Result<MutationOutcome, MutationError> {
        match self {
            Mutation::AddNode { node, placement } => Self::apply_add(doc, node, placement),

            Mutation::InsertSubtree {
                root,
                descendants,
                placement,
            } => Self::apply_insert_subtree(doc, root, descendants, placement),

            Mutation::UpdateNode { node_id, patch } => Ok(Self::apply_update(doc, node_id, patch)),

            Mutation::DeleteNode { node_id } => Self::apply_delete(doc, node_id),

            Mutation::DeleteSubtree { node_id } => Self::apply_delete_subtree(doc, node_id),

            Mutation::MoveNode { node_id, placement } => Self::apply_move(doc, node_id, placement),
        }
    }

    fn apply_add(
        doc: &mut Document,
        node: &Node,
        placement: &Placement,
    ) -> Result<MutationOutcome, MutationError> {
        if doc.contains(&node.id) {
            return Err(MutationError::DuplicateId(node.id.clone()));
        }

        for child in node.children() {
            if !doc.contains(child) {
                return Err(MutationError::InvalidStructure(format!(
                    "child {} does not exist",
                    child
                )));
            }
            if doc.parent_of(child).is_some() || child == ROOT_ID {
                return Err(MutationError::InvalidStructure(format!(
                    "child {} already has a parent",
                    child
                )));
            }
        }

        let slot = doc.resolve(placement);

        let mut node = node.clone();
        if node.is_container() && node.children.is_none() {
            node.children = Some(Vec::new());
        }
        let node_id = node.id.clone();
        let adopted: Vec<NodeId> = node.children().to_vec();
        doc.nodes_mut().insert(node_id.clone(), node);
        for child in &adopted {
            doc.set_parent(child, &node_id);
        }

        Self::place(doc, node_id, slot)
    }

    fn apply_insert_subtree(
        doc: &mut Document,
        root: &Node,
        descendants: &[Node],
        placement: &Placement,
    ) -> Result<MutationOutcome, MutationError> {
        let mut incoming: HashMap<&str, &Node> = HashMap::new();
        for node in std::iter::once(root).chain(descendants) {
            if doc.contains(&node.id) || incoming.insert(node.id.as_str(), node).is_some() {
                return Err(MutationError::DuplicateId(node.id.clone()));
            }
        }

        // Every descendant listed exactly once, by a node of the subtree
        let mut listed: HashSet<&str> = HashSet::new();
        for node in incoming.values() {
            for child in node.children() {
                if !incoming.contains_key(child.as_str()) {
                    return Err(MutationError::InvalidStructure(format!(
                        "child {} is not part of the subtree",
                        child
                    )));
                }
                if child == &root.id || !listed.insert(child.as_str()) {
                    return Err(MutationError::InvalidStructure(format!(
                        "child {} is listed more than once",
                        child
                    )));
                }
            }
        }
        let mut reached = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            reached += 1;
            stack.extend(node.children().iter().filter_map(|c| incoming.get(c.as_str()).copied()));
        }
        if reached != incoming.len() {
            return Err(MutationError::InvalidStructure(
                "subtree contains unreachable nodes".to_string(),
            ));
        }

        let slot = doc.resolve(placement);

        for node in std::iter::once(root).chain(descendants) {
            let mut node = node.clone();
            if node.is_container() && node.children.is_none() {
                node.children = Some(Vec::new());
            }
            for child in node.children() {
                doc.set_parent(child, &node.id);
            }
            doc.nodes_mut().insert(node.id.clone(), node);
        }

        Self::place(doc, root.id.clone(), slot)
    }

    fn place(doc: &mut Document, node_id: NodeId, slot: Slot) -> Result<MutationOutcome, MutationError> {
        let index = doc.attach(&node_id, &slot)?;
        debug!(node_id = %node_id, parent = %slot.parent, index, "Inserted node");

        Ok(MutationOutcome::Inserted {
            node_id,
            parent_id: slot.parent,
            index,
        })
    }

    fn apply_update(doc: &mut Document, node_id: &str, patch: &NodePatch) -> MutationOutcome {
        match doc.nodes_mut().get_mut(node_id) {
            Some(node) => {
                node.apply_patch(patch);
                MutationOutcome::Updated {
                    node_id: node_id.to_string(),
                }
            }
            None => {
                debug!(node_id = %node_id, "Update of unknown node ignored");
                MutationOutcome::Noop
            }
        }
    }

    fn apply_delete(doc: &mut Document, node_id: &str) -> Result<MutationOutcome, MutationError> {
        if node_id == ROOT_ID {
            return Err(MutationError::RootProtected);
        }
        if !doc.contains(node_id) {
            return Ok(MutationOutcome::Noop);
        }

        doc.detach(node_id);
        let children = doc
            .nodes_mut()
            .remove(node_id)
            .map(|node| node.children().to_vec())
            .unwrap_or_default();

        // children still listed elsewhere stay on the page
        let mut orphaned = Vec::new();
        for child in children {
            if doc.parent_of(&child) != Some(node_id) {
                continue;
            }
            match doc.listing_parent(&child) {
                Some(parent) => doc.set_parent(&child, &parent),
                None => {
                    doc.forget_parent(&child);
                    orphaned.push(child);
                }
            }
        }

        debug!(node_id = %node_id, orphaned = orphaned.len(), "Deleted node");

        Ok(MutationOutcome::Removed {
            removed: vec![node_id.to_string()],
            orphaned,
        })
    }

    fn apply_delete_subtree(doc: &mut Document, node_id: &str) -> Result<MutationOutcome, MutationError> {
        if node_id == ROOT_ID {
            return Err(MutationError::RootProtected);
        }
        if !doc.contains(node_id) {
            return Ok(MutationOutcome::Noop);
        }

        let mut removed = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![node_id.to_string()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(node) = doc.get(&id) {
                stack.extend(node.children().iter().rev().cloned());
                removed.push(id);
            }
        }

        doc.detach(node_id);
        for id in &removed {
            doc.nodes_mut().remove(id);
            doc.forget_parent(id);
        }
        doc.strip_references(removed.iter().map(String::as_str));

        debug!(node_id = %node_id, removed = removed.len(), "Deleted subtree");

        Ok(MutationOutcome::Removed {
            removed,
            orphaned: Vec::new(),
        })
    }

    fn apply_move(
        doc: &mut Document,
        node_id: &str,
        placement: &Placement,
    ) -> Result<MutationOutcome, MutationError> {
        if node_id == ROOT_ID {
            return Err(MutationError::RootProtected);
        }
        if !doc.contains(node_id) {
            return Ok(MutationOutcome::Noop);
        }

        let mut slot = doc.resolve(placement);
        if doc.is_within(node_id, &slot.parent) {
            return Err(MutationError::CycleDetected);
        }

        if let Some(old) = doc.detach(node_id) {
            if old.parent == slot.parent && old.index < slot.index {
                slot.index -= 1;
            }
        }

        let index = doc.attach(node_id, &slot)?;
        debug!(node_id = %node_id, parent = %slot.parent, index, "Moved node");

        Ok(MutationOutcome::Moved {
            node_id: node_id.to_string(),
            parent_id: slot.parent,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, NodeMap, StyleKey, Styles};

    /// root
    /// ├── section (container)
    /// │   └── heading
    /// ├── intro
    /// └── outro
    fn doc() -> Document {
        let mut nodes = NodeMap::new();
        nodes.insert(
            "root".into(),
            Node::new("root", NodeKind::Container).with_children(["section", "intro", "outro"]),
        );
        nodes.insert(
            "section".into(),
            Node::new("section", NodeKind::Container).with_children(["heading"]),
        );
        nodes.insert("heading".into(), Node::new("heading", NodeKind::Text));
        nodes.insert("intro".into(), Node::new("intro", NodeKind::Text));
        nodes.insert("outro".into(), Node::new("outro", NodeKind::Text));
        Document::from_nodes(nodes).unwrap()
    }

    fn children<'a>(doc: &'a Document, id: &str) -> Vec<&'a str> {
        doc.get(id).unwrap().children().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::MoveNode {
            node_id: "intro".to_string(),
            placement: Placement::InsideContainer("section".to_string()),
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_add_after_sibling() {
        let mut doc = doc();
        let result = doc
            .apply(Mutation::AddNode {
                node: Node::new("btn", NodeKind::Button),
                placement: Placement::AfterSibling("intro".into()),
            })
            .unwrap();

        assert_eq!(result.version, 1);
        assert_eq!(children(&doc, "root"), vec!["section", "intro", "btn", "outro"]);
        assert_eq!(doc.parent_of("btn"), Some("root"));
    }

    #[test]
    fn test_add_inside_container_appends_last() {
        let mut doc = doc();
        doc.apply(Mutation::AddNode {
            node: Node::new("img", NodeKind::Image),
            placement: Placement::InsideContainer("section".into()),
        })
        .unwrap();

        assert_eq!(children(&doc, "section"), vec!["heading", "img"]);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut doc = doc();
        let err = doc
            .apply(Mutation::AddNode {
                node: Node::new("intro", NodeKind::Text),
                placement: Placement::AppendToRoot,
            })
            .unwrap_err();

        assert_eq!(err, MutationError::DuplicateId("intro".into()));
        assert_eq!(doc.version, 0);
    }

    #[test]
    fn test_update_merges_styles() {
        let mut doc = doc();
        let styles = Styles::new().with(StyleKey::FontSize, 12.0).with(StyleKey::Color, "#000");
        doc.apply(Mutation::UpdateNode {
            node_id: "intro".into(),
            patch: NodePatch::styles(styles),
        })
        .unwrap();
        doc.apply(Mutation::UpdateNode {
            node_id: "intro".into(),
            patch: NodePatch::styles(Styles::new().with(StyleKey::Color, "#fff")),
        })
        .unwrap();

        let node = doc.get("intro").unwrap();
        assert_eq!(node.styles.len(), 2);
        assert_eq!(node.styles.get(&StyleKey::Color), Some(&"#fff".into()));
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let mut doc = doc();
        let result = doc
            .apply(Mutation::UpdateNode {
                node_id: "ghost".into(),
                patch: NodePatch::content("x"),
            })
            .unwrap();

        assert_eq!(result.outcome, MutationOutcome::Noop);
        assert_eq!(doc.version, 0);
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_delete_orphans_descendants() {
        let mut doc = doc();
        let result = doc
            .apply(Mutation::DeleteNode {
                node_id: "section".into(),
            })
            .unwrap();

        assert_eq!(
            result.outcome,
            MutationOutcome::Removed {
                removed: vec!["section".into()],
                orphaned: vec!["heading".into()],
            }
        );
        assert!(doc.contains("heading"));
        assert_eq!(doc.parent_of("heading"), None);
        assert_eq!(doc.orphans(), vec!["heading".to_string()]);
        assert!(doc.check_integrity().is_consistent());
    }

    #[test]
    fn test_delete_subtree_removes_descendants() {
        let mut doc = doc();
        let result = doc
            .apply(Mutation::DeleteSubtree {
                node_id: "section".into(),
            })
            .unwrap();

        assert_eq!(
            result.outcome,
            MutationOutcome::Removed {
                removed: vec!["section".into(), "heading".into()],
                orphaned: vec![],
            }
        );
        assert_eq!(doc.len(), 3);
        assert!(doc.orphans().is_empty());
    }

    #[test]
    fn test_root_is_protected() {
        let mut doc = doc();
        for mutation in [
            Mutation::DeleteNode { node_id: "root".into() },
            Mutation::DeleteSubtree { node_id: "root".into() },
            Mutation::MoveNode {
                node_id: "root".into(),
                placement: Placement::InsideContainer("section".into()),
            },
        ] {
            assert_eq!(doc.apply(mutation).unwrap_err(), MutationError::RootProtected);
        }
        assert_eq!(doc.len(), 5);
    }

    #[test]
    fn test_move_within_same_parent() {
        let mut doc = doc();
        doc.apply(Mutation::MoveNode {
            node_id: "section".into(),
            placement: Placement::AfterSibling("intro".into()),
        })
        .unwrap();
        assert_eq!(children(&doc, "root"), vec!["intro", "section", "outro"]);

        // after itself leaves the order alone
        doc.apply(Mutation::MoveNode {
            node_id: "section".into(),
            placement: Placement::AfterSibling("section".into()),
        })
        .unwrap();
        assert_eq!(children(&doc, "root"), vec!["intro", "section", "outro"]);
    }

    #[test]
    fn test_move_into_container() {
        let mut doc = doc();
        doc.apply(Mutation::MoveNode {
            node_id: "outro".into(),
            placement: Placement::InsideContainer("section".into()),
        })
        .unwrap();

        assert_eq!(children(&doc, "root"), vec!["section", "intro"]);
        assert_eq!(children(&doc, "section"), vec!["heading", "outro"]);
        assert_eq!(doc.parent_of("outro"), Some("section"));
    }

    #[test]
    fn test_move_into_own_subtree_fails() {
        let mut doc = doc();
        let err = doc
            .apply(Mutation::MoveNode {
                node_id: "section".into(),
                placement: Placement::AfterSibling("heading".into()),
            })
            .unwrap_err();

        assert_eq!(err, MutationError::CycleDetected);
        assert_eq!(children(&doc, "root"), vec!["section", "intro", "outro"]);
    }

    #[test]
    fn test_insert_subtree_validates_shape() {
        let mut doc = doc();
        let top = Node::new("s", NodeKind::Container).with_children(["a", "b"]);
        let a = Node::new("a", NodeKind::Text);

        let err = doc
            .apply(Mutation::InsertSubtree {
                root: top.clone(),
                descendants: vec![a.clone()],
                placement: Placement::AppendToRoot,
            })
            .unwrap_err();
        assert!(matches!(err, MutationError::InvalidStructure(_)));

        let b = Node::new("b", NodeKind::Button);
        let stray = Node::new("stray", NodeKind::Text);
        let err = doc
            .apply(Mutation::InsertSubtree {
                root: top.clone(),
                descendants: vec![a.clone(), b.clone(), stray],
                placement: Placement::AppendToRoot,
            })
            .unwrap_err();
        assert!(matches!(err, MutationError::InvalidStructure(_)));
        assert_eq!(doc.len(), 5);

        doc.apply(Mutation::InsertSubtree {
            root: top,
            descendants: vec![a, b],
            placement: Placement::AfterSibling("section".into()),
        })
        .unwrap();
        assert_eq!(children(&doc, "root"), vec!["section", "s", "intro", "outro"]);
        assert_eq!(doc.parent_of("b"), Some("s"));
        assert!(doc.check_integrity().is_consistent());
    }

    /// root [a, b], a [x], b [x]: x is listed twice
    fn shared_child_doc() -> Document {
        let mut nodes = NodeMap::new();
        nodes.insert(
            "root".into(),
            Node::new("root", NodeKind::Container).with_children(["a", "b"]),
        );
        nodes.insert("a".into(), Node::new("a", NodeKind::Container).with_children(["x"]));
        nodes.insert("b".into(), Node::new("b", NodeKind::Container).with_children(["x"]));
        nodes.insert(
            "x".into(),
            Node::new("x", NodeKind::Container).with_children(["leaf"]),
        );
        nodes.insert("leaf".into(), Node::new("leaf", NodeKind::Text));
        Document::from_nodes(nodes).unwrap()
    }

    #[test]
    fn test_delete_clears_every_listing() {
        let mut doc = shared_child_doc();
        assert_eq!(doc.check_integrity().multi_parent, vec!["x".to_string()]);

        doc.apply(Mutation::DeleteNode { node_id: "x".into() }).unwrap();

        assert!(children(&doc, "a").is_empty());
        assert!(children(&doc, "b").is_empty());
        let report = doc.check_integrity();
        assert!(report.is_consistent(), "{:?}", report);
        assert_eq!(report.orphans, vec!["leaf".to_string()]);
    }

    #[test]
    fn test_delete_keeps_child_listed_elsewhere() {
        let mut doc = shared_child_doc();
        assert_eq!(doc.parent_of("x"), Some("a"));

        let result = doc.apply(Mutation::DeleteNode { node_id: "a".into() }).unwrap();

        assert_eq!(
            result.outcome,
            MutationOutcome::Removed {
                removed: vec!["a".into()],
                orphaned: vec![],
            }
        );
        assert_eq!(doc.parent_of("x"), Some("b"));
        assert!(doc.orphans().is_empty());
        assert!(doc.check_integrity().is_consistent());
    }

    #[test]
    fn test_delete_subtree_clears_every_listing() {
        let mut doc = shared_child_doc();
        doc.apply(Mutation::DeleteSubtree { node_id: "a".into() }).unwrap();

        assert_eq!(children(&doc, "root"), vec!["b"]);
        assert!(children(&doc, "b").is_empty());
        assert!(!doc.contains("x"));
        assert!(!doc.contains("leaf"));
        assert!(doc.check_integrity().dangling.is_empty());
    }

    #[test]
    fn test_add_cannot_nest_inside_adopted_orphan() {
        let mut nodes = NodeMap::new();
        nodes.insert(
            "root".into(),
            Node::new("root", NodeKind::Container).with_children(["section"]),
        );
        nodes.insert(
            "section".into(),
            Node::new("section", NodeKind::Container).with_children(["inner"]),
        );
        nodes.insert(
            "inner".into(),
            Node::new("inner", NodeKind::Container).with_children(["leaf"]),
        );
        nodes.insert("leaf".into(), Node::new("leaf", NodeKind::Text));
        let mut doc = Document::from_nodes(nodes).unwrap();
        doc.apply(Mutation::DeleteNode {
            node_id: "section".into(),
        })
        .unwrap();

        let result = doc
            .apply(Mutation::AddNode {
                node: Node::new("wrap", NodeKind::Container).with_children(["inner"]),
                placement: Placement::InsideContainer("inner".into()),
            })
            .unwrap();

        assert!(matches!(
            result.outcome,
            MutationOutcome::Inserted { ref parent_id, .. } if parent_id == ROOT_ID
        ));
        assert_eq!(children(&doc, "wrap"), vec!["inner"]);
        assert_eq!(children(&doc, "inner"), vec!["leaf"]);
        let report = doc.check_integrity();
        assert!(report.is_consistent(), "{:?}", report);
        assert!(!report.has_orphans());
    }

    #[test]
    fn test_add_adopts_orphans() {
        let mut doc = doc();
        doc.apply(Mutation::DeleteNode {
            node_id: "section".into(),
        })
        .unwrap();

        doc.apply(Mutation::AddNode {
            node: Node::new("wrapper", NodeKind::Container).with_children(["heading"]),
            placement: Placement::AppendToRoot,
        })
        .unwrap();

        assert_eq!(doc.parent_of("heading"), Some("wrapper"));
        assert!(doc.orphans().is_empty());

        let err = doc
            .apply(Mutation::AddNode {
                node: Node::new("thief", NodeKind::Container).with_children(["intro"]),
                placement: Placement::AppendToRoot,
            })
            .unwrap_err();
        assert!(matches!(err, MutationError::InvalidStructure(_)));
    }
}
