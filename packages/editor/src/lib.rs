//! # LiteBuilder Editor
//!
//! Core document editing engine for LiteBuilder landing pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ templates / sections: seed trees            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: selection + insertion target       │
//! │  - Turns UI state into a Placement          │
//! │  - Clipboard, template reset                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: node map + parent index           │
//! │  - Applies mutations                        │
//! │  - Integrity checks, traversal              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ persistence: async adapter (memory / file)  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Ids are the only references**: the tree lives in children lists
//! 2. **Placement is explicit**: the engine never reads selection state
//! 3. **Lookup misses are no-ops**: only structural violations are errors
//! 4. **Saves are snapshots**: editing continues while a save is in flight
//!
//! ## Usage
//!
//! ```rust,ignore
//! use litebuilder_editor::{EditSession, Node, NodeKind, NodePatch, TemplateLibrary};
//!
//! let library = TemplateLibrary::builtin()?;
//! let mut session = EditSession::new("client-1");
//! session.load_template(&library, "template1")?;
//!
//! session.select_node(Some("hero"));
//! session.add_node(Node::create(NodeKind::Text, NodePatch::content("Hello")))?;
//!
//! let receipt = session.save_request()?.send(&adapter).await?;
//! session.mark_saved(&receipt);
//! ```

mod document;
mod errors;
mod id_generator;
mod mutations;
mod node;
mod persistence;
mod sections;
mod session;
mod templates;

pub use document::{DanglingReference, Document, IntegrityReport};
pub use errors::EditorError;
pub use id_generator::{generate_id, ID_LENGTH};
pub use mutations::{Mutation, MutationError, MutationOutcome, MutationResult, Placement};
pub use node::{Node, NodeId, NodeKind, NodeMap, NodePatch, StyleKey, StyleValue, Styles, ROOT_ID};
pub use persistence::{
    slugify, FileAdapter, MemoryAdapter, PersistenceAdapter, PersistenceError, ProjectId,
    ProjectRecord, ProjectSummary,
};
pub use sections::{Section, SectionKind};
pub use session::{Clipboard, EditSession, SaveReceipt, SaveRequest};
pub use templates::{TemplateInfo, TemplateLibrary, DEFAULT_TEMPLATE};
