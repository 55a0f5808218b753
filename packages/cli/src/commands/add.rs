use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use litebuilder_editor::{EditSession, MutationOutcome, Node, NodeKind, NodePatch, SectionKind};

use super::Store;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Project id or slug
    pub project: String,

    /// Element (text, button, image, container) or section (hero, feature, cta, testimonial)
    pub element: String,

    /// Insert right after this node
    #[arg(long, conflicts_with = "inside")]
    pub after: Option<String>,

    /// Insert as the last child of this container (after it, for leaves)
    #[arg(long)]
    pub inside: Option<String>,

    /// Text content for text and button elements
    #[arg(short, long)]
    pub content: Option<String>,
}

/// What `add` inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Node(NodeKind),
    Section(SectionKind),
}

fn parse_element(name: &str) -> Result<Element> {
    if let Ok(kind) = name.parse::<NodeKind>() {
        return Ok(Element::Node(kind));
    }
    if let Ok(section) = name.parse::<SectionKind>() {
        return Ok(Element::Section(section));
    }
    Err(anyhow!(
        "Unknown element '{}'. Expected one of: text, button, image, container, hero, feature, cta, testimonial",
        name
    ))
}

/// Point the session at the requested spot and insert
fn insert(session: &mut EditSession, element: Element, args: &AddArgs) -> Result<MutationOutcome> {
    session.select_node(args.inside.as_deref());
    session.set_insertion_target(args.after.as_deref());

    let result = match element {
        Element::Node(kind) => {
            let overrides = match &args.content {
                Some(content) => NodePatch::content(content.clone()),
                None => NodePatch::default(),
            };
            session.add_node(Node::create(kind, overrides))?
        }
        Element::Section(section) => session.add_section(section)?,
    };
    Ok(result.outcome)
}

pub async fn add(args: AddArgs, cwd: &str) -> Result<()> {
    let element = parse_element(&args.element)?;
    let store = Store::open(cwd)?;
    let mut session = store.session(&args.project).await?;

    let outcome = insert(&mut session, element, &args)?;
    session.save(&store.adapter).await?;

    if let MutationOutcome::Inserted {
        node_id,
        parent_id,
        index,
    } = outcome
    {
        println!(
            "{} Added {} {} to {} at position {}",
            "✓".green(),
            args.element,
            node_id.bright_white(),
            parent_id,
            index
        );
    }

    Ok(())
}
