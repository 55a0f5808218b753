use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use litebuilder_editor::{Document, Node, NodeKind};

use super::Store;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Project id or slug
    pub project: String,

    /// Print the raw node map as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let store = Store::open(cwd)?;
    let session = store.session(&args.project).await?;
    let doc = session
        .document()
        .ok_or_else(|| anyhow!("Project has no document"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(doc.nodes())?);
        return Ok(());
    }

    for line in render_tree(doc) {
        println!("{}", line);
    }

    let report = doc.check_integrity();
    for dangling in &report.dangling {
        println!(
            "{} {} lists missing child {}",
            "⚠️".yellow(),
            dangling.parent,
            dangling.child
        );
    }
    for id in &report.multi_parent {
        println!("{} {} has more than one parent", "⚠️".yellow(), id);
    }
    if report.has_orphans() {
        println!(
            "{} {} unreachable node(s): {}",
            "⚠️".yellow(),
            report.orphans.len(),
            report.orphans.join(", ")
        );
    }

    Ok(())
}

fn render_tree(doc: &Document) -> Vec<String> {
    doc.walk()
        .into_iter()
        .map(|(depth, node)| format!("{}{}", "  ".repeat(depth), describe(node)))
        .collect()
}

fn describe(node: &Node) -> String {
    let detail = match node.kind {
        NodeKind::Text | NodeKind::Button => node
            .content
            .as_deref()
            .map(|c| format!(" {:?}", truncate(c, 40)))
            .unwrap_or_default(),
        NodeKind::Image => node
            .image_url
            .as_deref()
            .map(|u| format!(" {}", u))
            .unwrap_or_default(),
        NodeKind::Container => String::new(),
    };
    format!("{} {}{}", node.kind, node.id.dimmed(), detail)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max).collect();
    short.push('…');
    short
}
