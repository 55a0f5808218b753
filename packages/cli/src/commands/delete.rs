use anyhow::Result;
use clap::Args;
use colored::Colorize;
use litebuilder_editor::MutationOutcome;

use super::Store;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Project id or slug
    pub project: String,

    /// Node to delete
    pub node: String,

    /// Also delete everything below the node
    #[arg(short, long)]
    pub recursive: bool,
}

pub async fn delete(args: DeleteArgs, cwd: &str) -> Result<()> {
    let store = Store::open(cwd)?;
    let mut session = store.session(&args.project).await?;

    let result = if args.recursive {
        session.delete_subtree(&args.node)?
    } else {
        session.delete_node(&args.node)?
    };

    let MutationOutcome::Removed { removed, orphaned } = result.outcome else {
        println!("{} No node {} in this project", "⚠️".yellow(), args.node);
        return Ok(());
    };

    session.save(&store.adapter).await?;
    println!("{} Deleted {} node(s)", "✓".green(), removed.len());
    if !orphaned.is_empty() {
        println!(
            "{} {} child node(s) are now unreachable: {}",
            "⚠️".yellow(),
            orphaned.len(),
            orphaned.join(", ")
        );
        println!("Use --recursive to delete a node with its children");
    }

    Ok(())
}
