use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::Store;

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Project id or slug
    pub project: String,
}

pub async fn publish(args: PublishArgs, cwd: &str, published: bool) -> Result<()> {
    let store = Store::open(cwd)?;
    let session = store.session(&args.project).await?;
    session.set_published(&store.adapter, published).await?;

    let state = if published {
        "published".green().bold()
    } else {
        "unpublished".yellow().bold()
    };
    println!("{} {} is now {}", "✓".green(), args.project.bright_white(), state);

    Ok(())
}
