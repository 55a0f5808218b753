use anyhow::Result;
use clap::Args;
use colored::Colorize;
use litebuilder_editor::{EditSession, PersistenceAdapter};
use tracing::warn;

use super::Store;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Project title
    pub title: String,

    /// Template to seed from (defaults to the configured one)
    #[arg(short, long)]
    pub template: Option<String>,
}

pub async fn new(args: NewArgs, cwd: &str) -> Result<()> {
    let store = Store::open(cwd)?;
    let template = args
        .template
        .unwrap_or_else(|| store.config.default_template.clone());
    if !store.library.contains(&template) {
        warn!(template = %template, "Unknown template, using the default");
    }

    let mut session = EditSession::new("cli");
    session.load_template(&store.library, &template)?;
    let project_id = session.create_project(&store.adapter, &args.title).await?;
    let record = store.adapter.fetch(&project_id).await?;

    println!(
        "{} Created {} from {}",
        "✓".green(),
        record.title.bright_white().bold(),
        session.template_id().unwrap_or_default()
    );
    println!("   id:   {}", record.id);
    println!("   slug: {}", record.slug);

    Ok(())
}
