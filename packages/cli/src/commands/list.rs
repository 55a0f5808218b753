use anyhow::Result;
use colored::Colorize;
use litebuilder_editor::PersistenceAdapter;

use super::Store;

pub async fn list(cwd: &str) -> Result<()> {
    let store = Store::open(cwd)?;
    let projects = store.adapter.list().await?;

    if projects.is_empty() {
        println!("{}", "⚠️  No projects yet".yellow());
        println!("Run: litebuilder new \"My Landing Page\"");
        return Ok(());
    }

    for project in &projects {
        let state = if project.published {
            "published".green()
        } else {
            "draft".dimmed()
        };
        println!(
            "{}  {:<28} {:<24} {:<9} {}",
            project.id,
            project.title.bright_white(),
            project.slug,
            state,
            project.updated_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
