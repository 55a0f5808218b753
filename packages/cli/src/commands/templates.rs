use anyhow::Result;
use colored::Colorize;
use litebuilder_editor::TemplateLibrary;

use crate::config::Config;

pub fn templates(cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let library = TemplateLibrary::builtin()?;

    println!("{}", "📄 Templates".bright_blue().bold());
    for info in library.list() {
        let marker = if info.id == config.default_template {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!(
            " {} {:<22} {} ({} nodes)",
            marker,
            info.id.bright_white(),
            info.name,
            info.node_count
        );
        println!("   {:<22} {}", "", info.description.dimmed());
    }

    Ok(())
}
