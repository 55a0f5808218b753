use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use litebuilder_editor::TemplateLibrary;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory for project files
    #[arg(short, long, default_value = "projects")]
    pub projects_dir: String,

    /// Template used by `new` when none is given
    #[arg(short, long, default_value = litebuilder_editor::DEFAULT_TEMPLATE)]
    pub template: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let library = TemplateLibrary::builtin()?;
    if !library.contains(&args.template) {
        return Err(anyhow!(
            "Unknown template '{}'. Run `litebuilder templates` to see the choices",
            args.template
        ));
    }

    println!(
        "{}",
        "📝 Initializing LiteBuilder workspace...".bright_blue().bold()
    );

    let projects_dir = PathBuf::from(cwd).join(&args.projects_dir);
    if !projects_dir.exists() {
        fs::create_dir_all(&projects_dir)?;
        println!("  {} Created {}/", "✓".green(), args.projects_dir);
    }

    let config = Config {
        projects_dir: args.projects_dir.clone(),
        default_template: args.template.clone(),
        ..Config::default()
    };

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Workspace initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: litebuilder new \"My Landing Page\"");
    println!("  2. Run: litebuilder show my-landing-page");

    Ok(())
}
