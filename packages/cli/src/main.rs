mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    add, delete, init, list, new, publish, set, show, templates, AddArgs, DeleteArgs, InitArgs,
    NewArgs, PublishArgs, SetArgs, ShowArgs,
};
use config::Config;
use tracing::Level;

/// LiteBuilder CLI - build landing pages from templates and sections
#[derive(Parser, Debug)]
#[command(name = "litebuilder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output (overrides logLevel from the config)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write litebuilder.config.json and create the projects directory
    Init(InitArgs),

    /// List the available templates
    Templates,

    /// Create a project from a template
    New(NewArgs),

    /// List projects, most recently updated first
    List,

    /// Print a project's node tree
    Show(ShowArgs),

    /// Add an element or a section
    Add(AddArgs),

    /// Update a node's content, link, image or styles
    Set(SetArgs),

    /// Delete a node
    Delete(DeleteArgs),

    /// Mark a project as published
    Publish(PublishArgs),

    /// Take a project offline
    Unpublish(PublishArgs),
}

fn init_logging(cwd: &str, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        // a broken config is reported by the command that loads it
        Config::load(cwd)
            .map(|config| config.log_level())
            .unwrap_or(Level::WARN)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    init_logging(&cwd, cli.verbose);

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Templates => templates(&cwd),
        Command::New(args) => new(args, &cwd).await,
        Command::List => list(&cwd).await,
        Command::Show(args) => show(args, &cwd).await,
        Command::Add(args) => add(args, &cwd).await,
        Command::Set(args) => set(args, &cwd).await,
        Command::Delete(args) => delete(args, &cwd).await,
        Command::Publish(args) => publish(args, &cwd, true).await,
        Command::Unpublish(args) => publish(args, &cwd, false).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
