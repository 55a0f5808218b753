use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use litebuilder_editor::{MutationOutcome, NodePatch, StyleKey, StyleValue, Styles};

use super::Store;

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Project id or slug
    pub project: String,

    /// Node to update
    pub node: String,

    #[arg(long)]
    pub content: Option<String>,

    #[arg(long)]
    pub href: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,

    /// Style property as key=value, e.g. fontSize=24 or padding=8,16,8,16
    #[arg(short, long = "style", value_parser = parse_style)]
    pub styles: Vec<(StyleKey, StyleValue)>,
}

fn parse_style(s: &str) -> Result<(StyleKey, StyleValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing style key in '{}'", s));
    }
    let value = value
        .parse::<StyleValue>()
        .map_err(|_| format!("invalid style value in '{}'", s))?;
    Ok((StyleKey::from(key), value))
}

impl SetArgs {
    fn patch(&self) -> NodePatch {
        NodePatch {
            content: self.content.clone(),
            image_url: self.image_url.clone(),
            href: self.href.clone(),
            styles: (!self.styles.is_empty())
                .then(|| self.styles.iter().cloned().collect::<Styles>()),
        }
    }
}

pub async fn set(args: SetArgs, cwd: &str) -> Result<()> {
    let patch = args.patch();
    if patch.is_empty() {
        return Err(anyhow!("Nothing to set. Pass --content, --href, --image-url or --style"));
    }

    let store = Store::open(cwd)?;
    let mut session = store.session(&args.project).await?;
    let result = session.update_node(&args.node, patch)?;

    if result.outcome == MutationOutcome::Noop {
        println!("{} No node {} in this project", "⚠️".yellow(), args.node);
        return Ok(());
    }

    session.save(&store.adapter).await?;
    println!("{} Updated {}", "✓".green(), args.node.bright_white());

    Ok(())
}
