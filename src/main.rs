use anyhow::{Context, Result};
use clap::Parser;
use quest::{Lang, RenderConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "questrender")]
#[command(about = "Render a questionnaire headlessly and print the resulting page")]
struct Cli {
    /// Questionnaire markup: a file path or an http(s)/file URL
    source: String,

    /// Locale for buttons, dialogs and month names
    #[arg(long, default_value = "en")]
    lang: String,

    /// JSON file with prior answers
    #[arg(long)]
    answers: Option<PathBuf>,

    /// JSON file with a saved navigation tree
    #[arg(long)]
    tree: Option<PathBuf>,

    /// Load the optional stylesheets next to a URL source
    #[arg(long)]
    activate: bool,
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_module("ureq", log::LevelFilter::Warn)
        .init();

    let cli = Cli::parse();

    let mut config = if cli.source.contains("://") {
        RenderConfig::from_url(&cli.source)
    } else {
        let text = std::fs::read_to_string(&cli.source)
            .with_context(|| format!("reading {}", cli.source))?;
        RenderConfig::from_text(text)
    };
    config = config
        .with_lang(Lang::from_tag(&cli.lang))
        .with_activate(cli.activate);
    if let Some(path) = &cli.answers {
        config = config.with_survey_data(read_json(path)?);
    }
    if let Some(path) = &cli.tree {
        config = config.with_tree_json(read_json(path)?);
    }

    let session = quest::render(config).await.context("rendering questionnaire")?;

    println!("module: {}", session.quest_name());
    println!(
        "active: {}",
        session
            .active_question_id()
            .map(|q| q.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    for sheet in session.stylesheets() {
        println!("stylesheet: {} ({} bytes)", sheet.href, sheet.text.len());
    }
    println!();
    println!("{}", session.html());
    Ok(())
}
