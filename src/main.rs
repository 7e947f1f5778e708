//! Archetype Engine CLI
//!
//! ```text
//! archetype_engine [--config PATH] [--scene business|spirit] [--history TEXT]... TEXT...
//! ```
//!
//! Runs the full pipeline over TEXT and prints the report as pretty JSON.
//! `--scene` adds scene actions for the chaos result.
//! Logs go to stderr; `RUST_LOG` overrides the default `archetype_engine=info`.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use archetype_engine::catalog::CatalogStore;
use archetype_engine::chaos::SceneMode;
use archetype_engine::config::EngineConfig;
use archetype_engine::pipeline::{run_pipeline, PipelineHistory};

const USAGE: &str = "usage: archetype_engine [--config PATH] [--scene business|spirit] [--history TEXT]... TEXT...";

struct CliArgs {
    config: Option<PathBuf>,
    scene: Option<SceneMode>,
    history: Vec<String>,
    text: String,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut config = None;
    let mut scene = None;
    let mut history = Vec::new();
    let mut words = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next().context("--config needs a path")?)),
            "--scene" => {
                scene = Some(match args.next().context("--scene needs a mode")?.as_str() {
                    "business" => SceneMode::Business,
                    "spirit" => SceneMode::Spirit,
                    other => bail!("unknown scene mode: {}\n{}", other, USAGE),
                })
            }
            "--history" => history.push(args.next().context("--history needs a text")?),
            "-h" | "--help" => bail!(USAGE),
            _ => words.push(arg),
        }
    }

    if words.is_empty() {
        bail!("no text given\n{}", USAGE);
    }
    Ok(CliArgs {
        config,
        scene,
        history,
        text: words.join(" "),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("archetype_engine=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let mut config = EngineConfig::resolve(args.config.as_deref()).await?;
    if args.scene.is_some() {
        config.scene.mode = args.scene;
    }
    debug!("Engine config: {:?}", config);

    let store = CatalogStore::new(&config.data_dir);
    let catalogs = store
        .load_all()
        .await
        .with_context(|| format!("Failed to load catalogs from {}", config.data_dir.display()))?;
    info!(
        "Catalogs: {} human, {} bridge rules, {} system",
        catalogs.human.items.len(),
        catalogs.bridge.rules.len(),
        catalogs.system.items.len()
    );

    let history = PipelineHistory {
        texts: args.history,
        ..PipelineHistory::default()
    };
    let report = run_pipeline(&args.text, &catalogs, &config, Some(&history), Utc::now())?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
