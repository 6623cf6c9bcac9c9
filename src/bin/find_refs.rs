//! Reference Finder CLI
//!
//! Loads a scene snapshot, selects an object, and lists every component
//! field that references it.
//!
//! Usage:
//!   asset-refs --scene scene.json --project /path/to/project Player
//!   asset-refs --help

use std::path::PathBuf;

use asset_refs::{FinderConfig, ObjectModel, OutputFormat, Scene, Session};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "asset-refs")]
#[command(about = "Find every component field that references an object")]
struct Cli {
    /// Object to search for: id, #id, or name
    selection: String,

    /// Scene snapshot (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Project root containing the content folder (overrides config)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = FinderConfig::load_from(cli.config.as_deref())?;
    if let Some(project) = cli.project {
        config.locator.project_root = project;
    }
    let format = cli.format.unwrap_or(config.output.format);

    let scene = Scene::from_path(&cli.scene)?;
    let store = config.script_store();

    let Some(selection) = scene.resolve(&cli.selection) else {
        eprintln!("❌ No object matches {:?}", cli.selection);
        let suggestions = scene.suggest(&cli.selection, 5);
        if !suggestions.is_empty() {
            eprintln!("   Did you mean: {}", suggestions.join(", "));
        }
        std::process::exit(1);
    };

    let mut session = Session::new(&scene, &store);
    let response = session
        .search_for(selection)
        .ok_or("selection cannot be searched")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputFormat::Text => {
            println!("🔍 References to {}", scene.label(selection));
            for target in response.request.target_objects.iter().skip(1) {
                println!("   + {}", scene.label(*target));
            }
            println!();

            if response.is_empty() {
                println!("No references found");
            }
            for pair in &response.reference_pairs {
                let owner_name = scene.type_name(pair.owner_object).unwrap_or("?");
                println!("{} -> {}", scene.label(pair.owner_object), scene.label(pair.target_object));
                println!("   {}", pair);
                if pair.is_internal_type() {
                    println!("   ({} has no script under {})", owner_name, config.locator.content_dir);
                }
            }
            println!();
            println!("{} reference(s)", response.len());
        }
    }

    Ok(())
}
