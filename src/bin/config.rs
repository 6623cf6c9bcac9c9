//! Reference Finder Config CLI
//!
//! View and manage asset-refs configuration, and check that the locator
//! settings actually reach the project's scripts.

use asset_refs::{FinderConfig, ScriptStore};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "asset-refs-config")]
#[command(about = "View and manage asset-refs configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: asset-refs.toml)
        #[arg(short, long, default_value = "asset-refs.toml")]
        output: String,
    },

    /// Validate configuration and the content folder it points at
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Show which script a type name resolves to
    Which {
        /// Type name, matched against script file stems
        type_name: String,

        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = FinderConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 asset-refs Configuration\n");
                println!("Locator:");
                println!("  Project root: {:?}", cfg.locator.project_root);
                println!("  Content dir: {}", cfg.locator.content_dir);
                println!("  Script extensions: {}", cfg.locator.script_extensions.join(", "));

                println!("\nOutput:");
                println!("  Format: {:?}", cfg.output.format);
            }
        }

        Commands::Init { output } => {
            let cfg = FinderConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        Commands::Validate { config } => {
            let cfg = match FinderConfig::load_from(config.as_deref()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("❌ Configuration error: {}", e);
                    std::process::exit(1);
                }
            };
            if cfg.locator.script_extensions.is_empty() {
                eprintln!("❌ No script extensions configured");
                std::process::exit(1);
            }

            let store = cfg.script_store();
            let content_root = store.content_root();
            if !content_root.is_dir() {
                eprintln!("❌ Content folder not found: {:?}", content_root);
                std::process::exit(1);
            }

            println!("✅ Configuration is valid");
            println!("   Content root: {:?}", content_root);
            println!(
                "   Scripts: {} ({})",
                store.script_paths().count(),
                cfg.locator.script_extensions.join(", ")
            );
        }

        Commands::Which { type_name, config } => {
            let store = FinderConfig::load_from(config.as_deref())?.script_store();
            match store.find_script_artifact(&type_name) {
                Some(path) => println!("{}", path),
                None => {
                    eprintln!("❌ No script named {} under {:?}", type_name, store.content_root());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
