mod manifest;

use clap::{Parser, Subcommand};

use apidump_core::config::default_config_path;
use apidump_core::entry_point::ENTRY_POINTS;
use apidump_core::LayerConfig;

#[derive(Parser)]
#[command(name = "apidump")]
#[command(about = "Vulkan API dump layer - configuration and installation helper")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the configuration the layer would use, as TOML
    Config {
        /// Configuration file path (defaults to the layer's search order)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// List the intercepted entry points
    EntryPoints,

    /// Print the loader manifest for the layer library
    Manifest {
        /// Path of the built layer library as the loader should open it
        #[arg(short, long, default_value_t = apidump_common::platform::layer_library_name().to_string())]
        library_path: String,

        /// Emit an implicit-layer manifest (enabled for every application)
        #[arg(long)]
        implicit: bool,
    },
}

fn main() -> anyhow::Result<()> {
    apidump_common::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { path } => {
            let path = path.unwrap_or_else(default_config_path);
            let mut config = if std::path::Path::new(&path).exists() {
                tracing::info!(path = %path, "loading configuration");
                LayerConfig::load(&path).map_err(|e| anyhow::anyhow!("{}: {}", path, e))?
            } else {
                tracing::info!(path = %path, "no configuration file, using defaults");
                LayerConfig::default()
            };
            config
                .apply_overrides(|key| std::env::var(key).ok())
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print!("{}", toml::to_string_pretty(&config)?);
        }

        Commands::EntryPoints => {
            println!(
                "{:<44} {:<10} {:<9} {:<8} {:<5} EXTENSION",
                "NAME", "TABLE", "LIFECYCLE", "BLOCKING", "FRAME"
            );
            for ep in ENTRY_POINTS {
                println!(
                    "{:<44} {:<10} {:<9} {:<8} {:<5} {}",
                    ep.name,
                    ep.key_source.category().to_string(),
                    format!("{:?}", ep.lifecycle),
                    if ep.blocking { "yes" } else { "-" },
                    if ep.frame_boundary { "end" } else { "-" },
                    ep.extension.unwrap_or("-"),
                );
            }
        }

        Commands::Manifest {
            library_path,
            implicit,
        } => {
            let manifest = manifest::layer_manifest(&library_path, implicit);
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
    }

    Ok(())
}
