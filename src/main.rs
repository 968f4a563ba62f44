use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stella_viewer::{input::InputModePreference, ViewerApp, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "stella-viewer")]
#[command(about = "Real-time viewer for a glTF or OBJ model", long_about = None)]
struct Cli {
    /// Model to open (.glb, .gltf or .obj)
    model: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the model file name is resolved against
    #[arg(long, env = "STELLA_ASSET_BASE")]
    asset_base: Option<PathBuf>,

    /// Camera input handler
    #[arg(long, value_enum)]
    input_mode: Option<InputModePreference>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = ViewerConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    config.apply_overrides(cli.model, cli.asset_base, cli.input_mode);

    log::info!("Stella viewer v{}", env!("CARGO_PKG_VERSION"));

    ViewerApp::new(config)?.run()
}
