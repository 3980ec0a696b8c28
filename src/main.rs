use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;
use tracing_subscriber::EnvFilter;

use facerec::adapter::load_engine;
use facerec::config::AdapterConfig;
use facerec::context::AppContext;
use facerec::export;
use facerec::onnx::OrtEngine;
use facerec::preferences::JsonPreferences;
use facerec::storage;

#[cfg(debug_assertions)]
const LOG_LEVEL: &str = "debug";
#[cfg(not(debug_assertions))]
const LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "facerec")]
#[command(about = "Extract face feature vectors with a pretrained network")]
struct Args {
    /// Preferences file (JSON object of preference keys)
    #[arg(long)]
    preferences: Option<PathBuf>,

    /// Directory holding the model and weight files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = LOG_LEVEL)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved configuration
    Config,
    /// Extract feature vectors for image files or directories of images
    Embed {
        /// Files, or directories with one sub-directory per person
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write bincode to this file instead of JSON lines to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn context(args: &Args) -> anyhow::Result<AppContext> {
    if args.preferences.is_none() && args.data_dir.is_none() {
        return Ok(AppContext::from_default_locations()?);
    }

    let preferences_path = match &args.preferences {
        Some(path) => path.clone(),
        None => storage::default_preferences_path()?,
    };
    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => storage::default_model_dir()?,
    };
    let preferences = JsonPreferences::load(&preferences_path)?;
    Ok(AppContext::new(Box::new(preferences), data_dir))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level))
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let context = context(&args)?;
    let config = AdapterConfig::resolve(context.preferences(), context.data_dir());

    match &args.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        },
        Command::Embed { inputs, out } => {
            let images = export::collect_images(inputs)?;
            info!("Found {} images", images.len());

            let mut engine: OrtEngine = load_engine(&config)?;
            let features = export::embed_all(&mut engine, &config, &images)?;

            match out {
                Some(path) => {
                    export::write_bincode(path, &features)?;
                    info!("Wrote {} feature vectors to {:?}", features.len(), path);
                },
                None => export::write_json_lines(std::io::stdout().lock(), &features)?,
            }
        },
    }

    Ok(())
}
