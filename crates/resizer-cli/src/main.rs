//! Resizer CLI - headless front-end for the Resizer cropper
//!
//! # Commands
//!
//! - `crop <src>` - export every image in a folder through the crop session
//! - `scan <src>` - list the images a crop run would visit
//! - `config show` / `config set <field> <value>` - inspect or edit the
//!   persisted configuration

mod batch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use resizer_core::config::{ConfigStore, CONFIG_FILE};
use resizer_core::geometry::Size;
use resizer_core::scan::scan_folder;
use resizer_core::Session;

use crate::batch::BatchOptions;

#[derive(Parser, Debug)]
#[command(name = "resizer", version, about = "Batch fixed-aspect image cropper")]
struct Cli {
    /// Configuration file, created with defaults if missing
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crop every image in a folder
    Crop {
        src: PathBuf,
        /// Output folder, defaults to "<src>_cropped"
        #[arg(long)]
        dst: Option<PathBuf>,
        /// Layout size the crop is computed against
        #[arg(long, default_value = "800x600", value_parser = parse_container)]
        container: Size,
        /// Zoom relative to fit, in percent
        #[arg(long)]
        zoom: Option<f64>,
        /// Tabs per image, including the primary one
        #[arg(long, default_value_t = 1)]
        tabs: usize,
        /// Directory searched when a source file cannot be decoded
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// List the images a crop run would visit
    Scan { src: PathBuf },
    /// Show or edit the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    Set { field: String, value: String },
}

/// Parse `"WIDTHxHEIGHT"` into a non-empty size.
fn parse_container(raw: &str) -> Result<Size, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let width: f64 = width.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height: f64 = height.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    let size = Size::new(width, height);
    if size.is_empty() {
        return Err(format!("container must be positive, got {raw:?}"));
    }
    Ok(size)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Crop {
            src,
            dst,
            container,
            zoom,
            tabs,
            assets,
        } => {
            let store = ConfigStore::load(&cli.config);
            let mut session = Session::new(store.config());
            if let Some(assets) = assets {
                session = session.with_asset_root(assets);
            }
            session.set_destination_folder(dst);
            if !session.open_source_folder(&src) {
                return Err(format!("not a directory: {}", src.display()).into());
            }

            let options = BatchOptions {
                container,
                zoom,
                tabs,
            };
            let summary = batch::run(&mut session, &options)?;

            println!("exported: {}", summary.exported);
            println!("skipped: {}", summary.skipped);
            if let Some(destination) = summary.destination {
                println!("destination: {}", destination.display());
            }
        }
        Commands::Scan { src } => {
            let Some(files) = scan_folder(&src) else {
                return Err(format!("not a directory: {}", src.display()).into());
            };
            for (index, file) in files.iter().enumerate() {
                println!("{index:06} {}", file.display());
            }
        }
        Commands::Config { command } => {
            let mut store = ConfigStore::load(&cli.config);
            match command {
                ConfigCommand::Show => {}
                ConfigCommand::Set { field, value } => store.set_field(&field, &value)?,
            }
            log::info!("configuration file {}", store.path().display());
            println!("{}", serde_json::to_string_pretty(store.config())?);
        }
    }

    Ok(())
}
