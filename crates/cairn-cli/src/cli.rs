use std::path::PathBuf;

use cairn_types::{AssetType, DataFormat};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cairn",
    about = "Cairn: resolve and store assets across cache, object store, and web hosts",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Storage configuration file
    #[arg(long, global = true, default_value = "cairn.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve an asset and write its bytes
    Load(LoadArgs),
    /// Upload an asset to the authoritative object store
    Store(StoreArgs),
    /// Show the URLs and write requests for an asset
    Url(UrlArgs),
}

#[derive(Args)]
pub struct LoadArgs {
    /// project, image-bitmap, image-vector, or sound
    pub asset_type: AssetType,
    pub id: String,
    /// Defaults to the type's runtime format
    #[arg(short, long)]
    pub format: Option<DataFormat>,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct StoreArgs {
    pub asset_type: AssetType,
    pub id: String,
    pub file: PathBuf,
    /// Defaults to the file extension, then the type's runtime format
    #[arg(short, long)]
    pub format: Option<DataFormat>,
}

#[derive(Args)]
pub struct UrlArgs {
    pub asset_type: AssetType,
    pub id: String,
    #[arg(short, long)]
    pub format: Option<DataFormat>,
}
