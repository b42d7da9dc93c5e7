use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use cairn_sdk::{DefaultAssetSource, NoDefaults, StaticDefaults, Storage, StorageConfig};
use cairn_store::{BinaryFetcher, HttpFetcher, HttpObjectBackend, InMemoryObjectBackend, ObjectBackend};
use cairn_types::{AssetKey, AssetType, DataFormat};
use colored::Colorize;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.config)?;
    match cli.command {
        Command::Load(args) => cmd_load(&config, args).await,
        Command::Store(args) => cmd_store(&config, args).await,
        Command::Url(args) => cmd_url(&config, args),
    }
}

fn load_config(path: &Path) -> anyhow::Result<StorageConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(StorageConfig::default());
    }
    StorageConfig::load(path).with_context(|| format!("reading {}", path.display()))
}

fn open_storage(config: &StorageConfig) -> anyhow::Result<Storage> {
    let defaults: Arc<dyn DefaultAssetSource> = match &config.defaults_dir {
        Some(dir) => Arc::new(StaticDefaults::from_dir(dir)?),
        None => Arc::new(NoDefaults),
    };
    match &config.object_store {
        Some(store) => {
            let mut backend = HttpObjectBackend::new(store.base_url.clone());
            if let Some(token) = &store.bearer_token {
                backend = backend.with_bearer_token(token.clone());
            }
            with_backend(config, Arc::new(backend), defaults)
        }
        // Reads fall through to the web stores.
        None => with_backend(config, Arc::new(InMemoryObjectBackend::default()), defaults),
    }
}

/// The backend downloads its own objects; web stores use a plain fetcher.
fn with_backend<B>(
    config: &StorageConfig,
    backend: Arc<B>,
    defaults: Arc<dyn DefaultAssetSource>,
) -> anyhow::Result<Storage>
where
    B: ObjectBackend + BinaryFetcher + 'static,
{
    Ok(Storage::with_default_stores(
        config,
        backend,
        Arc::new(HttpFetcher::new()),
        defaults,
    )?)
}

fn key_for(asset_type: AssetType, id: &str, format: Option<DataFormat>) -> anyhow::Result<AssetKey> {
    let format = format.unwrap_or_else(|| asset_type.runtime_format());
    Ok(AssetKey::new(asset_type, id, format)?)
}

async fn cmd_load(config: &StorageConfig, args: LoadArgs) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let key = key_for(args.asset_type, &args.id, args.format)?;

    let Some(asset) = storage.load_key(&key).await else {
        bail!("no store has {key}");
    };
    let data = asset.data().cloned().unwrap_or_default();

    match args.output {
        Some(path) => {
            std::fs::write(&path, &data).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "{} Loaded {} ({} bytes) → {}",
                "✓".green().bold(),
                key.to_string().cyan(),
                data.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn cmd_store(config: &StorageConfig, args: StoreArgs) -> anyhow::Result<()> {
    if config.object_store.is_none() {
        bail!("no [object_store] configured; nothing to store into");
    }
    let storage = open_storage(config)?;

    let format = match args.format {
        Some(format) => Some(format),
        None => args
            .file
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse::<DataFormat>().ok()),
    };
    let data = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let size = data.len();

    let id = storage.store(args.asset_type, format, data, &args.id).await?;
    println!(
        "{} Stored {} {} ({} bytes)",
        "✓".green().bold(),
        args.asset_type.to_string().yellow(),
        id.cyan(),
        size
    );
    Ok(())
}

fn cmd_url(config: &StorageConfig, args: UrlArgs) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let key = key_for(args.asset_type, &args.id, args.format)?;

    println!("{}", key.to_string().bold());
    if let Some(store) = &config.object_store {
        println!("  {:<16} {}/{}", "remote-object".cyan(), store.base_url.trim_end_matches('/'), key.storage_key());
    }
    for (name, url) in storage.web_urls(&key) {
        println!("  {:<16} {}", name.cyan(), url);
    }

    if key.asset_type() == AssetType::Project {
        if let Some(create) = storage.project_create_request() {
            println!("  {:<16} POST {} (credentials: {})", "create".yellow(), create.url, create.with_credentials);
        }
        if let Some(update) = storage.project_update_request(key.asset_id()) {
            println!("  {:<16} PUT {} (credentials: {})", "update".yellow(), update.url, update.with_credentials);
        }
    }
    Ok(())
}
