//! stockpile - inventory tracking from the command line
//!
//! Subcommands:
//! - `stockpile list [--search <text>]` - Show items
//! - `stockpile add <name> <quantity> [--photo <file>]` - Add or top up an item
//! - `stockpile edit <name> [--name <new>] [--quantity <n>] [--photo <file>]` - Edit or rename
//! - `stockpile adjust <name> <delta>` - Add to or subtract from a quantity
//! - `stockpile remove <name>` - Delete an item
//! - `stockpile config` - Print the effective configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use blobstash::{FileBlobStore, StashConfig};
use clap::{Parser, Subcommand};
use stockconf::{ConfigSources, StockConfig};
use stockpile::{
    BlobLayout, CaptureAdapter, CapturedFrame, ImageCodec, ImageOutcome, ImageUploader,
    JsonFileRecordStore, ListView, StillImageDevice, SubmitOutcome, SubmitRequest,
    SyncController, SyncPolicy,
};

#[derive(Parser)]
#[command(name = "stockpile")]
#[command(about = "Inventory tracking with item photos")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./stockpile.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration and where it came from
    Config,

    #[command(flatten)]
    Item(ItemCommand),
}

/// Commands that talk to the record and blob stores.
#[derive(Subcommand)]
enum ItemCommand {
    /// List items
    List {
        /// Only show items whose name contains this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Add an item, or set the quantity of an existing one
    Add {
        name: String,

        quantity: i64,

        /// Image file to snapshot as the item's photo
        #[arg(short, long)]
        photo: Option<PathBuf>,
    },

    /// Edit an item; renaming moves the record to the new name
    Edit {
        /// Current name of the item
        original: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New quantity
        #[arg(short, long)]
        quantity: Option<i64>,

        /// Image file to snapshot as the item's photo
        #[arg(short, long)]
        photo: Option<PathBuf>,
    },

    /// Change a quantity by a signed amount
    Adjust {
        name: String,

        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Delete an item
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = StockConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    stockpile::telemetry::init(&config.telemetry.log_level)?;

    match cli.command {
        Commands::Config => print_config(&config, &sources),
        Commands::Item(command) => run(command, &config).await?,
    }

    Ok(())
}

async fn run(command: ItemCommand, config: &StockConfig) -> Result<()> {
    let sync = build_controller(config)?;
    let mut view = ListView::new();

    match command {
        ItemCommand::List { search } => {
            sync.refresh(&mut view).await.context("Failed to list items")?;
            if let Some(search) = search {
                view.set_search(search);
            }
            print_items(&view);
        }

        ItemCommand::Add {
            name,
            quantity,
            photo,
        } => {
            let mut request = SubmitRequest::create(name, quantity);
            if let Some(photo) = photo {
                request = request.with_image(snapshot(&photo, config).await?);
            }
            let outcome = sync.submit(&mut view, request).await.context("Failed to add item")?;
            report_submit(&outcome);
        }

        ItemCommand::Edit {
            original,
            name,
            quantity,
            photo,
        } => {
            let current = sync
                .records()
                .get(&original)
                .await
                .context("Failed to read item")?
                .with_context(|| format!("No item named {original:?}"))?;

            let mut request = SubmitRequest::edit(
                &original,
                name.unwrap_or_else(|| original.clone()),
                quantity.unwrap_or_else(|| i64::from(current.quantity)),
            );
            if let Some(photo) = photo {
                request = request.with_image(snapshot(&photo, config).await?);
            }
            let outcome = sync.submit(&mut view, request).await.context("Failed to edit item")?;
            report_submit(&outcome);
        }

        ItemCommand::Adjust { name, delta } => {
            let outcome = sync
                .adjust_quantity(&mut view, &name, delta)
                .await
                .context("Failed to adjust quantity")?;
            println!("{}: {}", outcome.name, outcome.quantity);
        }

        ItemCommand::Remove { name } => {
            let outcome = sync.remove(&mut view, &name).await.context("Failed to remove item")?;
            if outcome.existed {
                println!("Removed {name}");
            } else {
                println!("No item named {name}");
            }
        }
    }

    Ok(())
}

fn print_config(config: &StockConfig, sources: &ConfigSources) {
    for file in &sources.files {
        println!("# file: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# env: {var}");
    }
    print!("{}", config.to_toml());
}

fn build_controller(config: &StockConfig) -> Result<SyncController> {
    let records = JsonFileRecordStore::new(&config.paths.state_dir, &config.store.collection);

    let mut stash = StashConfig::with_base_path(config.paths.blob_dir.clone());
    if let Some(url) = &config.blobs.public_base_url {
        stash = stash.with_public_base_url(url.clone());
    }
    let blobs = FileBlobStore::new(stash).with_context(|| {
        format!("Failed to open blob store at {}", config.paths.blob_dir.display())
    })?;

    let uploader = ImageUploader::new(
        Arc::new(blobs),
        ImageCodec::new(config.capture.jpeg_quality),
        BlobLayout::from(&config.blobs),
    );
    Ok(SyncController::new(
        Arc::new(records),
        uploader,
        SyncPolicy::from(&config.sync),
    ))
}

/// Stream `photo` through the capture adapter and take one snapshot at the configured size.
async fn snapshot(photo: &Path, config: &StockConfig) -> Result<CapturedFrame> {
    let adapter = CaptureAdapter::new(Arc::new(StillImageDevice::new(photo)));
    let mut session = adapter
        .start()
        .await
        .with_context(|| format!("Failed to open {}", photo.display()))?;
    let frame = session
        .capture_frame(config.capture.width, config.capture.height)
        .context("Failed to capture snapshot")?;
    session.stop();
    Ok(frame)
}

fn print_items(view: &ListView) {
    let mut shown = 0;
    for item in view.visible_items() {
        match &item.image_url {
            Some(url) => println!("{:<32} {:>8}  {}", item.display_name(), item.quantity, url),
            None => println!("{:<32} {:>8}", item.display_name(), item.quantity),
        }
        shown += 1;
    }
    if shown == 0 {
        if view.search().is_empty() {
            println!("No items yet.");
        } else {
            println!("No items match {:?}.", view.search());
        }
    }
}

fn report_submit(outcome: &SubmitOutcome) {
    match &outcome.renamed_from {
        Some(from) => println!("Saved {} (renamed from {from})", outcome.name),
        None => println!("Saved {}", outcome.name),
    }
    match &outcome.image {
        ImageOutcome::Unchanged => {}
        ImageOutcome::Attached { url } => println!("Photo: {url}"),
        ImageOutcome::CarriedForward { url } => println!("Photo kept: {url}"),
        ImageOutcome::UploadFailed { reason } => {
            eprintln!("warning: photo not saved: {reason}");
        }
    }
    if !outcome.refreshed {
        eprintln!("warning: saved, but the item list could not be reloaded");
    }
}
