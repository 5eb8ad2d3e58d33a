//! `rapport` — consolidate personal message exports into one SQLite store
//! and derive per-contact metrics from it.
//!
//! # Usage
//!
//! ```text
//! rapport ingest google-voice ~/Downloads/takeout
//! rapport ingest messenger ~/Downloads/facebook/messages/inbox
//! rapport ingest contacts ~/Downloads/contacts.csv
//! rapport resolve
//! rapport export messages.csv
//! rapport time-series --bucket week weekly.csv
//! rapport reciprocity --since 2020-01-01 reciprocity.csv
//! ```

mod output;
mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rapport_core::{
  ingest::Ingestor,
  record::SourceBatch,
  resolver::{ResolveOptions, Resolver},
  store::MessageStore,
  view::MessageView,
  writer::Writer,
};
use rapport_import::{contacts, google_voice, messenger};
use rapport_metrics::{Bucket, ContactEvent, conversation_log, reciprocity, time_series};
use rapport_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rapport", version, about = "Consolidate personal message exports")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "rapport.toml")]
  config: PathBuf,

  /// SQLite database to use instead of `store_path`.
  #[arg(long, value_name = "PATH")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Import one export into the store.
  Ingest {
    #[command(subcommand)]
    source: Source,
  },
  /// Link identities to people.
  Resolve,
  /// Write every message as one CSV row.
  Export { out: PathBuf },
  /// Write per-contact message counts per week or month.
  TimeSeries {
    #[arg(long, value_enum, default_value_t = BucketArg::Month)]
    bucket: BucketArg,
    out:    PathBuf,
  },
  /// Write per-contact reciprocity and amplitude.
  Reciprocity {
    /// Only count messages after this date (overrides `metrics.since`).
    #[arg(long)]
    since: Option<String>,
    out:   PathBuf,
  },
  /// Print row counts.
  Stats,
}

#[derive(Subcommand, Debug)]
enum Source {
  /// A Google Voice takeout folder.
  GoogleVoice {
    dir:   PathBuf,
    /// Read at most this many files (overrides `ingest.file_limit`).
    #[arg(long)]
    limit: Option<usize>,
  },
  /// A Facebook Messenger export or its `inbox` folder.
  Messenger { dir: PathBuf },
  /// A Google Contacts CSV file.
  Contacts { file: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BucketArg {
  Week,
  Month,
}

impl From<BucketArg> for Bucket {
  fn from(b: BucketArg) -> Self {
    match b {
      BucketArg::Week => Bucket::Week,
      BucketArg::Month => Bucket::Month,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store_path = cli.store.clone().unwrap_or_else(|| settings.store_path());
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Ingest { source } => {
      let batch = read_source(&settings, source)?;
      ingest(&store, &settings, batch).await
    }
    Command::Resolve => resolve(&store, &settings).await,
    Command::Export { out } => {
      let views = store.list_message_views().await?;
      let n = output::write_messages(&out, &views)?;
      info!(rows = n, file = %out.display(), "exported messages");
      Ok(())
    }
    Command::TimeSeries { bucket, out } => {
      let views = store.list_message_views().await?;
      let series = time_series(&owner_log(&views), bucket.into());
      let n = output::write_time_series(&out, &series)?;
      info!(contacts = n, buckets = series.buckets.len(), file = %out.display(), "wrote time series");
      Ok(())
    }
    Command::Reciprocity { since, out } => {
      let since = settings.since(since.as_deref())?;
      let views = store.list_message_views().await?;
      let rows = reciprocity(&owner_log(&views), since);
      let n = output::write_reciprocity(&out, &rows)?;
      info!(contacts = n, file = %out.display(), "wrote reciprocity");
      Ok(())
    }
    Command::Stats => {
      let c = store.counts().await?;
      println!("platforms:          {}", c.platforms);
      println!("identities:         {}", c.identities);
      println!("linked identities:  {}", c.linked_identities);
      println!("people:             {}", c.people);
      println!("messages:           {}", c.messages);
      Ok(())
    }
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn read_source(settings: &Settings, source: Source) -> Result<SourceBatch> {
  let batch = match source {
    Source::GoogleVoice { dir, limit } => {
      let owner_phone = settings.owner_phone()?;
      let limit = limit.or(settings.ingest.file_limit);
      google_voice::read_takeout(&dir, &owner_phone, limit)
        .with_context(|| format!("failed to read Google Voice takeout {}", dir.display()))?
    }
    Source::Messenger { dir } => messenger::read_inbox(&dir)
      .with_context(|| format!("failed to read Messenger inbox {}", dir.display()))?,
    Source::Contacts { file } => contacts::read_contacts(&file)
      .with_context(|| format!("failed to read contacts {}", file.display()))?,
  };
  info!(
    platform = %batch.platform,
    files = batch.tally.files,
    identities = batch.identities.len(),
    messages = batch.messages.len(),
    "source read"
  );
  Ok(batch)
}

async fn ingest(store: &SqliteStore, settings: &Settings, batch: SourceBatch) -> Result<()> {
  let mut ingestor = Ingestor::new(store, Writer::new(settings.ingest.skip_duplicate_messages));
  ingestor.ingest(batch).await.context("ingestion aborted")?;
  println!("{}", ingestor.finish());
  Ok(())
}

async fn resolve(store: &SqliteStore, settings: &Settings) -> Result<()> {
  let options = ResolveOptions { owner_names: settings.owner_names() };
  let report = Resolver::new(store, options)
    .run()
    .await
    .context("identity resolution aborted")?;
  println!("{report}");
  Ok(())
}

/// The owner's conversation log, warning when no message involves the owner.
fn owner_log(views: &[MessageView]) -> Vec<ContactEvent> {
  let log = conversation_log(views);
  if log.is_empty() && !views.is_empty() {
    warn!(
      messages = views.len(),
      "no message involves the owner; check owner.names and re-run `rapport resolve`"
    );
  }
  log
}
