mod output;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ideas_client::api::UploadFile;
use ideas_client::auth::StaticTokenProvider;
use ideas_client::cache::CacheSource;
use ideas_client::config::Config;
use ideas_client::sync::Entity;
use ideas_client::{ApiError, AppContext};

#[derive(Parser, Debug)]
#[command(name = "ideas")]
#[command(about = "Command-line client for the Ideas service")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/ideas/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List ideas (cached copy first, then the server's)
  List,
  /// Show one idea
  Show { id: String },
  /// Create an idea from text
  Create { transcript: Vec<String> },
  /// Create an idea from an audio file
  Upload { path: PathBuf },
  /// Replace an idea's transcript
  Update { id: String, transcript: Vec<String> },
  /// Delete an idea
  Delete { id: String },
  /// Semantic search
  Search { query: Vec<String> },
  /// Usage statistics
  Stats,
  /// Inspect or clear the local cache
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
  Status,
  Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  let config = Config::load(args.config.as_deref())?;
  let auth = Arc::new(StaticTokenProvider::from_env());
  let mut ctx = AppContext::init(config, auth)?;
  ctx.watch_session();

  match run(&mut ctx, args.command).await {
    Err(report) if matches!(report.downcast_ref::<ApiError>(), Some(ApiError::SessionExpired)) => {
      Err(report.wrap_err("Sign in again and export the new token as IDEAS_API_TOKEN"))
    }
    other => other,
  }
}

/// Log to a daily file under the data directory; stdout is for command output.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = Config::data_dir()?.join("logs");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(log_dir, "ideas.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env("IDEAS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

async fn run(ctx: &mut AppContext, command: Command) -> Result<()> {
  match command {
    Command::List => {
      let mut collection = ctx.collection();
      collection.refetch();
      if collection.source() == CacheSource::Cache {
        output::print_ideas("cached", collection.items());
      }
      collection.settle().await;
      match collection.error() {
        Some(error) if collection.items().is_empty() => return Err(error.clone().into()),
        Some(error) => output::print_warning(&format!("showing last known data: {}", error)),
        None => output::print_ideas("server", collection.items()),
      }
    }
    Command::Show { id } => {
      let mut detail = ctx.detail(id);
      detail.load().await;
      match (detail.entity(), detail.error()) {
        (Entity::Missing, _) => {
          output::print_warning(&format!("idea {} does not exist", detail.id()))
        }
        (Entity::Found(idea), error) => {
          if let Some(error) = error {
            output::print_warning(&format!("showing cached copy: {}", error));
          }
          output::print_idea(idea);
        }
        (Entity::Unknown, Some(error)) => return Err(error.clone().into()),
        (Entity::Unknown, None) => {}
      }
    }
    Command::Create { transcript } => {
      let idea = ctx.collection().create(&transcript.join(" ")).await?;
      output::print_idea(&idea);
    }
    Command::Upload { path } => {
      let file = UploadFile::from_path(&path)
        .await
        .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;
      let idea = ctx.collection().create_from_audio(file).await?;
      output::print_idea(&idea);
    }
    Command::Update { id, transcript } => {
      let idea = ctx.collection().update(&id, &transcript.join(" ")).await?;
      output::print_idea(&idea);
    }
    Command::Delete { id } => {
      ctx.collection().delete(&id).await?;
      println!("deleted {}", id);
    }
    Command::Search { query } => {
      let mut search = ctx.search();
      search.search(&query.join(" "));
      search.settle().await;
      if let Some(error) = search.error() {
        return Err(error.clone().into());
      }
      output::print_search(search.response());
    }
    Command::Stats => {
      let mut stats = ctx.stats();
      stats.refetch();
      stats.settle().await;
      if let Some(error) = stats.error() {
        return Err(error.clone().into());
      }
      if let Some(stats) = stats.stats() {
        output::print_stats(stats);
      }
    }
    Command::Cache { action } => match action {
      CacheAction::Status => {
        let snapshot = ctx.cache().read();
        output::print_cache_status(
          ctx.cache().last_updated(),
          snapshot.as_ref().map(|s| s.items.len()),
        );
      }
      CacheAction::Clear => {
        ctx.teardown();
        println!("cache cleared");
      }
    },
  }

  Ok(())
}
