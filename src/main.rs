use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ctaflow_api::HttpFlowApi;
use ctaflow_codec::PayloadCodec;
use ctaflow_config::{Direction, EditorConfig};
use ctaflow_editor::{FlowEditorSession, FsViewStateStore};
use ctaflow_graph::Flow;
use ctaflow_layout::LayeredLayout;

/// ctaflow - author and inspect WhatsApp CTA flows
#[derive(Parser)]
#[command(name = "ctaflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.ctaflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Decode a flow payload and print its authoring warnings
  Check {
    /// Path to the flow payload (JSON)
    flow_file: PathBuf,
  },

  /// Auto-layout a flow payload and print the result
  Layout {
    /// Path to the flow payload (JSON)
    flow_file: PathBuf,

    /// Layout direction, LR or TB (default: from config)
    #[arg(long)]
    direction: Option<Direction>,
  },

  /// Open a flow on the service and report its lifecycle state
  Status {
    /// Server id of the flow
    flow_id: String,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".ctaflow"),
  };
  let config_path = data_dir.join("config.json");
  let config = EditorConfig::load_or_default(&config_path)
    .with_context(|| format!("failed to load config: {}", config_path.display()))?;
  tracing::debug!(path = %config_path.display(), direction = %config.layout.direction, "config loaded");

  match cli.command {
    Some(Commands::Check { flow_file }) => check(&flow_file, &config)?,
    Some(Commands::Layout {
      flow_file,
      direction,
    }) => layout(&flow_file, direction, &config)?,
    Some(Commands::Status { flow_id }) => status(flow_id, data_dir, config)?,
    None => {
      println!("ctaflow - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_flow(flow_file: &Path, codec: &PayloadCodec) -> Result<Flow> {
  let content = std::fs::read_to_string(flow_file)
    .with_context(|| format!("failed to read flow file: {}", flow_file.display()))?;
  codec
    .decode_str(None, &content)
    .with_context(|| format!("failed to decode flow file: {}", flow_file.display()))
}

fn check(flow_file: &Path, config: &EditorConfig) -> Result<()> {
  let codec = PayloadCodec::new(config.seed_positions);
  let flow = load_flow(flow_file, &codec)?;

  eprintln!(
    "Loaded flow '{}': {} steps, {} transitions",
    flow.name,
    flow.steps.len(),
    flow.transitions.len()
  );

  let warnings = flow.warnings();
  if warnings.is_empty() {
    println!("no warnings");
  }
  for warning in &warnings {
    println!("warning: {warning}");
  }

  Ok(())
}

fn layout(flow_file: &Path, direction: Option<Direction>, config: &EditorConfig) -> Result<()> {
  let codec = PayloadCodec::new(config.seed_positions);
  let mut flow = load_flow(flow_file, &codec)?;

  let direction = direction.unwrap_or(config.layout.direction);
  flow.apply_layout(&LayeredLayout::new(config.layout), direction);

  println!("{}", serde_json::to_string_pretty(&codec.encode(&flow))?);
  Ok(())
}

fn status(flow_id: String, data_dir: PathBuf, config: EditorConfig) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { status_async(flow_id, data_dir, config).await })
}

async fn status_async(flow_id: String, data_dir: PathBuf, config: EditorConfig) -> Result<()> {
  let api = HttpFlowApi::new(&config.api).context("failed to create api client")?;
  let session = FlowEditorSession::builder(Arc::new(api))
    .config(config)
    .view_store(Arc::new(FsViewStateStore::new(data_dir.join("views"))))
    .open(&flow_id)
    .await
    .map_err(|e| anyhow::anyhow!(e.user_message()))
    .with_context(|| format!("failed to open flow {flow_id}"))?;

  let flow = session.flow();
  println!("flow:   {} ({})", flow.name, flow_id);
  println!("state:  {}", session.lifecycle_state());
  if let Some(lock) = session.lock_info() {
    match lock.campaigns {
      Some(campaigns) => {
        for campaign in campaigns {
          println!("locked by: {} [{}]", campaign.name, campaign.status);
        }
      }
      None => println!("locked: usage could not be determined"),
    }
  }
  for warning in session.warnings() {
    println!("warning: {warning}");
  }

  session.teardown();
  Ok(())
}
