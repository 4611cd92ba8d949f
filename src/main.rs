use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, warn};

use hashed_assets::config::ProjectConfig;
use hashed_assets::logging::init_logger;
use hashed_assets::models::AssetRecord;
use hashed_assets::transforms::CommandTransforms;
use hashed_assets::{AssetBuilder, BuildReport};

/// Fingerprint, bundle and publish the static assets of a web project.
#[derive(Debug, Parser)]
#[command(name = "hashed-assets", version, about)]
struct Cli {
  /// Project directory holding the configuration file and the build trees.
  #[arg(long, global = true, default_value = ".")]
  project: PathBuf,

  /// Configuration file to use instead of `<project>/assets.config.json`.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Enable debug logging.
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Only log errors.
  #[arg(short, long, global = true)]
  quiet: bool,

  /// Disable colored log output.
  #[arg(long, global = true)]
  no_color: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Run the full pipeline from a clean slate.
  Build {
    /// Keep the intermediate tree after publishing.
    #[arg(long)]
    keep_intermediate: bool,
    /// Print the build report as JSON.
    #[arg(long)]
    report: bool,
  },
  /// Remove the intermediate and target trees.
  Clean,
  /// Fingerprint the sources and print the resulting path mapping as JSON.
  Mapping,
}

fn main() {
  let cli = Cli::parse();
  init_logger(cli.verbose, cli.quiet, cli.no_color);

  if let Err(err) = run(cli) {
    error!("{err:#}");
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  let mut config = match &cli.config {
    Some(path) => ProjectConfig::from_path(path)?
      .with_context(|| format!("configuration file {} does not exist", path.display()))?,
    None => ProjectConfig::discover(&cli.project)?,
  };

  match cli.command {
    Command::Build {
      keep_intermediate,
      report,
    } => {
      config.keep_intermediate |= keep_intermediate;
      let transforms = CommandTransforms::new(config.commands.clone());
      let mut builder = AssetBuilder::new(config.to_context(&cli.project)?, transforms);
      let summary: BuildReport = builder.build()?.clone();

      if summary.has_problems() {
        warn!(
          missing = summary.missing_bundled_files.len(),
          failures = summary.transform_failures.len(),
          "build finished with problems"
        );
      }
      if report {
        println!("{}", serde_json::to_string_pretty(&summary)?);
      }
    }
    Command::Clean => {
      let builder = AssetBuilder::new(
        config.to_context(&cli.project)?,
        CommandTransforms::default(),
      );
      builder.clean_all()?;
    }
    Command::Mapping => {
      let context = config.to_context(&cli.project)?;
      let keep = context.keep_intermediate;
      let mut builder = AssetBuilder::new(context, CommandTransforms::default());
      builder.clean_intermediate()?;
      builder.fingerprint_sources()?;

      let records: Vec<AssetRecord> = builder.mapper().records().collect();
      println!("{}", serde_json::to_string_pretty(&records)?);

      if !keep {
        builder.clean_intermediate()?;
      }
    }
  }

  Ok(())
}
