//! Epoch CLI - Century inference for person records
//!
//! Usage:
//!   epoch run [--persons-dir <dir>]
//!   epoch resume [--kb <path>]
//!   epoch inspect <id>

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use epoch_core::{EpochConfig, KnowledgeBase, LoggingConfig};
use epoch_extractor::InferencePipeline;
use epoch_graph::{write_summary, FsPersonStore, SnapshotStore, TurtleWriter};

#[derive(Parser)]
#[command(name = "epoch")]
#[command(about = "Infer the active century of persons in a biographical knowledge graph")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, classify and propagate over the whole corpus
    Run {
        /// Root of the sharded person records
        #[arg(long)]
        persons_dir: Option<PathBuf>,

        #[command(flatten)]
        outputs: OutputArgs,
    },
    /// Reclassify a saved knowledge base without reading the corpus
    Resume {
        #[command(flatten)]
        outputs: OutputArgs,
    },
    /// Show the extracted evidence and centuries of one person
    Inspect {
        /// Person identifier
        id: String,

        /// Root of the sharded person records
        #[arg(long)]
        persons_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Knowledge base snapshot path
    #[arg(long)]
    kb: Option<PathBuf>,

    /// Turtle output path
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON run summary path
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl OutputArgs {
    fn apply(self, config: &mut EpochConfig) {
        if let Some(kb) = self.kb {
            config.storage.kb_path = kb;
        }
        if let Some(output) = self.output {
            config.storage.output_path = output;
        }
        if let Some(summary) = self.summary {
            config.storage.summary_path = Some(summary);
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EpochConfig> {
    let config = match path {
        Some(path) => EpochConfig::from_file(path)?,
        None => EpochConfig::default(),
    };
    Ok(config.with_env_override()?)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("epoch={0},epoch_extractor={0},epoch_graph={0}", logging.level).into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Write centuries, summary and report to stdout
async fn finish(config: &EpochConfig, kb: &KnowledgeBase) -> anyhow::Result<()> {
    let writer = TurtleWriter::new(config.output.clone());
    writer
        .write(&config.storage.output_path, kb)
        .await
        .context("writing century associations")?;

    let summary = kb.summary();
    if let Some(path) = &config.storage.summary_path {
        write_summary(path, &summary)
            .await
            .context("writing run summary")?;
    }

    println!("{summary}");
    for (century, count) in &summary.histogram {
        println!("  century {century}: {count}");
    }
    if !summary.problematic.is_empty() {
        println!("problematic: {}", summary.problematic.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    let pipeline = InferencePipeline::new(&config.inference);

    match cli.command {
        Commands::Run {
            persons_dir,
            outputs,
        } => {
            if let Some(dir) = persons_dir {
                config.storage.persons_dir = dir;
            }
            outputs.apply(&mut config);

            let store = FsPersonStore::new(&config.storage);
            let kb = pipeline
                .run_batch(&store)
                .await
                .with_context(|| format!("reading persons from {}", store.root().display()))?;

            SnapshotStore::new(&config.storage.kb_path)
                .save(&kb)
                .await
                .context("saving knowledge base")?;
            finish(&config, &kb).await?;
        }
        Commands::Resume { outputs } => {
            outputs.apply(&mut config);

            let snapshots = SnapshotStore::new(&config.storage.kb_path);
            let snapshot = snapshots.load().await.context("loading knowledge base")?;
            let kb = pipeline.resume(snapshot);

            snapshots.save(&kb).await.context("saving knowledge base")?;
            finish(&config, &kb).await?;
        }
        Commands::Inspect { id, persons_dir } => {
            if let Some(dir) = persons_dir {
                config.storage.persons_dir = dir;
            }

            let store = FsPersonStore::new(&config.storage);
            tracing::debug!(person = %id, path = %store.path_for(&id).display(), "inspecting");
            let inspection = pipeline.inspect(&store, &id).await?;
            println!("{}", serde_json::to_string_pretty(&inspection)?);
        }
    }

    Ok(())
}
