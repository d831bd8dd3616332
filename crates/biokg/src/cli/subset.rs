use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use biokg_core::ingest::{configured_readers, SUBSET_STATS_FILE};
use biokg_core::output::update_timestamp;
use biokg_core::{MergeConfig, OutputFormat, Subset, SubsetLimits};
use clap::Args;

use super::SourceFlags;

#[derive(Args, Debug)]
pub struct SubsetArgs {
    /// TOML config file supplying dataset paths
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub sources: SourceFlags,

    /// Directory for the extract and subset_stats.json
    #[arg(short, long, default_value = "subset_output")]
    pub output_dir: PathBuf,

    /// Output format: jsonl, csv or neo4j
    #[arg(short, long, default_value = "csv")]
    pub format: OutputFormat,

    /// Nodes taken from the start of each source
    #[arg(long, value_name = "N", default_value_t = 1000)]
    pub nodes_per_source: u64,

    /// Most edges kept per source
    #[arg(long, value_name = "N", default_value_t = 2000)]
    pub edges_per_source: u64,

    /// Keep every edge between selected nodes
    #[arg(long, conflicts_with = "edges_per_source")]
    pub all_edges: bool,

    /// Write one subdirectory per source instead of a combined graph
    #[arg(long)]
    pub split: bool,
}

pub fn run(args: &SubsetArgs) -> Result<()> {
    let mut config = MergeConfig::discover(args.config.as_deref())
        .context("failed to load config")?
        .with_env();
    args.sources.apply(&mut config);

    let readers = configured_readers(&config)?;
    if readers.is_empty() {
        bail!("no sources given; pass dataset flags such as --primekg-nodes or a --config file");
    }

    let limits = SubsetLimits {
        nodes_per_source: args.nodes_per_source,
        edges_per_source: (!args.all_edges).then_some(args.edges_per_source),
    };
    let subset = Subset::extract(&readers, limits).context("failed to sample sources")?;
    let report = subset
        .write(&args.output_dir, args.format, args.split, &update_timestamp())
        .with_context(|| format!("failed to write {}", args.output_dir.display()))?;

    eprintln!(
        "Extracted {} nodes and {} edges from {} sources",
        report.nodes(),
        report.edges(),
        report.sources.len()
    );
    for (source, counts) in &report.sources {
        eprintln!(
            "  {}: {} nodes, {} edges ({} outside the selection)",
            source, counts.nodes, counts.edges, counts.edges_outside
        );
    }
    eprintln!(
        "  Stats: {}",
        args.output_dir.join(SUBSET_STATS_FILE).display()
    );
    Ok(())
}
