use std::path::PathBuf;

use anyhow::{Context, Result};
use biokg_core::ingest::{merge_nodes_from, PrimeKgReader, SemMedDbLayout, SemMedDbReader};
use biokg_core::output::{delimited, jsonl, update_timestamp};
use biokg_core::GraphMerger;
use clap::Args;

use super::LimitFlags;

#[derive(Args, Debug)]
pub struct NodesArgs {
    /// SemMedDB entity dump (.csv or .csv.gz)
    pub semmeddb_entities: PathBuf,

    /// PrimeKG nodes.csv
    pub primekg_nodes: PathBuf,

    /// Merged node JSON-Lines file to write
    pub output: PathBuf,

    /// Also write the merged nodes as CSV
    #[arg(long, value_name = "PATH")]
    pub csv_output: Option<PathBuf>,

    #[command(flatten)]
    pub limits: LimitFlags,

    /// Record ceiling for SemMedDB only
    #[arg(long, value_name = "N")]
    pub semmeddb_limit: Option<u64>,

    /// Record ceiling for PrimeKG only
    #[arg(long, value_name = "N")]
    pub primekg_limit: Option<u64>,

    /// SemMedDB column layout: definition, numeric-id or concept
    #[arg(long, default_value = "numeric-id")]
    pub layout: SemMedDbLayout,

    /// Export the identifier mapping for a later `edges` run
    #[arg(long, value_name = "PATH")]
    pub mapping_out: Option<PathBuf>,

    /// Do not emit one node per contributing source
    #[arg(long)]
    pub no_source_nodes: bool,
}

pub fn run(args: &NodesArgs) -> Result<()> {
    let limit = args.limits.record_limit();
    let semmeddb = SemMedDbReader::new(Some(args.semmeddb_entities.clone()), None)
        .with_layout(args.layout);
    let primekg = PrimeKgReader::new(Some(args.primekg_nodes.clone()), None);

    let mut merger = GraphMerger::new();
    let semmeddb_read = merge_nodes_from(&mut merger, &semmeddb, args.semmeddb_limit.or(limit))
        .with_context(|| format!("failed to read {}", args.semmeddb_entities.display()))?;
    let primekg_read = merge_nodes_from(&mut merger, &primekg, args.primekg_limit.or(limit))
        .with_context(|| format!("failed to read {}", args.primekg_nodes.display()))?;
    if !args.no_source_nodes {
        merger.add_source_nodes();
    }

    let aggregator = merger.finish_nodes();
    if let Some(path) = &args.mapping_out {
        aggregator
            .mapping()
            .export(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    let graph = aggregator.finish();

    let update_date = update_timestamp();
    jsonl::write_nodes(&args.output, &graph.nodes, &update_date)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    if let Some(path) = &args.csv_output {
        delimited::write_nodes(path, &graph.nodes, &update_date)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    eprintln!(
        "Merged {} SemMedDB and {} PrimeKG records into {} nodes",
        semmeddb_read.records,
        primekg_read.records,
        graph.nodes.len()
    );
    eprintln!(
        "  Skipped: {} malformed, {} without identifier",
        semmeddb_read.malformed + primekg_read.malformed,
        graph.counts.nodes_unidentified
    );
    Ok(())
}
