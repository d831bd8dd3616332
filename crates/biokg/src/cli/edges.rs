use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use biokg_core::ingest::{
    merge_edges_from, BioKdeReader, IKraphFiles, IKraphReader, PrimeKgReader, SemMedDbReader,
};
use biokg_core::output::{delimited, jsonl, update_timestamp};
use biokg_core::{EdgeAggregator, IdentifierMapping, SourceReader};
use clap::Args;

use super::LimitFlags;

#[derive(Args, Debug)]
pub struct EdgesArgs {
    /// Identifier mapping ({"final_mapping": {raw: canonical}})
    pub mapping: PathBuf,

    /// Aggregated edge JSON-Lines file to write
    pub output: PathBuf,

    /// SemMedDB connection list
    #[arg(long)]
    pub semmeddb_connections: Option<PathBuf>,

    /// PrimeKG kg.csv / edges.csv
    #[arg(long)]
    pub primekg_edges: Option<PathBuf>,

    /// Directory holding the iKraph relationship files
    #[arg(long)]
    pub ikraph_dir: Option<PathBuf>,

    /// BioKDE edge CSV
    #[arg(long)]
    pub biokde_edges: Option<PathBuf>,

    /// Also write the aggregated edges as CSV
    #[arg(long, value_name = "PATH")]
    pub csv_output: Option<PathBuf>,

    #[command(flatten)]
    pub limits: LimitFlags,
}

impl EdgesArgs {
    fn readers(&self) -> Vec<Box<dyn SourceReader>> {
        let mut readers: Vec<Box<dyn SourceReader>> = Vec::new();
        if let Some(path) = &self.semmeddb_connections {
            readers.push(Box::new(SemMedDbReader::new(None, Some(path.clone()))));
        }
        if let Some(path) = &self.primekg_edges {
            readers.push(Box::new(PrimeKgReader::new(None, Some(path.clone()))));
        }
        if let Some(dir) = &self.ikraph_dir {
            let files = IKraphFiles {
                nodes: Vec::new(),
                ..IKraphFiles::default()
            };
            readers.push(Box::new(IKraphReader::new(dir).with_files(files)));
        }
        if let Some(path) = &self.biokde_edges {
            readers.push(Box::new(BioKdeReader::new(None, Some(path.clone()))));
        }
        readers
    }
}

pub fn run(args: &EdgesArgs) -> Result<()> {
    let readers = args.readers();
    if readers.is_empty() {
        bail!(
            "no edge inputs given; pass --semmeddb-connections, --primekg-edges, \
             --ikraph-dir or --biokde-edges"
        );
    }

    let mapping = IdentifierMapping::load(&args.mapping)
        .with_context(|| format!("failed to load mapping {}", args.mapping.display()))?;
    let mut aggregator = EdgeAggregator::from_mapping(mapping);

    let limit = args.limits.record_limit();
    for reader in &readers {
        merge_edges_from(&mut aggregator, reader.as_ref(), limit)
            .with_context(|| format!("failed to read {} edges", reader.source()))?;
    }
    let graph = aggregator.finish();

    let update_date = update_timestamp();
    jsonl::write_edges(&args.output, &graph.edges, &update_date)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    if let Some(path) = &args.csv_output {
        delimited::write_edges(path, &graph.edges, &update_date)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    eprintln!(
        "Aggregated {} edges ({} read, {} dropped)",
        graph.edges.len(),
        graph.counts.edges_in,
        graph.counts.edges_dropped
    );
    Ok(())
}
