//! Orchestration of a merge run: stage every source to JSON-Lines, replay
//! the staged node files into the merger, then the staged edge files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::biokde::BioKdeReader;
use super::ikraph::IKraphReader;
use super::merger::{EdgeAggregator, GraphMerger, MergeCounts, MergedGraph};
use super::normalizer::MappingBuilder;
use super::primekg::PrimeKgReader;
use super::semmeddb::SemMedDbReader;
use super::staging::{read_staged, StagedStats, StagingPaths, StagingWriter};
use super::stream::{ReadStats, SourceReader};
use crate::config::MergeConfig;
use crate::edge::RawEdge;
use crate::error::{Error, Result};
use crate::node::RawNode;
use crate::output::{self, OutputFiles, OutputFormat};
use crate::source::SourceKind;

pub const STATS_FILE: &str = "merge_stats.json";

/// Treat a missing input file as an empty stream.
pub(crate) fn tolerate_missing(
    source: SourceKind,
    result: Result<ReadStats>,
) -> Result<ReadStats> {
    match result {
        Err(Error::MissingInput(path)) => {
            tracing::warn!("{}: skipping missing input {}", source, path.display());
            Ok(ReadStats {
                missing_files: 1,
                ..ReadStats::default()
            })
        }
        other => other,
    }
}

/// Stream a reader's nodes straight into the merger.
pub fn merge_nodes_from(
    merger: &mut GraphMerger,
    reader: &dyn SourceReader,
    limit: Option<u64>,
) -> Result<ReadStats> {
    reader.read_nodes(limit, &mut |node| {
        merger.add_node(&node);
        Ok(())
    })
}

/// Stream a reader's edges straight into the aggregator. A missing edge
/// file is skipped with a warning.
pub fn merge_edges_from(
    aggregator: &mut EdgeAggregator,
    reader: &dyn SourceReader,
    limit: Option<u64>,
) -> Result<ReadStats> {
    let source = reader.source();
    tolerate_missing(
        source,
        reader.read_edges(limit, &mut |edge| {
            aggregator.add_edge(&edge);
            Ok(())
        }),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub nodes_read: ReadStats,
    pub edges_read: ReadStats,
    pub nodes_staged: StagedStats,
    pub edges_staged: StagedStats,
}

/// Summary written next to the merged output as `merge_stats.json`.
#[derive(Debug, Clone, Serialize)]
pub struct MergeStats {
    pub update_date: String,
    pub limit: Option<u64>,
    pub format: OutputFormat,
    pub sources: BTreeMap<SourceKind, SourceStats>,
    pub nodes: u64,
    pub edges: u64,
    pub mapping_entries: usize,
    pub counts: MergeCounts,
    pub outputs: Option<OutputFiles>,
}

impl MergeStats {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))
    }
}

/// Readers for every source that has at least one path configured.
pub fn configured_readers(config: &MergeConfig) -> Result<Vec<Box<dyn SourceReader>>> {
    let mut readers: Vec<Box<dyn SourceReader>> = Vec::new();

    let semmeddb = &config.semmeddb;
    if semmeddb.entities.is_some() || semmeddb.connections.is_some() {
        readers.push(Box::new(
            SemMedDbReader::new(semmeddb.entities.clone(), semmeddb.connections.clone())
                .with_layout(semmeddb.resolved_layout()?),
        ));
    }

    let primekg = &config.primekg;
    if primekg.nodes.is_some() || primekg.edges.is_some() {
        readers.push(Box::new(PrimeKgReader::new(
            primekg.nodes.clone(),
            primekg.edges.clone(),
        )));
    }

    if let Some(dir) = &config.ikraph.dir {
        readers.push(Box::new(
            IKraphReader::new(dir).with_files(config.ikraph.files.clone()),
        ));
    }

    let biokde = &config.biokde;
    if biokde.nodes.is_some() || biokde.edges.is_some() {
        readers.push(Box::new(
            BioKdeReader::new(biokde.nodes.clone(), biokde.edges.clone())
                .with_columns(biokde.columns.clone()),
        ));
    }

    Ok(readers)
}

/// Full streaming merge of every configured source.
#[derive(Debug, Clone)]
pub struct MergePipeline {
    config: MergeConfig,
    update_date: String,
}

impl MergePipeline {
    #[must_use]
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            update_date: output::update_timestamp(),
        }
    }

    #[must_use]
    pub fn with_update_date(mut self, update_date: impl Into<String>) -> Self {
        self.update_date = update_date.into();
        self
    }

    #[must_use]
    pub const fn config(&self) -> &MergeConfig {
        &self.config
    }

    fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Write one source's node and edge streams to its staging files.
    pub fn stage(&self, reader: &dyn SourceReader) -> Result<SourceStats> {
        let source = reader.source();
        let limit = self.config.record_limit();
        let paths = StagingPaths::new(self.output_dir(), source);
        let mut stats = SourceStats::default();

        tracing::info!("Staging {}", source.full_name());

        let mut nodes = StagingWriter::<RawNode>::create(&paths.nodes)?;
        stats.nodes_read =
            tolerate_missing(source, reader.read_nodes(limit, &mut |n| nodes.write(&n)))?;
        nodes.finish()?;

        let mut edges = StagingWriter::<RawEdge>::create(&paths.edges)?;
        stats.edges_read =
            tolerate_missing(source, reader.read_edges(limit, &mut |e| edges.write(&e)))?;
        edges.finish()?;

        Ok(stats)
    }

    fn seeded_merger(&self) -> Result<GraphMerger> {
        let mut mapping = MappingBuilder::new();
        if let Some(path) = &self.config.mapping {
            mapping.load_precomputed(path)?;
        }
        Ok(GraphMerger::with_mapping(mapping))
    }

    /// Replay staged files: nodes of every source first, then edges.
    pub fn merge_staged(
        &self,
        sources: &[SourceKind],
        stats: &mut BTreeMap<SourceKind, SourceStats>,
    ) -> Result<MergedGraph> {
        let mut merger = self.seeded_merger()?;
        for &source in sources {
            let paths = StagingPaths::new(self.output_dir(), source);
            let staged = read_staged::<RawNode>(&paths.nodes, |node| merger.add_node(&node))?;
            stats.entry(source).or_default().nodes_staged = staged;
        }
        if self.config.source_nodes {
            merger.add_source_nodes();
        }

        let mut aggregator = merger.finish_nodes();
        if let Some(path) = &self.config.mapping_out {
            aggregator.mapping().export(path)?;
        }

        for &source in sources {
            let paths = StagingPaths::new(self.output_dir(), source);
            let staged = read_staged::<RawEdge>(&paths.edges, |edge| {
                aggregator.add_edge(&edge);
            })?;
            stats.entry(source).or_default().edges_staged = staged;
        }

        Ok(aggregator.finish())
    }

    /// Stage, merge and write. Returns the run summary, which is also
    /// written to `merge_stats.json` in the output directory.
    pub fn run(&self) -> Result<MergeStats> {
        let dir = self.output_dir();
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let readers = configured_readers(&self.config)?;
        if readers.is_empty() {
            tracing::warn!("No sources configured; the merged graph will be empty");
        }

        let mut sources = BTreeMap::new();
        let mut order = Vec::with_capacity(readers.len());
        for reader in &readers {
            sources.insert(reader.source(), self.stage(reader.as_ref())?);
            order.push(reader.source());
        }

        let graph = self.merge_staged(&order, &mut sources)?;
        let files = output::write_graph(&graph, self.config.format, dir, &self.update_date)?;

        let stats = MergeStats {
            update_date: self.update_date.clone(),
            limit: self.config.record_limit(),
            format: self.config.format,
            sources,
            nodes: graph.nodes.len() as u64,
            edges: graph.edges.len() as u64,
            mapping_entries: graph.mapping.len(),
            counts: graph.counts,
            outputs: Some(files),
        };
        stats.write(&self.stats_path())?;

        tracing::info!(
            "Merged {} nodes and {} edges ({} edges dropped)",
            stats.nodes,
            stats.edges,
            stats.counts.edges_dropped
        );
        Ok(stats)
    }

    #[must_use]
    pub fn stats_path(&self) -> PathBuf {
        self.output_dir().join(STATS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::ingest::layout::IKraphFiles;
    use crate::ingest::reader::tests::{write_gz, write_plain};

    const SEMMEDDB_ENTITIES: &str = concat!(
        "\"E1\",\"C0011849\",\"1\",\"dsyn\",\"Diabetes Mellitus\",\"DM\",\"S\",\"1\",\"1\",\"1\"\n",
        "\"E2\",\"C0011849\",\"2\",\"dsyn\",\"Diabetes\",\"\",\"S\",\"1\",\"1\",\"1\"\n",
        "\"E3\",\"C0021641\",\"3\",\"aapp\",\"Insulin\",\"\",\"S\",\"1\",\"1\",\"1\"\n",
    );

    const SEMMEDDB_CONNECTIONS: &str = concat!(
        ":START_ID,:END_ID,:TYPE\n",
        "C0021641,C0011849,TREATS\n",
        "E3,E1,TREATS\n",
        "C0021641,C9999999,TREATS\n",
    );

    const PRIMEKG_NODES: &str = concat!(
        "node_index,node_id,node_type,node_name,node_source\n",
        "1,C0011849,disease,diabetes mellitus,MONDO\n",
        "2,INS,gene/protein,INS,NCBI\n",
    );

    const PRIMEKG_EDGES: &str = concat!(
        "relation,display_relation,x_index,y_index\n",
        "disease_protein,associated with,1,2\n",
        "disease_protein,associated with,1,5\n",
    );

    fn fixture(dir: &Path) -> MergeConfig {
        let data = dir.join("data");
        std::fs::create_dir_all(&data).unwrap();
        let ikraph = data.join("ikraph");
        std::fs::create_dir_all(&ikraph).unwrap();

        let mut config = MergeConfig {
            output_dir: dir.join("out"),
            ..MergeConfig::default()
        };
        let entities = write_gz(&data, "entity.csv.gz", SEMMEDDB_ENTITIES.as_bytes());
        let connections = write_plain(&data, "connections.csv", SEMMEDDB_CONNECTIONS.as_bytes());
        config.semmeddb.entities = Some(entities);
        config.semmeddb.connections = Some(connections);
        config.primekg.nodes = Some(write_plain(&data, "nodes.csv", PRIMEKG_NODES.as_bytes()));
        config.primekg.edges = Some(write_plain(&data, "kg.csv", PRIMEKG_EDGES.as_bytes()));

        write_gz(
            &ikraph,
            "nodes_gene.csv.gz",
            b"biokdeid:ID,official_name,common_name\n3630,INS,insulin\n",
        );
        write_gz(
            &ikraph,
            "rels.csv.gz",
            b":START_ID,:END_ID,relationship_type,probability\n3630,3630,1,0.4\n",
        );
        config.ikraph.dir = Some(ikraph);
        config.ikraph.files = IKraphFiles {
            nodes: vec!["nodes_gene.csv.gz".into(), "nodes_missing.csv.gz".into()],
            relationships: vec!["rels.csv.gz".into()],
        };
        config
    }

    #[test]
    fn test_full_run() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path());
        let stats = MergePipeline::new(config)
            .with_update_date("2024-01-01 00:00:00")
            .run()
            .unwrap();

        // E1 and E2 share a CUI and collapse into one node.
        let semmeddb = stats.sources[&SourceKind::SemMedDb];
        assert_eq!(semmeddb.nodes_read.records, 3);
        assert_eq!(semmeddb.edges_read.records, 3);
        assert_eq!(stats.sources[&SourceKind::IKraph].nodes_read.missing_files, 1);

        // UMLS:C0011849, UMLS:C0021641, PRIMEKG:C0011849, PRIMEKG:INS,
        // IKRAPH:3630 and three source nodes.
        assert_eq!(stats.nodes, 8);

        // Both SemMedDB TREATS lines land on one key; one endpoint is unknown,
        // and PrimeKG index 5 is absent.
        assert_eq!(stats.counts.edges_dropped, 2);
        assert_eq!(stats.edges, 3);

        let out = dir.path().join("out");
        let edges = std::fs::read_to_string(out.join("kg_edges.jsonl")).unwrap();
        let treats: serde_json::Value = edges
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
            .find(|e| e["relation_label"] == "TREATS")
            .unwrap();
        assert_eq!(treats["subject"], "UMLS:C0021641");
        assert_eq!(treats["object"], "UMLS:C0011849");
        assert_eq!(treats["frequency"], 2);

        assert!(out.join("semmeddb_nodes.jsonl").exists());
        assert!(out.join("ikraph_edges.jsonl").exists());
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(STATS_FILE)).unwrap()).unwrap();
        assert_eq!(written["nodes"], 8);
        assert_eq!(written["sources"]["PrimeKG"]["edges_read"]["records"], 2);
    }

    #[test]
    fn test_missing_source_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut config = fixture(dir.path());
        config.primekg.nodes = Some(dir.path().join("nope.csv"));
        config.source_nodes = false;

        let stats = MergePipeline::new(config).run().unwrap();
        assert_eq!(stats.sources[&SourceKind::PrimeKg].nodes_read.missing_files, 1);
        // Every PrimeKG edge now dangles.
        assert!(stats.counts.edges_dropped >= 2);
        assert_eq!(stats.nodes, 3);
    }

    #[test]
    fn test_limit_caps_each_stream() {
        let dir = TempDir::new().unwrap();
        let mut config = fixture(dir.path());
        config.limit = Some(1);

        let stats = MergePipeline::new(config).run().unwrap();
        for source in stats.sources.values() {
            assert!(source.nodes_read.records <= 1);
            assert!(source.edges_read.records <= 1);
        }
        assert_eq!(stats.limit, Some(1));
    }

    #[test]
    fn test_mapping_export_and_neo4j_output() {
        let dir = TempDir::new().unwrap();
        let mut config = fixture(dir.path());
        config.format = OutputFormat::Neo4j;
        config.mapping_out = Some(dir.path().join("mapping.json"));

        let stats = MergePipeline::new(config).run().unwrap();
        let files = stats.outputs.unwrap();
        assert!(files.nodes.ends_with("nodes_neo4j.csv"));

        let mapping: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("mapping.json")).unwrap())
                .unwrap();
        assert_eq!(mapping["final_mapping"]["UMLS:C0011849"], "UMLS:C0011849");
        assert_eq!(mapping["final_mapping"]["E2"], "UMLS:C0011849");
    }

    #[test]
    fn test_direct_streaming_helpers() {
        let dir = TempDir::new().unwrap();
        let config = fixture(dir.path());
        let primekg = PrimeKgReader::new(config.primekg.nodes, config.primekg.edges);

        let mut merger = GraphMerger::new();
        let read = merge_nodes_from(&mut merger, &primekg, None).unwrap();
        assert_eq!(read.records, 2);

        let mut aggregator = merger.finish_nodes();
        let missing = PrimeKgReader::new(None, Some(dir.path().join("gone.csv")));
        assert_eq!(merge_edges_from(&mut aggregator, &missing, None).unwrap().missing_files, 1);

        merge_edges_from(&mut aggregator, &primekg, None).unwrap();
        assert_eq!(aggregator.finish().edges.len(), 1);
    }
}
