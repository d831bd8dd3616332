//! Demo extracts: the first nodes of each source plus the edges that stay
//! inside that selection.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use super::merger::{GraphMerger, NodeTable};
use super::pipeline::{merge_nodes_from, tolerate_missing};
use super::stream::SourceReader;
use crate::edge::EdgeRecord;
use crate::error::{Error, Result};
use crate::node::NodeRecord;
use crate::output::{self, OutputFiles, OutputFormat};
use crate::source::SourceKind;

pub const SUBSET_STATS_FILE: &str = "subset_stats.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubsetLimits {
    pub nodes_per_source: u64,
    /// Ceiling on kept edges per source; `None` keeps every connecting edge.
    pub edges_per_source: Option<u64>,
}

impl Default for SubsetLimits {
    fn default() -> Self {
        Self {
            nodes_per_source: 1000,
            edges_per_source: Some(2000),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubsetCounts {
    pub nodes: u64,
    pub edges: u64,
    pub edges_read: u64,
    /// Edges with an endpoint outside the selected nodes.
    pub edges_outside: u64,
    pub edges_over_cap: u64,
    pub missing_files: u64,
}

/// One source's share of a subset. Nodes are deduplicated within the
/// source only.
#[derive(Debug, Clone)]
pub struct SourceSubset {
    pub source: SourceKind,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub counts: SubsetCounts,
}

impl SourceSubset {
    pub fn sample(reader: &dyn SourceReader, limits: SubsetLimits) -> Result<Self> {
        let source = reader.source();
        let mut merger = GraphMerger::new();
        let nodes_read = tolerate_missing(
            source,
            merge_nodes_from(&mut merger, reader, Some(limits.nodes_per_source)),
        )?;

        let mut aggregator = merger.finish_nodes();
        let mut over_cap = 0;
        let edges_read = tolerate_missing(
            source,
            reader.read_edges(None, &mut |edge| {
                let full = limits
                    .edges_per_source
                    .is_some_and(|cap| aggregator.edges().len() as u64 >= cap);
                if full {
                    over_cap += 1;
                } else {
                    aggregator.add_edge(&edge);
                }
                Ok(())
            }),
        )?;
        let graph = aggregator.finish();

        let counts = SubsetCounts {
            nodes: graph.nodes.len() as u64,
            edges: graph.edges.len() as u64,
            edges_read: edges_read.records,
            edges_outside: graph.counts.edges_dropped,
            edges_over_cap: over_cap,
            missing_files: nodes_read.missing_files + edges_read.missing_files,
        };
        tracing::info!(
            "{}: {} nodes and {} edges selected",
            source,
            counts.nodes,
            counts.edges
        );
        Ok(Self {
            source,
            nodes: graph.nodes,
            edges: graph.edges,
            counts,
        })
    }
}

/// Written next to the extract as `subset_stats.json`.
#[derive(Debug, Clone, Serialize)]
pub struct SubsetReport {
    pub update_date: String,
    pub format: OutputFormat,
    pub limits: SubsetLimits,
    pub sources: BTreeMap<SourceKind, SubsetCounts>,
    pub outputs: Vec<OutputFiles>,
}

impl SubsetReport {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))
    }

    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.sources.values().map(|c| c.nodes).sum()
    }

    #[must_use]
    pub fn edges(&self) -> u64 {
        self.sources.values().map(|c| c.edges).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Subset {
    pub limits: SubsetLimits,
    pub parts: Vec<SourceSubset>,
}

impl Subset {
    pub fn extract(readers: &[Box<dyn SourceReader>], limits: SubsetLimits) -> Result<Self> {
        let parts = readers
            .iter()
            .map(|reader| SourceSubset::sample(reader.as_ref(), limits))
            .collect::<Result<_>>()?;
        Ok(Self { limits, parts })
    }

    /// All sources in one node and edge table. A node id seen in several
    /// sources is kept once, from the first of them.
    #[must_use]
    pub fn combined(&self) -> (Vec<NodeRecord>, Vec<EdgeRecord>) {
        let mut nodes = NodeTable::new();
        for node in self.parts.iter().flat_map(|p| &p.nodes) {
            nodes.insert(node.clone());
        }
        let edges = self
            .parts
            .iter()
            .flat_map(|p| p.edges.iter().cloned())
            .collect();
        (nodes.into_records(), edges)
    }

    /// Write the extract into `dir`, either as one combined graph or, with
    /// `split`, one subdirectory per source.
    pub fn write(
        &self,
        dir: &Path,
        format: OutputFormat,
        split: bool,
        update_date: &str,
    ) -> Result<SubsetReport> {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let outputs = if split {
            let mut outputs = Vec::with_capacity(self.parts.len());
            for part in &self.parts {
                let part_dir = dir.join(part.source.file_stem());
                std::fs::create_dir_all(&part_dir).map_err(|e| Error::io(&part_dir, e))?;
                outputs.push(output::write_tables(
                    &part.nodes,
                    &part.edges,
                    format,
                    &part_dir,
                    update_date,
                )?);
            }
            outputs
        } else {
            let (nodes, edges) = self.combined();
            vec![output::write_tables(&nodes, &edges, format, dir, update_date)?]
        };

        let report = SubsetReport {
            update_date: update_date.to_string(),
            format,
            limits: self.limits,
            sources: self.parts.iter().map(|p| (p.source, p.counts)).collect(),
            outputs,
        };
        report.write(&dir.join(SUBSET_STATS_FILE))?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::ingest::primekg::PrimeKgReader;
    use crate::ingest::reader::tests::write_plain;
    use crate::ingest::semmeddb::SemMedDbReader;

    const PRIMEKG_NODES: &str = concat!(
        "node_index,node_id,node_type,node_name,node_source\n",
        "0,9796,gene/protein,PHYHIP,NCBI\n",
        "1,7918,gene/protein,GPANK1,NCBI\n",
        "2,MONDO_5015,disease,diabetes mellitus,MONDO\n",
    );

    const PRIMEKG_EDGES: &str = concat!(
        "relation,display_relation,x_index,y_index\n",
        "protein_protein,ppi,0,1\n",
        "protein_protein,ppi,1,0\n",
        "disease_protein,associated with,2,0\n",
    );

    fn primekg(dir: &Path) -> PrimeKgReader {
        PrimeKgReader::new(
            Some(write_plain(dir, "nodes.csv", PRIMEKG_NODES.as_bytes())),
            Some(write_plain(dir, "kg.csv", PRIMEKG_EDGES.as_bytes())),
        )
    }

    #[test]
    fn test_edges_stay_inside_selected_nodes() {
        let dir = TempDir::new().unwrap();
        let limits = SubsetLimits {
            nodes_per_source: 2,
            edges_per_source: None,
        };

        let part = SourceSubset::sample(&primekg(dir.path()), limits).unwrap();

        assert_eq!(part.counts.nodes, 2);
        assert_eq!(part.counts.edges, 2);
        assert_eq!(part.counts.edges_read, 3);
        assert_eq!(part.counts.edges_outside, 1);
        let ids: Vec<&str> = part.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(part
            .edges
            .iter()
            .all(|e| ids.contains(&e.subject.as_str()) && ids.contains(&e.object.as_str())));
    }

    #[test]
    fn test_edge_cap() {
        let dir = TempDir::new().unwrap();
        let limits = SubsetLimits {
            nodes_per_source: 10,
            edges_per_source: Some(1),
        };

        let part = SourceSubset::sample(&primekg(dir.path()), limits).unwrap();

        assert_eq!(part.counts.nodes, 3);
        assert_eq!(part.counts.edges, 1);
        assert_eq!(part.counts.edges_over_cap, 2);
    }

    #[test]
    fn test_missing_source_files_are_counted() {
        let dir = TempDir::new().unwrap();
        let reader = SemMedDbReader::new(
            Some(dir.path().join("entity.gz")),
            Some(dir.path().join("connections.csv")),
        );

        let part = SourceSubset::sample(&reader, SubsetLimits::default()).unwrap();
        assert_eq!(part.counts.missing_files, 2);
        assert!(part.nodes.is_empty());
    }

    #[test]
    fn test_write_combined_and_split() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        let semmeddb = SemMedDbReader::new(
            Some(write_plain(
                &data,
                "entity.csv",
                b"\"E1\",\"C0011849\",\"1\",\"dsyn\",\"Diabetes\",\"\",\"S\",\"3\",\"0.5\",\"1\"\n",
            )),
            None,
        );
        let readers: Vec<Box<dyn SourceReader>> =
            vec![Box::new(primekg(&data)), Box::new(semmeddb)];
        let subset = Subset::extract(&readers, SubsetLimits::default()).unwrap();

        let (nodes, edges) = subset.combined();
        assert_eq!(nodes.len(), 4);
        assert_eq!(edges.len(), 3);

        let out = dir.path().join("combined");
        let report = subset
            .write(&out, OutputFormat::Neo4j, false, "2024-01-01 00:00:00")
            .unwrap();
        assert_eq!(report.outputs.len(), 1);
        assert_eq!((report.nodes(), report.edges()), (4, 3));
        assert!(out.join("nodes_neo4j.csv").exists());
        assert!(out.join(SUBSET_STATS_FILE).exists());

        let out = dir.path().join("split");
        let report = subset
            .write(&out, OutputFormat::Jsonl, true, "2024-01-01 00:00:00")
            .unwrap();
        assert_eq!(report.outputs.len(), 2);
        assert!(out.join("primekg").join("kg_edges.jsonl").exists());
        let semmeddb_nodes =
            std::fs::read_to_string(out.join("semmeddb").join("kg_nodes.jsonl")).unwrap();
        let node: serde_json::Value = serde_json::from_str(semmeddb_nodes.trim()).unwrap();
        assert_eq!(node["id"], "UMLS:C0011849");
        assert_eq!(node["frequency"], 3);
    }
}
