use std::path::{Path, PathBuf};

use super::reader::{CsvRows, Header};
use super::stream::{Quota, ReadStats, SourceReader};
use crate::edge::RawEdge;
use crate::error::Result;
use crate::node::RawNode;
use crate::source::SourceKind;
use crate::vocab::Category;

/// Reads PrimeKG `nodes.csv` and `kg.csv`/`edges.csv`.
///
/// Edges refer to nodes by `node_index`, so each node registers its index
/// under [`index_key`] next to its `node_id`.
#[derive(Debug, Clone)]
pub struct PrimeKgReader {
    nodes: Option<PathBuf>,
    edges: Option<PathBuf>,
}

impl PrimeKgReader {
    #[must_use]
    pub const fn new(nodes: Option<PathBuf>, edges: Option<PathBuf>) -> Self {
        Self { nodes, edges }
    }
}

/// Key for a PrimeKG `node_index`. Indices and numeric `node_id`s overlap,
/// so an index never appears bare.
#[must_use]
pub fn index_key(index: &str) -> String {
    format!("PRIMEKG:index:{index}")
}

#[must_use]
pub fn node_from_row(header: &Header, row: &[String]) -> Option<RawNode> {
    let node_id = header.get(row, "node_id")?;
    let node_type = header.get(row, "node_type").unwrap_or_default();

    let mut node = RawNode::new(format!("PRIMEKG:{node_id}"), SourceKind::PrimeKg)
        .with_name(header.get(row, "node_name").unwrap_or_default())
        .with_type(node_type, Category::from_primekg_type(node_type))
        .with_iri(format!("{}node/{node_id}", SourceKind::PrimeKg.base_iri()))
        .with_node_source(header.get(row, "node_source").unwrap_or_default());
    if let Some(index) = header.get(row, "node_index") {
        node = node.with_key(index_key(index));
    }
    Some(node)
}

#[must_use]
pub fn edge_from_row(header: &Header, row: &[String]) -> Option<RawEdge> {
    let relation = header.get(row, "relation")?;
    let subject = index_key(header.get(row, "x_index")?);
    let object = index_key(header.get(row, "y_index")?);

    let mut edge = RawEdge::new(subject, object, relation, SourceKind::PrimeKg);
    if let Some(display) = header.get(row, "display_relation") {
        edge = edge.with_label(display);
    }
    Some(edge)
}

fn read_rows<T>(
    path: &Path,
    limit: Option<u64>,
    what: &str,
    parse: fn(&Header, &[String]) -> Option<T>,
    sink: &mut dyn FnMut(T) -> Result<()>,
) -> Result<ReadStats> {
    tracing::info!("Loading PrimeKG {} from {}", what, path.display());

    let mut stats = ReadStats::default();
    let mut quota = Quota::new(limit);
    let mut rows = CsvRows::with_header(path)?;
    let header = rows.header().cloned().unwrap_or_default();

    for row in rows.by_ref() {
        if quota.is_exhausted() {
            break;
        }
        let row = row?;
        match parse(&header, &row) {
            Some(record) => {
                sink(record)?;
                quota.consume();
                stats.accepted(SourceKind::PrimeKg, what);
            }
            None => stats.reject(SourceKind::PrimeKg, &row.join(",")),
        }
    }
    stats.malformed += rows.rejected();
    stats.decode = rows.decode_stats();
    tracing::info!("Loaded {} PrimeKG {}", stats.records, what);
    Ok(stats)
}

impl SourceReader for PrimeKgReader {
    fn source(&self) -> SourceKind {
        SourceKind::PrimeKg
    }

    fn read_nodes(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawNode) -> Result<()>,
    ) -> Result<ReadStats> {
        match &self.nodes {
            Some(path) => read_rows(path, limit, "nodes", node_from_row, sink),
            None => Ok(ReadStats::default()),
        }
    }

    fn read_edges(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawEdge) -> Result<()>,
    ) -> Result<ReadStats> {
        match &self.edges {
            Some(path) => read_rows(path, limit, "edges", edge_from_row, sink),
            None => Ok(ReadStats::default()),
        }
    }
}
