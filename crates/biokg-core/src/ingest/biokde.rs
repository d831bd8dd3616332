use std::path::PathBuf;

use super::layout::BioKdeColumns;
use super::reader::CsvRows;
use super::stream::{Quota, ReadStats, SourceReader};
use crate::edge::RawEdge;
use crate::error::Result;
use crate::node::RawNode;
use crate::source::SourceKind;
use crate::vocab::Category;

/// Reads BioKDE node and edge exports. Node ids are URLs whose fragment is
/// the local identifier.
#[derive(Debug, Clone)]
pub struct BioKdeReader {
    nodes: Option<PathBuf>,
    edges: Option<PathBuf>,
    columns: BioKdeColumns,
}

impl BioKdeReader {
    #[must_use]
    pub fn new(nodes: Option<PathBuf>, edges: Option<PathBuf>) -> Self {
        Self {
            nodes,
            edges,
            columns: BioKdeColumns::default(),
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: BioKdeColumns) -> Self {
        self.columns = columns;
        self
    }
}

/// Local identifier of a BioKDE URL: the part after the last `#`.
#[must_use]
pub fn url_fragment(url: &str) -> &str {
    url.rsplit_once('#').map_or(url, |(_, fragment)| fragment)
}

impl SourceReader for BioKdeReader {
    fn source(&self) -> SourceKind {
        SourceKind::BioKde
    }

    fn read_nodes(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawNode) -> Result<()>,
    ) -> Result<ReadStats> {
        let mut stats = ReadStats::default();
        let Some(path) = &self.nodes else {
            return Ok(stats);
        };
        tracing::info!("Loading BioKDE nodes from {}", path.display());

        let mut quota = Quota::new(limit);
        let mut rows = CsvRows::with_header(path)?;
        let header = rows.header().cloned().unwrap_or_default();

        for row in rows.by_ref() {
            if quota.is_exhausted() {
                break;
            }
            let row = row?;
            let Some(url) = header.get(&row, &self.columns.id) else {
                stats.reject(SourceKind::BioKde, &row.join(","));
                continue;
            };
            let fragment = url_fragment(url);
            let node_type = header.get(&row, &self.columns.node_type).unwrap_or_default();
            let node = RawNode::new(format!("BIOKDE:{fragment}"), SourceKind::BioKde)
                .with_name(header.get(&row, &self.columns.name).unwrap_or_default())
                .with_type(node_type, Category::from_type_keywords(node_type))
                .with_iri(url)
                .with_key(url)
                .with_key(fragment);

            sink(node)?;
            quota.consume();
            stats.accepted(SourceKind::BioKde, "nodes");
        }

        stats.malformed += rows.rejected();
        stats.decode = rows.decode_stats();
        tracing::info!("Loaded {} BioKDE nodes", stats.records);
        Ok(stats)
    }

    fn read_edges(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawEdge) -> Result<()>,
    ) -> Result<ReadStats> {
        let mut stats = ReadStats::default();
        let Some(path) = &self.edges else {
            return Ok(stats);
        };
        tracing::info!("Loading BioKDE edges from {}", path.display());

        let mut quota = Quota::new(limit);
        let mut rows = CsvRows::open(path)?.skip_header()?;

        for row in rows.by_ref() {
            if quota.is_exhausted() {
                break;
            }
            let row = row?;
            let fields: Vec<&str> = row.iter().map(|f| f.trim()).collect();
            if fields.len() < 3 || fields[..3].iter().any(|f| f.is_empty()) {
                stats.reject(SourceKind::BioKde, &row.join(","));
                continue;
            }

            sink(RawEdge::new(fields[0], fields[1], fields[2], SourceKind::BioKde))?;
            quota.consume();
            stats.accepted(SourceKind::BioKde, "edges");
        }

        stats.malformed += rows.rejected();
        stats.decode = rows.decode_stats();
        tracing::info!("Loaded {} BioKDE edges", stats.records);
        Ok(stats)
    }
}
