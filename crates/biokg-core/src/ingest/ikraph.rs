use std::path::{Path, PathBuf};

use super::layout::IKraphFiles;
use super::reader::{CsvRows, Header};
use super::stream::{Quota, ReadStats, SourceReader};
use crate::edge::RawEdge;
use crate::error::Result;
use crate::node::RawNode;
use crate::source::SourceKind;
use crate::vocab::Category;

/// Reads an iKraph dump directory: several per-type node files and one or
/// more relationship files, all header-named CSV.
#[derive(Debug, Clone)]
pub struct IKraphReader {
    dir: PathBuf,
    files: IKraphFiles,
}

impl IKraphReader {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: IKraphFiles::default(),
        }
    }

    #[must_use]
    pub fn with_files(mut self, files: IKraphFiles) -> Self {
        self.files = files;
        self
    }
}

/// Node type implied by a file name such as `nodes_biological process.csv.gz`.
fn type_from_file_name(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    stem.strip_prefix("nodes_").unwrap_or(stem).to_string()
}

#[must_use]
pub fn node_from_row(header: &Header, row: &[String], file_type: &str) -> Option<RawNode> {
    let raw_id = header.get(row, "biokdeid:ID")?;
    let name = header
        .get(row, "official_name")
        .or_else(|| header.get(row, "common_name"))
        .unwrap_or_default();
    let node_type = header.get(row, "type").unwrap_or(file_type);

    Some(
        RawNode::new(format!("IKRAPH:{raw_id}"), SourceKind::IKraph)
            .with_name(name)
            .with_type(node_type, Category::from_type_keywords(node_type))
            .with_iri(format!("{}node/{raw_id}", SourceKind::IKraph.base_iri()))
            .with_key(raw_id),
    )
}

#[must_use]
pub fn edge_from_row(header: &Header, row: &[String]) -> Option<RawEdge> {
    let subject = header.get(row, ":START_ID")?;
    let object = header.get(row, ":END_ID")?;
    let relation = header.get(row, "relationship_type")?;

    let mut edge = RawEdge::new(subject, object, relation, SourceKind::IKraph)
        .with_label(format!("relation_type_{relation}"));
    if let Some(probability) = header.get(row, "probability").and_then(|p| p.parse().ok()) {
        edge = edge.with_probability(probability);
    }
    Some(edge)
}

impl IKraphReader {
    fn for_each_row(
        &self,
        files: &[String],
        limit: Option<u64>,
        what: &str,
        on_row: &mut dyn FnMut(&Path, &Header, &[String]) -> Result<bool>,
    ) -> Result<ReadStats> {
        let mut stats = ReadStats::default();
        let mut quota = Quota::new(limit);

        for file in files {
            if quota.is_exhausted() {
                break;
            }
            let path = self.dir.join(file);
            if !path.exists() {
                tracing::warn!("Skipping missing iKraph file: {}", path.display());
                stats.missing_files += 1;
                continue;
            }
            tracing::info!("Loading iKraph {} from {}", what, path.display());

            let mut rows = CsvRows::with_header(&path)?;
            let header = rows.header().cloned().unwrap_or_default();
            for row in rows.by_ref() {
                if quota.is_exhausted() {
                    break;
                }
                let row = row?;
                if on_row(&path, &header, &row)? {
                    quota.consume();
                    stats.accepted(SourceKind::IKraph, what);
                } else {
                    stats.reject(SourceKind::IKraph, &row.join(","));
                }
            }
            stats.malformed += rows.rejected();
            stats.decode.add(rows.decode_stats());
        }

        tracing::info!("Loaded {} iKraph {}", stats.records, what);
        Ok(stats)
    }
}

impl SourceReader for IKraphReader {
    fn source(&self) -> SourceKind {
        SourceKind::IKraph
    }

    fn read_nodes(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawNode) -> Result<()>,
    ) -> Result<ReadStats> {
        self.for_each_row(&self.files.nodes, limit, "nodes", &mut |path, header, row| {
            match node_from_row(header, row, &type_from_file_name(path)) {
                Some(node) => sink(node).map(|()| true),
                None => Ok(false),
            }
        })
    }

    fn read_edges(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawEdge) -> Result<()>,
    ) -> Result<ReadStats> {
        self.for_each_row(
            &self.files.relationships,
            limit,
            "relationships",
            &mut |_, header, row| match edge_from_row(header, row) {
                Some(edge) => sink(edge).map(|()| true),
                None => Ok(false),
            },
        )
    }
}
