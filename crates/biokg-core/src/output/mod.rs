pub mod delimited;
pub mod jsonl;
pub mod kg;
pub mod neo4j;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::edge::EdgeRecord;
use crate::error::Result;
use crate::ingest::MergedGraph;
use crate::node::NodeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Csv,
    Neo4j,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
            Self::Neo4j => "neo4j",
        }
    }

    /// Output file names inside the output directory.
    #[must_use]
    pub fn files(&self, dir: &Path) -> OutputFiles {
        let (nodes, edges) = match self {
            Self::Jsonl => ("kg_nodes.jsonl", "kg_edges.jsonl"),
            Self::Csv => ("kg_nodes.csv", "kg_edges.csv"),
            Self::Neo4j => ("nodes_neo4j.csv", "relationships_neo4j.csv"),
        };
        OutputFiles {
            nodes: dir.join(nodes),
            edges: dir.join(edges),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            "neo4j" => Ok(Self::Neo4j),
            _ => Err(crate::Error::InvalidFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFiles {
    pub nodes: PathBuf,
    pub edges: PathBuf,
}

/// One timestamp for every record of a run.
#[must_use]
pub fn update_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Write a merged graph in the given format; returns the paths written.
pub fn write_graph(
    graph: &MergedGraph,
    format: OutputFormat,
    dir: &Path,
    update_date: &str,
) -> Result<OutputFiles> {
    write_tables(&graph.nodes, &graph.edges, format, dir, update_date)
}

pub fn write_tables(
    nodes: &[NodeRecord],
    edges: &[EdgeRecord],
    format: OutputFormat,
    dir: &Path,
    update_date: &str,
) -> Result<OutputFiles> {
    let files = format.files(dir);
    let (written_nodes, written_edges) = match format {
        OutputFormat::Jsonl => (
            jsonl::write_nodes(&files.nodes, nodes, update_date)?,
            jsonl::write_edges(&files.edges, edges, update_date)?,
        ),
        OutputFormat::Csv => (
            delimited::write_nodes(&files.nodes, nodes, update_date)?,
            delimited::write_edges(&files.edges, edges, update_date)?,
        ),
        OutputFormat::Neo4j => (
            neo4j::write_nodes(&files.nodes, nodes)?,
            neo4j::write_edges(&files.edges, edges, update_date)?,
        ),
    };
    tracing::info!(
        "Wrote {} nodes to {} and {} edges to {}",
        written_nodes,
        files.nodes.display(),
        written_edges,
        files.edges.display()
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSONL".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("neo4j".parse::<OutputFormat>().unwrap(), OutputFormat::Neo4j);
        assert!("parquet".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_neo4j_file_names() {
        let files = OutputFormat::Neo4j.files(Path::new("out"));
        assert_eq!(files.nodes, Path::new("out/nodes_neo4j.csv"));
        assert_eq!(files.edges, Path::new("out/relationships_neo4j.csv"));
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = update_timestamp();
        assert_eq!(ts.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
