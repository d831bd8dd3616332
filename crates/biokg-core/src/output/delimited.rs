use std::path::Path;

use super::kg::{KgEdge, KgNode, EDGE_FIELDS, NODE_FIELDS};
use crate::edge::EdgeRecord;
use crate::error::{Error, Result};
use crate::node::NodeRecord;

fn write_table<T>(
    path: &Path,
    header: &[&str],
    records: &[T],
    row: impl Fn(&T) -> Vec<String>,
) -> Result<u64> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(records.len() as u64)
}

/// Flat CSV with the KG node fields; list fields joined with `|`.
pub fn write_nodes(path: &Path, nodes: &[NodeRecord], update_date: &str) -> Result<u64> {
    write_table(path, &NODE_FIELDS, nodes, |n| KgNode::new(n, update_date).to_row())
}

pub fn write_edges(path: &Path, edges: &[EdgeRecord], update_date: &str) -> Result<u64> {
    write_table(path, &EDGE_FIELDS, edges, |e| KgEdge::new(e, update_date).to_row())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::edge::{EdgeKey, RawEdge};
    use crate::source::SourceKind;

    #[test]
    fn test_edges_csv_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edges.csv");
        let raw = RawEdge::new("a", "b", "binds, weakly", SourceKind::BioKde);
        let key = EdgeKey::new("X:1", "X:2", "binds, weakly");
        let edges = vec![EdgeRecord::from_raw(key, &raw)];

        write_edges(&path, &edges, "2024-01-01 00:00:00").unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(String::from)
            .collect();
        assert_eq!(header, EDGE_FIELDS);
        let rows: Vec<csv::StringRecord> = reader
            .records()
            .map(std::result::Result::unwrap)
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][2], "binds, weakly");
        assert_eq!(&rows[0][14], "BINDS");
    }
}
