//! Bulk-import CSV in the `neo4j-admin database import` header convention.

use std::path::Path;

use crate::edge::EdgeRecord;
use crate::error::{Error, Result};
use crate::node::NodeRecord;

pub const ARRAY_DELIMITER: &str = ";";

pub const NODE_HEADER: [&str; 9] = [
    ":ID",
    "name",
    "type",
    "category",
    "sources:string[]",
    ":LABEL",
    "node_source",
    "frequency:long",
    "score:double",
];

pub const EDGE_HEADER: [&str; 10] = [
    ":START_ID",
    ":END_ID",
    ":TYPE",
    "relation_label",
    "source_predicate",
    "sources:string[]",
    "frequency",
    "update_date",
    "id",
    "probability",
];

fn sources(set: &std::collections::BTreeSet<crate::source::SourceKind>) -> String {
    set.iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(ARRAY_DELIMITER)
}

#[must_use]
pub fn node_row(node: &NodeRecord) -> [String; 9] {
    [
        node.id.clone(),
        node.name.clone(),
        node.node_type.clone(),
        node.category.curie().to_string(),
        sources(&node.sources),
        node.labels().join(ARRAY_DELIMITER),
        node.node_source.clone(),
        node.frequency.map(|f| f.to_string()).unwrap_or_default(),
        node.score.map(|s| s.to_string()).unwrap_or_default(),
    ]
}

#[must_use]
pub fn edge_row(edge: &EdgeRecord, update_date: &str) -> [String; 10] {
    [
        edge.subject.clone(),
        edge.object.clone(),
        edge.category().as_str().to_string(),
        edge.relation_label.clone(),
        edge.source_predicate.clone(),
        sources(&edge.sources),
        edge.frequency.to_string(),
        update_date.to_string(),
        edge.id(),
        edge.probability.map(|p| p.to_string()).unwrap_or_default(),
    ]
}

pub fn write_nodes(path: &Path, nodes: &[NodeRecord]) -> Result<u64> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(NODE_HEADER)?;
    for node in nodes {
        writer.write_record(node_row(node))?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(nodes.len() as u64)
}

pub fn write_edges(path: &Path, edges: &[EdgeRecord], update_date: &str) -> Result<u64> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(EDGE_HEADER)?;
    for edge in edges {
        writer.write_record(edge_row(edge, update_date))?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(edges.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{EdgeKey, RawEdge};
    use crate::node::RawNode;
    use crate::source::SourceKind;
    use crate::vocab::Category;

    #[test]
    fn test_node_row_labels_and_sources() {
        let mut node = NodeRecord::from_raw(
            "X:1",
            &RawNode::new("X:1", SourceKind::IKraph).with_type("Disease", Category::Disease),
        );
        node.merge(&RawNode::new("X:1", SourceKind::SemMedDb));

        let row = node_row(&node);
        assert_eq!(row[4], "SemMedDB;iKraph");
        assert_eq!(row[5], "Disease;SemMedDB;iKraph;MergedNode");
        assert_eq!(row.len(), NODE_HEADER.len());
        assert_eq!(row[7], "");
    }

    #[test]
    fn test_edge_row_type_column() {
        let raw = RawEdge::new("a", "b", "drug_protein", SourceKind::PrimeKg)
            .with_label("target");
        let edge = EdgeRecord::from_raw(EdgeKey::new("P:1", "P:2", "drug_protein"), &raw);

        let row = edge_row(&edge, "2024-01-01 00:00:00");
        assert_eq!(row[2], "PROTEIN_INTERACTION");
        assert_eq!(row[3], "target");
        assert_eq!(row[4], "PRIMEKG:drug_protein");
        assert_eq!(row[6], "1");
        assert_eq!(row[9], "");
    }
}
