//! KG2-style node and edge shapes shared by the JSON-Lines and CSV writers.

use serde::Serialize;

use crate::edge::EdgeRecord;
use crate::node::NodeRecord;

pub const NODE_FIELDS: [&str; 12] = [
    "id",
    "iri",
    "name",
    "category",
    "category_label",
    "description",
    "provided_by",
    "synonym",
    "update_date",
    "node_source",
    "frequency",
    "score",
];

pub const EDGE_FIELDS: [&str; 17] = [
    "subject",
    "object",
    "relation_label",
    "source_predicate",
    "predicate",
    "qualified_predicate",
    "qualified_object_aspect",
    "qualified_object_direction",
    "negated",
    "publications",
    "update_date",
    "primary_knowledge_source",
    "frequency",
    "sources",
    "relation_type",
    "id",
    "probability",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KgNode<'a> {
    pub id: &'a str,
    pub iri: &'a str,
    pub name: &'a str,
    pub category: &'static str,
    pub category_label: &'static str,
    pub description: &'a str,
    pub provided_by: Vec<String>,
    pub synonym: &'a [String],
    pub update_date: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub node_source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl<'a> KgNode<'a> {
    #[must_use]
    pub fn new(node: &'a NodeRecord, update_date: &'a str) -> Self {
        Self {
            id: &node.id,
            iri: &node.iri,
            name: &node.name,
            category: node.category.curie(),
            category_label: node.category.label(),
            description: &node.description,
            provided_by: node.provided_by(),
            synonym: &node.synonyms,
            update_date,
            node_source: &node.node_source,
            frequency: node.frequency,
            score: node.score,
        }
    }

    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.iri.to_string(),
            self.name.to_string(),
            self.category.to_string(),
            self.category_label.to_string(),
            self.description.to_string(),
            self.provided_by.join(LIST_DELIMITER),
            self.synonym.join(LIST_DELIMITER),
            self.update_date.to_string(),
            self.node_source.to_string(),
            self.frequency.map(|f| f.to_string()).unwrap_or_default(),
            self.score.map(|s| s.to_string()).unwrap_or_default(),
        ]
    }
}

/// Delimiter for list-valued fields in flat CSV.
pub const LIST_DELIMITER: &str = "|";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KgEdge<'a> {
    pub subject: &'a str,
    pub object: &'a str,
    pub relation_label: &'a str,
    pub source_predicate: &'a str,
    pub predicate: Option<&'a str>,
    pub qualified_predicate: Option<&'a str>,
    pub qualified_object_aspect: Option<&'a str>,
    pub qualified_object_direction: Option<&'a str>,
    pub negated: bool,
    pub publications: Vec<String>,
    pub update_date: &'a str,
    pub primary_knowledge_source: &'a str,
    pub frequency: u64,
    pub sources: Vec<&'static str>,
    pub relation_type: &'static str,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl<'a> KgEdge<'a> {
    #[must_use]
    pub fn new(edge: &'a EdgeRecord, update_date: &'a str) -> Self {
        Self {
            subject: &edge.subject,
            object: &edge.object,
            relation_label: &edge.relation_label,
            source_predicate: &edge.source_predicate,
            predicate: None,
            qualified_predicate: None,
            qualified_object_aspect: None,
            qualified_object_direction: None,
            negated: false,
            publications: Vec::new(),
            update_date,
            primary_knowledge_source: &edge.primary_knowledge_source,
            frequency: edge.frequency,
            sources: edge.sources.iter().map(|s| s.as_str()).collect(),
            relation_type: edge.category().as_str(),
            id: edge.id(),
            probability: edge.probability,
        }
    }

    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        let optional = |v: Option<&str>| v.unwrap_or_default().to_string();
        vec![
            self.subject.to_string(),
            self.object.to_string(),
            self.relation_label.to_string(),
            self.source_predicate.to_string(),
            optional(self.predicate),
            optional(self.qualified_predicate),
            optional(self.qualified_object_aspect),
            optional(self.qualified_object_direction),
            self.negated.to_string(),
            self.publications.join(LIST_DELIMITER),
            self.update_date.to_string(),
            self.primary_knowledge_source.to_string(),
            self.frequency.to_string(),
            self.sources.join(LIST_DELIMITER),
            self.relation_type.to_string(),
            self.id.clone(),
            self.probability.map(|p| p.to_string()).unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{EdgeKey, RawEdge};
    use crate::node::RawNode;
    use crate::source::SourceKind;
    use crate::vocab::Category;

    #[test]
    fn test_node_row_matches_header() {
        let mut record = NodeRecord::from_raw(
            "UMLS:C1",
            &RawNode::new("UMLS:C1", SourceKind::SemMedDb)
                .with_name("aspirin")
                .with_type("phsu", Category::Drug)
                .with_synonyms(vec!["ASA".into(), "acetylsalicylic acid".into()])
                .with_counts(Some(12), None),
        );
        record.merge(&RawNode::new("UMLS:C1", SourceKind::PrimeKg).with_node_source("DrugBank"));

        let node = KgNode::new(&record, "2024-01-01 00:00:00");
        let row = node.to_row();
        assert_eq!(row.len(), NODE_FIELDS.len());
        assert_eq!(row[3], "biolink:Drug");
        assert_eq!(row[4], "drug");
        assert_eq!(row[6], "PRIMEKG:|SEMMEDDB:");
        assert_eq!(row[7], "ASA|acetylsalicylic acid");
        assert_eq!(&row[9..], ["DrugBank", "12", ""]);

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["node_source"], "DrugBank");
        assert_eq!(json["frequency"], 12);
        assert!(json.get("score").is_none());
    }

    #[test]
    fn test_edge_json_shape() {
        let raw = RawEdge::new("C1", "C2", "TREATS", SourceKind::SemMedDb);
        let record = EdgeRecord::from_raw(EdgeKey::new("UMLS:C1", "UMLS:C2", "TREATS"), &raw);
        let edge = KgEdge::new(&record, "2024-01-01 00:00:00");

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["predicate"], serde_json::Value::Null);
        assert_eq!(json["negated"], false);
        assert_eq!(json["frequency"], 1);
        assert_eq!(json["relation_type"], "TREATS");
        assert!(json.get("probability").is_none());
        assert_eq!(edge.to_row().len(), EDGE_FIELDS.len());
    }
}
