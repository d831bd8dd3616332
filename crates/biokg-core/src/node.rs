use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::source::SourceKind;
use crate::vocab::{Category, NodeLabel};

/// A node as produced by a source reader, before identifier normalization.
///
/// `keys` holds extra identifier spellings (entity ids, node indices, URLs)
/// that edges of the same source may use to refer to this node. `synonyms`
/// are display names only and never take part in identifier lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    pub source: SourceKind,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub iri: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub semantic_type: String,
    /// Upstream vocabulary a PrimeKG node was taken from (`NCBI`, `MONDO`...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl RawNode {
    #[must_use]
    pub fn new(id: impl Into<String>, source: SourceKind) -> Self {
        Self {
            id: id.into(),
            source,
            name: String::new(),
            node_type: String::new(),
            category: Category::NamedThing,
            iri: String::new(),
            description: String::new(),
            keys: Vec::new(),
            synonyms: Vec::new(),
            semantic_type: String::new(),
            node_source: String::new(),
            frequency: None,
            score: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, node_type: impl Into<String>, category: Category) -> Self {
        self.node_type = node_type.into();
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_iri(mut self, iri: impl Into<String>) -> Self {
        self.iri = iri.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.is_empty() && !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    #[must_use]
    pub fn with_synonyms(mut self, synonyms: Vec<String>) -> Self {
        self.synonyms = synonyms;
        self
    }

    #[must_use]
    pub fn with_semantic_type(mut self, semantic_type: impl Into<String>) -> Self {
        self.semantic_type = semantic_type.into();
        self
    }

    #[must_use]
    pub fn with_node_source(mut self, node_source: impl Into<String>) -> Self {
        self.node_source = node_source.into();
        self
    }

    /// SemMedDB mention frequency and concept score.
    #[must_use]
    pub const fn with_counts(mut self, frequency: Option<u64>, score: Option<f64>) -> Self {
        self.frequency = frequency;
        self.score = score;
        self
    }
}

/// A deduplicated node in the merged graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub category: Category,
    pub iri: String,
    pub description: String,
    pub synonyms: Vec<String>,
    pub sources: BTreeSet<SourceKind>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_source_node: bool,
}

impl NodeRecord {
    #[must_use]
    pub fn from_raw(canonical_id: impl Into<String>, raw: &RawNode) -> Self {
        let mut record = Self {
            id: canonical_id.into(),
            name: raw.name.clone(),
            node_type: raw.node_type.clone(),
            category: raw.category,
            iri: raw.iri.clone(),
            description: raw.description.clone(),
            synonyms: Vec::new(),
            sources: BTreeSet::from([raw.source]),
            node_source: raw.node_source.clone(),
            frequency: raw.frequency,
            score: raw.score,
            is_source_node: false,
        };
        record.add_synonyms(&raw.synonyms);
        record
    }

    /// Information-resource node describing one upstream source.
    #[must_use]
    pub fn source_node(source: SourceKind) -> Self {
        Self {
            id: source.provided_by(),
            name: source.full_name().to_string(),
            node_type: "source".to_string(),
            category: Category::RetrievalSource,
            iri: source.base_iri().to_string(),
            description: format!("{} knowledge source", source.as_str()),
            synonyms: vec![source.as_str().to_string()],
            sources: BTreeSet::from([source]),
            node_source: String::new(),
            frequency: None,
            score: None,
            is_source_node: true,
        }
    }

    /// Fold a later record for the same canonical id into this one.
    ///
    /// Content fields are first-writer-wins; only empty fields are filled.
    pub fn merge(&mut self, raw: &RawNode) {
        fill_if_empty(&mut self.name, &raw.name);
        fill_if_empty(&mut self.node_type, &raw.node_type);
        fill_if_empty(&mut self.iri, &raw.iri);
        fill_if_empty(&mut self.description, &raw.description);
        fill_if_empty(&mut self.node_source, &raw.node_source);
        self.frequency = self.frequency.or(raw.frequency);
        self.score = self.score.or(raw.score);
        if !self.category.is_specific() && raw.category.is_specific() {
            self.category = raw.category;
        }
        self.add_synonyms(&raw.synonyms);
        self.sources.insert(raw.source);
    }

    fn add_synonyms(&mut self, synonyms: &[String]) {
        for synonym in synonyms {
            let synonym = synonym.trim();
            if synonym.is_empty() || synonym == self.name {
                continue;
            }
            if !self.synonyms.iter().any(|s| s == synonym) {
                self.synonyms.push(synonym.to_string());
            }
        }
    }

    #[must_use]
    pub fn provided_by(&self) -> Vec<String> {
        self.sources.iter().map(SourceKind::provided_by).collect()
    }

    /// Graph-database labels: the type label, one per source, then
    /// `MergedNode` for nodes seen in more than one source.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        let mut labels = vec![NodeLabel::for_type(&self.node_type).as_str().to_string()];
        labels.extend(self.sources.iter().map(|s| s.as_str().to_string()));
        if self.sources.len() > 1 {
            labels.push("MergedNode".to_string());
        }
        labels
    }
}

fn fill_if_empty(field: &mut String, value: &str) {
    if field.is_empty() && !value.is_empty() {
        value.clone_into(field);
    }
}
