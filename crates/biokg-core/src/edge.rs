use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::source::SourceKind;
use crate::vocab::RelationCategory;

/// An edge as produced by a source reader. Endpoints are raw source
/// identifiers and must be resolved before aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub subject: String,
    pub object: String,
    pub relation: String,
    pub source: SourceKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Upstream count, kept for reference only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl RawEdge {
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        relation: impl Into<String>,
        source: SourceKind,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            relation: relation.into(),
            source,
            label: String::new(),
            frequency: None,
            probability: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub const fn with_frequency(mut self, frequency: u64) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub const fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    /// Human-readable label, falling back to the relation itself.
    #[must_use]
    pub fn relation_label(&self) -> &str {
        if self.label.is_empty() {
            &self.relation
        } else {
            &self.label
        }
    }

    #[must_use]
    pub fn source_predicate(&self) -> String {
        match self.source {
            SourceKind::IKraph => format!("IKRAPH:RELATION_{}", self.relation),
            other => format!("{}:{}", other.curie_prefix(), self.relation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub subject: String,
    pub object: String,
    pub relation: String,
}

impl EdgeKey {
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            relation: relation.into(),
        }
    }
}

/// An aggregated edge in the merged graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub subject: String,
    pub object: String,
    pub relation: String,
    pub relation_label: String,
    pub source_predicate: String,
    pub primary_knowledge_source: String,
    pub sources: BTreeSet<SourceKind>,
    pub frequency: u64,
    pub probability: Option<f64>,
}

impl EdgeRecord {
    #[must_use]
    pub fn from_raw(key: EdgeKey, raw: &RawEdge) -> Self {
        Self {
            subject: key.subject,
            object: key.object,
            relation: key.relation,
            relation_label: raw.relation_label().to_string(),
            source_predicate: raw.source_predicate(),
            primary_knowledge_source: raw.source.provided_by(),
            sources: BTreeSet::from([raw.source]),
            frequency: 1,
            probability: raw.probability,
        }
    }

    /// Count another occurrence of this key.
    pub fn absorb(&mut self, raw: &RawEdge) {
        self.frequency += 1;
        self.sources.insert(raw.source);
        self.probability = match (self.probability, raw.probability) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    #[must_use]
    pub fn category(&self) -> RelationCategory {
        RelationCategory::classify(&self.relation)
    }

    /// Stable identifier in the KGX-style dashed form.
    #[must_use]
    pub fn id(&self) -> String {
        format!(
            "{}---{}---None---None---None---{}---{}",
            self.subject, self.source_predicate, self.object, self.primary_knowledge_source
        )
    }
}
