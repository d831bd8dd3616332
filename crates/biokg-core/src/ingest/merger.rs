use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::normalizer::{IdentifierMapping, MappingBuilder, MatchRule};
use crate::edge::{EdgeKey, EdgeRecord, RawEdge};
use crate::node::{NodeRecord, RawNode};
use crate::source::SourceKind;

/// Merged nodes keyed by canonical id, in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    records: Vec<NodeRecord>,
    index: HashMap<String, usize>,
}

impl NodeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge; returns `true` when the canonical id was new.
    pub fn upsert(&mut self, canonical: &str, raw: &RawNode) -> bool {
        if let Some(&i) = self.index.get(canonical) {
            self.records[i].merge(raw);
            false
        } else {
            self.push(NodeRecord::from_raw(canonical, raw));
            true
        }
    }

    /// Insert a prebuilt record unless its id is already present.
    pub fn insert(&mut self, record: NodeRecord) -> bool {
        if self.index.contains_key(&record.id) {
            return false;
        }
        self.push(record);
        true
    }

    fn push(&mut self, record: NodeRecord) {
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<NodeRecord> {
        self.records
    }
}

/// Aggregated edges keyed by `(subject, object, relation)`.
#[derive(Debug, Clone, Default)]
pub struct EdgeTable {
    records: Vec<EdgeRecord>,
    index: HashMap<EdgeKey, usize>,
}

impl EdgeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence; returns `true` when the key was new.
    pub fn add(&mut self, key: EdgeKey, raw: &RawEdge) -> bool {
        if let Some(&i) = self.index.get(&key) {
            self.records[i].absorb(raw);
            false
        } else {
            self.index.insert(key.clone(), self.records.len());
            self.records.push(EdgeRecord::from_raw(key, raw));
            true
        }
    }

    #[must_use]
    pub fn get(&self, key: &EdgeKey) -> Option<&EdgeRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<EdgeRecord> {
        self.records
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    pub exact: u64,
    pub case_insensitive: u64,
    pub prefix_stripped: u64,
}

impl MatchCounts {
    fn record(&mut self, rule: MatchRule) {
        match rule {
            MatchRule::Exact => self.exact += 1,
            MatchRule::CaseInsensitive => self.case_insensitive += 1,
            MatchRule::PrefixStripped => self.prefix_stripped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeCounts {
    pub nodes_in: u64,
    pub nodes_unidentified: u64,
    pub nodes_merged: u64,
    pub edges_in: u64,
    pub edges_dropped: u64,
    pub edges_merged: u64,
    pub matches: MatchCounts,
}

/// Node phase of a merge. Nodes from every source must be added here
/// before [`GraphMerger::finish_nodes`] unlocks edge aggregation.
#[derive(Debug, Default)]
pub struct GraphMerger {
    mapping: MappingBuilder,
    nodes: NodeTable,
    counts: MergeCounts,
}

impl GraphMerger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mapping(mapping: MappingBuilder) -> Self {
        Self {
            mapping,
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, raw: &RawNode) {
        self.counts.nodes_in += 1;
        let Some(canonical) = self.mapping.register(raw) else {
            self.counts.nodes_unidentified += 1;
            tracing::debug!("Skipping node without identifier from {}", raw.source);
            return;
        };
        if !self.nodes.upsert(&canonical, raw) {
            self.counts.nodes_merged += 1;
        }
    }

    /// Add one information-resource node per source seen so far.
    pub fn add_source_nodes(&mut self) {
        let seen: Vec<SourceKind> = SourceKind::ALL
            .into_iter()
            .filter(|s| self.nodes.iter().any(|n| n.sources.contains(s)))
            .collect();
        for source in seen {
            self.nodes.insert(NodeRecord::source_node(source));
        }
    }

    #[must_use]
    pub const fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    #[must_use]
    pub fn finish_nodes(self) -> EdgeAggregator {
        tracing::info!("Node phase complete: {} merged nodes", self.nodes.len());
        EdgeAggregator {
            mapping: self.mapping.finish(),
            nodes: self.nodes,
            external: None,
            edges: EdgeTable::new(),
            counts: self.counts,
        }
    }
}

/// Edge phase of a merge, holding a frozen identifier mapping.
#[derive(Debug)]
pub struct EdgeAggregator {
    mapping: IdentifierMapping,
    nodes: NodeTable,
    external: Option<HashSet<String>>,
    edges: EdgeTable,
    counts: MergeCounts,
}

impl EdgeAggregator {
    /// Aggregate edges against a precomputed mapping alone. The mapping's
    /// canonical ids stand in for the node set.
    #[must_use]
    pub fn from_mapping(mapping: IdentifierMapping) -> Self {
        let external = mapping
            .canonical_ids()
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            mapping,
            nodes: NodeTable::new(),
            external: Some(external),
            edges: EdgeTable::new(),
            counts: MergeCounts::default(),
        }
    }

    fn is_known(&self, id: &str) -> bool {
        self.nodes.contains(id) || self.external.as_ref().is_some_and(|ids| ids.contains(id))
    }

    fn resolve_endpoint(&mut self, raw: &str, source: SourceKind) -> Option<String> {
        let resolution = self.mapping.resolve(raw, source)?;
        if !self.is_known(resolution.canonical) {
            return None;
        }
        let canonical = resolution.canonical.to_string();
        self.counts.matches.record(resolution.rule);
        Some(canonical)
    }

    /// Add one edge; returns `false` when an endpoint does not resolve to a
    /// known node and the edge is dropped.
    pub fn add_edge(&mut self, raw: &RawEdge) -> bool {
        self.counts.edges_in += 1;
        let subject = self.resolve_endpoint(&raw.subject, raw.source);
        let object = self.resolve_endpoint(&raw.object, raw.source);
        let relation = raw.relation.trim();

        let (Some(subject), Some(object)) = (subject, object) else {
            self.counts.edges_dropped += 1;
            tracing::debug!(
                "Dropping {} edge {} -[{}]-> {}: unresolved endpoint",
                raw.source,
                raw.subject,
                raw.relation,
                raw.object
            );
            return false;
        };

        if !self.edges.add(EdgeKey::new(subject, object, relation), raw) {
            self.counts.edges_merged += 1;
        }
        true
    }

    #[must_use]
    pub const fn mapping(&self) -> &IdentifierMapping {
        &self.mapping
    }

    #[must_use]
    pub const fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    #[must_use]
    pub fn finish(self) -> MergedGraph {
        tracing::info!(
            "Edge phase complete: {} aggregated edges, {} dropped",
            self.edges.len(),
            self.counts.edges_dropped
        );
        MergedGraph {
            nodes: self.nodes.into_records(),
            edges: self.edges.into_records(),
            mapping: self.mapping,
            counts: self.counts,
        }
    }
}

/// Final merge result.
#[derive(Debug)]
pub struct MergedGraph {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub mapping: IdentifierMapping,
    pub counts: MergeCounts,
}
