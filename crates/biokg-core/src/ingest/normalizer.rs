use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::RawNode;
use crate::source::SourceKind;

/// Which fallback step resolved an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    CaseInsensitive,
    PrefixStripped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub canonical: &'a str,
    pub rule: MatchRule,
}

/// Trim whitespace and surrounding quotes from a raw identifier.
/// Empty ids and the placeholder `0` carry no identity.
#[must_use]
pub fn clean_id(raw: &str) -> Option<&str> {
    let id = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if id.is_empty() || id == "0" {
        None
    } else {
        Some(id)
    }
}

/// Local part of an identifier: after the last `#`, else after the first `:`.
#[must_use]
pub fn strip_prefix(id: &str) -> &str {
    if let Some((_, fragment)) = id.rsplit_once('#') {
        fragment
    } else if let Some((_, local)) = id.split_once(':') {
        local
    } else {
        id
    }
}

/// `C` followed by at least six more characters.
#[must_use]
pub fn is_cui_shaped(value: &str) -> bool {
    value.starts_with('C') && value.chars().count() >= 7
}

#[derive(Debug, Clone, Default)]
struct KeyIndex {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl KeyIndex {
    fn insert(&mut self, key: &str, canonical: &str) {
        if !self.exact.contains_key(key) {
            self.exact.insert(key.to_string(), canonical.to_string());
        }
        self.folded
            .entry(key.to_lowercase())
            .or_insert_with(|| canonical.to_string());
    }

    fn exact(&self, key: &str) -> Option<&str> {
        self.exact.get(key).map(String::as_str)
    }

    fn folded(&self, key: &str) -> Option<&str> {
        self.folded.get(&key.to_lowercase()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
struct Keys {
    global: KeyIndex,
    scoped: HashMap<SourceKind, KeyIndex>,
}

impl Keys {
    fn exact(&self, source: SourceKind, key: &str) -> Option<&str> {
        self.scoped
            .get(&source)
            .and_then(|index| index.exact(key))
            .or_else(|| self.global.exact(key))
    }

    fn folded(&self, source: SourceKind, key: &str) -> Option<&str> {
        self.scoped
            .get(&source)
            .and_then(|index| index.folded(key))
            .or_else(|| self.global.folded(key))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingFile {
    final_mapping: BTreeMap<String, String>,
}

fn read_mapping_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let text = super::reader::read_to_string(path)?;
    let file: MappingFile = serde_json::from_str(&text)?;
    Ok(file.final_mapping)
}

/// Node-phase identifier table. Consumed by [`MappingBuilder::finish`]
/// once every node stream has been registered.
#[derive(Debug, Clone, Default)]
pub struct MappingBuilder {
    keys: Keys,
    registered: u64,
}

impl MappingBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with a precomputed `{"final_mapping": {raw: canonical}}` file.
    /// Entries become global keys.
    pub fn load_precomputed(&mut self, path: &Path) -> Result<usize> {
        let mapping = read_mapping_file(path)?;
        let count = mapping.len();
        for (raw, canonical) in &mapping {
            if let (Some(raw), Some(canonical)) = (clean_id(raw), clean_id(canonical)) {
                self.keys.global.insert(raw, canonical);
                self.keys.global.insert(canonical, canonical);
            }
        }
        tracing::info!("Loaded {} precomputed mappings from {}", count, path.display());
        Ok(count)
    }

    /// Register a node and return its canonical id.
    ///
    /// The canonical id is the first candidate key that is already mapped,
    /// otherwise the node's own id. Every candidate is then mapped to it
    /// unless already taken.
    pub fn register(&mut self, node: &RawNode) -> Option<String> {
        let id = clean_id(&node.id)?;
        let source = node.source;

        let mut candidates: Vec<&str> = vec![id];
        let stripped = strip_prefix(id);
        if stripped != id && !stripped.is_empty() {
            candidates.push(stripped);
        }
        candidates.extend(node.keys.iter().filter_map(|k| clean_id(k)));
        if source == SourceKind::SemMedDb && is_cui_shaped(&node.semantic_type) {
            candidates.push(&node.semantic_type);
        }

        let canonical = candidates
            .iter()
            .find_map(|c| self.keys.exact(source, c))
            .unwrap_or(id)
            .to_string();

        self.keys.global.insert(&canonical, &canonical);
        self.keys.global.insert(id, &canonical);
        let scoped = self.keys.scoped.entry(source).or_default();
        for candidate in candidates.iter().skip(1) {
            scoped.insert(candidate, &canonical);
        }

        self.registered += 1;
        Some(canonical)
    }

    #[must_use]
    pub const fn registered(&self) -> u64 {
        self.registered
    }

    /// Freeze the table. Edge resolution is only available afterwards.
    #[must_use]
    pub fn finish(self) -> IdentifierMapping {
        IdentifierMapping { keys: self.keys }
    }
}

/// Immutable identifier table used to resolve edge endpoints.
#[derive(Debug, Clone, Default)]
pub struct IdentifierMapping {
    keys: Keys,
}

impl IdentifierMapping {
    /// Build directly from a precomputed mapping file, without node streams.
    pub fn load(path: &Path) -> Result<Self> {
        let mut builder = MappingBuilder::new();
        builder.load_precomputed(path)?;
        Ok(builder.finish())
    }

    /// Exact, then case-insensitive, then prefix-stripped; each step tries
    /// the source's own keys before global ones.
    #[must_use]
    pub fn resolve(&self, raw: &str, source: SourceKind) -> Option<Resolution<'_>> {
        let id = clean_id(raw)?;
        if let Some(canonical) = self.keys.exact(source, id) {
            return Some(Resolution {
                canonical,
                rule: MatchRule::Exact,
            });
        }
        if let Some(canonical) = self.keys.folded(source, id) {
            return Some(Resolution {
                canonical,
                rule: MatchRule::CaseInsensitive,
            });
        }
        let stripped = strip_prefix(id);
        if stripped != id {
            if let Some(canonical) = self.keys.exact(source, stripped) {
                return Some(Resolution {
                    canonical,
                    rule: MatchRule::PrefixStripped,
                });
            }
        }
        None
    }

    #[must_use]
    pub fn normalize(&self, raw: &str, source: SourceKind) -> Option<&str> {
        self.resolve(raw, source).map(|r| r.canonical)
    }

    /// Every canonical id the table can resolve to.
    #[must_use]
    pub fn canonical_ids(&self) -> HashSet<&str> {
        self.keys
            .global
            .exact
            .values()
            .chain(self.keys.scoped.values().flat_map(|i| i.exact.values()))
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.global.exact.len()
            + self.keys.scoped.values().map(|i| i.exact.len()).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten to `raw -> canonical`. Global keys take precedence over
    /// scoped ones, and scoped keys are taken in source order.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut flat: BTreeMap<String, String> = self
            .keys
            .global
            .exact
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for source in SourceKind::ALL {
            if let Some(index) = self.keys.scoped.get(&source) {
                for (raw, canonical) in &index.exact {
                    flat.entry(raw.clone()).or_insert_with(|| canonical.clone());
                }
            }
        }
        flat
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        let file = MappingFile {
            final_mapping: self.flatten(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))?;
        tracing::info!(
            "Wrote {} identifier mappings to {}",
            file.final_mapping.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::ingest::primekg::index_key;

    fn semmed(id: &str) -> RawNode {
        RawNode::new(id, SourceKind::SemMedDb)
    }

    #[test]
    fn test_clean_id() {
        assert_eq!(clean_id(" \"UMLS:C1\" "), Some("UMLS:C1"));
        assert_eq!(clean_id("'x'"), Some("x"));
        assert_eq!(clean_id(""), None);
        assert_eq!(clean_id("0"), None);
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("UMLS:C0011849"), "C0011849");
        assert_eq!(strip_prefix("https://b.org/e#G1"), "G1");
        assert_eq!(strip_prefix("plain"), "plain");
    }

    #[test]
    fn test_cui_shape() {
        assert!(is_cui_shaped("C0011849"));
        assert!(!is_cui_shaped("C12345"));
        assert!(!is_cui_shaped("dsyn"));
    }

    #[test]
    fn test_same_cui_different_entity_ids_share_canonical() {
        let mut builder = MappingBuilder::new();
        let a = builder
            .register(&semmed("UMLS:C0011849").with_key("C0011849").with_key("E1"))
            .unwrap();
        let b = builder
            .register(&semmed("UMLS:C0011849").with_key("C0011849").with_key("E2"))
            .unwrap();
        assert_eq!(a, b);

        let mapping = builder.finish();
        assert_eq!(mapping.normalize("E1", SourceKind::SemMedDb), Some("UMLS:C0011849"));
        assert_eq!(mapping.normalize("E2", SourceKind::SemMedDb), Some("UMLS:C0011849"));
    }

    #[test]
    fn test_registration_is_idempotent() {
        let node = semmed("UMLS:C1").with_key("E1");
        let mut builder = MappingBuilder::new();
        let first = builder.register(&node);
        let second = builder.register(&node);
        assert_eq!(first, second);
        assert_eq!(builder.registered(), 2);
    }

    fn register_all(nodes: &[&RawNode]) -> (Vec<String>, MappingBuilder) {
        let mut builder = MappingBuilder::new();
        let canonicals = nodes
            .iter()
            .map(|n| builder.register(n).unwrap())
            .collect();
        (canonicals, builder)
    }

    #[test]
    fn test_prefix_variants_share_first_seen_canonical_in_either_order() {
        let umls = semmed("UMLS:C0011849");
        let mesh = semmed("MESH:C0011849");

        for (first, second) in [(&umls, &mesh), (&mesh, &umls)] {
            let (canonicals, mut builder) = register_all(&[first, second]);
            assert_eq!(canonicals, vec![first.id.clone(), first.id.clone()]);

            let before = builder.clone().finish().flatten();
            assert_eq!(builder.register(first).unwrap(), first.id);
            assert_eq!(builder.register(second).unwrap(), first.id);
            let mapping = builder.finish();
            assert_eq!(mapping.flatten(), before);

            for raw in ["UMLS:C0011849", "MESH:C0011849", "C0011849"] {
                assert_eq!(mapping.normalize(raw, SourceKind::SemMedDb), Some(first.id.as_str()));
            }
        }
    }

    #[test]
    fn test_case_variants_resolve_to_exactly_one_canonical_in_either_order() {
        let upper = semmed("UMLS:C0011849");
        let lower = semmed("umls:c0011849");

        for (first, second) in [(&upper, &lower), (&lower, &upper)] {
            let (canonicals, mut builder) = register_all(&[first, second]);
            assert_eq!(canonicals, vec![first.id.clone(), second.id.clone()]);

            let before = builder.clone().finish().flatten();
            builder.register(second);
            builder.register(first);
            let mapping = builder.finish();
            assert_eq!(mapping.flatten(), before);

            // each spelling hits itself; any other spelling folds onto the first seen
            assert_eq!(mapping.normalize(&upper.id, SourceKind::SemMedDb), Some(upper.id.as_str()));
            assert_eq!(mapping.normalize(&lower.id, SourceKind::SemMedDb), Some(lower.id.as_str()));
            let mixed = mapping.resolve("Umls:C0011849", SourceKind::SemMedDb).unwrap();
            assert_eq!(mixed.canonical, first.id);
            assert_eq!(mixed.rule, MatchRule::CaseInsensitive);
        }
    }

    #[test]
    fn test_primekg_index_keys_stay_apart_from_node_ids() {
        let gene = RawNode::new("PRIMEKG:2", SourceKind::PrimeKg).with_key(index_key("0"));
        let disease =
            RawNode::new("PRIMEKG:MONDO_5015", SourceKind::PrimeKg).with_key(index_key("2"));

        for (first, second) in [(&gene, &disease), (&disease, &gene)] {
            let (canonicals, builder) = register_all(&[first, second]);
            assert_eq!(canonicals, vec![first.id.clone(), second.id.clone()]);

            let mapping = builder.finish();
            let resolve = |raw: &str| mapping.normalize(raw, SourceKind::PrimeKg);
            assert_eq!(resolve(&index_key("2")), Some("PRIMEKG:MONDO_5015"));
            assert_eq!(resolve(&index_key("0")), Some("PRIMEKG:2"));
            assert_eq!(resolve("2"), Some("PRIMEKG:2"));
            assert_eq!(resolve(&index_key("7")), None);
        }
    }

    #[test]
    fn test_first_seen_wins_on_collision() {
        let mut builder = MappingBuilder::new();
        builder.register(&semmed("UMLS:C1").with_key("shared"));
        builder.register(&semmed("UMLS:C2").with_key("other"));
        // `shared` is already mapped, so the second node joins the first
        let third = builder.register(&semmed("UMLS:C3").with_key("shared")).unwrap();
        assert_eq!(third, "UMLS:C1");

        let mapping = builder.finish();
        assert_eq!(mapping.normalize("UMLS:C3", SourceKind::SemMedDb), Some("UMLS:C1"));
        assert_eq!(mapping.normalize("other", SourceKind::SemMedDb), Some("UMLS:C2"));
    }

    #[test]
    fn test_resolution_order() {
        let mut builder = MappingBuilder::new();
        builder.register(&semmed("UMLS:C0011849"));
        builder.register(&semmed("umls:c0011849"));
        let mapping = builder.finish();

        let exact = mapping.resolve("umls:c0011849", SourceKind::SemMedDb).unwrap();
        assert_eq!((exact.canonical, exact.rule), ("umls:c0011849", MatchRule::Exact));

        let folded = mapping.resolve("Umls:C0011849", SourceKind::SemMedDb).unwrap();
        assert_eq!(
            (folded.canonical, folded.rule),
            ("UMLS:C0011849", MatchRule::CaseInsensitive)
        );

        let stripped = mapping.resolve("MESH:C0011849", SourceKind::SemMedDb).unwrap();
        assert_eq!(
            (stripped.canonical, stripped.rule),
            ("UMLS:C0011849", MatchRule::PrefixStripped)
        );

        assert!(mapping.resolve("C9999999", SourceKind::SemMedDb).is_none());
    }

    #[test]
    fn test_scoped_keys_do_not_leak_across_sources() {
        let mut builder = MappingBuilder::new();
        builder.register(&RawNode::new("PRIMEKG:9796", SourceKind::PrimeKg).with_key("5"));
        builder.register(&RawNode::new("IKRAPH:5", SourceKind::IKraph).with_key("5"));
        let mapping = builder.finish();

        assert_eq!(mapping.normalize("5", SourceKind::PrimeKg), Some("PRIMEKG:9796"));
        assert_eq!(mapping.normalize("5", SourceKind::IKraph), Some("IKRAPH:5"));
        assert_eq!(mapping.normalize("5", SourceKind::SemMedDb), None);
        // canonical ids are global
        assert_eq!(mapping.normalize("IKRAPH:5", SourceKind::PrimeKg), Some("IKRAPH:5"));
    }

    #[test]
    fn test_semantic_type_cui_is_a_key() {
        let mut builder = MappingBuilder::new();
        builder.register(&semmed("SEMMEDDB:E9").with_semantic_type("C0000005"));
        let mapping = builder.finish();
        assert_eq!(mapping.normalize("C0000005", SourceKind::SemMedDb), Some("SEMMEDDB:E9"));
    }

    #[test]
    fn test_precomputed_mapping_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mapping.json");
        std::fs::write(
            &path,
            r#"{"final_mapping": {"PRIMEKG:9796": "UMLS:C1", "9796": "UMLS:C1"}, "edge_overlaps": {}}"#,
        )
        .unwrap();

        let mut builder = MappingBuilder::new();
        assert_eq!(builder.load_precomputed(&path).unwrap(), 2);
        let canonical = builder
            .register(&RawNode::new("PRIMEKG:9796", SourceKind::PrimeKg))
            .unwrap();
        assert_eq!(canonical, "UMLS:C1");

        let mapping = builder.finish();
        let out = dir.path().join("out.json");
        mapping.export(&out).unwrap();
        let reloaded = IdentifierMapping::load(&out).unwrap();
        assert_eq!(reloaded.normalize("9796", SourceKind::IKraph), Some("UMLS:C1"));
        assert!(reloaded.canonical_ids().contains("UMLS:C1"));
    }
}
