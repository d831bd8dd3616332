use std::path::PathBuf;

use super::layout::SemMedDbLayout;
use super::reader::TextLines;
use super::stream::{clean_field, Quota, ReadStats, SourceReader};
use crate::edge::RawEdge;
use crate::error::Result;
use crate::node::RawNode;
use crate::source::SourceKind;
use crate::vocab::Category;

const UMLS_CUI_IRI: &str = "https://www.nlm.nih.gov/research/umls/sourcereleasedocs/current/CUI/";

/// Reads a SemMedDB entity dump and its connection list.
#[derive(Debug, Clone)]
pub struct SemMedDbReader {
    entities: Option<PathBuf>,
    connections: Option<PathBuf>,
    layout: SemMedDbLayout,
}

impl SemMedDbReader {
    #[must_use]
    pub fn new(entities: Option<PathBuf>, connections: Option<PathBuf>) -> Self {
        Self {
            entities,
            connections,
            layout: SemMedDbLayout::default(),
        }
    }

    #[must_use]
    pub const fn with_layout(mut self, layout: SemMedDbLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Parse one entity line: whitespace and outer quotes stripped, fields split
/// on `","`.
#[must_use]
pub fn parse_entity_line(line: &str, layout: &SemMedDbLayout) -> Option<RawNode> {
    let line = line.trim().trim_matches('"');
    let parts: Vec<&str> = line.split("\",\"").collect();
    if parts.len() < layout.min_fields {
        return None;
    }
    let field = |i: usize| parts.get(i).map_or("", |v| clean_field(v));

    let cui = field(layout.cui);
    let entity_id = layout.entity_id.map_or("", field);
    let (id, iri) = if !cui.is_empty() {
        (format!("UMLS:{cui}"), format!("{UMLS_CUI_IRI}{cui}"))
    } else if !entity_id.is_empty() {
        (
            format!("SEMMEDDB:{entity_id}"),
            format!("{}#{entity_id}", SourceKind::SemMedDb.base_iri()),
        )
    } else {
        return None;
    };

    let semantic_type = field(layout.semantic_type);
    let synonyms: Vec<String> = layout
        .aliases
        .map(field)
        .unwrap_or_default()
        .split('|')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect();

    let description = match layout.definition {
        Some(i) => field(i).to_string(),
        None => synonyms.first().cloned().unwrap_or_default(),
    };
    let frequency = layout.frequency.and_then(|i| field(i).parse().ok());
    let score = layout.score.and_then(|i| field(i).parse().ok());

    Some(
        RawNode::new(id, SourceKind::SemMedDb)
            .with_name(field(layout.name))
            .with_type(semantic_type, Category::from_semantic_type(semantic_type))
            .with_iri(iri)
            .with_description(description)
            .with_key(cui)
            .with_key(entity_id)
            .with_synonyms(synonyms)
            .with_semantic_type(semantic_type)
            .with_counts(frequency, score),
    )
}

/// Parse one connection line: `:START_ID,:END_ID,:TYPE[,frequency]`.
#[must_use]
pub fn parse_connection_line(line: &str) -> Option<RawEdge> {
    let parts: Vec<&str> = line.split(',').map(clean_field).collect();
    if parts.len() < 3 {
        return None;
    }
    let mut edge = RawEdge::new(parts[0], parts[1], parts[2], SourceKind::SemMedDb);
    if let Some(frequency) = parts.get(3).and_then(|f| f.parse().ok()) {
        edge = edge.with_frequency(frequency);
    }
    Some(edge)
}

fn is_connection_header(line: &str) -> bool {
    line.contains("START_ID")
}

impl SourceReader for SemMedDbReader {
    fn source(&self) -> SourceKind {
        SourceKind::SemMedDb
    }

    fn read_nodes(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawNode) -> Result<()>,
    ) -> Result<ReadStats> {
        let mut stats = ReadStats::default();
        let Some(path) = &self.entities else {
            return Ok(stats);
        };
        tracing::info!("Loading SemMedDB entities from {}", path.display());

        let mut quota = Quota::new(limit);
        let mut lines = TextLines::open(path)?;
        for line in lines.by_ref() {
            if quota.is_exhausted() {
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_entity_line(&line, &self.layout) {
                Some(node) => {
                    sink(node)?;
                    quota.consume();
                    stats.accepted(SourceKind::SemMedDb, "entities");
                }
                None => stats.reject(SourceKind::SemMedDb, &line),
            }
        }
        stats.decode = lines.decode_stats();
        tracing::info!("Loaded {} SemMedDB entities", stats.records);
        Ok(stats)
    }

    fn read_edges(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawEdge) -> Result<()>,
    ) -> Result<ReadStats> {
        let mut stats = ReadStats::default();
        let Some(path) = &self.connections else {
            return Ok(stats);
        };
        tracing::info!("Loading SemMedDB connections from {}", path.display());

        let mut quota = Quota::new(limit);
        let mut lines = TextLines::open(path)?;
        let mut first = true;
        for line in lines.by_ref() {
            if quota.is_exhausted() {
                break;
            }
            let line = line?;
            if std::mem::take(&mut first) && is_connection_header(&line) {
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_connection_line(&line) {
                Some(edge) => {
                    sink(edge)?;
                    quota.consume();
                    stats.accepted(SourceKind::SemMedDb, "connections");
                }
                None => stats.reject(SourceKind::SemMedDb, &line),
            }
        }
        stats.decode = lines.decode_stats();
        tracing::info!("Loaded {} SemMedDB connections", stats.records);
        Ok(stats)
    }
}
