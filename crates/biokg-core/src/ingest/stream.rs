use serde::{Deserialize, Serialize};

use super::reader::DecodeStats;
use crate::edge::RawEdge;
use crate::error::Result;
use crate::node::RawNode;
use crate::source::SourceKind;

const PROGRESS_INTERVAL: u64 = 100_000;

/// Per-stream counters reported by a source reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadStats {
    pub records: u64,
    pub malformed: u64,
    pub missing_files: u64,
    pub decode: DecodeStats,
}

impl ReadStats {
    pub(crate) fn accepted(&mut self, source: SourceKind, what: &str) {
        self.records += 1;
        if self.records % PROGRESS_INTERVAL == 0 {
            tracing::info!("{}: read {} {}...", source, self.records, what);
        }
    }

    pub(crate) fn reject(&mut self, source: SourceKind, detail: &str) {
        self.malformed += 1;
        tracing::debug!("{}: skipping malformed record: {}", source, detail);
    }

    pub fn add(&mut self, other: &Self) {
        self.records += other.records;
        self.malformed += other.malformed;
        self.missing_files += other.missing_files;
        self.decode.add(other.decode);
    }
}

/// Record ceiling shared by every file of one stream.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    remaining: Option<u64>,
}

impl Quota {
    #[must_use]
    pub const fn new(limit: Option<u64>) -> Self {
        Self { remaining: limit }
    }

    #[must_use]
    pub const fn unlimited() -> Self {
        Self { remaining: None }
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self.remaining, Some(0))
    }

    pub fn consume(&mut self) {
        if let Some(n) = self.remaining.as_mut() {
            *n = n.saturating_sub(1);
        }
    }
}

/// Streams one upstream dataset as raw node and edge records.
///
/// Readers push records into the supplied sink rather than buffering, so a
/// whole dump never has to fit in memory.
pub trait SourceReader {
    fn source(&self) -> SourceKind;

    fn read_nodes(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawNode) -> Result<()>,
    ) -> Result<ReadStats>;

    fn read_edges(
        &self,
        limit: Option<u64>,
        sink: &mut dyn FnMut(RawEdge) -> Result<()>,
    ) -> Result<ReadStats>;
}

/// Trim whitespace and any surrounding double quotes.
#[must_use]
pub fn clean_field(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}
