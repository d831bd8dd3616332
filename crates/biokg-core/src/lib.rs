#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod config;
pub mod edge;
pub mod error;
pub mod import;
pub mod ingest;
pub mod node;
pub mod output;
pub mod source;
pub mod vocab;

pub use config::MergeConfig;
pub use edge::{EdgeKey, EdgeRecord, RawEdge};
pub use error::{Error, Result};
pub use import::{AdminImport, ImportOptions, ImportOutcome, EXIT_NOT_FOUND};
pub use ingest::{
    EdgeAggregator, GraphMerger, IdentifierMapping, MappingBuilder, MergePipeline, MergeStats,
    MergedGraph, SourceReader, Subset, SubsetLimits,
};
pub use node::{NodeRecord, RawNode};
pub use output::{OutputFiles, OutputFormat};
pub use source::SourceKind;
pub use vocab::{Category, NodeLabel, RelationCategory};
