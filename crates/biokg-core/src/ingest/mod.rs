mod biokde;
mod ikraph;
mod layout;
mod merger;
mod normalizer;
mod pipeline;
mod primekg;
mod reader;
mod semmeddb;
mod staging;
mod stream;
mod subset;

pub use biokde::{url_fragment, BioKdeReader};
pub use ikraph::IKraphReader;
pub use layout::{BioKdeColumns, IKraphFiles, SemMedDbLayout};
pub use merger::{
    EdgeAggregator, EdgeTable, GraphMerger, MatchCounts, MergeCounts, MergedGraph, NodeTable,
};
pub use normalizer::{
    clean_id, is_cui_shaped, strip_prefix, IdentifierMapping, MappingBuilder, MatchRule,
    Resolution,
};
pub use pipeline::{
    configured_readers, merge_edges_from, merge_nodes_from, MergePipeline, MergeStats,
    SourceStats, STATS_FILE,
};
pub use primekg::{index_key, PrimeKgReader};
pub use reader::{decode_bytes, open_input, CsvRows, DecodeStats, Decoding, Header, TextLines};
pub use semmeddb::{parse_connection_line, parse_entity_line, SemMedDbReader};
pub use staging::{read_staged, StagedStats, StagingPaths, StagingWriter};
pub use stream::{clean_field, Quota, ReadStats, SourceReader};
pub use subset::{
    SourceSubset, Subset, SubsetCounts, SubsetLimits, SubsetReport, SUBSET_STATS_FILE,
};
