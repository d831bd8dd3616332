pub mod edges;
pub mod import;
pub mod merge;
pub mod nodes;
pub mod subset;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use biokg_core::config::resolve_limit;
use biokg_core::{ImportOptions, ImportOutcome, MergeConfig};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "biokg",
    about = "Merge SemMedDB, PrimeKG, iKraph and BioKDE dumps into one knowledge graph",
    version
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream every configured source through staging and merge them
    Merge(merge::MergeArgs),
    /// Merge SemMedDB entities and PrimeKG nodes into one node file
    Nodes(nodes::NodesArgs),
    /// Aggregate edges against a precomputed identifier mapping
    Edges(edges::EdgesArgs),
    /// Load bulk-import CSV files with neo4j-admin
    Import(import::ImportArgs),
    /// Extract a small demo graph: the first nodes of each source and the
    /// edges between them
    Subset(subset::SubsetArgs),
}

pub fn dispatch(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Merge(args) => merge::run(args),
        Commands::Nodes(args) => nodes::run(&args).map(|()| ExitCode::SUCCESS),
        Commands::Edges(args) => edges::run(&args).map(|()| ExitCode::SUCCESS),
        Commands::Import(args) => import::run(&args),
        Commands::Subset(args) => subset::run(&args).map(|()| ExitCode::SUCCESS),
    }
}

fn set<T: Clone>(target: &mut Option<T>, value: Option<&T>) {
    if let Some(v) = value {
        *target = Some(v.clone());
    }
}

/// Dataset locations; each one given here replaces the config file's.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceFlags {
    /// SemMedDB entity dump (.csv or .csv.gz)
    #[arg(long)]
    pub semmeddb_entities: Option<PathBuf>,

    /// SemMedDB connection list
    #[arg(long)]
    pub semmeddb_connections: Option<PathBuf>,

    /// SemMedDB column layout: definition, numeric-id or concept
    #[arg(long, value_name = "PRESET")]
    pub semmeddb_layout: Option<String>,

    /// PrimeKG nodes.csv
    #[arg(long)]
    pub primekg_nodes: Option<PathBuf>,

    /// PrimeKG kg.csv / edges.csv
    #[arg(long)]
    pub primekg_edges: Option<PathBuf>,

    /// Directory holding the iKraph node and relationship files
    #[arg(long)]
    pub ikraph_dir: Option<PathBuf>,

    /// BioKDE node CSV
    #[arg(long)]
    pub biokde_nodes: Option<PathBuf>,

    /// BioKDE edge CSV
    #[arg(long)]
    pub biokde_edges: Option<PathBuf>,
}

impl SourceFlags {
    pub fn apply(&self, config: &mut MergeConfig) {
        set(&mut config.semmeddb.entities, self.semmeddb_entities.as_ref());
        set(&mut config.semmeddb.connections, self.semmeddb_connections.as_ref());
        set(&mut config.primekg.nodes, self.primekg_nodes.as_ref());
        set(&mut config.primekg.edges, self.primekg_edges.as_ref());
        set(&mut config.ikraph.dir, self.ikraph_dir.as_ref());
        set(&mut config.biokde.nodes, self.biokde_nodes.as_ref());
        set(&mut config.biokde.edges, self.biokde_edges.as_ref());

        // a preset named on the command line replaces explicit columns from the file
        if let Some(layout) = &self.semmeddb_layout {
            config.semmeddb.layout = Some(layout.clone());
            config.semmeddb.columns = None;
        }
    }
}

/// Record ceilings shared by every subcommand that reads sources.
#[derive(Args, Debug, Clone, Default)]
pub struct LimitFlags {
    /// Read at most 100 records per stream
    #[arg(long)]
    pub test: bool,

    /// Read at most N records per stream (wins over --test)
    #[arg(long, value_name = "N")]
    pub limit: Option<u64>,
}

impl LimitFlags {
    pub const fn record_limit(&self) -> Option<u64> {
        resolve_limit(self.limit, self.test)
    }
}

/// Overrides for the `neo4j-admin database import` invocation.
#[derive(Args, Debug, Clone, Default)]
pub struct ImportFlags {
    /// Target database name
    #[arg(long)]
    pub database: Option<String>,

    /// Keep an existing database instead of overwriting it
    #[arg(long)]
    pub no_overwrite: bool,

    /// Off-heap memory ceiling passed to the importer (e.g. 2G)
    #[arg(long, value_name = "SIZE")]
    pub max_off_heap_memory: Option<String>,

    /// neo4j-admin executable name or path
    #[arg(long, value_name = "BIN", default_value = biokg_core::import::NEO4J_ADMIN)]
    pub neo4j_admin: String,
}

impl ImportFlags {
    pub fn apply(&self, options: &mut ImportOptions) {
        if let Some(database) = &self.database {
            options.database.clone_from(database);
        }
        if self.no_overwrite {
            options.overwrite = false;
        }
        if let Some(memory) = &self.max_off_heap_memory {
            options.max_off_heap_memory.clone_from(memory);
        }
    }
}

pub fn exit_code(outcome: ImportOutcome) -> ExitCode {
    ExitCode::from(u8::try_from(outcome.exit_code()).unwrap_or(1))
}
