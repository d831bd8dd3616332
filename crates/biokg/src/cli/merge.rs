use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use biokg_core::{AdminImport, MergeConfig, MergePipeline, OutputFormat};
use clap::Args;

use super::{exit_code, set, ImportFlags, LimitFlags, SourceFlags};

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// TOML config file (default: <config dir>/biokg/config.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub sources: SourceFlags,

    /// Directory for staging files, merged output and merge_stats.json
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output format: jsonl, csv or neo4j
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    #[command(flatten)]
    pub limits: LimitFlags,

    /// Precomputed {"final_mapping": {...}} file to seed identifiers
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Export the identifier mapping built during the node phase
    #[arg(long)]
    pub mapping_out: Option<PathBuf>,

    /// Do not emit one node per contributing source
    #[arg(long)]
    pub no_source_nodes: bool,

    /// Run neo4j-admin import on the result (requires --format neo4j)
    #[arg(long)]
    pub neo4j_import: bool,

    #[command(flatten)]
    pub import: ImportFlags,
}

impl MergeArgs {
    fn apply(&self, config: &mut MergeConfig) {
        self.sources.apply(config);
        set(&mut config.mapping, self.mapping.as_ref());
        set(&mut config.mapping_out, self.mapping_out.as_ref());
        set(&mut config.limit, self.limits.limit.as_ref());

        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.limits.test {
            config.test = true;
        }
        if self.no_source_nodes {
            config.source_nodes = false;
        }
        if self.neo4j_import {
            config.neo4j.enabled = true;
        }
        self.import.apply(&mut config.neo4j.options);
    }
}

pub fn run(args: MergeArgs) -> Result<ExitCode> {
    let mut config = MergeConfig::discover(args.config.as_deref())
        .context("failed to load config")?
        .with_env();
    args.apply(&mut config);

    if config.neo4j.enabled && config.format != OutputFormat::Neo4j {
        bail!("neo4j import needs --format neo4j (got {})", config.format);
    }

    let import = config.neo4j.clone();
    let pipeline = MergePipeline::new(config);
    let stats = pipeline.run().with_context(|| {
        format!(
            "merge into {} failed",
            pipeline.config().output_dir.display()
        )
    })?;

    eprintln!(
        "Merged {} nodes and {} edges ({} edges dropped)",
        stats.nodes, stats.edges, stats.counts.edges_dropped
    );
    eprintln!("  Stats: {}", pipeline.stats_path().display());

    let Some(files) = stats.outputs.filter(|_| import.enabled) else {
        return Ok(ExitCode::SUCCESS);
    };

    let outcome = AdminImport::new(&files.nodes, &files.edges, import.options)
        .with_binary(&args.import.neo4j_admin)
        .run()
        .context("neo4j-admin import failed")?;
    Ok(exit_code(outcome))
}
