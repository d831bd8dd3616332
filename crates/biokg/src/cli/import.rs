use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use biokg_core::{AdminImport, ImportOptions};
use clap::Args;

use super::{exit_code, ImportFlags};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Node CSV with :ID/:LABEL headers
    pub nodes: PathBuf,

    /// Relationship CSV with :START_ID/:END_ID/:TYPE headers
    pub relationships: PathBuf,

    #[command(flatten)]
    pub import: ImportFlags,
}

pub fn run(args: &ImportArgs) -> Result<ExitCode> {
    let mut options = ImportOptions::default();
    args.import.apply(&mut options);

    let outcome = AdminImport::new(&args.nodes, &args.relationships, options)
        .with_binary(&args.import.neo4j_admin)
        .run()
        .context("neo4j-admin import failed")?;
    Ok(exit_code(outcome))
}
