use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const NEO4J_ADMIN: &str = "neo4j-admin";

/// Conventional shell status for a command that is not on `PATH`.
pub const EXIT_NOT_FOUND: i32 = 127;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub database: String,
    pub overwrite: bool,
    pub max_off_heap_memory: String,
    pub array_delimiter: String,
    pub trim_strings: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            database: "neo4j".to_string(),
            overwrite: true,
            max_off_heap_memory: "1G".to_string(),
            array_delimiter: ";".to_string(),
            trim_strings: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Completed,
    NotFound,
    Failed(i32),
}

impl ImportOutcome {
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::NotFound => EXIT_NOT_FOUND,
            Self::Failed(code) => *code,
        }
    }
}

/// A `neo4j-admin database import full` invocation.
#[derive(Debug, Clone)]
pub struct AdminImport {
    binary: String,
    nodes: PathBuf,
    relationships: PathBuf,
    options: ImportOptions,
}

impl AdminImport {
    #[must_use]
    pub fn new(nodes: &Path, relationships: &Path, options: ImportOptions) -> Self {
        Self {
            binary: NEO4J_ADMIN.to_string(),
            nodes: nodes.to_path_buf(),
            relationships: relationships.to_path_buf(),
            options,
        }
    }

    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "database".to_string(),
            "import".to_string(),
            "full".to_string(),
            self.options.database.clone(),
        ];
        if self.options.overwrite {
            args.push("--overwrite-destination".to_string());
        }
        args.push(format!("--nodes={}", self.nodes.display()));
        args.push(format!("--relationships={}", self.relationships.display()));
        args.push(format!("--trim-strings={}", self.options.trim_strings));
        args.push(format!("--array-delimiter={}", self.options.array_delimiter));
        args.push(format!(
            "--max-off-heap-memory={}",
            self.options.max_off_heap_memory
        ));
        args
    }

    pub fn run(&self) -> Result<ImportOutcome> {
        let Ok(binary) = which::which(&self.binary) else {
            tracing::error!(
                "{} not found in PATH; install Neo4j or add its bin directory to PATH",
                self.binary
            );
            return Ok(ImportOutcome::NotFound);
        };

        let args = self.args();
        tracing::info!("Running {} {}", binary.display(), args.join(" "));

        let output = Command::new(&binary)
            .args(&args)
            .output()
            .map_err(|e| Error::io(&binary, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::info!("{} stdout:\n{}", self.binary, stdout.trim_end());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::warn!("{} stderr:\n{}", self.binary, stderr.trim_end());
        }

        if output.status.success() {
            Ok(ImportOutcome::Completed)
        } else {
            let code = output.status.code().unwrap_or(1);
            tracing::error!("{} import failed with exit code {}", self.binary, code);
            Ok(ImportOutcome::Failed(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import() -> AdminImport {
        AdminImport::new(
            Path::new("out/nodes_neo4j.csv"),
            Path::new("out/relationships_neo4j.csv"),
            ImportOptions::default(),
        )
    }

    #[test]
    fn test_default_args() {
        assert_eq!(
            import().args(),
            vec![
                "database",
                "import",
                "full",
                "neo4j",
                "--overwrite-destination",
                "--nodes=out/nodes_neo4j.csv",
                "--relationships=out/relationships_neo4j.csv",
                "--trim-strings=true",
                "--array-delimiter=;",
                "--max-off-heap-memory=1G",
            ]
        );
    }

    #[test]
    fn test_no_overwrite_flag() {
        let options = ImportOptions {
            overwrite: false,
            database: "kg".into(),
            ..ImportOptions::default()
        };
        let args = AdminImport::new(Path::new("n.csv"), Path::new("r.csv"), options).args();
        assert_eq!(args[3], "kg");
        assert!(!args.iter().any(|a| a == "--overwrite-destination"));
    }

    #[test]
    fn test_missing_binary_is_127() {
        let outcome = import()
            .with_binary("neo4j-admin-definitely-not-installed")
            .run()
            .unwrap();
        assert_eq!(outcome, ImportOutcome::NotFound);
        assert_eq!(outcome.exit_code(), 127);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_propagates() {
        assert_eq!(import().with_binary("true").run().unwrap(), ImportOutcome::Completed);
        assert_eq!(import().with_binary("false").run().unwrap(), ImportOutcome::Failed(1));
    }
}
