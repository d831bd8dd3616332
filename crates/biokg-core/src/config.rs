use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::import::ImportOptions;
use crate::ingest::{BioKdeColumns, IKraphFiles, SemMedDbLayout};
use crate::output::OutputFormat;

/// Records per stream when running in test mode.
pub const TEST_LIMIT: u64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemMedDbConfig {
    pub entities: Option<PathBuf>,
    pub connections: Option<PathBuf>,
    /// Preset name: `definition`, `numeric-id` or `concept`.
    pub layout: Option<String>,
    /// Explicit column positions; wins over `layout`.
    pub columns: Option<SemMedDbLayout>,
}

impl SemMedDbConfig {
    pub fn resolved_layout(&self) -> Result<SemMedDbLayout> {
        let layout = match (&self.columns, &self.layout) {
            (Some(columns), _) => *columns,
            (None, Some(name)) => name.parse()?,
            (None, None) => SemMedDbLayout::default(),
        };
        layout.validate()?;
        Ok(layout)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimeKgConfig {
    pub nodes: Option<PathBuf>,
    pub edges: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IKraphConfig {
    pub dir: Option<PathBuf>,
    pub files: IKraphFiles,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BioKdeConfig {
    pub nodes: Option<PathBuf>,
    pub edges: Option<PathBuf>,
    pub columns: BioKdeColumns,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jImportConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub options: ImportOptions,
}

/// Settings for a full merge run.
///
/// Layered lowest to highest: defaults, config file, environment, then
/// whatever the command line sets on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub limit: Option<u64>,
    pub test: bool,
    pub source_nodes: bool,
    /// Precomputed `final_mapping` file seeding the identifier table.
    pub mapping: Option<PathBuf>,
    /// Where to export the identifier table after the node phase.
    pub mapping_out: Option<PathBuf>,
    pub semmeddb: SemMedDbConfig,
    pub primekg: PrimeKgConfig,
    pub ikraph: IKraphConfig,
    pub biokde: BioKdeConfig,
    pub neo4j: Neo4jImportConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("merged_output"),
            format: OutputFormat::default(),
            limit: None,
            test: false,
            source_nodes: true,
            mapping: None,
            mapping_out: None,
            semmeddb: SemMedDbConfig::default(),
            primekg: PrimeKgConfig::default(),
            ikraph: IKraphConfig::default(),
            biokde: BioKdeConfig::default(),
            neo4j: Neo4jImportConfig::default(),
        }
    }
}

impl MergeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `$XDG_CONFIG_HOME/biokg/config.toml` or the platform equivalent.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("biokg").join("config.toml"))
    }

    /// Load an explicit config file, else the default one if present, else
    /// built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!("Loading config from {}", path.display());
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn with_env_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = var("BIOKG_OUTPUT_DIR").filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(limit) = var("BIOKG_LIMIT").and_then(|v| v.trim().parse().ok()) {
            self.limit = Some(limit);
        }
        if let Some(test) = var("BIOKG_TEST") {
            self.test = test == "1" || test.eq_ignore_ascii_case("true");
        }
        self
    }

    /// Per-stream record ceiling: an explicit limit wins over test mode.
    #[must_use]
    pub const fn record_limit(&self) -> Option<u64> {
        resolve_limit(self.limit, self.test)
    }
}

#[must_use]
pub const fn resolve_limit(limit: Option<u64>, test: bool) -> Option<u64> {
    match (limit, test) {
        (Some(n), _) => Some(n),
        (None, true) => Some(TEST_LIMIT),
        (None, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_limit_resolution() {
        assert_eq!(resolve_limit(Some(5), true), Some(5));
        assert_eq!(resolve_limit(None, true), Some(TEST_LIMIT));
        assert_eq!(resolve_limit(None, false), None);
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
output_dir = "out"
format = "neo4j"
test = true

[semmeddb]
entities = "/data/semmeddb/concept.csv.gz"
layout = "concept"

[ikraph]
dir = "/data/ikraph"
files = { nodes = ["nodes_gene.csv.gz"], relationships = ["rels.csv.gz"] }

[biokde.columns]
id = "uri"

[neo4j]
enabled = true
database = "kg"
"#,
        )
        .unwrap();

        let config = MergeConfig::load(&path).unwrap();
        assert_eq!(config.format, OutputFormat::Neo4j);
        assert_eq!(config.record_limit(), Some(TEST_LIMIT));
        assert_eq!(config.semmeddb.resolved_layout().unwrap(), SemMedDbLayout::CONCEPT);
        assert_eq!(config.ikraph.files.nodes, vec!["nodes_gene.csv.gz"]);
        assert_eq!(config.biokde.columns.id, "uri");
        assert_eq!(config.biokde.columns.name, "name");
        assert!(config.neo4j.enabled);
        assert_eq!(config.neo4j.options.database, "kg");
        assert_eq!(config.neo4j.options.max_off_heap_memory, "1G");
        assert!(config.source_nodes);
    }

    #[test]
    fn test_bad_toml_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "format = [").unwrap();
        let err = MergeConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BIOKG_OUTPUT_DIR", "/tmp/kg"),
            ("BIOKG_LIMIT", "25"),
            ("BIOKG_TEST", "true"),
        ]);
        let config =
            MergeConfig::default().with_env_from(|k| env.get(k).map(ToString::to_string));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/kg"));
        assert_eq!(config.limit, Some(25));
        assert!(config.test);
        assert_eq!(config.record_limit(), Some(25));
    }

    #[test]
    fn test_explicit_columns_win() {
        let config = SemMedDbConfig {
            layout: Some("concept".into()),
            columns: Some(SemMedDbLayout::DEFINITION),
            ..SemMedDbConfig::default()
        };
        assert_eq!(config.resolved_layout().unwrap(), SemMedDbLayout::DEFINITION);

        let bad = SemMedDbConfig {
            layout: Some("v9".into()),
            ..SemMedDbConfig::default()
        };
        assert!(bad.resolved_layout().is_err());
    }
}
