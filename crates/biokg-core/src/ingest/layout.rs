//! Column layouts for sources whose upstream format varies between dumps.

use serde::{Deserialize, Serialize};

/// Column positions in a SemMedDB entity line, counted after splitting on
/// `","`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemMedDbLayout {
    #[serde(default)]
    pub entity_id: Option<usize>,
    pub cui: usize,
    pub name: usize,
    pub semantic_type: usize,
    #[serde(default)]
    pub definition: Option<usize>,
    #[serde(default)]
    pub aliases: Option<usize>,
    #[serde(default)]
    pub frequency: Option<usize>,
    #[serde(default)]
    pub score: Option<usize>,
    pub min_fields: usize,
}

impl SemMedDbLayout {
    /// `entity_id,cui,name,semantic_type,definition,aliases,source,frequency,score,rank`
    pub const DEFINITION: Self = Self {
        entity_id: Some(0),
        cui: 1,
        name: 2,
        semantic_type: 3,
        definition: Some(4),
        aliases: Some(5),
        frequency: Some(7),
        score: Some(8),
        min_fields: 10,
    };

    /// `entity_id,cui,numeric_id,semantic_type,name,aliases,source,frequency,score,rank`
    pub const NUMERIC_ID: Self = Self {
        entity_id: Some(0),
        cui: 1,
        name: 4,
        semantic_type: 3,
        definition: None,
        aliases: Some(5),
        frequency: Some(7),
        score: Some(8),
        min_fields: 10,
    };

    /// `CUI,name,type,score,aliases,freq1,freq2,start,end,rank,label`
    pub const CONCEPT: Self = Self {
        entity_id: None,
        cui: 0,
        name: 1,
        semantic_type: 2,
        definition: None,
        aliases: Some(4),
        frequency: Some(5),
        score: Some(3),
        min_fields: 11,
    };

    /// Highest column index referenced, which must be below `min_fields`.
    #[must_use]
    pub fn max_column(&self) -> usize {
        [
            self.entity_id,
            Some(self.cui),
            Some(self.name),
            Some(self.semantic_type),
            self.definition,
            self.aliases,
            self.frequency,
            self.score,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.max_column() >= self.min_fields {
            return Err(crate::Error::InvalidLayout(format!(
                "column {} is outside min_fields {}",
                self.max_column(),
                self.min_fields
            )));
        }
        Ok(())
    }
}

impl Default for SemMedDbLayout {
    fn default() -> Self {
        Self::NUMERIC_ID
    }
}

impl std::str::FromStr for SemMedDbLayout {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "definition" => Ok(Self::DEFINITION),
            "numeric-id" | "numeric_id" => Ok(Self::NUMERIC_ID),
            "concept" => Ok(Self::CONCEPT),
            _ => Err(crate::Error::InvalidLayout(s.to_string())),
        }
    }
}

/// Header names for the BioKDE node table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BioKdeColumns {
    pub id: String,
    pub name: String,
    pub node_type: String,
}

impl Default for BioKdeColumns {
    fn default() -> Self {
        Self {
            id: ":ID".to_string(),
            name: "name".to_string(),
            node_type: ":LABEL".to_string(),
        }
    }
}

/// File names inside an iKraph dump directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IKraphFiles {
    pub nodes: Vec<String>,
    pub relationships: Vec<String>,
}

impl Default for IKraphFiles {
    fn default() -> Self {
        let nodes = [
            "gene",
            "disease",
            "chemical",
            "anatomy",
            "biological process",
            "cellular component",
            "molecular function",
            "pathway",
            "pharmacologic class",
            "species",
            "cellline",
            "dnamutation",
        ];
        Self {
            nodes: nodes.iter().map(|n| format!("nodes_{n}.csv.gz")).collect(),
            relationships: vec![
                "relationships_db.mapped.csv.gz".to_string(),
                "relationships_pubmed.mapped.csv.gz".to_string(),
            ],
        }
    }
}
