use serde::{Deserialize, Serialize};

/// Upstream knowledge graph a record was read from.
///
/// Variant order matches the byte order of [`SourceKind::as_str`], so sorted
/// source sets serialize the same way as sorted names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "BioKDE")]
    BioKde,
    #[serde(rename = "PrimeKG")]
    PrimeKg,
    #[serde(rename = "SemMedDB")]
    SemMedDb,
    #[serde(rename = "iKraph")]
    IKraph,
}

impl SourceKind {
    pub const ALL: [Self; 4] = [Self::SemMedDb, Self::PrimeKg, Self::IKraph, Self::BioKde];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BioKde => "BioKDE",
            Self::PrimeKg => "PrimeKG",
            Self::SemMedDb => "SemMedDB",
            Self::IKraph => "iKraph",
        }
    }

    /// CURIE prefix used for ids minted from this source's local identifiers.
    #[must_use]
    pub const fn curie_prefix(&self) -> &'static str {
        match self {
            Self::BioKde => "BIOKDE",
            Self::PrimeKg => "PRIMEKG",
            Self::SemMedDb => "SEMMEDDB",
            Self::IKraph => "IKRAPH",
        }
    }

    /// Knowledge-source CURIE, e.g. `PRIMEKG:`.
    #[must_use]
    pub fn provided_by(&self) -> String {
        format!("{}:", self.curie_prefix())
    }

    #[must_use]
    pub const fn base_iri(&self) -> &'static str {
        match self {
            Self::BioKde => "https://biokde.insilicom.com/",
            Self::PrimeKg => "https://primekg.ethz.ch/",
            Self::SemMedDb => "https://lhncbc.nlm.nih.gov/ii/tools/SemRep_SemMedDB_SKR.html",
            Self::IKraph => "https://ikraph.insilicom.com/",
        }
    }

    #[must_use]
    pub const fn full_name(&self) -> &'static str {
        match self {
            Self::BioKde => "BioKDE Knowledge Graph",
            Self::PrimeKg => "PrimeKG Knowledge Graph",
            Self::SemMedDb => "Semantic Medline Database (SemMedDB)",
            Self::IKraph => "iKraph Knowledge Graph",
        }
    }

    /// Stem used for staging file names.
    #[must_use]
    pub const fn file_stem(&self) -> &'static str {
        match self {
            Self::BioKde => "biokde",
            Self::PrimeKg => "primekg",
            Self::SemMedDb => "semmeddb",
            Self::IKraph => "ikraph",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "biokde" => Ok(Self::BioKde),
            "primekg" => Ok(Self::PrimeKg),
            "semmeddb" => Ok(Self::SemMedDb),
            "ikraph" => Ok(Self::IKraph),
            _ => Err(crate::Error::InvalidSource(s.to_string())),
        }
    }
}
