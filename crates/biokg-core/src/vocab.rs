//! Ordered lookup tables shared by the readers and writers.
//!
//! Every keyword table here is scanned top to bottom and the first hit wins,
//! so entry order is part of the output contract.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    NamedThing,
    AnatomicalEntity,
    OrganismTaxon,
    ChemicalEntity,
    Disease,
    Drug,
    Gene,
    Protein,
    Pathway,
    PhenotypicFeature,
    BiologicalProcess,
    CellularComponent,
    MolecularFunction,
    Cell,
    SequenceVariant,
    RetrievalSource,
}

impl Category {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NamedThing => "named_thing",
            Self::AnatomicalEntity => "anatomical_entity",
            Self::OrganismTaxon => "organism_taxon",
            Self::ChemicalEntity => "chemical_entity",
            Self::Disease => "disease",
            Self::Drug => "drug",
            Self::Gene => "gene",
            Self::Protein => "protein",
            Self::Pathway => "pathway",
            Self::PhenotypicFeature => "phenotypic_feature",
            Self::BiologicalProcess => "biological_process",
            Self::CellularComponent => "cellular_component",
            Self::MolecularFunction => "molecular_function",
            Self::Cell => "cell",
            Self::SequenceVariant => "sequence_variant",
            Self::RetrievalSource => "retrieval_source",
        }
    }

    #[must_use]
    pub const fn curie(&self) -> &'static str {
        match self {
            Self::NamedThing => "biolink:NamedThing",
            Self::AnatomicalEntity => "biolink:AnatomicalEntity",
            Self::OrganismTaxon => "biolink:OrganismTaxon",
            Self::ChemicalEntity => "biolink:ChemicalEntity",
            Self::Disease => "biolink:Disease",
            Self::Drug => "biolink:Drug",
            Self::Gene => "biolink:Gene",
            Self::Protein => "biolink:Protein",
            Self::Pathway => "biolink:Pathway",
            Self::PhenotypicFeature => "biolink:PhenotypicFeature",
            Self::BiologicalProcess => "biolink:BiologicalProcess",
            Self::CellularComponent => "biolink:CellularComponent",
            Self::MolecularFunction => "biolink:MolecularFunction",
            Self::Cell => "biolink:Cell",
            Self::SequenceVariant => "biolink:SequenceVariant",
            Self::RetrievalSource => "biolink:RetrievalSource",
        }
    }

    #[must_use]
    pub const fn is_specific(&self) -> bool {
        !matches!(self, Self::NamedThing)
    }

    /// Category for a SemMedDB/UMLS semantic type abbreviation.
    #[must_use]
    pub fn from_semantic_type(semantic_type: &str) -> Self {
        let wanted = semantic_type.trim().to_ascii_lowercase();
        SEMANTIC_TYPE_CATEGORIES
            .iter()
            .find(|(abbrev, _)| *abbrev == wanted)
            .map_or(Self::NamedThing, |(_, category)| *category)
    }

    /// Category for a PrimeKG `node_type` value.
    #[must_use]
    pub fn from_primekg_type(node_type: &str) -> Self {
        let wanted = node_type.trim().to_ascii_lowercase();
        PRIMEKG_TYPE_CATEGORIES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map_or(Self::NamedThing, |(_, category)| *category)
    }

    /// Category for free-form type strings (iKraph, BioKDE), derived from the
    /// node label rules.
    #[must_use]
    pub fn from_type_keywords(node_type: &str) -> Self {
        match NodeLabel::for_type(node_type) {
            NodeLabel::Gene => Self::Gene,
            NodeLabel::Disease => Self::Disease,
            NodeLabel::Chemical => Self::ChemicalEntity,
            NodeLabel::Anatomy => Self::AnatomicalEntity,
            NodeLabel::Pathway => Self::Pathway,
            NodeLabel::Species => Self::OrganismTaxon,
            NodeLabel::Cell => Self::Cell,
            NodeLabel::Mutation => Self::SequenceVariant,
            NodeLabel::BiologicalProcess => Self::BiologicalProcess,
            NodeLabel::CellularComponent => Self::CellularComponent,
            NodeLabel::MolecularFunction => Self::MolecularFunction,
            NodeLabel::PharmacologicClass => Self::Drug,
            NodeLabel::Entity => Self::NamedThing,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

const SEMANTIC_TYPE_CATEGORIES: &[(&str, Category)] = &[
    ("aapp", Category::AnatomicalEntity),
    ("bact", Category::OrganismTaxon),
    ("bpoc", Category::AnatomicalEntity),
    ("chem", Category::ChemicalEntity),
    ("diap", Category::Disease),
    ("drdd", Category::Drug),
    ("dsyn", Category::Disease),
    ("ftcn", Category::NamedThing),
    ("gngm", Category::Gene),
    ("imft", Category::Drug),
    ("lbpr", Category::NamedThing),
    ("mobd", Category::Disease),
    ("neop", Category::Disease),
    ("npop", Category::NamedThing),
    ("orga", Category::OrganismTaxon),
    ("phsu", Category::Drug),
    ("sosy", Category::Disease),
    ("virs", Category::OrganismTaxon),
];

const PRIMEKG_TYPE_CATEGORIES: &[(&str, Category)] = &[
    ("gene/protein", Category::Gene),
    ("drug", Category::Drug),
    ("disease", Category::Disease),
    ("side_effect", Category::Disease),
    ("indication", Category::Disease),
    ("contraindication", Category::Disease),
    ("off_label_use", Category::Disease),
    ("pathway", Category::Pathway),
    ("protein", Category::Protein),
    ("anatomy", Category::AnatomicalEntity),
    ("symptom", Category::Disease),
    ("phenotype", Category::PhenotypicFeature),
];

/// Primary graph-database label derived from a node's type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Gene,
    Disease,
    Chemical,
    Anatomy,
    Pathway,
    Species,
    Cell,
    Mutation,
    BiologicalProcess,
    CellularComponent,
    MolecularFunction,
    PharmacologicClass,
    Entity,
}

// `cell` precedes `cellular component`, and `mutation` precedes
// `dna mutation`; the later entries are unreachable but kept so the table
// reproduces the established labels exactly.
const NODE_LABEL_RULES: &[(&[&str], NodeLabel)] = &[
    (&["gene", "protein"], NodeLabel::Gene),
    (&["disease"], NodeLabel::Disease),
    (&["chemical", "drug"], NodeLabel::Chemical),
    (&["anatomy"], NodeLabel::Anatomy),
    (&["pathway"], NodeLabel::Pathway),
    (&["species"], NodeLabel::Species),
    (&["cell"], NodeLabel::Cell),
    (&["mutation"], NodeLabel::Mutation),
    (&["biological process"], NodeLabel::BiologicalProcess),
    (&["cellular component"], NodeLabel::CellularComponent),
    (&["molecular function"], NodeLabel::MolecularFunction),
    (&["pharmacologic class"], NodeLabel::PharmacologicClass),
    (&["dna mutation"], NodeLabel::Mutation),
];

impl NodeLabel {
    #[must_use]
    pub fn for_type(node_type: &str) -> Self {
        let lowered = node_type.to_lowercase();
        first_keyword_match(&lowered, NODE_LABEL_RULES).unwrap_or(Self::Entity)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gene => "Gene",
            Self::Disease => "Disease",
            Self::Chemical => "Chemical",
            Self::Anatomy => "Anatomy",
            Self::Pathway => "Pathway",
            Self::Species => "Species",
            Self::Cell => "Cell",
            Self::Mutation => "Mutation",
            Self::BiologicalProcess => "BiologicalProcess",
            Self::CellularComponent => "CellularComponent",
            Self::MolecularFunction => "MolecularFunction",
            Self::PharmacologicClass => "PharmacologicClass",
            Self::Entity => "Entity",
        }
    }
}

/// Coarse relationship type used as the graph-database edge type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationCategory {
    ProteinInteraction,
    Regulates,
    Interacts,
    Association,
    Causes,
    Treats,
    Correlation,
    Participates,
    Binds,
    Localizes,
    Presents,
    Resembles,
    Palliates,
    Includes,
    Covaries,
    NegativeCorrelation,
    PositiveCorrelation,
    Relationship,
}

const RELATION_RULES: &[(&[&str], RelationCategory)] = &[
    (&["ppi", "protein"], RelationCategory::ProteinInteraction),
    (&["regulates"], RelationCategory::Regulates),
    (&["interacts"], RelationCategory::Interacts),
    (&["association"], RelationCategory::Association),
    (&["causes"], RelationCategory::Causes),
    (&["treats"], RelationCategory::Treats),
    (&["correlation"], RelationCategory::Correlation),
    (&["participates"], RelationCategory::Participates),
    (&["binds"], RelationCategory::Binds),
    (&["localizes"], RelationCategory::Localizes),
    (&["presents"], RelationCategory::Presents),
    (&["resembles"], RelationCategory::Resembles),
    (&["palliates"], RelationCategory::Palliates),
    (&["includes"], RelationCategory::Includes),
    (&["covaries"], RelationCategory::Covaries),
    (&["negative"], RelationCategory::NegativeCorrelation),
    (&["positive"], RelationCategory::PositiveCorrelation),
];

impl RelationCategory {
    #[must_use]
    pub fn classify(relation: &str) -> Self {
        let lowered = relation.to_lowercase();
        first_keyword_match(&lowered, RELATION_RULES).unwrap_or(Self::Relationship)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProteinInteraction => "PROTEIN_INTERACTION",
            Self::Regulates => "REGULATES",
            Self::Interacts => "INTERACTS",
            Self::Association => "ASSOCIATION",
            Self::Causes => "CAUSES",
            Self::Treats => "TREATS",
            Self::Correlation => "CORRELATION",
            Self::Participates => "PARTICIPATES",
            Self::Binds => "BINDS",
            Self::Localizes => "LOCALIZES",
            Self::Presents => "PRESENTS",
            Self::Resembles => "RESEMBLES",
            Self::Palliates => "PALLIATES",
            Self::Includes => "INCLUDES",
            Self::Covaries => "COVARIES",
            Self::NegativeCorrelation => "NEGATIVE_CORRELATION",
            Self::PositiveCorrelation => "POSITIVE_CORRELATION",
            Self::Relationship => "RELATIONSHIP",
        }
    }
}

impl std::fmt::Display for RelationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn first_keyword_match<T: Copy>(haystack: &str, rules: &[(&[&str], T)]) -> Option<T> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(_, value)| *value)
}
