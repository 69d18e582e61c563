//! Feature schema and trained ranking models.
//!
//! The model publishes an ordered list of feature names; feature extraction
//! computes exactly those and `predict` consumes them in that order. Feature
//! names are checked against the compile-time [`Feature`] enumeration at
//! load time, so a weight file naming an unknown feature fails fast instead
//! of silently scoring zeros.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

mod models;

pub use models::{BranchingNeuralNet, Layer, LinearSvm, LogisticRegression, NeuralNet};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("weight file parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown feature name: {0}")]
    UnknownFeature(String),
    #[error("duplicate feature name: {0}")]
    DuplicateFeature(String),
    #[error("weight shape mismatch: {0}")]
    Shape(String),
}

macro_rules! features {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Every feature the extraction layer knows how to compute.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(usize)]
        pub enum Feature {
            $($variant),+
        }

        impl Feature {
            pub const ALL: &'static [Feature] = &[$(Feature::$variant),+];
            pub const COUNT: usize = Feature::ALL.len();

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Feature::$variant => $name),+
                }
            }

            pub fn from_name(name: &str) -> Option<Feature> {
                match name {
                    $($name => Some(Feature::$variant)),+,
                    _ => None,
                }
            }
        }
    };
}

features! {
    MatchTxtDate => "match_txt_date",
    MatchStrPrefLabelExact => "match_str_pref_label_exact",
    MatchStrPrefLabelEnd => "match_str_pref_label_end",
    MatchStrPrefLabel => "match_str_pref_label",
    MatchStrAltLabelExact => "match_str_alt_label_exact",
    MatchStrAltLabelEnd => "match_str_alt_label_end",
    MatchStrAltLabel => "match_str_alt_label",
    MatchStrLastPart => "match_str_last_part",
    MatchStrFirstPart => "match_str_first_part",
    MatchStrNonMatching => "match_str_non_matching",
    MatchStrConflict => "match_str_conflict",
    EntityQuotes => "entity_quotes",
    EntityTypePerson => "entity_type_person",
    EntityTypeLocation => "entity_type_location",
    EntityTypeOrganisation => "entity_type_organisation",
    EntityTypeOther => "entity_type_other",
    CandidateInlinks => "candidate_inlinks",
    CandidateInlinksRel => "candidate_inlinks_rel",
    CandidateInlinksNewspapers => "candidate_inlinks_newspapers",
    CandidateInlinksNewspapersRel => "candidate_inlinks_newspapers_rel",
    CandidateAmbig => "candidate_ambig",
    CandidateLang => "candidate_lang",
    CandidateTypePerson => "candidate_type_person",
    CandidateTypeLocation => "candidate_type_location",
    CandidateTypeOrganisation => "candidate_type_organisation",
    MatchStrLsrPref => "match_str_lsr_pref",
    MatchStrLsrWdMax => "match_str_lsr_wd_max",
    MatchStrLsrWdMean => "match_str_lsr_wd_mean",
    MatchStrLsrAltMax => "match_str_lsr_alt_max",
    MatchStrLsrAltMean => "match_str_lsr_alt_mean",
    MatchStrSolrQuery0 => "match_str_solr_query_0",
    MatchStrSolrQuery1 => "match_str_solr_query_1",
    MatchStrSolrQuery2 => "match_str_solr_query_2",
    MatchStrSolrQuery3 => "match_str_solr_query_3",
    MatchStrSolrSubstitution => "match_str_solr_substitution",
    MatchStrSolrPosition => "match_str_solr_position",
    MatchStrSolrScore => "match_str_solr_score",
    MatchTxtType => "match_txt_type",
    MatchTxtRole => "match_txt_role",
    MatchTxtSpec => "match_txt_spec",
    MatchTxtKeyword => "match_txt_keyword",
    MatchTxtSubject => "match_txt_subject",
    MatchTxtVecMax => "match_txt_vec_max",
    MatchTxtVecMean => "match_txt_vec_mean",
    MatchTxtEntities => "match_txt_entities",
    MatchTxtEntitiesNewspapers => "match_txt_entities_newspapers",
    MatchTxtEntityVecMax => "match_txt_entity_vec_max",
    MatchTxtEntityVecMean => "match_txt_entity_vec_mean",
}

impl Feature {
    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered list of features a model was trained on.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    order: Vec<Feature>,
    declared: [bool; Feature::COUNT],
}

impl FeatureSchema {
    pub fn new(order: Vec<Feature>) -> Result<Self, ModelError> {
        let mut declared = [false; Feature::COUNT];
        for f in &order {
            if declared[f.index()] {
                return Err(ModelError::DuplicateFeature(f.as_str().to_string()));
            }
            declared[f.index()] = true;
        }
        Ok(Self { order, declared })
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ModelError> {
        let order = names
            .iter()
            .map(|n| {
                Feature::from_name(n.as_ref())
                    .ok_or_else(|| ModelError::UnknownFeature(n.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(order)
    }

    /// A schema declaring every known feature, in enumeration order.
    pub fn full() -> Self {
        Self {
            order: Feature::ALL.to_vec(),
            declared: [true; Feature::COUNT],
        }
    }

    pub fn contains(&self, f: Feature) -> bool {
        self.declared[f.index()]
    }

    /// Whether any declared feature name starts with the given prefix.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.order.iter().any(|f| f.as_str().starts_with(prefix))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.order.iter().copied()
    }
}

/// Feature values for one candidate. Every known feature starts at 0.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    values: [f64; Feature::COUNT],
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: [0.0; Feature::COUNT],
        }
    }
}

impl FeatureVector {
    pub fn get(&self, f: Feature) -> f64 {
        self.values[f.index()]
    }

    pub fn set(&mut self, f: Feature, value: f64) {
        self.values[f.index()] = value;
    }

    pub fn add(&mut self, f: Feature, delta: f64) {
        self.values[f.index()] += delta;
    }

    /// The model input: declared feature values in schema order.
    pub fn example(&self, schema: &FeatureSchema) -> Vec<f64> {
        schema.iter().map(|f| self.get(f)).collect()
    }

    /// Name→value map of the declared features, for reporting.
    pub fn snapshot(&self, schema: &FeatureSchema) -> HashMap<String, f64> {
        schema
            .iter()
            .map(|f| (f.as_str().to_string(), self.get(f)))
            .collect()
    }
}

/// A trained candidate-ranking model.
pub trait Model: Send + Sync {
    /// The features the model consumes, in input order.
    fn schema(&self) -> &FeatureSchema;

    /// Probability in [0, 1] that the candidate is the correct link.
    fn predict(&self, example: &[f64]) -> f64;
}

/// Load a model from a JSON weight file.
pub fn load_model(path: &Path) -> Result<Box<dyn Model>, ModelError> {
    let content = std::fs::read_to_string(path)?;
    model_from_json(&content)
}

/// Parse a model from JSON weight-file contents.
pub fn model_from_json(json: &str) -> Result<Box<dyn Model>, ModelError> {
    models::from_json(json)
}
