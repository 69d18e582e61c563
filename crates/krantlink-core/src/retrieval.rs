//! Candidate retrieval: a sequence of increasingly lax queries against the
//! description index, paginated until the row budget is filled. A second
//! iteration retries with a spelling-substituted head mention when the
//! first found nothing.

use std::collections::HashSet;

use krantlink_kb::KbDocument;
use krantlink_model::{FeatureVector, Model};

use crate::LinkError;
use crate::mention::Mention;
use crate::remote::DescriptionIndex;
use crate::text::{normalize, tokenize};

/// One retrieved description with its scoring bookkeeping.
#[derive(Debug)]
pub struct Candidate {
    pub document: KbDocument,
    /// 0 = original head, 1 = spelling-substituted head.
    pub iteration: u8,
    /// Which of the four query variants produced the document.
    pub query_variant: u8,
    pub prob: f64,
    pub features: FeatureVector,
    /// Labels that have not matched the mention (rule-feature state).
    pub(crate) non_matching: Vec<String>,
    abstract_bow: Option<Vec<String>>,
}

impl Candidate {
    pub fn new(document: KbDocument, iteration: u8, query_variant: u8) -> Self {
        Self {
            document,
            iteration,
            query_variant,
            prob: 0.0,
            features: FeatureVector::default(),
            non_matching: Vec::new(),
            abstract_bow: None,
        }
    }

    /// Distinct normalised words of the abstract, in first-occurrence order.
    pub(crate) fn abstract_bow(&mut self) -> &[String] {
        if self.abstract_bow.is_none() {
            let mut seen = HashSet::new();
            let mut bow = Vec::new();
            if let Some(text) = &self.document.abstract_text {
                for token in tokenize(text) {
                    for word in normalize(&token).split_whitespace() {
                        if seen.insert(word.to_string()) {
                            bow.push(word.to_string());
                        }
                    }
                }
            }
            self.abstract_bow = Some(bow);
        }
        self.abstract_bow.as_deref().unwrap_or_default()
    }
}

/// The candidates for one cluster, with the filtered and ranked views and
/// the aggregates shared by the probability features.
#[derive(Debug, Default)]
pub struct CandidateList {
    pub candidates: Vec<Candidate>,
    pub queries: Vec<String>,
    /// Indices of candidates passing the hard filter.
    pub filtered: Vec<usize>,
    /// Filtered indices sorted by probability, descending.
    pub ranked: Vec<usize>,
    max_score: Option<f64>,
    sum_inlinks: Option<i64>,
    sum_inlinks_newspapers: Option<i64>,
}

impl CandidateList {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Maximum index score among the filtered candidates.
    pub(crate) fn max_score(&mut self) -> f64 {
        if self.max_score.is_none() {
            let max = self
                .filtered
                .iter()
                .filter_map(|&i| self.candidates[i].document.score)
                .fold(0.0, f64::max);
            self.max_score = Some(max);
        }
        self.max_score.unwrap_or(0.0)
    }

    pub(crate) fn sum_inlinks(&mut self) -> i64 {
        if self.sum_inlinks.is_none() {
            let sum = self
                .filtered
                .iter()
                .filter_map(|&i| self.candidates[i].document.inlinks)
                .sum();
            self.sum_inlinks = Some(sum);
        }
        self.sum_inlinks.unwrap_or(0)
    }

    pub(crate) fn sum_inlinks_newspapers(&mut self) -> i64 {
        if self.sum_inlinks_newspapers.is_none() {
            let sum = self
                .filtered
                .iter()
                .filter_map(|&i| self.candidates[i].document.inlinks_newspapers)
                .sum();
            self.sum_inlinks_newspapers = Some(sum);
        }
        self.sum_inlinks_newspapers.unwrap_or(0)
    }

    /// Predict a probability for every filtered candidate and sort them,
    /// best first. Ties keep retrieval order.
    pub(crate) fn rank(&mut self, model: &dyn Model) {
        for &ci in &self.filtered {
            let example = self.candidates[ci].features.example(model.schema());
            self.candidates[ci].prob = model.predict(&example);
        }
        let mut ranked = self.filtered.clone();
        ranked.sort_by(|&a, &b| {
            self.candidates[b]
                .prob
                .partial_cmp(&self.candidates[a].prob)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.ranked = ranked;
    }
}

/// The four query variants for a head mention, in order of strictness.
fn build_queries(head: &Mention) -> [String; 4] {
    let norm = &head.norm;
    let stripped = &head.stripped;
    let last_part = &head.last_part;
    [
        format!("pref_label_str:\"{norm}\" OR pref_label_str:\"{stripped}\""),
        format!("alt_label_str:\"{norm}\" OR alt_label_str:\"{stripped}\""),
        format!("pref_label:\"{norm}\" OR pref_label:\"{stripped}\""),
        format!("last_part_str:\"{last_part}\""),
    ]
}

/// Retrieve candidates for the cluster head.
///
/// Iteration 0 uses the head as-is; iteration 1 requires a successful
/// spelling substitution. Documents are deduplicated by id; retrieval stops
/// once the budget is reached or an iteration produced candidates.
pub(crate) async fn retrieve(
    head: &mut Mention,
    index: &dyn DescriptionIndex,
    budget: usize,
) -> Result<CandidateList, LinkError> {
    let mut list = CandidateList::default();
    let mut seen: HashSet<String> = HashSet::new();

    for iteration in 0..2u8 {
        if !list.candidates.is_empty() {
            break;
        }
        if iteration == 1 && !head.substitute() {
            break;
        }

        let queries = build_queries(head);
        list.queries = queries.to_vec();

        for (variant, query) in queries.iter().enumerate() {
            if list.candidates.len() >= budget {
                break;
            }
            let rows = budget - list.candidates.len();
            let documents = index.query(query, rows).await?;
            tracing::debug!(query = %query, hits = documents.len(), "retrieval query");

            for document in documents {
                if seen.insert(document.id.clone()) {
                    list.candidates
                        .push(Candidate::new(document, iteration, variant as u8));
                }
            }
        }
    }

    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_follow_the_fixed_order() {
        let ocr = "De heer Kennedy sprak.";
        let head = Mention::new("Kennedy", None, ocr, 0);
        let queries = build_queries(&head);
        assert_eq!(
            queries[0],
            "pref_label_str:\"kennedy\" OR pref_label_str:\"kennedy\""
        );
        assert!(queries[1].starts_with("alt_label_str:"));
        assert!(queries[2].starts_with("pref_label:"));
        assert_eq!(queries[3], "last_part_str:\"kennedy\"");
    }

    #[test]
    fn abstract_bow_dedupes_in_order() {
        let doc = KbDocument {
            id: "x".into(),
            pref_label: "x".into(),
            abstract_text: Some("De dirigent, de dirigent van het orkest.".into()),
            ..Default::default()
        };
        let mut cand = Candidate::new(doc, 0, 0);
        assert_eq!(
            cand.abstract_bow(),
            ["de", "dirigent", "van", "het", "orkest"]
        );
    }
}
