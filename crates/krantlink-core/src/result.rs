//! Link results: the per-cluster outcome and the externally visible JSON
//! response shape.

use std::collections::HashMap;

use serde::Serialize;

use krantlink_kb::KbDocument;
use krantlink_model::FeatureSchema;

use crate::retrieval::{Candidate, CandidateList};

/// The outcome of linking one cluster.
#[derive(Debug, Default)]
pub struct ClusterResult {
    pub reason: String,
    pub prob: f64,
    /// Index of the chosen candidate in the list, if any.
    pub best: Option<usize>,
    pub list: Option<CandidateList>,
}

impl ClusterResult {
    pub fn simple(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Default::default()
        }
    }

    pub fn with_list(
        reason: impl Into<String>,
        prob: f64,
        best: Option<usize>,
        list: CandidateList,
    ) -> Self {
        Self {
            reason: reason.into(),
            prob,
            best,
            list: Some(list),
        }
    }

    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.best
            .and_then(|i| self.list.as_ref().and_then(|l| l.candidates.get(i)))
    }

    /// Build the record for one mention surface form.
    pub fn record(
        &self,
        text: &str,
        min_prob: f64,
        schema: &FeatureSchema,
        include_features: bool,
        include_candidates: bool,
    ) -> LinkedRecord {
        let best = self.best_candidate();

        let mut record = LinkedRecord {
            text: text.to_string(),
            reason: self.reason.clone(),
            prob: (self.prob > 0.0).then_some(self.prob),
            link: None,
            label: None,
            features: None,
            candidates: None,
        };

        if let Some(best) = best {
            if self.prob >= min_prob {
                record.link = Some(best.document.id.clone());
                // The label field is optional on index documents; absent
                // stays absent.
                record.label = best.document.label.clone();
            }
            if include_features {
                record.features = Some(best.features.snapshot(schema));
            }
        }

        if include_candidates
            && let Some(list) = &self.list
            && !list.candidates.is_empty()
        {
            record.candidates = Some(
                list.candidates
                    .iter()
                    .map(|c| CandidateRecord {
                        id: c.document.id.clone(),
                        prob: c.prob,
                        features: c.features.snapshot(schema),
                        document: c.document.clone(),
                    })
                    .collect(),
            );
        }

        record
    }
}

/// One emitted per-mention record.
#[derive(Debug, Clone, Serialize)]
pub struct LinkedRecord {
    pub text: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prob: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<HashMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<CandidateRecord>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateRecord {
    pub id: String,
    pub prob: f64,
    pub features: HashMap<String, f64>,
    pub document: KbDocument,
}

/// The response envelope: `{status, message?, linkedNEs?}`.
#[derive(Debug, Clone, Serialize)]
pub struct LinkResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "linkedNEs", skip_serializing_if = "Option::is_none")]
    pub linked_nes: Option<Vec<LinkedRecord>>,
}

impl LinkResponse {
    pub fn ok(records: Vec<LinkedRecord>) -> Self {
        Self {
            status: "ok".into(),
            message: None,
            linked_nes: Some(records),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: Some(message.into()),
            linked_nes: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krantlink_model::{Feature, FeatureVector};

    fn list_with_one(prob: f64) -> CandidateList {
        let doc = KbDocument {
            id: "Jan_de_Vries".into(),
            pref_label: "jan de vries".into(),
            label: Some("Jan de Vries".into()),
            ..Default::default()
        };
        let mut cand = Candidate::new(doc, 0, 0);
        cand.prob = prob;
        cand.features = {
            let mut f = FeatureVector::default();
            f.set(Feature::MatchStrPrefLabelExact, 1.0);
            f
        };
        let mut list = CandidateList::default();
        list.candidates.push(cand);
        list.filtered = vec![0];
        list.ranked = vec![0];
        list
    }

    #[test]
    fn link_present_iff_probability_clears_threshold() {
        let schema = FeatureSchema::from_names(&["match_str_pref_label_exact"]).unwrap();

        let result = ClusterResult::with_list("Predicted link", 0.9, Some(0), list_with_one(0.9));
        let record = result.record("Jan de Vries", 0.5, &schema, false, false);
        assert_eq!(record.link.as_deref(), Some("Jan_de_Vries"));
        assert_eq!(record.label.as_deref(), Some("Jan de Vries"));
        assert_eq!(record.prob, Some(0.9));

        let low = ClusterResult::with_list(
            "Probability too low for: Jan de Vries",
            0.42,
            Some(0),
            list_with_one(0.42),
        );
        let record = low.record("Jan de Vries", 0.5, &schema, false, false);
        assert!(record.link.is_none());
        assert!(record.label.is_none());
        assert_eq!(record.prob, Some(0.42));
        assert_eq!(record.reason, "Probability too low for: Jan de Vries");
    }

    #[test]
    fn absent_document_label_is_not_synthesised() {
        let schema = FeatureSchema::from_names(&["match_str_pref_label_exact"]).unwrap();
        let mut list = list_with_one(0.9);
        list.candidates[0].document.label = None;
        let result = ClusterResult::with_list("Predicted link", 0.9, Some(0), list);
        let record = result.record("Jan de Vries", 0.5, &schema, false, false);
        assert_eq!(record.link.as_deref(), Some("Jan_de_Vries"));
        assert!(record.label.is_none());
    }

    #[test]
    fn simple_result_has_reason_only() {
        let result = ClusterResult::simple("Invalid entity");
        let record = result.record("Maart 1920", 0.5, &FeatureSchema::full(), true, true);
        assert_eq!(record.reason, "Invalid entity");
        assert!(record.prob.is_none());
        assert!(record.link.is_none());
        assert!(record.features.is_none());
        assert!(record.candidates.is_none());
    }

    #[test]
    fn features_and_candidates_are_opt_in() {
        let schema = FeatureSchema::from_names(&["match_str_pref_label_exact"]).unwrap();
        let result = ClusterResult::with_list("Predicted link", 0.9, Some(0), list_with_one(0.9));

        let bare = result.record("x", 0.5, &schema, false, false);
        assert!(bare.features.is_none() && bare.candidates.is_none());

        let full = result.record("x", 0.5, &schema, true, true);
        let features = full.features.unwrap();
        assert_eq!(features["match_str_pref_label_exact"], 1.0);
        let candidates = full.candidates.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "Jan_de_Vries");
    }

    #[test]
    fn response_serialises_with_renamed_field() {
        let response = LinkResponse::ok(vec![]);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"linkedNEs\""));
        assert!(!json.contains("message"));

        let err = LinkResponse::error("boom");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("boom"));
    }
}
