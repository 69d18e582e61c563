//! Feature extraction for candidate descriptions.
//!
//! Two passes per cluster: rule features drive the hard filter (name and
//! date conflicts), probability features feed the trained model. A feature
//! is only computed when the model's schema declares it; expensive signals
//! (word vectors, newspaper co-occurrence) never touch the network for
//! models that don't use them.

mod context;
mod name;

use krantlink_lexicon::{self as lexicon, Role, SchemaCompat};
use krantlink_model::{Feature, FeatureSchema};

use crate::LinkError;
use crate::cluster::{Cluster, fetch_vectors};
use crate::context::Article;
use crate::mention::Mention;
use crate::remote::Remotes;
use crate::retrieval::{Candidate, CandidateList};

use context::ABSTRACT_HEAD;

/// One cluster's feature-extraction pass over a candidate list.
pub(crate) struct Extractor<'a> {
    pub mentions: &'a [Mention],
    pub cluster: &'a mut Cluster,
    pub article: &'a mut Article,
    pub schema: &'a FeatureSchema,
    pub remotes: &'a Remotes,
    pub compat: SchemaCompat,
}

impl Extractor<'_> {
    /// Compute the rule features and mark the candidates passing the hard
    /// filter: no name conflict and no date conflict.
    pub(crate) async fn rule_features(&mut self, list: &mut CandidateList) -> Result<(), LinkError> {
        let head = self.cluster.head();
        let head_norm = self.mentions[head].norm.clone();
        let head_stripped = self.mentions[head].stripped.clone();

        for cand in &mut list.candidates {
            let date = self.date_feature(cand).await?;
            if date > -1.0 {
                name::pref_label_match(cand, &head_norm);
                name::alt_label_match(cand, &head_norm);
                name::last_part_match(cand, &head_stripped);
                name::first_part_match(cand, &head_norm, self.article.ocr_norm());
                cand.features.set(
                    Feature::MatchStrNonMatching,
                    (cand.non_matching.len() as f64 * 0.25).tanh(),
                );
                name::name_conflict(cand);
            }
        }

        list.filtered = (0..list.candidates.len())
            .filter(|&i| {
                let f = &list.candidates[i].features;
                f.get(Feature::MatchStrConflict) == 0.0 && f.get(Feature::MatchTxtDate) > -1.0
            })
            .collect();
        Ok(())
    }

    /// Compute the probability features for every filtered candidate.
    pub(crate) async fn prob_features(&mut self, list: &mut CandidateList) {
        let max_score = list.max_score();
        let sum_inlinks = list.sum_inlinks();
        let sum_news = list.sum_inlinks_newspapers();
        let filtered = list.filtered.clone();

        let head_norm = self.mentions[self.cluster.head()].norm.clone();
        let mut roles: Vec<&'static Role> = Vec::new();
        for &i in &self.cluster.members {
            if let Some(role) = self.mentions[i].role
                && !roles.iter().any(|r| r.name == role.name)
            {
                roles.push(role);
            }
        }

        for (pos, &ci) in filtered.iter().enumerate() {
            let cand = &mut list.candidates[ci];

            self.entity_quotes(cand);
            self.entity_type(cand);
            self.candidate_inlinks(cand, sum_inlinks, sum_news);
            self.candidate_ambig(cand);
            self.candidate_lang(cand);
            self.candidate_type(cand);

            if self.schema.contains_prefix("match_str_lsr") {
                name::levenshtein_features(cand, &head_norm);
            }
            self.solr_properties(cand, pos, max_score);

            if self.schema.contains(Feature::MatchTxtType)
                && let Some(ratios) = self.cluster.type_ratios(self.mentions)
            {
                context::type_match(cand, &ratios);
            }
            if self.schema.contains(Feature::MatchTxtRole) {
                context::role_match(cand, &roles, self.compat);
            }
            if self.schema.contains(Feature::MatchTxtSpec) {
                context::spec_match(cand, self.article.ocr_norm());
            }
            if self.schema.contains(Feature::MatchTxtKeyword) {
                context::keyword_match(cand, self.article.ocr_bow());
            }
            if self.schema.contains(Feature::MatchTxtSubject) {
                context::subject_match(cand, self.article.subjects());
            }
            self.vector_match(cand).await;
            if self.schema.contains(Feature::MatchTxtEntities) {
                let parts = self.cluster.context_entity_parts(self.mentions).to_vec();
                context::entity_match(cand, &parts);
            }
            if self.schema.contains(Feature::MatchTxtEntitiesNewspapers) {
                context::entity_match_newspapers(
                    cand,
                    self.mentions,
                    &head_norm,
                    self.remotes.metadata.as_ref(),
                )
                .await;
            }
            self.entity_vector_match(cand).await;
        }
    }

    /// Compare the publication year with the candidate's life years.
    /// Returns the value used by the hard filter.
    async fn date_feature(&mut self, cand: &mut Candidate) -> Result<f64, LinkError> {
        let publ_year = self
            .article
            .publ_year(self.remotes.metadata.as_ref())
            .await?;
        let Some(publ_year) = publ_year else {
            return Ok(0.0);
        };
        match date_feature_value(
            publ_year,
            cand.document.birth_year,
            cand.document.death_year,
        ) {
            Some(value) => {
                cand.features.set(Feature::MatchTxtDate, value);
                Ok(value)
            }
            None => Ok(0.0),
        }
    }

    fn entity_quotes(&mut self, cand: &mut Candidate) {
        if !self.schema.contains(Feature::EntityQuotes) {
            return;
        }
        let sum = self.cluster.sum_quotes(self.mentions);
        cand.features
            .set(Feature::EntityQuotes, (f64::from(sum) * 0.25).tanh());
    }

    fn entity_type(&mut self, cand: &mut Candidate) {
        if !self.schema.contains_prefix("entity_type") {
            return;
        }
        let Some(ratios) = self.cluster.type_ratios(self.mentions) else {
            return;
        };
        for (tag, ratio) in &ratios {
            match tag.as_str() {
                "person" => cand.features.set(Feature::EntityTypePerson, *ratio),
                "location" => cand.features.set(Feature::EntityTypeLocation, *ratio),
                "organisation" => cand.features.set(Feature::EntityTypeOrganisation, *ratio),
                _ => cand.features.add(Feature::EntityTypeOther, *ratio),
            }
        }
    }

    fn candidate_inlinks(&mut self, cand: &mut Candidate, sum_inlinks: i64, sum_news: i64) {
        if !self.schema.contains_prefix("candidate_inlinks") {
            return;
        }
        if let Some(count) = cand.document.inlinks.filter(|&c| c > 0) {
            cand.features
                .set(Feature::CandidateInlinks, (count as f64 * 0.001).tanh());
            if sum_inlinks > 0 {
                cand.features
                    .set(Feature::CandidateInlinksRel, count as f64 / sum_inlinks as f64);
            }
        }
        if let Some(count) = cand.document.inlinks_newspapers.filter(|&c| c > 0) {
            cand.features.set(
                Feature::CandidateInlinksNewspapers,
                (count as f64 * 0.001).tanh(),
            );
            if sum_news > 0 {
                cand.features.set(
                    Feature::CandidateInlinksNewspapersRel,
                    count as f64 / sum_news as f64,
                );
            }
        }
    }

    fn candidate_ambig(&mut self, cand: &mut Candidate) {
        if !self.schema.contains(Feature::CandidateAmbig) {
            return;
        }
        let value = if cand.document.is_ambiguous() { 1.0 } else { -1.0 };
        cand.features.set(Feature::CandidateAmbig, value);
    }

    fn candidate_lang(&mut self, cand: &mut Candidate) {
        if !self.schema.contains(Feature::CandidateLang) {
            return;
        }
        let value = if cand.document.is_dutch() { 1.0 } else { -1.0 };
        cand.features.set(Feature::CandidateLang, value);
    }

    fn candidate_type(&mut self, cand: &mut Candidate) {
        if !self.schema.contains_prefix("candidate_type") {
            return;
        }
        let types = cand.document.combined_types();
        if types.is_empty() {
            return;
        }
        for entry in lexicon::TYPES {
            if types.iter().any(|s| entry.schema_types.contains(s)) {
                let feature = match entry.name {
                    "person" => Feature::CandidateTypePerson,
                    "location" => Feature::CandidateTypeLocation,
                    _ => Feature::CandidateTypeOrganisation,
                };
                cand.features.set(feature, 1.0);
            }
        }
    }

    fn solr_properties(&mut self, cand: &mut Candidate, pos: usize, max_score: f64) {
        if !self.schema.contains_prefix("match_str_solr") {
            return;
        }
        let one_hot = [
            Feature::MatchStrSolrQuery0,
            Feature::MatchStrSolrQuery1,
            Feature::MatchStrSolrQuery2,
            Feature::MatchStrSolrQuery3,
        ];
        for (variant, feature) in one_hot.into_iter().enumerate() {
            let value = if usize::from(cand.query_variant) == variant {
                1.0
            } else {
                0.0
            };
            cand.features.set(feature, value);
        }
        cand.features.set(
            Feature::MatchStrSolrSubstitution,
            if cand.iteration == 1 { 1.0 } else { 0.0 },
        );
        cand.features.set(
            Feature::MatchStrSolrPosition,
            1.0 - (pos as f64 * 0.25).tanh(),
        );
        if max_score > 0.0 {
            cand.features.set(
                Feature::MatchStrSolrScore,
                cand.document.score.unwrap_or(0.0) / max_score,
            );
        }
    }

    /// Cosine similarity between the cluster context window and the
    /// candidate's abstract-head plus keywords, for Dutch candidates.
    async fn vector_match(&mut self, cand: &mut Candidate) {
        if !self.schema.contains_prefix("match_txt_vec") {
            return;
        }
        if !cand.document.is_dutch() {
            return;
        }
        if self.cluster.window(self.mentions).is_empty() {
            return;
        }

        let parts = self.cluster.entity_parts(self.mentions).clone();
        let keep = |w: &str| {
            w.chars().count() > 4 && !parts.contains(w) && !lexicon::UNWANTED.contains(w)
        };
        let mut bow: Vec<String> = cand
            .abstract_bow()
            .iter()
            .take(ABSTRACT_HEAD)
            .filter(|w| keep(w.as_str()))
            .cloned()
            .collect();
        bow.extend(
            cand.document
                .keyword
                .iter()
                .filter(|w| keep(w.as_str()))
                .cloned(),
        );
        if bow.is_empty() {
            return;
        }

        let Some(window_vectors) = self
            .cluster
            .window_vectors(self.mentions, self.remotes.vectors.as_ref())
            .await
        else {
            return;
        };
        let Some(cand_vectors) = fetch_vectors(self.remotes.vectors.as_ref(), &bow).await else {
            return;
        };

        if let Some((max, mean)) = cosine_stats(window_vectors, &cand_vectors) {
            cand.features
                .set(Feature::MatchTxtVecMax, (max - 0.25).max(-1.0));
            cand.features.set(Feature::MatchTxtVecMean, mean);
        }
    }

    /// Cosine similarity between the other article entities and the
    /// candidate's Wikidata identifier vector.
    async fn entity_vector_match(&mut self, cand: &mut Candidate) {
        if !self.schema.contains_prefix("match_txt_entity_vec") {
            return;
        }
        let Some(uri) = cand.document.uri_wd.clone() else {
            return;
        };
        let Some(wd_id) = uri.rsplit('/').next().map(str::to_string) else {
            return;
        };
        if self.cluster.context_entity_parts(self.mentions).is_empty() {
            return;
        }

        let Some(entity_vectors) = self
            .cluster
            .context_entity_vectors(self.mentions, self.remotes.vectors.as_ref())
            .await
        else {
            return;
        };
        let Some(cand_vectors) = fetch_vectors(self.remotes.vectors.as_ref(), &[wd_id]).await
        else {
            return;
        };

        if let Some((max, mean)) = cosine_stats(entity_vectors, &cand_vectors) {
            cand.features
                .set(Feature::MatchTxtEntityVecMax, (max - 0.25).max(-1.0));
            cand.features
                .set(Feature::MatchTxtEntityVecMean, (mean - 0.2).max(-1.0));
        }
    }
}

/// The date feature: how the publication year relates to the candidate's
/// life years. `None` when the candidate has no birth year.
pub(crate) fn date_feature_value(
    publ_year: i32,
    birth_year: Option<i32>,
    death_year: Option<i32>,
) -> Option<f64> {
    let birth = birth_year?;
    let death = death_year.unwrap_or(birth + 80);
    Some(if publ_year < birth {
        -1.0
    } else if publ_year < birth + 20 {
        0.5
    } else if publ_year < death + 20 {
        1.0
    } else {
        0.75
    })
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|y| y * y).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

/// Max and mean of the pairwise cosine similarity matrix.
fn cosine_stats(rows: &[Vec<f64>], cols: &[Vec<f64>]) -> Option<(f64, f64)> {
    if rows.is_empty() || cols.is_empty() {
        return None;
    }
    let mut max = f64::MIN;
    let mut sum = 0.0;
    let mut n = 0usize;
    for a in rows {
        for b in cols {
            let c = cosine(a, b);
            max = max.max(c);
            sum += c;
            n += 1;
        }
    }
    Some((max, sum / n as f64))
}
