//! Grouping mentions into clusters presumed to refer to the same entity,
//! plus the cluster-level derived state the feature extractor consumes.

use std::collections::{HashMap, HashSet};

use krantlink_lexicon as lexicon;

use crate::mention::Mention;
use crate::remote::VectorGateway;
use crate::result::ClusterResult;
use crate::text::normalize;

/// A group of related mentions. Members are indices into the context's
/// mention list; the first member is the head whose properties drive
/// retrieval. Derived state is computed at most once per cluster.
#[derive(Debug)]
pub struct Cluster {
    pub members: Vec<usize>,
    pub result: Option<ClusterResult>,
    type_ratios: Option<Option<HashMap<String, f64>>>,
    window: Option<Vec<String>>,
    entity_parts: Option<HashSet<String>>,
    context_entity_parts: Option<Vec<String>>,
    sum_quotes: Option<u32>,
    window_vectors: Option<Option<Vec<Vec<f64>>>>,
    context_entity_vectors: Option<Option<Vec<Vec<f64>>>>,
}

impl Cluster {
    pub fn new(members: Vec<usize>) -> Self {
        Self {
            members,
            result: None,
            type_ratios: None,
            window: None,
            entity_parts: None,
            context_entity_parts: None,
            sum_quotes: None,
            window_vectors: None,
            context_entity_vectors: None,
        }
    }

    /// The head mention index.
    pub fn head(&self) -> usize {
        self.members[0]
    }

    pub fn contains(&self, mention: usize) -> bool {
        self.members.contains(&mention)
    }

    /// Fraction of members carrying each type tag, counting NER tags and
    /// inferred alternate types. `None` when no member carries any tag.
    pub fn type_ratios(&mut self, mentions: &[Mention]) -> Option<HashMap<String, f64>> {
        if self.type_ratios.is_none() {
            let mut tags: Vec<String> = Vec::new();
            for &i in &self.members {
                if let Some(tag) = &mentions[i].tag {
                    tags.push(tag.clone());
                }
            }
            for &i in &self.members {
                if let Some(alt) = mentions[i].alt_type {
                    tags.push(alt.to_string());
                }
            }
            let ratios = if tags.is_empty() {
                None
            } else {
                let total = tags.len() as f64;
                let mut map: HashMap<String, f64> = HashMap::new();
                for tag in tags {
                    *map.entry(tag).or_insert(0.0) += 1.0;
                }
                for v in map.values_mut() {
                    *v /= total;
                }
                Some(map)
            };
            self.type_ratios = Some(ratios);
        }
        self.type_ratios.clone().flatten()
    }

    /// Words appearing inside any member's stripped form.
    pub fn entity_parts(&mut self, mentions: &[Mention]) -> &HashSet<String> {
        if self.entity_parts.is_none() {
            let parts = self
                .members
                .iter()
                .flat_map(|&i| mentions[i].stripped.split_whitespace())
                .map(str::to_string)
                .collect();
            self.entity_parts = Some(parts);
        }
        self.entity_parts.get_or_insert_with(HashSet::new)
    }

    /// Combined context window of all members: normalised window tokens plus
    /// title and role forms, excluding entity parts, short words and stop
    /// words.
    pub fn window(&mut self, mentions: &[Mention]) -> &[String] {
        if self.window.is_none() {
            let parts = self.entity_parts(mentions).clone();
            let mut window: Vec<String> = Vec::new();
            for &i in &self.members {
                let m = &mentions[i];
                for w in m.window_left.iter().chain(m.window_right.iter()) {
                    window.extend(normalize(w).split_whitespace().map(str::to_string));
                }
                if let Some(t) = &m.title_form {
                    window.push(t.clone());
                }
                if let Some(r) = &m.role_form {
                    window.push(r.clone());
                }
            }
            window.retain(|w| {
                w.chars().count() > 4
                    && !parts.contains(w)
                    && !lexicon::UNWANTED.contains(w.as_str())
            });
            self.window = Some(window);
        }
        self.window.as_deref().unwrap_or_default()
    }

    /// Words of OTHER valid mentions in the article, disjoint from this
    /// cluster's entity parts.
    pub fn context_entity_parts(&mut self, mentions: &[Mention]) -> &[String] {
        if self.context_entity_parts.is_none() {
            let own = self.entity_parts(mentions).clone();
            let mut seen = HashSet::new();
            let mut parts: Vec<String> = Vec::new();
            for e in mentions.iter().filter(|e| e.valid) {
                for p in e.norm.split_whitespace() {
                    if p.chars().count() > 4
                        && !own.contains(p)
                        && !lexicon::UNWANTED.contains(p)
                        && seen.insert(p.to_string())
                    {
                        parts.push(p.to_string());
                    }
                }
            }
            self.context_entity_parts = Some(parts);
        }
        self.context_entity_parts.as_deref().unwrap_or_default()
    }

    pub fn sum_quotes(&mut self, mentions: &[Mention]) -> u32 {
        if self.sum_quotes.is_none() {
            self.sum_quotes = Some(self.members.iter().map(|&i| mentions[i].quotes).sum());
        }
        self.sum_quotes.unwrap_or(0)
    }

    /// Vectors for the combined context window, fetched at most once.
    /// `None` when the window is empty or the service has no vectors.
    pub async fn window_vectors(
        &mut self,
        mentions: &[Mention],
        gateway: &dyn VectorGateway,
    ) -> Option<&[Vec<f64>]> {
        if self.window_vectors.is_none() {
            let words = self.window(mentions).to_vec();
            self.window_vectors = Some(fetch_vectors(gateway, &words).await);
        }
        self.window_vectors.as_ref().and_then(|v| v.as_deref())
    }

    /// Vectors for the context entity parts, fetched at most once.
    pub async fn context_entity_vectors(
        &mut self,
        mentions: &[Mention],
        gateway: &dyn VectorGateway,
    ) -> Option<&[Vec<f64>]> {
        if self.context_entity_vectors.is_none() {
            let words = self.context_entity_parts(mentions).to_vec();
            self.context_entity_vectors = Some(fetch_vectors(gateway, &words).await);
        }
        self.context_entity_vectors.as_ref().and_then(|v| v.as_deref())
    }
}

/// Fetch vectors, degrading to `None` on failure or an empty response.
pub(crate) async fn fetch_vectors(
    gateway: &dyn VectorGateway,
    words: &[String],
) -> Option<Vec<Vec<f64>>> {
    if words.is_empty() {
        return None;
    }
    match gateway.vectors(words).await {
        Ok(v) if !v.is_empty() => Some(v),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "word vectors unavailable");
            None
        }
    }
}

/// Group the given mentions into clusters.
///
/// Mentions are processed longest norm first (ties broken by norm,
/// descending); each is adopted by an existing cluster via the first
/// matching rule, or starts a new one.
pub fn build_clusters(mentions: &[Mention], indices: &[usize]) -> Vec<Cluster> {
    let mut order: Vec<usize> = indices.to_vec();
    order.sort_by(|&a, &b| {
        mentions[b]
            .word_count()
            .cmp(&mentions[a].word_count())
            .then_with(|| mentions[b].norm.cmp(&mentions[a].norm))
    });

    let mut clusters: Vec<Cluster> = Vec::new();
    for idx in order {
        assign(idx, &mut clusters, mentions);
    }
    clusters
}

fn assign(idx: usize, clusters: &mut Vec<Cluster>, mentions: &[Mention]) {
    let entity = &mentions[idx];

    // Exact adoption: identical text or identical non-empty norm.
    for cluster in clusters.iter_mut() {
        for &ei in &cluster.members {
            let e = &mentions[ei];
            if entity.text == e.text
                || (!entity.norm.is_empty() && !e.norm.is_empty() && entity.norm == e.norm)
            {
                cluster.members.push(idx);
                return;
            }
        }
    }

    // Partial rules; the combined candidate set must be a singleton.
    let mut candidates: Vec<usize> = Vec::new();
    for (ci, cluster) in clusters.iter().enumerate() {
        for &ei in &cluster.members {
            let e = &mentions[ei];
            if entity.norm.is_empty() || e.norm.is_empty() {
                continue;
            }
            if entity.last_word() == e.last_word() {
                // Last-part extension: a longer name ending in this mention.
                if e.norm.ends_with(&entity.norm) && e.word_count() > entity.word_count() {
                    candidates.push(ci);
                    break;
                }
            } else if entity.first_word() == e.first_word()
                && entity.word_count() == 1
                && e.word_count() > 1
                && e.is_person()
                && entity.is_person()
            {
                // First-name attachment.
                candidates.push(ci);
                break;
            }
        }
    }

    if candidates.len() == 1 {
        clusters[candidates[0]].members.push(idx);
    } else {
        clusters.push(Cluster::new(vec![idx]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentions_from(specs: &[(&str, Option<&str>)]) -> Vec<Mention> {
        let ocr = specs
            .iter()
            .map(|(t, _)| *t)
            .collect::<Vec<_>>()
            .join(" en ");
        let mut out = Vec::new();
        let mut cursor = 0;
        for (text, tag) in specs {
            let m = Mention::new(text, *tag, &ocr, cursor);
            if let Some(end) = m.end_pos() {
                cursor = end;
            }
            out.push(m);
        }
        out
    }

    fn all_indices(mentions: &[Mention]) -> Vec<usize> {
        (0..mentions.len()).collect()
    }

    #[test]
    fn identical_texts_share_a_cluster() {
        let mentions = mentions_from(&[
            ("Jan de Vries", Some("person")),
            ("Jan de Vries", Some("person")),
        ]);
        let clusters = build_clusters(&mentions, &all_indices(&mentions));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn shorter_suffix_joins_longer_name() {
        let mentions = mentions_from(&[
            ("Jan de Vries", Some("person")),
            ("de Vries", Some("person")),
            ("Amsterdam", Some("location")),
        ]);
        let clusters = build_clusters(&mentions, &all_indices(&mentions));
        assert_eq!(clusters.len(), 2);
        let big = clusters.iter().find(|c| c.members.len() == 2).unwrap();
        // Head is the longest norm
        assert_eq!(mentions[big.head()].norm, "jan de vries");
    }

    #[test]
    fn first_name_attaches_to_person_cluster() {
        let mentions = mentions_from(&[
            ("Jan de Vries", Some("person")),
            ("Jan", Some("person")),
        ]);
        let clusters = build_clusters(&mentions, &all_indices(&mentions));
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn first_name_needs_person_tags_on_both() {
        let mentions = mentions_from(&[
            ("Jan de Vries", Some("person")),
            ("Jan", Some("location")),
        ]);
        let clusters = build_clusters(&mentions, &all_indices(&mentions));
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn ambiguous_attachment_starts_a_new_cluster() {
        // "de Vries" fits both multi-word names: no unique target.
        let mentions = mentions_from(&[
            ("Jan de Vries", Some("person")),
            ("Piet de Vries", Some("person")),
            ("de Vries", Some("person")),
        ]);
        let clusters = build_clusters(&mentions, &all_indices(&mentions));
        assert_eq!(clusters.len(), 3);
    }

    #[test]
    fn clustering_a_cluster_is_idempotent() {
        let mentions = mentions_from(&[
            ("Jan de Vries", Some("person")),
            ("de Vries", Some("person")),
            ("Jan", Some("person")),
        ]);
        let clusters = build_clusters(&mentions, &all_indices(&mentions));
        assert_eq!(clusters.len(), 1);
        let again = build_clusters(&mentions, &clusters[0].members);
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].members.len(), 3);
    }

    #[test]
    fn type_ratios_count_ner_and_inferred_types() {
        let mentions = mentions_from(&[
            ("Jan de Vries", Some("person")),
            ("de Vries", Some("person")),
        ]);
        let mut cluster = Cluster::new(vec![0, 1]);
        let ratios = cluster.type_ratios(&mentions).unwrap();
        assert_eq!(ratios["person"], 1.0);
    }

    #[test]
    fn window_excludes_entity_parts_and_short_words() {
        let ocr = "Componist Willem Mengelberg dirigeerde gisteren het orkest";
        let m = Mention::new("Willem Mengelberg", Some("person"), ocr, 0);
        let mentions = vec![m];
        let mut cluster = Cluster::new(vec![0]);
        let window = cluster.window(&mentions).to_vec();
        assert!(window.contains(&"componist".to_string()));
        assert!(window.contains(&"dirigeerde".to_string()));
        // entity part
        assert!(!window.contains(&"mengelberg".to_string()));
        // too short
        assert!(!window.contains(&"het".to_string()));
    }

    #[test]
    fn context_entity_parts_skip_own_parts() {
        let mentions = mentions_from(&[
            ("Willem Mengelberg", Some("person")),
            ("Concertgebouw", Some("organisation")),
        ]);
        let mut cluster = Cluster::new(vec![0]);
        let parts = cluster.context_entity_parts(&mentions).to_vec();
        assert!(parts.contains(&"concertgebouw".to_string()));
        assert!(!parts.contains(&"mengelberg".to_string()));
    }
}
