//! The linking control loop: cluster queue, per-cluster linking, the
//! cluster-split rule, and per-mention result emission.

use std::collections::HashSet;
use std::sync::Arc;

use krantlink_lexicon::SchemaCompat;
use krantlink_model::Model;

use crate::LinkError;
use crate::cluster::{Cluster, build_clusters};
use crate::config::LinkerSettings;
use crate::context::Context;
use crate::features::Extractor;
use crate::mention::Mention;
use crate::remote::Remotes;
use crate::result::{ClusterResult, LinkResponse};
use crate::retrieval::retrieve;

#[derive(Debug, Clone, Default)]
pub struct LinkerOptions {
    /// Propagate errors instead of wrapping them in an error response.
    pub debug: bool,
    /// Include the chosen candidate's feature snapshot in each record.
    pub include_features: bool,
    /// Include the full candidate listing in each record.
    pub include_candidates: bool,
    pub compat: SchemaCompat,
}

/// Links the mentions of one article to knowledge-base descriptions.
///
/// One `link` call is one request: all state derived from the article is
/// request-scoped and dropped on return.
pub struct EntityLinker {
    remotes: Remotes,
    model: Arc<dyn Model>,
    solr_rows: usize,
    min_prob: f64,
    options: LinkerOptions,
}

impl EntityLinker {
    pub fn new(
        remotes: Remotes,
        model: Arc<dyn Model>,
        settings: &LinkerSettings,
        options: LinkerOptions,
    ) -> Self {
        Self {
            remotes,
            model,
            solr_rows: settings.solr_rows,
            min_prob: settings.min_prob,
            options,
        }
    }

    /// Link the mentions of the article at `url`. When `ne` is given, only
    /// the cluster containing that mention is linked; if no NER span has
    /// that exact text, an ad-hoc mention is constructed for it.
    pub async fn link(&self, url: &str, ne: Option<&str>) -> Result<LinkResponse, LinkError> {
        let mut context = match Context::fetch(url, &self.remotes).await {
            Ok(context) => context,
            Err(e) => return self.fail("Error retrieving context", e),
        };

        let requested: Option<usize> = ne.map(|ne| {
            match context.mentions.iter().position(|m| m.text == ne) {
                Some(i) => i,
                None => {
                    let mention = Mention::new(ne, None, &context.article.ocr, 0);
                    context.mentions.push(mention);
                    context.mentions.len() - 1
                }
            }
        });

        let all: Vec<usize> = (0..context.mentions.len()).collect();
        let mut to_link = build_clusters(&context.mentions, &all);
        if let Some(req) = requested {
            to_link.retain(|c| c.contains(req));
        }

        let mut linked: Vec<Cluster> = Vec::new();
        while let Some(mut cluster) = to_link.pop() {
            if let Err(e) = self.link_cluster(&mut cluster, &mut context).await {
                return self.fail("Error linking entity", e);
            }

            let head_norm = context.mentions[cluster.head()].norm.clone();
            let dependencies: Vec<usize> = cluster
                .members
                .iter()
                .copied()
                .filter(|&i| context.mentions[i].norm != head_norm)
                .collect();

            if dependencies.is_empty() {
                linked.push(cluster);
                continue;
            }

            // A multi-name cluster must resolve to a person; otherwise the
            // dependent mentions are re-clustered on their own.
            let chose_person = cluster
                .result
                .as_ref()
                .and_then(|r| r.best_candidate())
                .is_some_and(|c| c.document.combined_types().contains(&"Person"));

            if chose_person {
                linked.push(cluster);
                continue;
            }

            let head_group: Vec<usize> = cluster
                .members
                .iter()
                .copied()
                .filter(|i| !dependencies.contains(i))
                .collect();
            let mut new_clusters = vec![Cluster::new(head_group)];
            new_clusters.extend(build_clusters(&context.mentions, &dependencies));
            if let Some(req) = requested {
                new_clusters.retain(|c| c.contains(req));
            }
            tracing::debug!(
                head = %head_norm,
                parts = new_clusters.len(),
                "cluster split"
            );
            to_link.extend(new_clusters);
        }

        // One record per unique mention text, first occurrence wins.
        let to_return: Vec<usize> = match requested {
            Some(i) => vec![i],
            None => (0..context.mentions.len()).collect(),
        };
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();
        for idx in to_return {
            let text = context.mentions[idx].text.clone();
            if !seen.insert(text.clone()) {
                continue;
            }
            if let Some(result) = linked
                .iter()
                .find(|c| c.contains(idx))
                .and_then(|c| c.result.as_ref())
            {
                records.push(result.record(
                    &text,
                    self.min_prob,
                    self.model.schema(),
                    self.options.include_features,
                    self.options.include_candidates,
                ));
            }
        }

        Ok(LinkResponse::ok(records))
    }

    /// Attempt to link one cluster, storing the outcome on the cluster.
    async fn link_cluster(
        &self,
        cluster: &mut Cluster,
        context: &mut Context,
    ) -> Result<(), LinkError> {
        let Context { article, mentions } = context;
        let head = cluster.head();

        if !mentions[head].valid {
            cluster.result = Some(ClusterResult::simple("Invalid entity"));
            return Ok(());
        }

        let mut list = retrieve(
            &mut mentions[head],
            self.remotes.index.as_ref(),
            self.solr_rows,
        )
        .await?;
        if list.is_empty() {
            cluster.result = Some(ClusterResult::simple("Nothing found"));
            return Ok(());
        }

        {
            let mut extractor = Extractor {
                mentions: mentions.as_slice(),
                cluster: &mut *cluster,
                article,
                schema: self.model.schema(),
                remotes: &self.remotes,
                compat: self.options.compat,
            };
            extractor.rule_features(&mut list).await?;
            if !list.filtered.is_empty() {
                extractor.prob_features(&mut list).await;
            }
        }

        if list.filtered.is_empty() {
            cluster.result = Some(ClusterResult::with_list(
                "Name or date conflict",
                0.0,
                None,
                list,
            ));
            return Ok(());
        }

        list.rank(self.model.as_ref());
        let best = list.ranked[0];
        let prob = list.candidates[best].prob;
        let reason = if prob >= self.min_prob {
            "Predicted link".to_string()
        } else {
            // Index documents may lack a label; the reason then drops the
            // label segment rather than naming some other field.
            match &list.candidates[best].document.label {
                Some(label) => format!("Probability too low for: {label}"),
                None => "Probability too low".to_string(),
            }
        };
        cluster.result = Some(ClusterResult::with_list(reason, prob, Some(best), list));
        Ok(())
    }

    fn fail(&self, phase: &str, error: LinkError) -> Result<LinkResponse, LinkError> {
        if self.options.debug {
            return Err(error);
        }
        tracing::warn!(phase, error = %error, "link request failed");
        Ok(LinkResponse::error(format!("{phase}: {error}")))
    }
}
