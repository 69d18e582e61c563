//! Client for the full-text search index over knowledge-base descriptions.
//!
//! The index speaks a Solr-style select API; every query is sorted by
//! `(lang, inlinks)` descending so Dutch, well-linked descriptions surface
//! first. Documents come back as [`KbDocument`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KbError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("index returned HTTP {0}")]
    Status(u16),
}

/// One knowledge-base description as stored in the search index.
///
/// Only `id` and `pref_label` are guaranteed; everything else is optional
/// and defaults to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbDocument {
    pub id: String,
    #[serde(default)]
    pub pref_label: String,
    #[serde(default)]
    pub alt_label: Vec<String>,
    #[serde(default)]
    pub wd_alt_label: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_part: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub schema_type: Vec<String>,
    #[serde(default)]
    pub dbo_type: Vec<String>,
    #[serde(default)]
    pub keyword: Vec<String>,
    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlinks: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlinks_newspapers: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambig: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_wd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl KbDocument {
    /// All KB type names attached to the description, schema.org and
    /// DBpedia ontology combined.
    pub fn combined_types(&self) -> Vec<&str> {
        self.schema_type
            .iter()
            .chain(self.dbo_type.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_dutch(&self) -> bool {
        self.lang.as_deref() == Some("nl")
    }

    pub fn is_ambiguous(&self) -> bool {
        self.ambig == Some(1)
    }
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    response: SelectResponse,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    #[serde(default)]
    docs: Vec<KbDocument>,
}

/// HTTP client for the description index.
#[derive(Debug, Clone)]
pub struct KbClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl KbClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one query, returning at most `rows` documents sorted by
    /// `(lang, inlinks)` descending.
    pub async fn select(&self, q: &str, rows: usize) -> Result<Vec<KbDocument>, KbError> {
        let url = format!("{}/select", self.base_url.trim_end_matches('/'));
        let rows = rows.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", q),
                ("rows", rows.as_str()),
                ("sort", "lang desc,inlinks desc"),
                ("fl", "*,score"),
                ("wt", "json"),
                ("indent", "on"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KbError::Status(status.as_u16()));
        }

        let body: SelectBody = response.json().await?;
        tracing::debug!(query = q, hits = body.response.docs.len(), "index query");
        Ok(body.response.docs)
    }
}
