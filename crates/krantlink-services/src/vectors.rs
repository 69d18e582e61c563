//! Word-vector service client.
//!
//! Takes a space-joined word list and returns one vector per known word.
//! An empty or 404 response means no vectors are available; callers treat
//! that as an absent signal, not an error.

use std::time::Duration;

use serde::Deserialize;

use crate::ServiceError;

const VECTOR_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Deserialize)]
struct VectorBody {
    #[serde(default)]
    vectors: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct VectorClient {
    base_url: String,
    client: reqwest::Client,
}

impl VectorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch vectors for the given words. Returns an empty list when the
    /// service knows none of them.
    pub async fn vectors(&self, words: &[String]) -> Result<Vec<Vec<f64>>, ServiceError> {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let source = words.join(" ");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("source", source.as_str())])
            .timeout(VECTOR_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ServiceError::Status {
                service: "vector service",
                status: status.as_u16(),
            });
        }

        let body: VectorBody = response.json().await?;
        Ok(body.vectors)
    }
}
