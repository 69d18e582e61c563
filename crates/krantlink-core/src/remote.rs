//! Gateway traits over the external services, so the engine can be driven
//! by the real HTTP clients in production and by in-memory fakes in tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use krantlink_kb::{KbClient, KbDocument, KbError};
use krantlink_services::{NerClient, NerSpan, OcrClient, ServiceError, SruClient, VectorClient};

use crate::config::LinkerSettings;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves an article URL to its OCR text.
pub trait OcrGateway: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ServiceError>>;
}

/// Returns the tagged entity spans for an article.
pub trait NerGateway: Send + Sync {
    fn spans<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<NerSpan>, ServiceError>>;
}

/// Article metadata and corpus statistics over SRU.
pub trait MetadataGateway: Send + Sync {
    fn publication_year<'a>(
        &'a self,
        article_url: &'a str,
    ) -> BoxFuture<'a, Result<Option<i32>, ServiceError>>;

    fn record_count<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<u64, ServiceError>>;
}

/// Word-vector lookups.
pub trait VectorGateway: Send + Sync {
    fn vectors<'a>(
        &'a self,
        words: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f64>>, ServiceError>>;
}

/// The full-text index over knowledge-base descriptions.
pub trait DescriptionIndex: Send + Sync {
    fn query<'a>(
        &'a self,
        q: &'a str,
        rows: usize,
    ) -> BoxFuture<'a, Result<Vec<KbDocument>, KbError>>;
}

impl OcrGateway for OcrClient {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ServiceError>> {
        Box::pin(OcrClient::fetch(self, url))
    }
}

impl NerGateway for NerClient {
    fn spans<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<NerSpan>, ServiceError>> {
        Box::pin(NerClient::spans(self, url))
    }
}

impl MetadataGateway for SruClient {
    fn publication_year<'a>(
        &'a self,
        article_url: &'a str,
    ) -> BoxFuture<'a, Result<Option<i32>, ServiceError>> {
        Box::pin(SruClient::publication_year(self, article_url))
    }

    fn record_count<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<u64, ServiceError>> {
        Box::pin(SruClient::record_count(self, query))
    }
}

impl VectorGateway for VectorClient {
    fn vectors<'a>(
        &'a self,
        words: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f64>>, ServiceError>> {
        Box::pin(VectorClient::vectors(self, words))
    }
}

impl DescriptionIndex for KbClient {
    fn query<'a>(
        &'a self,
        q: &'a str,
        rows: usize,
    ) -> BoxFuture<'a, Result<Vec<KbDocument>, KbError>> {
        Box::pin(KbClient::select(self, q, rows))
    }
}

/// The set of external collaborators one linking request talks to.
#[derive(Clone)]
pub struct Remotes {
    pub ocr: Arc<dyn OcrGateway>,
    pub ner: Arc<dyn NerGateway>,
    pub metadata: Arc<dyn MetadataGateway>,
    pub vectors: Arc<dyn VectorGateway>,
    pub index: Arc<dyn DescriptionIndex>,
}

impl Remotes {
    /// Wire up the production HTTP clients from the configured endpoints.
    pub fn from_settings(settings: &LinkerSettings) -> Self {
        Self {
            ocr: Arc::new(OcrClient::new()),
            ner: Arc::new(NerClient::new(settings.tpta_url.clone())),
            metadata: Arc::new(SruClient::new(settings.jsru_url.clone())),
            vectors: Arc::new(VectorClient::new(settings.w2v_url.clone())),
            index: Arc::new(KbClient::new(settings.solr_url.clone())),
        }
    }
}
