//! HTTP clients for the external services the linker consumes: the OCR
//! resolver, the NER tagger, the SRU bibliographic endpoint and the
//! word-vector service.
//!
//! All clients are thin: one blocking-style async call per request with a
//! per-call timeout, XML handled with SAX-style event parsing.

use thiserror::Error;

pub mod ner;
pub mod ocr;
pub mod sru;
pub mod vectors;

pub use ner::{NerClient, NerSpan};
pub use ocr::OcrClient;
pub use sru::SruClient;
pub use vectors::VectorClient;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("NER service error: {0}")]
    Ner(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}
