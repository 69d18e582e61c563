//! Per-article context: the OCR text, the recognised mentions, and lazily
//! derived article state (publication year, subjects, normalised OCR,
//! OCR bag-of-words). All derived state is computed at most once per
//! request and never invalidated.

use std::collections::HashSet;

use krantlink_lexicon as lexicon;

use crate::LinkError;
use crate::mention::Mention;
use crate::remote::{MetadataGateway, Remotes};
use crate::text::{normalize, tokenize};

#[derive(Debug)]
pub struct Article {
    pub url: String,
    pub ocr: String,
    publ_year: Option<Option<i32>>,
    subjects: Option<Vec<&'static str>>,
    ocr_norm: Option<String>,
    ocr_bow: Option<HashSet<String>>,
}

impl Article {
    pub fn new(url: impl Into<String>, ocr: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ocr: ocr.into(),
            publ_year: None,
            subjects: None,
            ocr_norm: None,
            ocr_bow: None,
        }
    }

    /// Publication year from the article metadata, fetched on first use.
    pub async fn publ_year(
        &mut self,
        metadata: &dyn MetadataGateway,
    ) -> Result<Option<i32>, LinkError> {
        if let Some(year) = self.publ_year {
            return Ok(year);
        }
        let year = metadata.publication_year(&self.url).await?;
        self.publ_year = Some(year);
        Ok(year)
    }

    /// Subjects detected in the OCR via the subject vocabularies.
    pub fn subjects(&mut self) -> &[&'static str] {
        if self.subjects.is_none() {
            let tokens: HashSet<String> =
                tokenize(&self.ocr).iter().map(|t| normalize(t)).collect();
            let subjects = lexicon::SUBJECTS
                .iter()
                .filter(|s| {
                    lexicon::subject_vocabulary(s)
                        .iter()
                        .any(|w| tokens.contains(*w))
                })
                .map(|s| s.name)
                .collect();
            self.subjects = Some(subjects);
        }
        self.subjects.as_deref().unwrap_or_default()
    }

    pub fn ocr_norm(&mut self) -> &str {
        if self.ocr_norm.is_none() {
            self.ocr_norm = Some(normalize(&self.ocr));
        }
        self.ocr_norm.as_deref().unwrap_or_default()
    }

    /// Distinct normalised words of the OCR.
    pub fn ocr_bow(&mut self) -> &HashSet<String> {
        if self.ocr_bow.is_none() {
            let bow = tokenize(&self.ocr)
                .iter()
                .flat_map(|t| {
                    normalize(t)
                        .split_whitespace()
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .collect();
            self.ocr_bow = Some(bow);
        }
        self.ocr_bow.get_or_insert_with(HashSet::new)
    }
}

/// Everything known about one article: OCR plus the mention list.
#[derive(Debug)]
pub struct Context {
    pub article: Article,
    pub mentions: Vec<Mention>,
}

impl Context {
    /// Fetch OCR and NER results for an article URL and build the mentions.
    ///
    /// A document cursor advances past each found span so identical surface
    /// forms map to successive occurrences.
    pub async fn fetch(url: &str, remotes: &Remotes) -> Result<Self, LinkError> {
        let ocr = remotes.ocr.fetch(url).await?;
        let spans = remotes.ner.spans(url).await?;

        let mut mentions = Vec::with_capacity(spans.len());
        let mut cursor = 0usize;
        for span in spans {
            let mention = Mention::new(&span.text, Some(&span.tag), &ocr, cursor);
            if let Some(end) = mention.end_pos() {
                cursor = end;
            }
            mentions.push(mention);
        }

        tracing::debug!(url, mentions = mentions.len(), "context ready");
        Ok(Self {
            article: Article::new(url, ocr),
            mentions,
        })
    }
}
