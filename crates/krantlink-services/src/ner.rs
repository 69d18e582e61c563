//! NER service client.
//!
//! The service tags an article (by URL) and returns XML of the form
//! `<entities><person>Jan de Vries</person>…</entities>`, or an `<error>`
//! element which is propagated as a failure. The child element tag is the
//! entity type; spans of length ≤ 1 are dropped.

use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::ServiceError;

const NER_TIMEOUT: Duration = Duration::from_secs(30);

/// One tagged span from the NER service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NerSpan {
    pub tag: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct NerClient {
    base_url: String,
    client: reqwest::Client,
}

impl NerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Request the tagged spans for an article.
    pub async fn spans(&self, article_url: &str) -> Result<Vec<NerSpan>, ServiceError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("lang", "nl"), ("url", article_url)])
            .timeout(NER_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                service: "NER service",
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        parse_spans(&body)
    }
}

/// Parse the NER response body into spans, surfacing `<error>` elements.
pub fn parse_spans(xml: &str) -> Result<Vec<NerSpan>, ServiceError> {
    let mut reader = Reader::from_str(xml);

    let mut spans = Vec::new();
    let mut in_error = false;
    let mut in_entities = false;
    let mut current_tag: Option<String> = None;
    let mut text_buf = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "error" => {
                        in_error = true;
                        text_buf.clear();
                    }
                    "entities" => in_entities = true,
                    _ if in_entities && current_tag.is_none() => {
                        current_tag = Some(name);
                        text_buf.clear();
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if in_error || current_tag.is_some() {
                    let text = e
                        .unescape()
                        .map_err(|e| ServiceError::Malformed(e.to_string()))?;
                    text_buf.push_str(&text);
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if in_error && name.as_ref() == b"error" {
                    return Err(ServiceError::Ner(text_buf.trim().to_string()));
                }
                if name.as_ref() == b"entities" {
                    in_entities = false;
                } else if let Some(tag) = current_tag.take_if(|t| t.as_bytes() == name.as_ref()) {
                    let text = text_buf.trim().to_string();
                    if text.chars().count() > 1 {
                        spans.push(NerSpan { tag, text });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_spans() {
        let xml = "<response><entities>\
            <person>Jan de Vries</person>\
            <location>Amsterdam</location>\
            <organisation>Philips</organisation>\
            </entities></response>";
        let spans = parse_spans(xml).unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!(
            spans[0],
            NerSpan {
                tag: "person".into(),
                text: "Jan de Vries".into()
            }
        );
        assert_eq!(spans[1].tag, "location");
    }

    #[test]
    fn short_spans_are_dropped() {
        let xml = "<response><entities><person>J</person><person>Jo</person></entities></response>";
        let spans = parse_spans(xml).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Jo");
    }

    #[test]
    fn error_element_propagates() {
        let xml = "<response><error>tagger unavailable</error></response>";
        match parse_spans(xml) {
            Err(ServiceError::Ner(msg)) => assert_eq!(msg, "tagger unavailable"),
            other => panic!("expected NER error, got {other:?}"),
        }
    }

    #[test]
    fn empty_entities_is_fine() {
        let xml = "<response><entities/></response>";
        assert!(parse_spans(xml).unwrap().is_empty());
    }
}
