//! OCR resolver client.
//!
//! An article URL resolves to an XML document; the OCR text is the
//! whitespace-collapsed concatenation of all text content in that document.

use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::ServiceError;

const OCR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct OcrClient {
    client: reqwest::Client,
}

impl OcrClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch and flatten the OCR for an article URL.
    pub async fn fetch(&self, url: &str) -> Result<String, ServiceError> {
        let response = self.client.get(url).timeout(OCR_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                service: "OCR resolver",
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        extract_text(&body)
    }
}

impl Default for OcrClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialise the text content of an XML document, collapsing whitespace.
pub fn extract_text(xml: &str) -> Result<String, ServiceError> {
    let mut reader = Reader::from_str(xml);
    let mut pieces: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| ServiceError::Malformed(e.to_string()))?;
                pieces.push(text.into_owned());
            }
            Event::CData(e) => {
                pieces.push(String::from_utf8_lossy(e.as_ref()).into_owned());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let joined = pieces.join(" ");
    Ok(joined.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_collapses_text() {
        let xml = "<text><title>De  krant</title>\n<p>Jan de Vries\nwas aanwezig.</p></text>";
        assert_eq!(extract_text(xml).unwrap(), "De krant Jan de Vries was aanwezig.");
    }

    #[test]
    fn empty_document_yields_empty_ocr() {
        assert_eq!(extract_text("<text/>").unwrap(), "");
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = "<p>Vries &amp; Zonen</p>";
        assert_eq!(extract_text(xml).unwrap(), "Vries & Zonen");
    }
}
