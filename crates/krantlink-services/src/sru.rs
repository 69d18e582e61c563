//! SRU metadata client.
//!
//! Two uses against the newspaper article collection: fetching an article's
//! publication year from its Dublin Core `date` element, and counting
//! articles matching a co-occurrence query (`maximumRecords=0`, only the
//! `numberOfRecords` element is read).

use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::ServiceError;

const METADATA_TIMEOUT: Duration = Duration::from_secs(30);
const COUNT_TIMEOUT: Duration = Duration::from_secs(60);

const COLLECTION: &str = "DDD_artikel";

#[derive(Debug, Clone)]
pub struct SruClient {
    base_url: String,
    client: reqwest::Client,
}

impl SruClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the publication year for an article URL, if the collection
    /// knows it.
    pub async fn publication_year(&self, article_url: &str) -> Result<Option<i32>, ServiceError> {
        let Some(key) = article_key(article_url) else {
            tracing::debug!(url = article_url, "no article key in URL");
            return Ok(None);
        };

        let query = format!("uniqueKey={key}");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("operation", "searchRetrieve"),
                ("x-collection", COLLECTION),
                ("query", query.as_str()),
            ])
            .timeout(METADATA_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                service: "SRU",
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(parse_year(&body)?)
    }

    /// Count articles matching a CQL query.
    pub async fn record_count(&self, query: &str) -> Result<u64, ServiceError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("operation", "searchRetrieve"),
                ("x-collection", COLLECTION),
                ("maximumRecords", "0"),
                ("query", query),
            ])
            .timeout(COUNT_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                service: "SRU",
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        parse_record_count(&body)
    }
}

/// The `ddd:…` collection key embedded in a resolver URL, minus the
/// trailing `:ocr` suffix.
pub fn article_key(url: &str) -> Option<&str> {
    let start = url.find("ddd:")?;
    let end = url.len().checked_sub(4)?;
    if end <= start {
        return None;
    }
    Some(&url[start..end])
}

fn parse_year(xml: &str) -> Result<Option<i32>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut in_date = false;
    let mut date_buf = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"date" => {
                in_date = true;
                date_buf.clear();
            }
            Event::Text(e) if in_date => {
                if let Ok(text) = e.unescape() {
                    date_buf.push_str(&text);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"date" => {
                let year = date_buf.trim().chars().take(4).collect::<String>();
                return Ok(year.parse().ok());
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(None)
}

fn parse_record_count(xml: &str) -> Result<u64, ServiceError> {
    let mut reader = Reader::from_str(xml);
    let mut in_count = false;
    let mut buf = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"numberOfRecords" => {
                in_count = true;
                buf.clear();
            }
            Event::Text(e) if in_count => {
                if let Ok(text) = e.unescape() {
                    buf.push_str(&text);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"numberOfRecords" => {
                return buf
                    .trim()
                    .parse()
                    .map_err(|_| ServiceError::Malformed(format!("bad record count: {buf}")));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Err(ServiceError::Malformed("numberOfRecords missing".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_key_strips_suffix() {
        assert_eq!(
            article_key("http://resolver.example/resolve?urn=ddd:010734861:mpeg21:a0002:ocr"),
            Some("ddd:010734861:mpeg21:a0002")
        );
        assert_eq!(article_key("http://resolver.example/plain"), None);
    }

    #[test]
    fn parses_dublin_core_year() {
        let xml = r#"<srw:searchRetrieveResponse xmlns:srw="http://www.loc.gov/zing/srw/"
            xmlns:dc="http://purl.org/dc/elements/1.1/">
            <srw:records><srw:record><srw:recordData>
            <dc:date>1920-03-14</dc:date>
            </srw:recordData></srw:record></srw:records>
            </srw:searchRetrieveResponse>"#;
        assert_eq!(parse_year(xml).unwrap(), Some(1920));
    }

    #[test]
    fn missing_date_is_none() {
        let xml = "<response><records/></response>";
        assert_eq!(parse_year(xml).unwrap(), None);
    }

    #[test]
    fn parses_record_count() {
        let xml = r#"<srw:searchRetrieveResponse xmlns:srw="http://www.loc.gov/zing/srw/">
            <srw:numberOfRecords>117</srw:numberOfRecords>
            </srw:searchRetrieveResponse>"#;
        assert_eq!(parse_record_count(xml).unwrap(), 117);
    }

    #[test]
    fn garbage_count_is_malformed() {
        let xml = "<r><numberOfRecords>lots</numberOfRecords></r>";
        assert!(matches!(
            parse_record_count(xml),
            Err(ServiceError::Malformed(_))
        ));
    }
}
