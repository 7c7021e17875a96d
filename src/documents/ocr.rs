use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::settings::{non_blank, OcrSettings};
use super::validator::DocumentError;

pub const DEFAULT_MIME_TYPE: &str = "application/pdf";

const OCR_TIMEOUT_SECS: u64 = 60;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Runs OCR over a base64-encoded file and returns the full text.
    async fn extract(&self, content: &str, mime_type: &str) -> Result<String, DocumentError>;
}

/// Google Document AI `:process` endpoint, authenticated with a bearer token.
#[derive(Clone)]
pub struct DocumentAiExtractor {
    endpoint: Option<String>,
    access_token: Option<String>,
    client: Client,
}

impl DocumentAiExtractor {
    pub fn new(settings: &OcrSettings) -> Result<Self, DocumentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(OCR_TIMEOUT_SECS))
            .build()
            .map_err(|err| DocumentError::Ocr(err.to_string()))?;

        Ok(Self {
            endpoint: non_blank(&settings.endpoint).map(str::to_string),
            access_token: non_blank(&settings.access_token).map(str::to_string),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.access_token.is_some()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest<'a> {
    raw_document: RawDocument<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument<'a> {
    content: &'a str,
    mime_type: &'a str,
}

#[derive(Deserialize)]
struct ProcessResponse {
    document: ProcessedDocument,
}

#[derive(Deserialize)]
struct ProcessedDocument {
    text: String,
}

fn parse_process_response(body: &str) -> Result<String, DocumentError> {
    let parsed: ProcessResponse = serde_json::from_str(body)
        .map_err(|err| DocumentError::Ocr(format!("unexpected OCR response: {}", err)))?;
    Ok(parsed.document.text)
}

#[async_trait]
impl TextExtractor for DocumentAiExtractor {
    fn name(&self) -> &str {
        "document-ai"
    }

    async fn extract(&self, content: &str, mime_type: &str) -> Result<String, DocumentError> {
        let (Some(endpoint), Some(token)) = (self.endpoint.as_deref(), self.access_token.as_deref())
        else {
            return Err(DocumentError::OcrNotConfigured);
        };

        tracing::info!("Making HTTP request to: {}", endpoint);
        let body = ProcessRequest {
            raw_document: RawDocument { content, mime_type },
        };
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|err| DocumentError::Ocr(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| DocumentError::Ocr(err.to_string()))?;
        if !status.is_success() {
            return Err(DocumentError::Ocr(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        parse_process_response(&text)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_document_ai_field_names() {
        let body = ProcessRequest {
            raw_document: RawDocument {
                content: "aGVsbG8=",
                mime_type: DEFAULT_MIME_TYPE,
            },
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["rawDocument"]["content"], "aGVsbG8=");
        assert_eq!(value["rawDocument"]["mimeType"], "application/pdf");
    }

    #[test]
    fn response_text_is_extracted() {
        let text = parse_process_response(r#"{"document":{"text":"PASSPORT\nDOE JOHN","pages":[]}}"#)
            .expect("parse");
        assert_eq!(text, "PASSPORT\nDOE JOHN");
        assert!(parse_process_response(r#"{"error":"nope"}"#).is_err());
    }

    #[tokio::test]
    async fn unconfigured_extractor_refuses_to_run() {
        let extractor = DocumentAiExtractor::new(&OcrSettings {
            endpoint: Some("https://example.com/v1/processors/x:process".to_string()),
            access_token: Some("   ".to_string()),
        })
        .expect("client");

        assert!(!extractor.is_configured());
        assert!(matches!(
            extractor.extract("aGVsbG8=", DEFAULT_MIME_TYPE).await,
            Err(DocumentError::OcrNotConfigured)
        ));
    }
}
