use std::sync::Arc;

use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::llm::{ChatRequest, LlmProvider};
use super::classifier::{classification_messages, judge, parse_classification, OcrResult, Verdict};
use super::ocr::{TextExtractor, DEFAULT_MIME_TYPE};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("No file uploaded.")]
    NoFile,
    #[error("OCR is not configured (set ocr.endpoint and ocr.access_token)")]
    OcrNotConfigured,
    #[error("{0}")]
    Ocr(String),
    #[error("{0}")]
    Classification(#[source] ApiError),
    #[error("could not parse classification: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub verdict: Verdict,
    pub ocr_result: OcrResult,
}

/// OCR followed by language-model classification.
#[derive(Clone)]
pub struct DocumentValidator {
    extractor: Arc<dyn TextExtractor>,
    llm: Arc<dyn LlmProvider>,
}

impl DocumentValidator {
    pub fn new(extractor: Arc<dyn TextExtractor>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { extractor, llm }
    }

    pub async fn validate(
        &self,
        document_type: &str,
        mime_type: Option<&str>,
        content: &str,
    ) -> Result<Validation, DocumentError> {
        let span = tracing::info_span!("validate_document", request_id = %Uuid::new_v4());

        async move {
            let result = self.run(document_type, mime_type, content).await;
            match &result {
                Ok(validation) => tracing::info!(
                    "Document checked against {:?}: {:?}",
                    document_type,
                    validation.verdict
                ),
                Err(err) => tracing::error!("Error processing document: {}", err),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        document_type: &str,
        mime_type: Option<&str>,
        content: &str,
    ) -> Result<Validation, DocumentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DocumentError::NoFile);
        }
        let mime_type = mime_type
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);

        let extracted = self.extractor.extract(content, mime_type).await?;
        tracing::debug!("Extracted text: {}", extracted);

        tracing::info!("Sending the extracted text to {}", self.llm.name());
        let reply = self
            .llm
            .chat(ChatRequest::new(classification_messages(&extracted)))
            .await
            .map_err(DocumentError::Classification)?;

        let ocr_result = parse_classification(&reply)?;
        tracing::debug!("Parsed classification: {:?}", ocr_result);

        Ok(Validation {
            verdict: judge(&ocr_result, document_type),
            ocr_result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::ocr::fakes::FixedExtractor;
    use crate::llm::provider::fakes::RecordingLlm;

    fn validator(text: Option<&str>, reply: &str) -> (DocumentValidator, Arc<RecordingLlm>) {
        let llm = Arc::new(RecordingLlm::new(reply));
        let extractor = Arc::new(FixedExtractor {
            text: text.map(str::to_string),
        });
        (DocumentValidator::new(extractor, llm.clone()), llm)
    }

    #[tokio::test]
    async fn matching_passport_is_valid() {
        let (validator, llm) = validator(
            Some("PASSPORT\nROE JANE\nEXP 02 APR 2031"),
            "```json\n{\"document_type\":\"Passport\",\"name\":\"Jane Roe\",\"expiration_date\":\"2031-04-02\"}\n```",
        );

        let validation = validator
            .validate("Passport", None, "aGVsbG8=")
            .await
            .expect("validates");
        assert_eq!(validation.verdict, Verdict::Valid);
        assert_eq!(validation.ocr_result.name.as_deref(), Some("Jane Roe"));
        assert_eq!(
            llm.last_user_prompt().as_deref(),
            Some("PASSPORT\nROE JANE\nEXP 02 APR 2031")
        );
    }

    #[tokio::test]
    async fn other_document_type_is_a_mismatch() {
        let (validator, _) = validator(
            Some("DRIVING LICENCE"),
            r#"{"document_type":"Driving License","name":null,"expiration_date":null}"#,
        );
        let validation = validator
            .validate("Passport", Some("image/png"), "aGVsbG8=")
            .await
            .expect("validates");
        assert_eq!(validation.verdict, Verdict::Mismatch);
    }

    #[tokio::test]
    async fn unrelated_document_is_rejected() {
        let (validator, _) = validator(Some("Invoice #42"), r#"{"document_type":"None"}"#);
        let validation = validator
            .validate("Passport", None, "aGVsbG8=")
            .await
            .expect("validates");
        assert_eq!(validation.verdict, Verdict::NotADocument);
    }

    #[tokio::test]
    async fn failures_surface_as_errors() {
        let (blank, _) = validator(Some("x"), "{}");
        assert!(matches!(
            blank.validate("Passport", None, "  ").await,
            Err(DocumentError::NoFile)
        ));

        let (ocr_down, llm) = validator(None, "{}");
        assert!(matches!(
            ocr_down.validate("Passport", None, "aGVsbG8=").await,
            Err(DocumentError::Ocr(_))
        ));
        assert!(llm.last_user_prompt().is_none());

        let (prose, _) = validator(Some("text"), "It is a passport.");
        assert!(matches!(
            prose.validate("Passport", None, "aGVsbG8=").await,
            Err(DocumentError::Parse(_))
        ));

        let (llm_down, llm) = validator(Some("text"), "{}");
        llm.set_failing(true);
        assert!(matches!(
            llm_down.validate("Passport", None, "aGVsbG8=").await,
            Err(DocumentError::Classification(_))
        ));
    }
}
