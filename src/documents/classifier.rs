//! Turns OCR text into a structured classification via the language model.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

pub const CLASSIFIER_INSTRUCTION: &str = r#"You are a helpful and accurate assistant. The user will provide text extracted from an identity document.
Your task is to determine:
1. The type of document either "Passport", "Driving License", or "None" (if the document is neither)
2. The name of the document owner
3. The expiration date

Always return your response in the following strict JSON format:
{
"document_type": "Passport" | "Driving License" | "None",
"name": "Full Name of the owner",
"expiration_date": "YYYY-MM-DD"
}
If any information is missing or unclear, return null for that field. Be concise and only respond with the JSON object."#;

static CODE_FENCE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// The model's reading of an identity document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResult {
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Mismatch,
    NotADocument,
}

impl Verdict {
    pub fn is_valid(&self) -> &'static str {
        match self {
            Verdict::Valid => "valid",
            Verdict::Mismatch | Verdict::NotADocument => "invalid",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Valid => "Your document was validated",
            Verdict::Mismatch => "Your document did not match the selected document type",
            Verdict::NotADocument => {
                "Uploaded file is not a valid document (Passport | Driving license)"
            }
        }
    }
}

pub fn classification_messages(extracted_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CLASSIFIER_INSTRUCTION),
        ChatMessage::user(extracted_text),
    ]
}

/// Removes the first Markdown code fence (optionally tagged `json`) around
/// the reply, keeping its body.
pub fn strip_code_fences(reply: &str) -> String {
    match CODE_FENCE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```")) {
        Ok(pattern) => pattern.replacen(reply, 1, "$1").trim().to_string(),
        Err(err) => {
            tracing::warn!("Code fence pattern unavailable: {}", err);
            reply.trim().to_string()
        }
    }
}

pub fn parse_classification(reply: &str) -> Result<OcrResult, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(reply))
}

/// Compares the classified type with the one the user selected. The literal
/// strings "None" and "null" count as "not a document".
pub fn judge(result: &OcrResult, expected: &str) -> Verdict {
    match result.document_type.as_deref() {
        None | Some("None") | Some("null") => Verdict::NotADocument,
        Some(actual) if actual == expected => Verdict::Valid,
        Some(_) => Verdict::Mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(document_type: Option<&str>) -> OcrResult {
        OcrResult {
            document_type: document_type.map(str::to_string),
            ..OcrResult::default()
        }
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let reply = "```json\n{\"document_type\": \"Passport\", \"name\": \"Jane Roe\", \"expiration_date\": \"2031-04-02\"}\n```";
        let parsed = parse_classification(reply).expect("parse");
        assert_eq!(parsed.document_type.as_deref(), Some("Passport"));
        assert_eq!(parsed.name.as_deref(), Some("Jane Roe"));
        assert_eq!(parsed.expiration_date.as_deref(), Some("2031-04-02"));
    }

    #[test]
    fn untagged_fence_and_bare_json_both_parse() {
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");

        let parsed = parse_classification(r#"{"document_type": null, "name": null}"#).expect("parse");
        assert_eq!(parsed, OcrResult::default());
    }

    #[test]
    fn prose_reply_fails_to_parse() {
        assert!(parse_classification("This looks like a passport.").is_err());
    }

    #[test]
    fn verdicts_follow_the_classified_type() {
        assert_eq!(judge(&result(Some("Passport")), "Passport"), Verdict::Valid);
        assert_eq!(
            judge(&result(Some("Driving License")), "Passport"),
            Verdict::Mismatch
        );
        assert_eq!(judge(&result(Some("None")), "Passport"), Verdict::NotADocument);
        assert_eq!(judge(&result(Some("null")), "Passport"), Verdict::NotADocument);
        assert_eq!(judge(&result(None), "Passport"), Verdict::NotADocument);

        assert_eq!(Verdict::Valid.is_valid(), "valid");
        assert_eq!(Verdict::Mismatch.is_valid(), "invalid");
    }
}
