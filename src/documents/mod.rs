//! Identity-document validation: OCR, then a language-model classification
//! checked against the document type the user selected.

pub mod classifier;
pub mod ocr;
pub mod validator;

pub use classifier::{OcrResult, Verdict};
pub use ocr::{DocumentAiExtractor, TextExtractor, DEFAULT_MIME_TYPE};
pub use validator::{DocumentError, DocumentValidator, Validation};
