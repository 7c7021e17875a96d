//! FAQ retrieval.
//!
//! - `chunker`: splits FAQ text into blank-line delimited chunks
//! - `index`: exact inner-product vector index
//! - `knowledge`: the startup-built corpus + index pair
//! - `retriever`: query embedding and top-k lookup

pub mod chunker;
pub mod index;
pub mod knowledge;
pub mod retriever;

pub use index::{IndexError, SearchHit, VectorIndex};
pub use knowledge::KnowledgeBase;
pub use retriever::{RetrievedChunk, Retriever, DEFAULT_TOP_K};
