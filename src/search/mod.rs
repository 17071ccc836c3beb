//! Search engines: lexical (FTS5), semantic (embedding cosine scan) and
//! the hybrid merger that combines them.

pub mod embedding;
pub mod hybrid;
pub mod lexical;
pub mod semantic;

pub use embedding::Embedder;
pub use hybrid::{HybridWeights, DEFAULT_LIMIT};
