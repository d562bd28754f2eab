//! Semantic activity matching.
//!
//! The rule engine only needs `nearest(query) -> (key, score)` for the
//! activity keys of a sector. This crate provides:
//!
//! - [`SimilarityProvider`] / [`ProviderFactory`]: the collaborator seams
//! - [`SimilarityRegistry`]: per-sector provider cache with single-flight
//!   construction, shared by all requests of a pipeline
//! - [`EmbeddingProvider`]: arg-max cosine similarity over embeddings
//! - [`HttpEmbedder`]: embedding service client
//! - [`mocks`]: deterministic providers for tests

pub mod embedding;
pub mod error;
pub mod http;
pub mod mocks;
pub mod registry;
pub mod traits;

pub use embedding::{cosine_similarity, EmbeddingFactory, EmbeddingProvider, InputType};
pub use error::SimilarityError;
pub use http::HttpEmbedder;
pub use mocks::{StaticFactory, StaticSimilarity};
pub use registry::{DisabledFactory, SimilarityLookup, SimilarityRegistry};
pub use traits::{Embedder, ProviderFactory, SimilarityMatch, SimilarityProvider};
