use dss_similarity::SimilarityError;
use dss_types::ConfigError;
use thiserror::Error;

/// Errors raised while assembling a [`Pipeline`](crate::Pipeline).
///
/// Classification itself never fails; every request ends in a
/// classified or undetermined response.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("similarity provider setup failed: {0}")]
    Similarity(#[from] SimilarityError),
}
