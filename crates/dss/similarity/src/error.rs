use thiserror::Error;

/// Failures of a similarity provider. None of them reach the caller of the
/// pipeline; the registry turns them into a no-match lookup.
#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("provider construction failed: {0}")]
    Construction(String),

    #[error("no candidate activity keys")]
    EmptyCandidates,

    #[error("embedding request timed out")]
    Timeout,

    #[error("embedding transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("similarity lookup failed: {0}")]
    Lookup(String),
}
