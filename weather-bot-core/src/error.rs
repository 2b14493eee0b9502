use thiserror::Error;

/// Errors surfaced by the core lookup pipeline.
///
/// Provider outages and non-success statuses are deliberately absent here: they
/// are folded into `LookupOutcome::NotFound` or an empty candidate list where
/// the call is made.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider answered with a success status but the payload is unusable.
    #[error("{provider} returned a malformed response: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(
        "missing credential `{name}`.\n\
         Hint: set the {env} environment variable or run `weather-bot configure`."
    )]
    MissingCredential {
        name: &'static str,
        env: &'static str,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
