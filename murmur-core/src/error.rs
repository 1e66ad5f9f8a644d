use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error taxonomy of the murmur core.
///
/// Soft-check surfaces (`SocialGraph::is_following`,
/// `EngagementService::is_liked`) never return these; they log and fall
/// back to `false` because they gate only optional UI affordances.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller lacks identity context.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Actor does not own the target resource.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Referenced post, comment, like, or follow edge is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The mutation duplicates existing state (like or follow edge).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request arguments violate an invariant (empty target id,
    /// self-follow).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying store or collaborator failure.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(err.into())
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Store(err.into())
    }
}
