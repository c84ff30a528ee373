use crate::{Error, record::RecordId};

/// The ways a [RecordSession](super::RecordSession) operation can fail.
///
/// None of these are retried automatically. After any error the session's
/// cache holds its last confirmed state.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SessionError {
    /// The store rejected a field, or the caller supplied an invalid value.
    ///
    /// The string is suitable for showing to the user.
    #[error("invalid record: {0}")]
    Validation(String),

    /// The record or user has no matching entry in the store.
    #[error("the record could not be found")]
    NotFound,

    /// The request could not be completed, e.g. the store is unreachable or
    /// did not answer in time.
    #[error("could not reach the record store: {0}")]
    Transport(String),

    /// The store failed for a reason that is not the caller's fault.
    #[error("the record store failed: {0}")]
    Server(String),

    /// There is no signed in user, so there is no session to change.
    #[error("no user is signed in")]
    SignedOut,

    /// A change to this record is still waiting for the store to answer.
    #[error("a change to record {0} is still in progress")]
    MutationInFlight(RecordId),

    /// The session was initialized again while the request was in flight, so
    /// its result was discarded.
    #[error("the session changed before the request completed")]
    Superseded,
}

impl From<Error> for SessionError {
    fn from(error: Error) -> Self {
        match error {
            Error::Validation(description) => SessionError::Validation(description),
            Error::NotFound => SessionError::NotFound,
            error => SessionError::Server(error.to_string()),
        }
    }
}
