//! Outcome and error types shared by blocking and asynchronous operations.

use crate::model::decode::DecodeError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AccessResult<T> = Result<T, AccessError>;

/// An asynchronous request could not be run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionError {
    /// No tokio runtime was available to accept the request.
    NoRuntime,
    /// The target context was discarded before submission.
    ContextDiscarded,
    /// The worker went away before resolving the request.
    Abandoned,
}

impl Display for SubmissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRuntime => write!(f, "no async runtime available to run the request"),
            Self::ContextDiscarded => write!(f, "request targets a discarded context"),
            Self::Abandoned => write!(f, "request was abandoned before completing"),
        }
    }
}

impl Error for SubmissionError {}

/// Failure of any data-access operation.
#[derive(Debug)]
pub enum AccessError {
    Store(StoreError),
    Submission(SubmissionError),
    Decode(DecodeError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Submission(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Submission(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<StoreError> for AccessError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SubmissionError> for AccessError {
    fn from(value: SubmissionError) -> Self {
        Self::Submission(value)
    }
}

impl From<DecodeError> for AccessError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

/// Terminal outcome of an asynchronous request: exactly one of two cases.
#[derive(Debug)]
#[must_use]
pub enum Envelope<T> {
    Success(T),
    Failure(AccessError),
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> AccessResult<T> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(err) => Err(err),
        }
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AccessError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }

    pub fn map<U, F>(self, f: F) -> Envelope<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success(value) => Envelope::Success(f(value)),
            Self::Failure(err) => Envelope::Failure(err),
        }
    }
}

impl<T, E> From<Result<T, E>> for Envelope<T>
where
    E: Into<AccessError>,
{
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err.into()),
        }
    }
}
