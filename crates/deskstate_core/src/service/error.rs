//! Service-level error taxonomy.

use super::layout::LayoutError;
use crate::model::ViewTargetError;
use crate::repo::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse classification exposed to transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DeadlineExceeded,
    InvariantViolation,
    /// Caller-supplied input was rejected; retrying unchanged will fail.
    InvalidArgument,
    PersistenceFailure,
}

#[derive(Debug)]
pub enum ServiceError {
    /// Store call failed while performing `operation`.
    Store {
        operation: &'static str,
        source: StoreError,
    },
    /// Request cannot proceed in the current state; not retryable.
    InvariantViolation(String),
    InvalidLayout(LayoutError),
    /// A view target could not be resolved to a block definition.
    InvalidTarget(ViewTargetError),
}

impl ServiceError {
    /// Returns a mapper wrapping store errors with `operation`.
    pub(crate) fn store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store { source, .. } => match source {
                StoreError::NotFound { .. } | StoreError::SingletonMissing(_) => {
                    ErrorKind::NotFound
                }
                StoreError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
                _ => ErrorKind::PersistenceFailure,
            },
            Self::InvariantViolation(_) | Self::InvalidLayout(_) => ErrorKind::InvariantViolation,
            Self::InvalidTarget(_) => ErrorKind::InvalidArgument,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store { operation, source } => write!(f, "error {operation}: {source}"),
            Self::InvariantViolation(message) => write!(f, "{message}"),
            Self::InvalidLayout(err) => write!(f, "invalid layout: {err}"),
            Self::InvalidTarget(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store { source, .. } => Some(source),
            Self::InvariantViolation(_) => None,
            Self::InvalidLayout(err) => Some(err),
            Self::InvalidTarget(err) => Some(err),
        }
    }
}

impl From<LayoutError> for ServiceError {
    fn from(value: LayoutError) -> Self {
        Self::InvalidLayout(value)
    }
}

impl From<ViewTargetError> for ServiceError {
    fn from(value: ViewTargetError) -> Self {
        Self::InvalidTarget(value)
    }
}
