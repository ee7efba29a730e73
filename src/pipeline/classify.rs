// src/pipeline/classify.rs

//! Classification of analysis failures into recovery actions.
//!
//! | Kind            | Action                      |
//! |-----------------|-----------------------------|
//! | `NotFound`      | remove index entry, surface |
//! | `Unrecoverable` | swallow (acknowledge)       |
//! | `Other`         | surface (redeliver)         |

use crate::error::{AppError, CODE_NOT_FOUND};

/// Failure kind as declared by the failing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The module no longer exists upstream
    NotFound,
    /// Explicitly flagged as not worth retrying
    Unrecoverable,
    /// Anything else, including untagged failures
    Other,
}

/// What the processor does about a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Log and treat the delivery as handled
    Skip,
    /// Remove the stale index entry, then surface the original error
    CompensateThenPropagate,
    /// Surface the error so the delivery is redelivered
    Propagate,
}

impl ErrorKind {
    pub fn recovery(self) -> RecoveryAction {
        match self {
            ErrorKind::NotFound => RecoveryAction::CompensateThenPropagate,
            ErrorKind::Unrecoverable => RecoveryAction::Skip,
            ErrorKind::Other => RecoveryAction::Propagate,
        }
    }
}

/// An error paired with its kind.
#[derive(Debug)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub error: AppError,
}

impl ClassifiedError {
    pub fn action(&self) -> RecoveryAction {
        self.kind.recovery()
    }

    pub fn into_error(self) -> AppError {
        self.error
    }
}

/// Map an error to its kind. Unknown or unflagged errors are `Other`.
pub fn classify(error: AppError) -> ClassifiedError {
    let kind = match &error {
        AppError::Analysis { code, .. } if code.as_deref() == Some(CODE_NOT_FOUND) => {
            ErrorKind::NotFound
        }
        AppError::Analysis {
            unrecoverable: true,
            ..
        } => ErrorKind::Unrecoverable,
        AppError::RecordNotFound { .. } => ErrorKind::NotFound,
        _ => ErrorKind::Other,
    };

    ClassifiedError { kind, error }
}
