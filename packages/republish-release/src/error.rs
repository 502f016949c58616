//! Error types for the asset replacement protocol

use republish_utils::BoxError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single call against the release service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with something other than the expected status.
    #[error("HTTP {status} {reason}{}", body_suffix(.body))]
    Status {
        status: u16,
        reason: String,
        body: String,
    },
    /// Connection, TLS or protocol failure before a status was received.
    #[error("request failed: {0}")]
    Transport(#[source] BoxError),
    #[error("local archive {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {body}")
    }
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Protocol steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    FetchRelease,
    ValidatePreconditions,
    UploadNew,
    StabilizationDelay,
    RenameCurrentToOld,
    RenameNewToCurrent,
    DeleteOld,
    PatchNotes,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Step::FetchRelease => "GET - release info",
            Step::ValidatePreconditions => "check release assets",
            Step::UploadNew => "POST - upload new 7z package",
            Step::StabilizationDelay => "wait for upload processing",
            Step::RenameCurrentToOld => "PATCH - rename current asset to old",
            Step::RenameNewToCurrent => "PATCH - rename updated asset to current",
            Step::DeleteOld => "DELETE - remove old asset",
            Step::PatchNotes => "PATCH - update release notes with date/build number",
        };
        f.write_str(text)
    }
}

/// Asset layout found on the release that blocks a new run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("current asset {0} not found")]
    CurrentMissing(String),
    #[error("old asset {0} exists")]
    StaleOld(String),
    #[error("new asset {0} exists")]
    StaleNew(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PreconditionViolation,
    TransportFailure,
    LocalIoFailure,
}

/// A fatal protocol failure. The release is left as described by
/// [`ReplaceError::recovery_hint`].
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("{0}")]
    Precondition(#[from] Precondition),
    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: ClientError,
    },
}

impl ReplaceError {
    pub fn step(&self) -> Step {
        match self {
            ReplaceError::Precondition(_) => Step::ValidatePreconditions,
            ReplaceError::Step { step, .. } => *step,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReplaceError::Precondition(_) => ErrorKind::PreconditionViolation,
            ReplaceError::Step {
                source: ClientError::LocalIo { .. },
                ..
            } => ErrorKind::LocalIoFailure,
            ReplaceError::Step { .. } => ErrorKind::TransportFailure,
        }
    }

    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            ReplaceError::Step { source, .. } => Some(source),
            ReplaceError::Precondition(_) => None,
        }
    }

    /// What the operator has to fix by hand before the next run, if anything.
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self.step() {
            Step::FetchRelease | Step::UploadNew | Step::StabilizationDelay => None,
            Step::ValidatePreconditions => match self {
                ReplaceError::Precondition(Precondition::CurrentMissing(_)) => None,
                _ => Some(
                    "a previous run did not finish; inspect the _old/_new assets and remove or rename them by hand",
                ),
            },
            Step::RenameCurrentToOld => Some(
                "no asset may carry the canonical name: the previous archive is the current or _old asset and the new archive is the _new asset; rename them by hand",
            ),
            Step::RenameNewToCurrent => Some(
                "the previous archive is the _old asset and the new archive is still the _new asset; rename _new to the canonical name and delete _old",
            ),
            Step::DeleteOld => Some("delete the stray _old asset, it blocks the next run"),
            Step::PatchNotes => Some(
                "the new archive is published; the release notes still show the previous date and build",
            ),
        }
    }
}
