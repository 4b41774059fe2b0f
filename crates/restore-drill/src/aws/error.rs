//! RDS error classification
//!
//! Maps control-plane error codes to a small taxonomy so callers can tell
//! "not visible yet" and "already gone" apart from "call rejected". Uses the
//! SDK's `.code()` metadata instead of string matching on Debug output.

use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// RDS error categories for polling, retry and cleanup logic
#[derive(Debug, Error)]
pub enum RdsError {
    /// Resource does not exist (not created yet, or already deleted)
    #[error("Resource not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Resource exists but is in a state that rejects the operation
    #[error("Resource in invalid state ({code}): {message}")]
    InvalidState { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    Throttled(String),

    /// Resource with that identifier already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Any other SDK, service or transport failure
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl RdsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RdsError::NotFound { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, RdsError::InvalidState { .. })
    }

    /// Whether waiting and asking again can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RdsError::Throttled(_) | RdsError::InvalidState { .. })
    }

    /// The raw service error code, when one was returned
    pub fn code(&self) -> Option<&str> {
        match self {
            RdsError::NotFound { code, .. } | RdsError::InvalidState { code, .. } => Some(code),
            RdsError::Sdk { code, .. } => code.as_deref(),
            RdsError::Throttled(_) | RdsError::AlreadyExists(_) => None,
        }
    }

    /// A not-found error for a resource that a describe call did not return.
    pub fn missing(code: &str, resource_id: &str) -> Self {
        RdsError::NotFound {
            code: code.to_string(),
            message: format!("{resource_id} not returned by describe call"),
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        self.code().and_then(suggestion_for_code)
    }
}

/// Known RDS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "DBClusterNotFoundFault",
    "DBInstanceNotFound",
    "DBInstanceNotFoundFault",
    "DBClusterSnapshotNotFoundFault",
    "DBSnapshotNotFound",
];

/// Known RDS error codes for "invalid state" conditions
const INVALID_STATE_CODES: &[&str] = &[
    "InvalidDBClusterStateFault",
    "InvalidDBInstanceState",
    "InvalidDBInstanceStateFault",
    "InvalidDBClusterSnapshotStateFault",
];

/// Known RDS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "DBClusterAlreadyExistsFault",
    "DBInstanceAlreadyExists",
    "DBInstanceAlreadyExistsFault",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Classify an RDS error from its code and message.
pub fn classify_rds_error(code: Option<&str>, message: Option<&str>) -> RdsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => RdsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if INVALID_STATE_CODES.contains(&c) => RdsError::InvalidState {
            code: c.to_string(),
            message,
        },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => RdsError::AlreadyExists(message),
        Some(c) if THROTTLING_CODES.contains(&c) => RdsError::Throttled(message),
        _ => RdsError::Sdk {
            code: code.map(str::to_string),
            message,
        },
    }
}

/// Classify any SDK error (operation errors and `SdkError` wrappers alike).
///
/// Transport failures carry no service code; their message is rendered with
/// the full cause chain.
pub fn classify_sdk_error<E>(err: E) -> RdsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match err.code() {
        Some(code) => classify_rds_error(Some(code), err.message()),
        None => RdsError::Sdk {
            code: None,
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "InsufficientDBInstanceCapacity",
        "Try a different instance class via --instance-class.",
    ),
    (
        "StorageQuotaExceeded",
        "Request a storage quota increase via the Service Quotas console.",
    ),
    (
        "InstanceQuotaExceeded",
        "Request a DB instance quota increase via the Service Quotas console.",
    ),
    (
        "DBClusterQuotaExceededFault",
        "Delete leftover test clusters (restore-drill sweep --execute) or raise the quota.",
    ),
    (
        "DBSubnetGroupNotFoundFault",
        "Check DB_SUBNET_GROUP_NAME points at an existing subnet group.",
    ),
    (
        "KMSKeyNotAccessibleFault",
        "The snapshot's KMS key must be usable by the caller.",
    ),
    (
        "AccessDenied",
        "The caller lacks the rds:* permissions needed for restore testing.",
    ),
];

fn suggestion_for_code(code: &str) -> Option<&'static str> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| *s)
}
