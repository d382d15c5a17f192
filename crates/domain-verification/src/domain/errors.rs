//! # Domain Errors
//!
//! Error types surfaced synchronously to callers of the Domain Verification
//! subsystem. Internal inconsistencies are logged and recovered instead.

use super::value_objects::{CallerRole, DomainSetId, Uid};
use thiserror::Error;

/// Why a caller-supplied domain set was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidDomainSetReason {
    /// No identity token was supplied.
    IdNull,
    /// The token does not belong to any attached package.
    IdInvalid,
    /// The domain set was empty.
    SetEmpty,
    /// At least one domain is not declared by the package.
    UnknownDomain,
}

impl std::fmt::Display for InvalidDomainSetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidDomainSetReason::IdNull => write!(f, "domain set id is null"),
            InvalidDomainSetReason::IdInvalid => write!(f, "domain set id is not attached"),
            InvalidDomainSetReason::SetEmpty => write!(f, "domain set is empty"),
            InvalidDomainSetReason::UnknownDomain => {
                write!(f, "domain set contains unknown domains")
            }
        }
    }
}

/// Errors returned by the Domain Verification service.
#[derive(Debug, Error)]
pub enum DomainVerificationError {
    /// Caller supplied an invalid identity token or domain set.
    #[error("Invalid domain set {id:?} for {package_name:?}: {reason}")]
    InvalidDomainSet {
        /// Token as supplied, if any.
        id: Option<DomainSetId>,
        /// Package the token resolved to, if it resolved.
        package_name: Option<String>,
        /// Rejection reason.
        reason: InvalidDomainSetReason,
    },

    /// The package no longer resolves to a live manifest.
    #[error("Package unavailable: {0}")]
    PackageUnavailable(String),

    /// Caller supplied an argument outside the allowed range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Caller does not hold the required role.
    #[error("Caller uid {uid} is not an approved {role}")]
    NotAuthorized {
        /// Role that was required.
        role: CallerRole,
        /// Calling uid.
        uid: Uid,
    },

    /// Persisted settings could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl DomainVerificationError {
    pub(crate) fn invalid_set(
        id: Option<DomainSetId>,
        package_name: Option<&str>,
        reason: InvalidDomainSetReason,
    ) -> Self {
        DomainVerificationError::InvalidDomainSet {
            id,
            package_name: package_name.map(str::to_string),
            reason,
        }
    }

    /// Rejection reason, when this is an invalid domain set error.
    pub fn invalid_set_reason(&self) -> Option<InvalidDomainSetReason> {
        match self {
            DomainVerificationError::InvalidDomainSet { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Settings document encode/decode failure.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Malformed or unreadable document.
    #[error("Failed to decode settings: {0}")]
    Decode(String),

    /// Sink rejected the document.
    #[error("Failed to encode settings: {0}")]
    Encode(String),
}
