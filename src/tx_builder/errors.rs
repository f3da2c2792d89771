//! Error types for the transaction builder
//!
//! Every failure a bundle can hit between construction and confirmation maps
//! onto one of these variants:
//! - Connectivity: the endpoint could not be reached or timed out
//! - SubmissionRejected: the bundle was refused, locally or by the ledger
//! - MalformedBundle: the caller assembled something that cannot be sent
//!
//! The remaining variants cover SDK constructor failures, non-transport RPC
//! errors on read-only queries, signing and amount conversion.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::amount::AmountError;
use crate::tx_builder::operations::{OperationKind, Resource};

/// Error type for all transaction builder operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The remote endpoint is unreachable or the request timed out
    #[error("Connectivity error (endpoint: {endpoint}): {message}")]
    Connectivity {
        /// Endpoint the request was addressed to
        endpoint: String,
        /// Transport-level description
        message: String,
    },

    /// The bundle was refused and nothing was applied
    ///
    /// Raised either by local validation (dependency order, missing signer)
    /// before anything is sent, or by the ledger itself.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(RejectionReason),

    /// The caller assembled an empty or structurally invalid bundle
    #[error("Malformed bundle: {0}")]
    MalformedBundle(String),

    /// An SDK instruction constructor refused the parameters
    #[error("Invalid operation ({kind}): {reason}")]
    InvalidOperation {
        kind: OperationKind,
        reason: String,
    },

    /// Non-transport RPC failure on a read-only query
    #[error("RPC error (endpoint: {endpoint}): {message}")]
    Rpc { endpoint: String, message: String },

    /// Signing the compiled message failed
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Why a bundle was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The fee payer or a debited account cannot cover the bundle
    #[error("insufficient funds")]
    InsufficientFunds,

    /// A signer declared by one of the operations is absent
    #[error("missing signature for {0}")]
    MissingSignature(Pubkey),

    /// An operation runs before (or after) another one it depends on
    #[error("operation #{position} ({kind}) {violation}")]
    DependencyOrder {
        position: usize,
        kind: OperationKind,
        violation: OrderViolation,
    },

    /// The ledger could not verify the signatures it was given
    #[error("signature verification failed: {0}")]
    InvalidSignature(String),

    /// The recent blockhash is unknown to the ledger or has expired
    #[error("stale recency token")]
    StaleRecencyToken,

    /// Any other refusal reported by the ledger
    #[error("{0}")]
    Other(String),
}

/// The two ways an operation can be misplaced within a bundle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderViolation {
    #[error("requires {resource} which is only provided later by operation #{provider}")]
    RequiredLater { resource: Resource, provider: usize },

    #[error("must run before {resource} exists, but operation #{provider} already provided it")]
    PrecludedEarlier { resource: Resource, provider: usize },
}

impl LedgerError {
    /// Get the error category for structured logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connectivity { .. } => "connectivity",
            Self::SubmissionRejected(_) => "rejected",
            Self::MalformedBundle(_) => "malformed",
            Self::InvalidOperation { .. } => "operation",
            Self::Rpc { .. } => "rpc",
            Self::Signing(_) => "signing",
            Self::Amount(_) => "amount",
        }
    }

    /// True if the ledger (or local validation) refused the bundle
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::SubmissionRejected(_))
    }

    /// Create a connectivity error for an endpoint
    pub fn connectivity(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connectivity {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a rejection error
    pub fn rejected(reason: RejectionReason) -> Self {
        Self::SubmissionRejected(reason)
    }

    /// Create an invalid operation error
    pub fn invalid_operation(kind: OperationKind, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            kind,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::connectivity("http://127.0.0.1:8899", "connection refused");
        assert_eq!(
            err.to_string(),
            "Connectivity error (endpoint: http://127.0.0.1:8899): connection refused"
        );

        let err = LedgerError::rejected(RejectionReason::InsufficientFunds);
        assert_eq!(err.to_string(), "Submission rejected: insufficient funds");

        let err = LedgerError::MalformedBundle("bundle has no operations".to_string());
        assert_eq!(err.to_string(), "Malformed bundle: bundle has no operations");
    }

    #[test]
    fn test_dependency_order_display() {
        let mint = Pubkey::new_unique();
        let reason = RejectionReason::DependencyOrder {
            position: 0,
            kind: OperationKind::InitializeMetadata,
            violation: OrderViolation::RequiredLater {
                resource: Resource::Mint(mint),
                provider: 1,
            },
        };
        let msg = reason.to_string();
        assert!(msg.starts_with("operation #0 (initialize-metadata) requires mint "));
        assert!(msg.ends_with("only provided later by operation #1"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            LedgerError::connectivity("x", "y").category(),
            "connectivity"
        );
        assert_eq!(
            LedgerError::rejected(RejectionReason::StaleRecencyToken).category(),
            "rejected"
        );
        assert_eq!(
            LedgerError::MalformedBundle("empty".into()).category(),
            "malformed"
        );
        assert_eq!(
            LedgerError::invalid_operation(OperationKind::MintTo, "bad program").category(),
            "operation"
        );
    }

    #[test]
    fn test_is_rejection() {
        assert!(LedgerError::rejected(RejectionReason::InsufficientFunds).is_rejection());
        assert!(!LedgerError::connectivity("x", "y").is_rejection());
    }
}
