//! Error types for enscid
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for enscid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Details of a failed JSON-RPC interaction
///
/// Chain clients fill in whatever the transport exposed. The HTTP status and
/// response body are what [`Error::is_transient`] inspects, alongside the
/// message itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcFailure {
    /// Human readable error message
    pub message: String,
    /// HTTP status of the response, if the failure came from the transport
    pub status: Option<u16>,
    /// Raw response body, if any
    pub body: Option<String>,
    /// JSON-RPC error code, if the endpoint returned an error object
    pub code: Option<i64>,
}

impl RpcFailure {
    /// Failure carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Failure from an HTTP response with a non-success status
    pub fn http(status: u16, body: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            body: Some(body.into()),
            code: None,
        }
    }

    /// Failure from a JSON-RPC error object
    pub fn json_rpc(code: i64, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
            ..Self::default()
        }
    }

    /// Whether this failure signals rate limiting or provider overload
    pub fn is_transient(&self) -> bool {
        mentions_rate_limit(&self.message)
            || self.body.as_deref().is_some_and(mentions_rate_limit)
            || matches!(self.status, Some(429) | Some(599))
    }
}

impl std::fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        if let Some(code) = self.code {
            write!(f, " (code {})", code)?;
        }
        Ok(())
    }
}

fn mentions_rate_limit(text: &str) -> bool {
    text.to_ascii_lowercase().contains("rate limit")
}

/// Core error type for enscid
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The ENS registry has no resolver bound to the name
    #[error("No resolver set for {name}. Please set a resolver that supports contenthash.")]
    NoResolver {
        /// The ENS name that was looked up
        name: String,
    },

    /// The CID cannot be represented as an EIP-1577 IPFS contenthash
    #[error("Unsupported CID: {0}")]
    UnsupportedCid(String),

    /// JSON-RPC provider or contract-call failure
    #[error("RPC error: {0}")]
    Rpc(RpcFailure),

    /// The transaction was mined but reverted
    #[error("Transaction {tx_hash} reverted in block {block_number}")]
    TransactionReverted {
        /// Transaction hash (0x-prefixed hex)
        tx_hash: String,
        /// Block the transaction was included in
        block_number: u64,
    },

    /// No receipt arrived within the configured timeout
    #[error("Timed out after {secs}s waiting for receipt of {tx_hash}")]
    ReceiptTimeout {
        /// Transaction hash (0x-prefixed hex)
        tx_hash: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// ABI encoding/decoding errors
    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unsupported CID error
    pub fn unsupported_cid(msg: impl Into<String>) -> Self {
        Self::UnsupportedCid(msg.into())
    }

    /// Create an RPC error from a plain message
    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::Rpc(RpcFailure::message(msg))
    }

    /// Whether a retry has a reasonable chance of succeeding
    ///
    /// Only rate-limit and overload signals qualify. Everything else,
    /// including reverts and malformed responses, is permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Rpc(failure) if failure.is_transient())
    }
}

impl From<RpcFailure> for Error {
    fn from(failure: RpcFailure) -> Self {
        Self::Rpc(failure)
    }
}
