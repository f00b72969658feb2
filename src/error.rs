//! Error types for the payments front-door.
//!
//! The taxonomy follows how failures must be routed, not where they occur:
//!
//! - **Request-shape errors** ([`GatewayError::MethodNotAllowed`],
//!   [`GatewayError::InvalidRequest`]): rejected before any downstream call.
//! - **Expected absence** ([`GatewayError::NotFound`]): the one error callers
//!   may catch and branch on (existence checks).
//! - **Downstream rejections** ([`GatewayError::ClientError`]): the caller's
//!   data was refused; the downstream error payload is preserved verbatim.
//! - **Downstream/transport failures** ([`GatewayError::ServerError`],
//!   [`GatewayError::HttpError`]): never recovered locally.
//! - **Precondition violations** ([`GatewayError::TransactionAlreadyOpen`],
//!   [`GatewayError::NoOpenTransaction`], [`GatewayError::ExpansionInput`]):
//!   programming errors that must fail loudly.

use serde_json::Value;
use thiserror::Error;

use crate::proxy::Verb;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while fronting the downstream resource service.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request verb is not in the endpoint's permitted set.
    ///
    /// Detected before argument rewriting or dispatch; the downstream
    /// service is never contacted for a disallowed verb.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Verb),

    /// The downstream service has no record at the addressed resource.
    ///
    /// This is the only variant intended as control flow: callers doing
    /// existence checks catch it and branch. Everything else propagates.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The downstream service rejected the request (4xx other than 404).
    ///
    /// `body` carries the downstream's error payload verbatim when one was
    /// returned, [`Value::Null`] otherwise.
    #[error("downstream rejected request with status {status}")]
    ClientError {
        /// HTTP status returned by the downstream service.
        status: u16,
        /// Downstream error payload, preserved for the HTTP-facing layer.
        body: Value,
    },

    /// The downstream service failed (5xx).
    ///
    /// Never recovered locally; this must stay loud all the way up so it
    /// surfaces in operational monitoring as a 500-equivalent.
    #[error("downstream service failure with status {status}")]
    ServerError {
        /// HTTP status returned by the downstream service.
        status: u16,
    },

    /// The HTTP round trip itself failed (timeout, DNS, TLS, refused).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Service configuration was rejected at startup.
    #[error("invalid service configuration: {0}")]
    ConfigError(String),

    /// A downstream record is missing a field this crate depends on.
    #[error("malformed downstream record: {0}")]
    MalformedRecord(String),

    /// Caller-supplied input failed validation before dispatch.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// `expand` was handed something other than an array of record objects.
    #[error("cannot expand: {0}")]
    ExpansionInput(String),

    /// The session already holds a live transaction reference.
    ///
    /// Creating a second transaction without an intervening
    /// [`reset`](crate::transaction::TransactionLedger::reset) is a
    /// programming error, not a recoverable user condition.
    #[error("a transaction is already open in this session")]
    TransactionAlreadyOpen,

    /// A transaction update was attempted with no open transaction.
    #[error("no open transaction in this session")]
    NoOpenTransaction,

    /// The authenticated buyer does not own the addressed resource.
    #[error("not allowed: {0}")]
    Forbidden(String),

    /// The buyer already has an active subscription for this product.
    #[error("buyer is already subscribed to this product")]
    AlreadySubscribed,
}
