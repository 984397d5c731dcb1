// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[allow(clippy::result_large_err)]
#[derive(Debug, Error)]
pub enum GnmiError {
    /// Invalid or contradictory connection options, detected before any
    /// network activity.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or incomplete RPC input, detected before marshalling.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An RPC that the selected OS variant does not support.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Server-side or protocol-level failure, surfaced verbatim.
    #[error("RPC failed: {0}")]
    Api(#[from] tonic::Status),

    /// Network/TLS failure from the transport layer, surfaced verbatim.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Failure while fetching the target's certificate for the
    /// trust-on-first-use flow.
    #[error("Connection error: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, GnmiError>;
