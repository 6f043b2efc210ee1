// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Transport error taxonomy
 * Every probe failure renders to one of the canonical error strings
 * consumed by findings and by the response classifier.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde_json::Value;
use thiserror::Error;

/// Uniform error value surfaced by the GraphQL transport.
///
/// The `Display` output is load-bearing: it is embedded verbatim in
/// findings and drives classification, so the shapes below must stay
/// stable.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Non-2xx response carrying a GraphQL error envelope
    #[error("GraphQL Error: {}", .messages.join(", "))]
    Graphql {
        status: u16,
        messages: Vec<String>,
        errors: Vec<Value>,
    },

    /// Non-2xx response with a JSON `message` body
    #[error("API Error {status}: {message}")]
    Api { status: u16, message: String },

    /// Non-2xx response with no interpretable body
    #[error("HTTP Error {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// Transport-layer failure without an HTTP response
    #[error("Network Error: {code}")]
    Network { code: String },

    /// Request exceeded its deadline
    #[error("Timeout de la petición")]
    Timeout,

    /// Anything else; carries the underlying message as-is
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// HTTP status of the failed exchange, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Graphql { status, .. }
            | TransportError::Api { status, .. }
            | TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// GraphQL errors embedded in the failing response, when present
    pub fn graphql_errors(&self) -> Option<&[Value]> {
        match self {
            TransportError::Graphql { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout;
        }
        if err.is_connect() {
            return TransportError::Network {
                code: io_error_code(&err),
            };
        }
        TransportError::Other(err.to_string())
    }
}

/// Walk the source chain looking for the underlying IO error kind, which
/// gives a concise code ("ConnectionRefused", "ConnectionReset", ...).
fn io_error_code(err: &reqwest::Error) -> String {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return format!("{:?}", io.kind());
        }
        source = inner.source();
    }
    err.to_string()
}
