// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Response and error classification.
//!
//! A single pure function maps every probe outcome into a small tagged
//! enum. `LimitEnforced` and `AuthDenied` indicate the server defended
//! correctly and must never produce findings; `Timeout` and `Other` are
//! graded per prober.

use serde_json::Value;

/// Markers indicating a complexity/depth/pagination defense kicked in
const LIMIT_MARKERS: &[&str] = &["limit", "complexity", "depth", "pagination"];

/// Markers indicating an authorization denial
const AUTH_MARKERS: &[&str] = &["unauthorized", "forbidden", "access denied"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The server enforced a query limit (depth, complexity, pagination)
    LimitEnforced,
    /// The server denied access to the requested object or operation
    AuthDenied,
    /// The request exceeded its deadline
    Timeout,
    /// Transport-layer failure without an HTTP response
    Network,
    /// Anything else
    Other,
}

/// Classify a probe outcome.
///
/// `error_text` is the transport error string (empty for 2xx responses),
/// `graphql_errors` the error list from the envelope if any, `http_status`
/// the response status when one was received, and `has_data` whether the
/// envelope carried non-null data. A GraphQL "not found" with no data is
/// treated as a denial, matching the observed upstream behavior even
/// though it conflates missing objects with denied access.
pub fn classify(
    error_text: &str,
    graphql_errors: Option<&[Value]>,
    http_status: Option<u16>,
    has_data: bool,
) -> ErrorClass {
    let messages: Vec<String> = graphql_errors
        .unwrap_or_default()
        .iter()
        .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
        .map(|m| m.to_lowercase())
        .collect();

    if messages
        .iter()
        .any(|m| LIMIT_MARKERS.iter().any(|k| m.contains(k)))
    {
        return ErrorClass::LimitEnforced;
    }

    let denied_message = messages.iter().any(|m| {
        AUTH_MARKERS.iter().any(|k| m.contains(k)) || (!has_data && m.contains("not found"))
    });
    if denied_message || matches!(http_status, Some(401) | Some(403)) {
        return ErrorClass::AuthDenied;
    }

    let lower = error_text.to_lowercase();
    if lower.contains("timeout") {
        return ErrorClass::Timeout;
    }
    if http_status.is_none() && lower.contains("network error") {
        return ErrorClass::Network;
    }

    ErrorClass::Other
}
