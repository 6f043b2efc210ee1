// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Immutable scan input: the GraphQL endpoint plus the principals under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTarget {
    /// Absolute HTTP(S) endpoint accepting GraphQL over POST
    pub url: String,

    /// Inline SDL or a path to an SDL file; when present, remote
    /// introspection is suppressed
    #[serde(default)]
    pub schema: Option<String>,

    /// Ordered principals under test; BOLA probing needs at least two
    #[serde(default)]
    pub user_contexts: Vec<UserContext>,

    #[serde(default)]
    pub bola_config: Option<BolaConfig>,
}

/// A principal under test: a labeled bearer credential plus the object ids
/// it legitimately owns, keyed by GraphQL object type name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub id: String,
    pub auth_token: String,
    #[serde(default)]
    pub owned_object_ids: HashMap<String, Vec<String>>,
}

impl UserContext {
    /// Headers to attach to every request issued as this principal
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        if self.auth_token.is_empty() {
            return Vec::new();
        }
        vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.auth_token),
        )]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BolaConfig {
    /// Restricts BOLA points of interest to these return types
    #[serde(default)]
    pub target_object_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Info,
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }
}

// Total order Critical > High > Medium > Low > Info, independent of the
// variant declaration order used for display.
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// A graded, human-readable observation with optional free-form evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityFinding {
    pub id: String,
    #[serde(rename = "type")]
    pub vuln_type: String,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
    /// Opaque name -> value mapping, typically {query, response},
    /// serialized as free-form JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<HashMap<String, Value>>,
}

impl VulnerabilityFinding {
    pub fn new(
        vuln_type: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vuln_type: vuln_type.into(),
            severity,
            description: description.into(),
            recommendation: recommendation.into(),
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: HashMap<String, Value>) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScanStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::Queued => write!(f, "Queued"),
            ScanStatus::Running => write!(f, "Running"),
            ScanStatus::Completed => write!(f, "Completed"),
            ScanStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Sealed scan output published by the orchestrator at completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub scan_id: String,
    pub target: String,
    pub status: ScanStatus,
    pub findings: Vec<VulnerabilityFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: String,
    pub completed_at: String,
}

impl ScanResult {
    pub fn sealed(
        scan_id: String,
        target: &ScanTarget,
        status: ScanStatus,
        findings: Vec<VulnerabilityFinding>,
        error: Option<String>,
        started_at: String,
    ) -> Self {
        Self {
            scan_id,
            target: target.url.clone(),
            status,
            findings,
            error,
            started_at,
            completed_at: Utc::now().to_rfc3339(),
        }
    }
}
