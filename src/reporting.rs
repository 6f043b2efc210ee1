// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Console reporting and exit-code translation for the CLI.

use crate::types::{ScanResult, ScanStatus, Severity, VulnerabilityFinding};

/// Findings ordered by severity descending; ties keep emission order.
pub fn sorted_findings(result: &ScanResult) -> Vec<&VulnerabilityFinding> {
    let mut findings: Vec<&VulnerabilityFinding> = result.findings.iter().collect();
    // Stable sort preserves emission order within a severity
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    findings
}

/// Exit code contract: 0 on a completed scan with no Critical/High
/// findings, 1 otherwise (including connectivity and fatal failures).
pub fn exit_code(result: &ScanResult) -> i32 {
    if result.status != ScanStatus::Completed {
        return 1;
    }
    let severe = result
        .findings
        .iter()
        .any(|f| matches!(f.severity, Severity::Critical | Severity::High));
    if severe {
        1
    } else {
        0
    }
}

pub fn print_report(result: &ScanResult) {
    let count = |severity: Severity| {
        result
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    };

    println!();
    println!("{}", "-".repeat(60));
    println!("ESCANEO {} - {}", result.scan_id, result.target);
    println!("Estado: {}", result.status);
    if let Some(error) = &result.error {
        println!("Error:  {}", error);
    }
    println!("{}", "-".repeat(60));
    println!("HALLAZGOS: {}", result.findings.len());

    for severity in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        let n = count(severity);
        if n > 0 {
            println!("  [{}] {}", severity, n);
        }
    }

    for finding in sorted_findings(result) {
        println!();
        println!("[{}] {}", finding.severity, finding.vuln_type);
        println!("  Descripción:   {}", finding.description);
        println!("  Recomendación: {}", finding.recommendation);
        if let Some(evidence) = &finding.evidence {
            // Deterministic ordering keeps the report stable run to run
            let mut keys: Vec<&String> = evidence.keys().collect();
            keys.sort();
            println!(
                "  Evidencia:     {}",
                keys.iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            for key in keys {
                println!("    {}: {}", key, render_evidence_value(&evidence[key]));
            }
        }
    }

    println!();
    println!("{}", "-".repeat(60));
}

/// Maximum rendered length per evidence value in the console report
const EVIDENCE_VALUE_MAX: usize = 200;

fn render_evidence_value(value: &serde_json::Value) -> String {
    let rendered = match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    };
    if rendered.chars().count() > EVIDENCE_VALUE_MAX {
        let truncated: String = rendered.chars().take(EVIDENCE_VALUE_MAX).collect();
        format!("{}...", truncated)
    } else {
        rendered
    }
}
