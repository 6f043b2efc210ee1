// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Scan orchestration and coordination
 * Sequences connectivity check -> schema acquisition -> DoS -> BOLA,
 * aggregates findings and seals the result. `run_scan` never errors at
 * the boundary: every failure lands in the result's status and error.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::graphql_schema::GraphQLSchema;
use crate::http_client::HttpClient;
use crate::introspection::SchemaFetcher;
use crate::scanners::{BolaProber, DosProber};
use crate::types::{ScanResult, ScanStatus, ScanTarget, Severity, VulnerabilityFinding};

const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECTIVITY_PROBE: &str = "{ __typename }";

/// Run a full scan against the target. Never panics or returns an error;
/// the outcome is always a well-formed [`ScanResult`].
pub async fn run_scan(target: ScanTarget) -> ScanResult {
    run_scan_with_cancel(target, Arc::new(AtomicBool::new(false))).await
}

/// Variant accepting a host-provided cancellation flag. When the flag is
/// raised the orchestrator stops issuing probes at the next boundary and
/// returns `Failed` with the partial finding set preserved.
pub async fn run_scan_with_cancel(target: ScanTarget, cancel: Arc<AtomicBool>) -> ScanResult {
    let scan_id = Uuid::new_v4().to_string();
    let started_at = Utc::now().to_rfc3339();
    info!("[Scan {}] Starting scan of {}", scan_id, target.url);

    let http_client = match HttpClient::new() {
        Ok(client) => Arc::new(client),
        Err(err) => {
            return ScanResult::sealed(
                scan_id,
                &target,
                ScanStatus::Failed,
                Vec::new(),
                Some(format!("No se pudo inicializar el cliente HTTP: {:#}", err)),
                started_at,
            );
        }
    };

    let auth_headers = target
        .user_contexts
        .first()
        .map(|ctx| ctx.auth_headers())
        .unwrap_or_default();

    // Connectivity gate: a target we cannot reach produces no findings
    if let Err(err) = http_client
        .post_graphql(&target.url, CONNECTIVITY_PROBE, &auth_headers, CONNECTIVITY_TIMEOUT)
        .await
    {
        let message = format!(
            "No se pudo conectar a {}. Verifique que el endpoint GraphQL sea accesible: {}",
            target.url, err
        );
        error!("[Scan {}] {}", scan_id, message);
        return ScanResult::sealed(
            scan_id,
            &target,
            ScanStatus::Failed,
            Vec::new(),
            Some(message),
            started_at,
        );
    }

    let mut findings: Vec<VulnerabilityFinding> = Vec::new();
    let outcome = run_phases(&http_client, &target, &auth_headers, &cancel, &mut findings).await;

    if let Err(err) = outcome {
        error!("[Scan {}] Fatal error during scan: {:#}", scan_id, err);
        findings.push(VulnerabilityFinding::new(
            "Error Fatal Durante el Escaneo",
            Severity::Critical,
            format!("El escaneo abortó por un error interno: {:#}", err),
            "Revisar los registros del escáner y reintentar el escaneo.",
        ));
        return ScanResult::sealed(
            scan_id,
            &target,
            ScanStatus::Failed,
            findings,
            Some(err.to_string()),
            started_at,
        );
    }

    if cancel.load(Ordering::Relaxed) {
        warn!("[Scan {}] Cancelled by host", scan_id);
        return ScanResult::sealed(
            scan_id,
            &target,
            ScanStatus::Failed,
            findings,
            Some("Escaneo cancelado por el host".to_string()),
            started_at,
        );
    }

    info!(
        "[Scan {}] Completed with {} findings",
        scan_id,
        findings.len()
    );
    ScanResult::sealed(
        scan_id,
        &target,
        ScanStatus::Completed,
        findings,
        None,
        started_at,
    )
}

async fn run_phases(
    http_client: &Arc<HttpClient>,
    target: &ScanTarget,
    auth_headers: &[(String, String)],
    cancel: &AtomicBool,
    findings: &mut Vec<VulnerabilityFinding>,
) -> Result<()> {
    let schema = acquire_schema(http_client, target, auth_headers, findings).await;

    if cancel.load(Ordering::Relaxed) {
        return Ok(());
    }
    let dos = DosProber::new(http_client.clone());
    findings.extend(
        dos.scan(&target.url, auth_headers, schema.as_ref(), cancel)
            .await?,
    );

    if cancel.load(Ordering::Relaxed) {
        return Ok(());
    }
    let bola = BolaProber::new(http_client.clone());
    findings.extend(
        bola.scan(&target.url, target, schema.as_ref(), cancel)
            .await?,
    );

    Ok(())
}

/// A provided SDL schema suppresses remote introspection; otherwise the
/// schema is fetched from the target. A null schema never fails the scan.
async fn acquire_schema(
    http_client: &Arc<HttpClient>,
    target: &ScanTarget,
    auth_headers: &[(String, String)],
    findings: &mut Vec<VulnerabilityFinding>,
) -> Option<GraphQLSchema> {
    if let Some(source) = &target.schema {
        return match GraphQLSchema::from_sdl_source(source) {
            Ok(schema) => {
                info!(
                    "[Scan] Loaded provided schema ({} types), skipping introspection",
                    schema.types.len()
                );
                Some(schema)
            }
            Err(err) => {
                warn!("[Scan] Failed to load provided schema: {:#}", err);
                findings.push(VulnerabilityFinding::new(
                    "Introspection Deshabilitada o Fallida",
                    Severity::Low,
                    format!("No se pudo cargar el esquema proporcionado: {:#}", err),
                    "Verificar que el esquema configurado sea SDL válido o una ruta de archivo legible.",
                ));
                None
            }
        };
    }

    let fetcher = SchemaFetcher::new(http_client.clone());
    let (schema, fetch_findings) = fetcher.fetch(&target.url, auth_headers).await;
    findings.extend(fetch_findings);
    schema
}
