// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * BOLA (Broken Object Level Authorization) prober
 * Cross-products authenticated principals against victim-owned object
 * ids over the schema's points of interest. A probe that is denied by
 * the server is the expected outcome and never a finding.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analyzer::{find_bola_points_of_interest, BolaPointOfInterest};
use crate::classifier::{classify, ErrorClass};
use crate::graphql_schema::{GraphQLSchema, OperationKind};
use crate::http_client::HttpClient;
use crate::operation_builder::build_bola_operation;
use crate::scanners::pause;
use crate::types::{ScanTarget, Severity, UserContext, VulnerabilityFinding};

const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

pub struct BolaProber {
    http_client: Arc<HttpClient>,
}

impl BolaProber {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn scan(
        &self,
        url: &str,
        target: &ScanTarget,
        schema: Option<&GraphQLSchema>,
        cancel: &AtomicBool,
    ) -> Result<Vec<VulnerabilityFinding>> {
        let mut findings = Vec::new();

        if target.user_contexts.len() < 2 {
            info!("[BOLA] Skipping: requires at least two user contexts");
            return Ok(findings);
        }
        let Some(schema) = schema else {
            info!("[BOLA] Skipping: no schema available");
            return Ok(findings);
        };

        let filter = target
            .bola_config
            .as_ref()
            .map(|c| c.target_object_types.as_slice());
        let points = find_bola_points_of_interest(schema, filter);

        if points.is_empty() {
            match filter {
                Some(types) if !types.is_empty() => {
                    findings.push(VulnerabilityFinding::new(
                        "No se encontraron puntos de prueba BOLA para los tipos especificados",
                        Severity::Info,
                        format!(
                            "El esquema no expone operaciones con argumentos de identificador que devuelvan los tipos especificados: {}.",
                            types.join(", ")
                        ),
                        "Verificar los nombres de tipo configurados en bolaConfig.targetObjectTypes.",
                    ));
                }
                _ => {
                    findings.push(VulnerabilityFinding::new(
                        "No se encontraron puntos de prueba BOLA",
                        Severity::Info,
                        "El esquema no expone operaciones con argumentos de identificador sobre las que probar autorización a nivel de objeto.",
                        "Ninguna acción requerida.",
                    ));
                }
            }
            return Ok(findings);
        }

        info!(
            "[BOLA] {} points of interest across {} user contexts",
            points.len(),
            target.user_contexts.len()
        );

        let mut tested: HashSet<String> = HashSet::new();
        for attacker in &target.user_contexts {
            for victim in &target.user_contexts {
                if attacker.id == victim.id {
                    continue;
                }
                for point in &points {
                    let type_name = point.effective_type_name();
                    let Some(object_ids) = victim.owned_object_ids.get(&type_name) else {
                        continue;
                    };
                    for object_id in object_ids {
                        if cancel.load(Ordering::Relaxed) {
                            warn!("[BOLA] Cancellation requested, stopping probes");
                            return Ok(findings);
                        }
                        let probe_key = format!(
                            "{}-{}-{}-{}",
                            attacker.id, point.operation, point.field_name, object_id
                        );
                        if !tested.insert(probe_key) {
                            continue;
                        }
                        self.probe(url, attacker, victim, point, object_id, schema, &mut findings)
                            .await;
                        pause().await;
                    }
                }
            }
        }

        info!("[BOLA] Probing completed: {} findings", findings.len());
        Ok(findings)
    }

    #[allow(clippy::too_many_arguments)]
    async fn probe(
        &self,
        url: &str,
        attacker: &UserContext,
        victim: &UserContext,
        point: &BolaPointOfInterest,
        object_id: &str,
        schema: &GraphQLSchema,
        findings: &mut Vec<VulnerabilityFinding>,
    ) {
        let query = build_bola_operation(point, object_id, Some(schema));
        debug!(
            "[BOLA] {} -> {} {} (victim {}, id {})",
            attacker.id, point.operation, point.field_name, victim.id, object_id
        );

        match self
            .http_client
            .post_graphql(url, &query, &attacker.auth_headers(), PROBE_TIMEOUT)
            .await
        {
            Ok(response) => {
                if !response.errors().is_empty() {
                    let class = classify(
                        "",
                        Some(response.errors()),
                        Some(response.status_code),
                        response.has_data(),
                    );
                    if matches!(class, ErrorClass::AuthDenied | ErrorClass::LimitEnforced) {
                        debug!(
                            "[BOLA] Probe on {} denied by the server ({:?})",
                            point.field_name, class
                        );
                        return;
                    }
                }

                let field_data = response.field_data(&point.field_name);
                if exposes_object(field_data) {
                    let severity = if point.operation == OperationKind::Mutation {
                        Severity::Critical
                    } else {
                        Severity::High
                    };
                    findings.push(
                        VulnerabilityFinding::new(
                            "Vulnerabilidad BOLA Detectada",
                            severity,
                            format!(
                                "El usuario '{}' accedió a un objeto del usuario '{}' mediante la operación {} '{}' pasando '{}' como argumento '{}', sin que el servidor denegara la petición.",
                                attacker.id,
                                victim.id,
                                point.operation,
                                point.field_name,
                                object_id,
                                point.id_arg_name
                            ),
                            "Verificar la propiedad del objeto en cada resolución: el servidor debe comprobar que el principal autenticado es dueño del objeto solicitado antes de devolverlo o modificarlo.",
                        )
                        .with_evidence(HashMap::from([
                            ("query".to_string(), json!(query)),
                            (
                                "response".to_string(),
                                field_data.cloned().unwrap_or(Value::Null),
                            ),
                        ])),
                    );
                } else {
                    debug!(
                        "[BOLA] Inconclusive probe on {} (null or empty data)",
                        point.field_name
                    );
                }
            }
            Err(err) => {
                if matches!(err.status(), Some(401) | Some(403)) {
                    debug!(
                        "[BOLA] Probe on {} rejected at transport level ({})",
                        point.field_name,
                        err.status().unwrap_or_default()
                    );
                    return;
                }
                let class = classify(&err.to_string(), err.graphql_errors(), err.status(), false);
                if matches!(class, ErrorClass::AuthDenied | ErrorClass::LimitEnforced) {
                    debug!(
                        "[BOLA] Probe on {} denied by the server ({:?})",
                        point.field_name, class
                    );
                    return;
                }
                findings.push(
                    VulnerabilityFinding::new(
                        format!("Error Inesperado en Prueba BOLA ({})", point.field_name),
                        Severity::Low,
                        format!(
                            "La prueba BOLA sobre '{}' produjo un error no clasificado: {}",
                            point.field_name, err
                        ),
                        "Revisar manualmente la respuesta del servidor ante esta consulta.",
                    )
                    .with_evidence(HashMap::from([
                        ("query".to_string(), json!(query)),
                        ("error".to_string(), json!(err.to_string())),
                    ])),
                );
            }
        }
    }
}

/// Whether the returned field value exposes an object: a non-null object
/// with at least one key besides `__typename`, or a non-empty array.
fn exposes_object(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Object(map)) => map.keys().any(|k| k != "__typename"),
        Some(Value::Array(items)) => !items.is_empty(),
        _ => false,
    }
}
