// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Denial-of-service amenability prober
 * Two sub-checks in order: query depth acceptance and unbounded list
 * fields. Correct defenses (limit/complexity errors) never produce
 * findings.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::classifier::{classify, ErrorClass};
use crate::errors::TransportError;
use crate::graphql_schema::GraphQLSchema;
use crate::http_client::HttpClient;
use crate::operation_builder::{build_deep_query, build_list_query};
use crate::scanners::pause;
use crate::types::{Severity, VulnerabilityFinding};

/// Nesting depth of the probe document
const DEPTH_PROBE_LEVELS: usize = 7;
/// A list response longer than this without pagination is graded High
const UNBOUNDED_LIST_THRESHOLD: usize = 100;

const DEPTH_TIMEOUT: Duration = Duration::from_secs(15);
const LIST_TIMEOUT: Duration = Duration::from_secs(20);

pub struct DosProber {
    http_client: Arc<HttpClient>,
}

impl DosProber {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn scan(
        &self,
        url: &str,
        headers: &[(String, String)],
        schema: Option<&GraphQLSchema>,
        cancel: &AtomicBool,
    ) -> Result<Vec<VulnerabilityFinding>> {
        info!("[DoS] Starting denial-of-service checks on {}", url);
        let mut findings = Vec::new();

        self.check_depth(url, headers, schema, &mut findings).await;
        pause().await;

        let list_fields = crate::analyzer::find_list_fields(schema);
        info!("[DoS] Probing {} candidate list fields", list_fields.len());
        for field_name in &list_fields {
            if cancel.load(Ordering::Relaxed) {
                warn!("[DoS] Cancellation requested, stopping list probes");
                break;
            }
            self.check_list_field(url, headers, schema, field_name, &mut findings)
                .await;
            pause().await;
        }

        info!("[DoS] Checks completed: {} findings", findings.len());
        Ok(findings)
    }

    /// Depth check: does the server accept a deeply nested query?
    async fn check_depth(
        &self,
        url: &str,
        headers: &[(String, String)],
        schema: Option<&GraphQLSchema>,
        findings: &mut Vec<VulnerabilityFinding>,
    ) {
        let query = build_deep_query(DEPTH_PROBE_LEVELS, schema);
        debug!("[DoS] Depth probe ({} levels): {}", DEPTH_PROBE_LEVELS, query);

        match self
            .http_client
            .post_graphql(url, &query, headers, DEPTH_TIMEOUT)
            .await
        {
            Ok(response) => {
                if response.errors().is_empty() {
                    findings.push(
                        VulnerabilityFinding::new(
                            "Potencial DoS por Profundidad",
                            Severity::Medium,
                            format!(
                                "El servidor aceptó una consulta anidada de profundidad {} sin aplicar límites de profundidad ni de complejidad.",
                                DEPTH_PROBE_LEVELS
                            ),
                            "Configurar un límite de profundidad de consultas (query depth limit) y análisis de complejidad en el servidor GraphQL.",
                        )
                        .with_evidence(HashMap::from([
                            ("query".to_string(), json!(query)),
                            (
                                "response".to_string(),
                                response.data.clone().unwrap_or(serde_json::Value::Null),
                            ),
                        ])),
                    );
                    return;
                }

                let class = classify(
                    "",
                    Some(response.errors()),
                    Some(response.status_code),
                    response.has_data(),
                );
                match class {
                    ErrorClass::LimitEnforced | ErrorClass::AuthDenied => {
                        debug!("[DoS] Depth probe rejected by server defenses ({:?})", class);
                    }
                    _ => {
                        findings.push(self.unexpected_error_finding(
                            "profundidad",
                            &query,
                            &response.error_messages_lower().join(", "),
                        ));
                    }
                }
            }
            Err(err) => self.grade_probe_error(findings, "profundidad", &query, err),
        }
    }

    /// Pagination check: does an argument-less list query return an
    /// unbounded number of rows?
    async fn check_list_field(
        &self,
        url: &str,
        headers: &[(String, String)],
        schema: Option<&GraphQLSchema>,
        field_name: &str,
        findings: &mut Vec<VulnerabilityFinding>,
    ) {
        let query = build_list_query(field_name, schema);
        debug!("[DoS] List probe: {}", query);
        let check_name = format!("lista {}", field_name);

        match self
            .http_client
            .post_graphql(url, &query, headers, LIST_TIMEOUT)
            .await
        {
            Ok(response) => {
                let messages = response.error_messages_lower();
                if messages
                    .iter()
                    .any(|m| m.contains("pagination") || m.contains("limit"))
                {
                    debug!("[DoS] Field {} enforces pagination", field_name);
                    return;
                }

                if let Some(items) = response.field_data(field_name).and_then(|v| v.as_array()) {
                    if items.len() > UNBOUNDED_LIST_THRESHOLD {
                        findings.push(
                            VulnerabilityFinding::new(
                                "Potencial DoS por Falta de Paginación",
                                Severity::High,
                                format!(
                                    "El campo '{}' devolvió {} elementos en una sola respuesta sin requerir argumentos de paginación.",
                                    field_name,
                                    items.len()
                                ),
                                "Exigir argumentos de paginación (first/last o limit/offset) y acotar el tamaño máximo de página en el servidor.",
                            )
                            .with_evidence(HashMap::from([
                                ("query".to_string(), json!(query)),
                                ("longitud".to_string(), json!(items.len())),
                            ])),
                        );
                    } else {
                        debug!(
                            "[DoS] Field {} returned a bounded list ({} items)",
                            field_name,
                            items.len()
                        );
                    }
                    return;
                }

                if !messages.is_empty() {
                    let class = classify(
                        "",
                        Some(response.errors()),
                        Some(response.status_code),
                        response.has_data(),
                    );
                    match class {
                        ErrorClass::LimitEnforced | ErrorClass::AuthDenied => {
                            debug!("[DoS] List probe on {} rejected ({:?})", field_name, class);
                        }
                        _ => {
                            findings.push(self.unexpected_error_finding(
                                &check_name,
                                &query,
                                &messages.join(", "),
                            ));
                        }
                    }
                    return;
                }

                debug!("[DoS] Inconclusive list probe on {} (no array data)", field_name);
            }
            Err(err) => self.grade_probe_error(findings, &check_name, &query, err),
        }
    }

    /// Grade a transport failure per the depth-check error table.
    fn grade_probe_error(
        &self,
        findings: &mut Vec<VulnerabilityFinding>,
        check_name: &str,
        query: &str,
        err: TransportError,
    ) {
        let class = classify(&err.to_string(), err.graphql_errors(), err.status(), false);
        match class {
            ErrorClass::LimitEnforced | ErrorClass::AuthDenied => {
                debug!(
                    "[DoS] Probe ({}) rejected by server defenses ({:?})",
                    check_name, class
                );
            }
            ErrorClass::Timeout => {
                findings.push(
                    VulnerabilityFinding::new(
                        format!("Timeout en Chequeo DoS ({})", check_name),
                        Severity::Medium,
                        format!(
                            "La sonda de denegación de servicio ({}) agotó el tiempo de espera; el servidor puede ser susceptible a consultas costosas.",
                            check_name
                        ),
                        "Revisar los límites de ejecución y tiempos de respuesta del servidor GraphQL bajo consultas costosas.",
                    )
                    .with_evidence(HashMap::from([
                        ("query".to_string(), json!(query)),
                        ("error".to_string(), json!(err.to_string())),
                    ])),
                );
            }
            ErrorClass::Network | ErrorClass::Other => {
                findings.push(self.unexpected_error_finding(check_name, query, &err.to_string()));
            }
        }
    }

    fn unexpected_error_finding(
        &self,
        check_name: &str,
        query: &str,
        detail: &str,
    ) -> VulnerabilityFinding {
        VulnerabilityFinding::new(
            format!("Error Inesperado en Chequeo DoS ({})", check_name),
            Severity::Low,
            format!(
                "La sonda de denegación de servicio ({}) produjo un error no clasificado: {}",
                check_name, detail
            ),
            "Revisar manualmente la respuesta del servidor ante esta consulta.",
        )
        .with_evidence(HashMap::from([
            ("query".to_string(), json!(query)),
            ("error".to_string(), json!(detail)),
        ]))
    }
}
