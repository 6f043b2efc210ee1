// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! GraphQL schema introspection
//! Retrieves the remote schema and records introspection exposure as a
//! finding. A null schema is a valid downstream state: the DoS prober
//! falls back to conventional field names and the BOLA prober skips.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::graphql_schema::GraphQLSchema;
use crate::http_client::HttpClient;
use crate::types::{Severity, VulnerabilityFinding};

const INTROSPECTION_TIMEOUT: Duration = Duration::from_secs(15);

/// Standard introspection document with descriptions disabled
const INTROSPECTION_QUERY: &str = r#"query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      kind
      name
      fields(includeDeprecated: true) {
        name
        args {
          name
          type { kind name ofType { kind name ofType { kind name ofType { kind name ofType { kind name ofType { kind name ofType { kind name } } } } } } }
          defaultValue
        }
        type { kind name ofType { kind name ofType { kind name ofType { kind name ofType { kind name ofType { kind name ofType { kind name } } } } } } }
      }
      enumValues(includeDeprecated: true) { name }
    }
  }
}"#;

const DISABLE_RECOMMENDATION: &str = "Deshabilitar la introspección de GraphQL en producción o restringirla a entornos internos autenticados.";

pub struct SchemaFetcher {
    http_client: Arc<HttpClient>,
}

impl SchemaFetcher {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    /// Run the introspection query and grade the outcome. Returns the
    /// parsed schema (or `None`) together with the findings to record;
    /// failure here never aborts the scan.
    pub async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> (Option<GraphQLSchema>, Vec<VulnerabilityFinding>) {
        let mut findings = Vec::new();
        info!("[GraphQL] Running schema introspection on {}", url);

        let response = match self
            .http_client
            .post_graphql(url, INTROSPECTION_QUERY, headers, INTROSPECTION_TIMEOUT)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                info!("[GraphQL] Introspection request failed: {}", err);
                findings.push(VulnerabilityFinding::new(
                    "Introspection Deshabilitada o Fallida",
                    Severity::Low,
                    format!("La consulta de introspección falló: {}", err),
                    "Verificar manualmente si la introspección está deshabilitada de forma intencional.",
                ));
                return (None, findings);
            }
        };

        let Some(data) = response.data.clone().filter(|d| !d.is_null()) else {
            let detail = if response.errors().is_empty() {
                "la respuesta no contiene datos".to_string()
            } else {
                response
                    .error_messages_lower()
                    .join(", ")
            };
            info!("[GraphQL] Introspection returned no data: {}", detail);
            findings.push(VulnerabilityFinding::new(
                "Introspection Deshabilitada o Fallida",
                Severity::Low,
                format!("La consulta de introspección no devolvió datos: {}", detail),
                "Verificar manualmente si la introspección está deshabilitada de forma intencional.",
            ));
            return (None, findings);
        };

        findings.push(VulnerabilityFinding::new(
            "Introspection Habilitada",
            Severity::Info,
            "El endpoint respondió a la consulta de introspección exponiendo el esquema completo.",
            DISABLE_RECOMMENDATION,
        ));

        if !response.errors().is_empty() {
            findings.push(VulnerabilityFinding::new(
                "Introspection Query con Errores",
                Severity::Info,
                format!(
                    "La introspección devolvió datos junto con errores: {}",
                    response.error_messages_lower().join(", ")
                ),
                DISABLE_RECOMMENDATION,
            ));
        }

        match GraphQLSchema::from_introspection(&data) {
            Ok(schema) => {
                info!(
                    "[GraphQL] Parsed schema: {} types, query root {:?}, mutation root {:?}",
                    schema.types.len(),
                    schema.query_type,
                    schema.mutation_type
                );
                (Some(schema), findings)
            }
            Err(err) => {
                warn!("[GraphQL] Failed to parse introspection result: {:#}", err);
                findings.push(VulnerabilityFinding::new(
                    "Introspection Deshabilitada o Fallida",
                    Severity::Low,
                    format!(
                        "El resultado de la introspección no pudo interpretarse: {:#}",
                        err
                    ),
                    "Revisar si el endpoint devuelve un esquema de introspección conforme a la especificación.",
                ));
                (None, findings)
            }
        }
    }
}
