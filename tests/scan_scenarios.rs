// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * GqlGuard - End-to-end scan scenarios
 * Drives full scans against a stubbed GraphQL endpoint and checks the
 * graded finding stream.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gqlguard::engine::run_scan;
use gqlguard::types::{BolaConfig, ScanStatus, ScanTarget, Severity, UserContext};

fn context(id: &str, token: &str, owned: &[(&str, &[&str])]) -> UserContext {
    UserContext {
        id: id.to_string(),
        auth_token: token.to_string(),
        owned_object_ids: owned
            .iter()
            .map(|(type_name, ids)| {
                (
                    type_name.to_string(),
                    ids.iter().map(|i| i.to_string()).collect(),
                )
            })
            .collect(),
    }
}

fn target(server: &MockServer, contexts: Vec<UserContext>) -> ScanTarget {
    ScanTarget {
        url: format!("{}/graphql", server.uri()),
        schema: None,
        user_contexts: contexts,
        bola_config: None,
    }
}

/// Exact-match stub for the `{ __typename }` connectivity probe
async fn mount_connectivity(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_json(json!({"query": "{ __typename }"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"__typename": "Query"}})),
        )
        .mount(server)
        .await;
}

/// Default stub: every unmatched probe hits a complexity limit, which is
/// classified as a defense and never graded
async fn mount_limit_catch_all(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"errors": [{"message": "Query complexity limit exceeded"}]}),
        ))
        .with_priority(250)
        .mount(server)
        .await;
}

const BOLA_SDL: &str = "type Query { order(id: ID!): Order } type Order { id: ID total: Int }";

// With introspection disabled and a single principal, the scan completes
// with exactly one Low finding and the pagination probe falls back to the
// conventional list-field names.
#[tokio::test]
async fn scenario_introspection_disabled_completes_with_single_low_finding() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("__schema"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_connectivity(&server).await;
    mount_limit_catch_all(&server).await;

    let result = run_scan(target(&server, vec![context("a", "t", &[])])).await;

    assert_eq!(result.status, ScanStatus::Completed);
    assert!(result.error.is_none());
    assert_eq!(result.findings.len(), 1, "findings: {:?}", result.findings);
    assert_eq!(
        result.findings[0].vuln_type,
        "Introspection Deshabilitada o Fallida"
    );
    assert_eq!(result.findings[0].severity, Severity::Low);

    // The pagination probe fell back to conventional list-field names
    let requests = server.received_requests().await.unwrap();
    let bodies: Vec<String> = requests
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .collect();
    assert!(bodies.iter().any(|b| b.contains("{ users {")));
    assert!(bodies.iter().any(|b| b.contains("{ connections {")));
}

// A server that accepts the depth-7 probe gets a Medium finding naming
// the depth.
#[tokio::test]
async fn scenario_deep_query_accepted_is_graded_medium() {
    let server = MockServer::start().await;

    mount_connectivity(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("viewer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"viewer": {"account": {"owner": {"id": "1", "__typename": "Viewer"}}}}}),
        ))
        .mount(&server)
        .await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(&server, vec![context("a", "t", &[])]);
    scan_target.schema = Some(
        "type Query { viewer: Viewer } \
         type Viewer { id: ID account: Account } \
         type Account { id: ID owner: Viewer }"
            .to_string(),
    );

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.findings.len(), 1, "findings: {:?}", result.findings);
    let finding = &result.findings[0];
    assert_eq!(finding.vuln_type, "Potencial DoS por Profundidad");
    assert_eq!(finding.severity, Severity::Medium);
    assert!(finding.description.contains("profundidad 7"));
}

// A list field without pagination returning 150 rows is graded High,
// with the observed length in the description.
#[tokio::test]
async fn scenario_unpaginated_list_of_150_is_graded_high() {
    let server = MockServer::start().await;

    let rows: Vec<Value> = (0..150)
        .map(|i| json!({"id": format!("u{}", i), "name": "n", "email": "e", "__typename": "User"}))
        .collect();

    mount_connectivity(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("{ users {"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"users": rows}})))
        .mount(&server)
        .await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(&server, vec![context("a", "t", &[])]);
    scan_target.schema = Some(
        "type Query { users: [User!]! } \
         type User { id: ID name: String email: String }"
            .to_string(),
    );

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.findings.len(), 1, "findings: {:?}", result.findings);
    let finding = &result.findings[0];
    assert_eq!(finding.vuln_type, "Potencial DoS por Falta de Paginación");
    assert_eq!(finding.severity, Severity::High);
    assert!(finding.description.contains("150"));
}

// A bounded list (under the threshold) is not a finding.
#[tokio::test]
async fn bounded_list_produces_no_finding() {
    let server = MockServer::start().await;

    let rows: Vec<Value> = (0..100).map(|i| json!({"id": format!("u{}", i)})).collect();

    mount_connectivity(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("{ users {"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"users": rows}})))
        .mount(&server)
        .await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(&server, vec![context("a", "t", &[])]);
    scan_target.schema =
        Some("type Query { users: [User!]! } type User { id: ID }".to_string());

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Completed);
    assert!(result.findings.is_empty(), "findings: {:?}", result.findings);
}

// A probe as attacker A that returns victim B's order is a finding:
// High on the query point, Critical on the mutation point, with the
// probe document and the response as evidence.
#[tokio::test]
async fn scenario_bola_hit_is_high_on_query_and_critical_on_mutation() {
    let server = MockServer::start().await;

    mount_connectivity(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("updateOrder(id:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"updateOrder": {"id": "o1", "total": 42, "__typename": "Order"}}}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("order(id:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"order": {"id": "o1", "total": 42, "__typename": "Order"}}}),
        ))
        .mount(&server)
        .await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(
        &server,
        vec![
            context("a", "token-a", &[]),
            context("b", "token-b", &[("Order", &["o1"])]),
        ],
    );
    scan_target.schema = Some(
        "type Query { order(id: ID!): Order } \
         type Mutation { updateOrder(id: ID!): Order } \
         type Order { id: ID total: Int }"
            .to_string(),
    );

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Completed);
    let bola: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.vuln_type == "Vulnerabilidad BOLA Detectada")
        .collect();
    assert_eq!(bola.len(), 2, "findings: {:?}", result.findings);

    let query_hit = bola
        .iter()
        .find(|f| f.description.contains("'order'"))
        .expect("query point finding");
    assert_eq!(query_hit.severity, Severity::High);
    assert!(query_hit.description.contains("'a'"));
    assert!(query_hit.description.contains("'b'"));
    assert!(query_hit.description.contains("'o1'"));
    let evidence = query_hit.evidence.as_ref().expect("evidence");
    assert!(evidence["query"]
        .as_str()
        .unwrap()
        .contains("order(id: \"o1\")"));
    assert_eq!(evidence["response"]["total"], json!(42));

    let mutation_hit = bola
        .iter()
        .find(|f| f.description.contains("'updateOrder'"))
        .expect("mutation point finding");
    assert_eq!(mutation_hit.severity, Severity::Critical);
}

// The same probe denied with a GraphQL error is the expected outcome
// and produces no finding.
#[tokio::test]
async fn scenario_denied_bola_probe_produces_no_finding() {
    let server = MockServer::start().await;

    mount_connectivity(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("order(id:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"order": null}, "errors": [{"message": "Forbidden"}]}),
        ))
        .mount(&server)
        .await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(
        &server,
        vec![
            context("a", "token-a", &[]),
            context("b", "token-b", &[("Order", &["o1"])]),
        ],
    );
    scan_target.schema = Some(BOLA_SDL.to_string());

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Completed);
    assert!(result.findings.is_empty(), "findings: {:?}", result.findings);
}

// A connectivity failure aborts the scan before any finding is recorded.
#[tokio::test]
async fn scenario_connectivity_failure_fails_with_no_findings() {
    let scan_target = ScanTarget {
        url: "http://127.0.0.1:9/graphql".to_string(),
        schema: None,
        user_contexts: vec![context("a", "t", &[])],
        bola_config: None,
    };

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Failed);
    assert!(result.findings.is_empty());
    let error = result.error.expect("error message");
    assert!(
        error.starts_with("No se pudo conectar a "),
        "error: {}",
        error
    );
}

// Probes are deduplicated on (attacker, operation, field, objectId):
// duplicate owned ids trigger a single request.
#[tokio::test]
async fn duplicate_owned_ids_are_probed_once() {
    let server = MockServer::start().await;

    mount_connectivity(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("order(id:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"order": {"id": "o1", "total": 42, "__typename": "Order"}}}),
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(
        &server,
        vec![
            context("a", "token-a", &[]),
            context("b", "token-b", &[("Order", &["o1", "o1"])]),
        ],
    );
    scan_target.schema = Some(BOLA_SDL.to_string());

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Completed);
    let bola_count = result
        .findings
        .iter()
        .filter(|f| f.vuln_type == "Vulnerabilidad BOLA Detectada")
        .count();
    assert_eq!(bola_count, 1);
}

// BOLA probes run under the attacker's bearer token.
#[tokio::test]
async fn bola_probe_carries_attacker_authorization_header() {
    let server = MockServer::start().await;

    mount_connectivity(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("order(id:"))
        .and(wiremock::matchers::header("Authorization", "Bearer token-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"order": {"id": "o1", "__typename": "Order"}}}),
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(
        &server,
        vec![
            context("a", "token-a", &[]),
            context("b", "token-b", &[("Order", &["o1"])]),
        ],
    );
    scan_target.schema = Some(BOLA_SDL.to_string());

    let result = run_scan(scan_target).await;
    assert_eq!(result.status, ScanStatus::Completed);
}

// With no qualifying point of interest the prober records an Info
// finding and stops.
#[tokio::test]
async fn bola_without_points_of_interest_is_informational() {
    let server = MockServer::start().await;

    mount_connectivity(&server).await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(
        &server,
        vec![context("a", "ta", &[]), context("b", "tb", &[])],
    );
    scan_target.schema = Some("type Query { ping: String }".to_string());

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.findings.len(), 1, "findings: {:?}", result.findings);
    assert_eq!(
        result.findings[0].vuln_type,
        "No se encontraron puntos de prueba BOLA"
    );
    assert_eq!(result.findings[0].severity, Severity::Info);
}

// The Info variant naming the configured types fires when the filter
// matches nothing.
#[tokio::test]
async fn bola_with_unmatched_type_filter_is_informational() {
    let server = MockServer::start().await;

    mount_connectivity(&server).await;
    mount_limit_catch_all(&server).await;

    let mut scan_target = target(
        &server,
        vec![
            context("a", "ta", &[]),
            context("b", "tb", &[("Order", &["o1"])]),
        ],
    );
    scan_target.schema = Some(BOLA_SDL.to_string());
    scan_target.bola_config = Some(BolaConfig {
        target_object_types: vec!["User".to_string()],
    });

    let result = run_scan(scan_target).await;

    assert_eq!(result.status, ScanStatus::Completed);
    assert_eq!(result.findings.len(), 1, "findings: {:?}", result.findings);
    assert_eq!(
        result.findings[0].vuln_type,
        "No se encontraron puntos de prueba BOLA para los tipos especificados"
    );
    assert!(result.findings[0].description.contains("User"));
}

// BOLA is skipped silently when the schema could not be acquired, even
// with two principals configured.
#[tokio::test]
async fn bola_is_skipped_without_schema() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("__schema"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_connectivity(&server).await;
    mount_limit_catch_all(&server).await;

    let result = run_scan(target(
        &server,
        vec![
            context("a", "ta", &[]),
            context("b", "tb", &[("Order", &["o1"])]),
        ],
    ))
    .await;

    assert_eq!(result.status, ScanStatus::Completed);
    // Only the introspection finding; no BOLA activity at all
    assert_eq!(result.findings.len(), 1, "findings: {:?}", result.findings);
    assert_eq!(
        result.findings[0].vuln_type,
        "Introspection Deshabilitada o Fallida"
    );
}

// Full remote-introspection path: the schema comes from the wire, the
// exposure is recorded as Info, and BOLA probing proceeds on it.
#[tokio::test]
async fn introspected_schema_feeds_bola_probing() {
    let server = MockServer::start().await;

    let introspection = json!({
        "data": {
            "__schema": {
                "queryType": {"name": "Query"},
                "mutationType": null,
                "subscriptionType": null,
                "types": [
                    {
                        "kind": "OBJECT",
                        "name": "Query",
                        "fields": [
                            {
                                "name": "order",
                                "args": [
                                    {
                                        "name": "id",
                                        "type": {
                                            "kind": "NON_NULL",
                                            "name": null,
                                            "ofType": {"kind": "SCALAR", "name": "ID", "ofType": null}
                                        },
                                        "defaultValue": null
                                    }
                                ],
                                "type": {"kind": "OBJECT", "name": "Order", "ofType": null}
                            }
                        ],
                        "enumValues": null
                    },
                    {
                        "kind": "OBJECT",
                        "name": "Order",
                        "fields": [
                            {"name": "id", "args": [], "type": {"kind": "SCALAR", "name": "ID", "ofType": null}},
                            {"name": "total", "args": [], "type": {"kind": "SCALAR", "name": "Int", "ofType": null}}
                        ],
                        "enumValues": null
                    }
                ]
            }
        }
    });

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("__schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(introspection))
        .mount(&server)
        .await;
    mount_connectivity(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("order(id:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"order": {"id": "o1", "total": 42, "__typename": "Order"}}}),
        ))
        .mount(&server)
        .await;
    mount_limit_catch_all(&server).await;

    let result = run_scan(target(
        &server,
        vec![
            context("a", "token-a", &[]),
            context("b", "token-b", &[("Order", &["o1"])]),
        ],
    ))
    .await;

    assert_eq!(result.status, ScanStatus::Completed);
    assert!(result
        .findings
        .iter()
        .any(|f| f.vuln_type == "Introspection Habilitada" && f.severity == Severity::Info));
    let bola = result
        .findings
        .iter()
        .find(|f| f.vuln_type == "Vulnerabilidad BOLA Detectada")
        .expect("BOLA finding");
    assert_eq!(bola.severity, Severity::High);
    // The selection set picked Order's scalar fields from the
    // introspected schema in declaration order
    assert!(bola.evidence.as_ref().unwrap()["query"]
        .as_str()
        .unwrap()
        .contains("{ id __typename total }"));
}
