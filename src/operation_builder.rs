// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Synthesis of well-formed GraphQL operation documents from points of
//! interest and candidate fields. All output is syntactically valid
//! printable GraphQL.

use crate::analyzer::{find_deep_path, BolaPointOfInterest};
use crate::graphql_schema::{GraphQLSchema, OperationKind, TypeKind};

/// Selections present in every synthesized document
const BASE_SELECTIONS: &[&str] = &["id", "__typename"];

/// How many scalar fields of the return type to add on top of the base
const MAX_SCALAR_FIELDS: usize = 3;

/// Single-operation document probing one object id through a point of
/// interest, e.g. `query { order(id: "o1") { id __typename total } }`.
pub fn build_bola_operation(
    point: &BolaPointOfInterest,
    object_id: &str,
    schema: Option<&GraphQLSchema>,
) -> String {
    let selections = selection_set(schema, point.return_type_name.as_deref());
    format!(
        "{} {{ {}({}: \"{}\") {{ {} }} }}",
        point.operation,
        point.field_name,
        point.id_arg_name,
        escape_string(object_id),
        selections.join(" ")
    )
}

/// Argument-less list query used by the pagination probe.
pub fn build_list_query(field_name: &str, schema: Option<&GraphQLSchema>) -> String {
    let return_type = schema.and_then(|s| {
        s.root_fields(OperationKind::Query)
            .iter()
            .find(|f| f.name == field_name)
            .map(|f| f.type_ref.name().to_string())
    });
    let selections = selection_set(schema, return_type.as_deref());
    format!("query {{ {} {{ {} }} }}", field_name, selections.join(" "))
}

/// Deeply nested document for the depth probe. Follows the analyzer's
/// path when the schema offers one; otherwise emits a synthetic
/// `node { child0 { child1 { ... } } }` document of exactly `depth`
/// levels. Servers without the synthetic fields reject it with a
/// validation error, which the prober grades accordingly.
pub fn build_deep_query(depth: usize, schema: Option<&GraphQLSchema>) -> String {
    let path = find_deep_path(schema, depth);
    let segments: Vec<String> = if path.is_empty() {
        let mut synthetic = Vec::with_capacity(depth);
        if depth > 0 {
            synthetic.push("node".to_string());
        }
        for level in 0..depth.saturating_sub(1) {
            synthetic.push(format!("child{}", level));
        }
        synthetic
    } else {
        path
    };

    let mut selection = BASE_SELECTIONS.join(" ");
    for segment in segments.iter().rev() {
        selection = format!("{} {{ {} }}", segment, selection);
    }
    format!("query {{ {} }}", selection)
}

/// `id __typename` plus up to the first three distinct scalar fields of
/// the return type, in declaration order.
fn selection_set(schema: Option<&GraphQLSchema>, type_name: Option<&str>) -> Vec<String> {
    let mut selections: Vec<String> = BASE_SELECTIONS.iter().map(|s| s.to_string()).collect();

    let resolved = match (schema, type_name) {
        (Some(schema), Some(type_name)) => schema.type_by_name(type_name),
        _ => None,
    };
    if let Some(object) = resolved.filter(|t| t.kind == TypeKind::Object) {
        let mut added = 0;
        for field in &object.fields {
            if added == MAX_SCALAR_FIELDS {
                break;
            }
            if field.type_ref.kind() != TypeKind::Scalar {
                continue;
            }
            if selections.iter().any(|s| s == &field.name) {
                continue;
            }
            selections.push(field.name.clone());
            added += 1;
        }
    }

    selections
}

fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
