// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pure schema extractors feeding the probers.
//!
//! Everything in this module is side-effect free and returns empty or
//! fallback outputs when the schema is unavailable, so probers can run
//! against introspection-disabled targets.

use crate::graphql_schema::{GraphQLSchema, OperationKind, TypeKind};

/// Candidate list-field names probed when the schema is unavailable or
/// exposes no qualifying list field
pub const FALLBACK_LIST_FIELDS: &[&str] = &[
    "users",
    "posts",
    "items",
    "orders",
    "products",
    "nodes",
    "edges",
    "connections",
    "list",
    "all",
    "get",
];

/// Argument names that paginate rather than identify
const PAGINATION_ARGS: &[&str] = &["first", "last", "before", "after", "limit", "offset"];

/// A (field, id-argument) pair on an operation root suitable for BOLA
/// probing.
#[derive(Debug, Clone, PartialEq)]
pub struct BolaPointOfInterest {
    pub field_name: String,
    pub operation: OperationKind,
    pub id_arg_name: String,
    pub return_type_name: Option<String>,
}

impl BolaPointOfInterest {
    /// Object type whose owned ids feed this point: the unwrapped return
    /// type when known, otherwise inferred from the field name.
    pub fn effective_type_name(&self) -> String {
        self.return_type_name
            .clone()
            .unwrap_or_else(|| infer_object_type_from_field_name(&self.field_name))
    }
}

/// Walk root query and mutation fields collecting those that accept an
/// object identifier. A field qualifies when at least one argument has the
/// named type `ID` or an argument name containing `id`; the first such
/// argument in declaration order is selected.
pub fn find_bola_points_of_interest(
    schema: &GraphQLSchema,
    target_object_types: Option<&[String]>,
) -> Vec<BolaPointOfInterest> {
    let mut points = Vec::new();

    for operation in [OperationKind::Query, OperationKind::Mutation] {
        for field in schema.root_fields(operation) {
            let id_arg = field
                .args
                .iter()
                .find(|arg| arg.type_ref.name() == "ID" || arg.name.to_lowercase().contains("id"));
            if let Some(arg) = id_arg {
                let return_type_name = match field.type_ref.name() {
                    "" => None,
                    name => Some(name.to_string()),
                };
                points.push(BolaPointOfInterest {
                    field_name: field.name.clone(),
                    operation,
                    id_arg_name: arg.name.clone(),
                    return_type_name,
                });
            }
        }
    }

    if let Some(filter) = target_object_types {
        if !filter.is_empty() {
            points.retain(|point| {
                let type_name = point.effective_type_name();
                filter.iter().any(|t| t == &type_name)
            });
        }
    }

    points
}

/// Root query fields returning an outer-level list with no required
/// argument outside the pagination allowlist. Falls back to a list of
/// conventional field names when the schema yields nothing.
pub fn find_list_fields(schema: Option<&GraphQLSchema>) -> Vec<String> {
    let fallback = || {
        FALLBACK_LIST_FIELDS
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
    };

    let Some(schema) = schema else {
        return fallback();
    };

    let mut fields = Vec::new();
    for field in schema.root_fields(OperationKind::Query) {
        if !field.type_ref.is_list_outer() {
            continue;
        }
        let has_blocking_arg = field.args.iter().any(|arg| {
            arg.type_ref.is_required()
                && !PAGINATION_ARGS.contains(&arg.name.to_lowercase().as_str())
        });
        if !has_blocking_arg {
            fields.push(field.name.clone());
        }
    }

    if fields.is_empty() {
        fallback()
    } else {
        fields
    }
}

/// Greedy walk from the query root: at each step pick the first field that
/// is not a list at the outer level, takes no required arguments, and
/// returns an object type different from the current one. Stops after
/// `depth` steps or when no field qualifies.
pub fn find_deep_path(schema: Option<&GraphQLSchema>, depth: usize) -> Vec<String> {
    let Some(schema) = schema else {
        return Vec::new();
    };
    let Some(mut current) = schema
        .query_type
        .as_deref()
        .and_then(|name| schema.type_by_name(name))
    else {
        return Vec::new();
    };

    let mut path = Vec::new();
    for _ in 0..depth {
        let next = current.fields.iter().find(|field| {
            !field.type_ref.is_list_outer()
                && field.args.iter().all(|arg| !arg.type_ref.is_required())
                && field.type_ref.kind() == TypeKind::Object
                && field.type_ref.name() != current.name
        });
        let Some(field) = next else {
            break;
        };
        path.push(field.name.clone());
        match schema.type_by_name(field.type_ref.name()) {
            Some(next_type) => current = next_type,
            None => break,
        }
    }
    path
}

/// Derive an object type name from a root field name: strip a leading
/// accessor verb, strip a trailing collection suffix, capitalize. Used
/// only as a fallback when the return type is unavailable.
pub fn infer_object_type_from_field_name(name: &str) -> String {
    let mut rest = name;
    for prefix in ["get", "find", "list", "all"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }
    for suffix in ["ById", "Connection", "Edge", "s"] {
        if let Some(stripped) = rest.strip_suffix(suffix) {
            rest = stripped;
        }
    }
    let mut chars = rest.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => "Object".to_string(),
    }
}
