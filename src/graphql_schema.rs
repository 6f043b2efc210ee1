// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! In-memory GraphQL schema model.
//!
//! Built either from an introspection result (the `data` object of the
//! introspection response) or from SDL text. Field and argument order is
//! declaration order as received, which keeps downstream selection-set
//! synthesis deterministic.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    fn from_introspection(kind: &str) -> TypeKind {
        match kind {
            "OBJECT" => TypeKind::Object,
            "INTERFACE" => TypeKind::Interface,
            "UNION" => TypeKind::Union,
            "ENUM" => TypeKind::Enum,
            "INPUT_OBJECT" => TypeKind::InputObject,
            _ => TypeKind::Scalar,
        }
    }
}

/// Recursive type reference preserving NonNull/List wrapping.
///
/// The analyzer must distinguish an outer-level list (`[User!]!`) from a
/// list buried deeper, so the full wrapper shape is kept instead of
/// flattened flags.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Named { name: String, kind: TypeKind },
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Strip NonNull wrappers, keeping List wrappers in place
    pub fn unwrap_non_null(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(inner) => inner.unwrap_non_null(),
            other => other,
        }
    }

    /// Whether the type is a list once NonNull is unwrapped
    pub fn is_list_outer(&self) -> bool {
        matches!(self.unwrap_non_null(), TypeRef::List(_))
    }

    /// Whether the value is required (outer NonNull)
    pub fn is_required(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Innermost named type
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Named { name, .. } => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.name(),
        }
    }

    /// Kind of the innermost named type
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeRef::Named { kind, .. } => *kind,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.kind(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphQLArgument {
    pub name: String,
    pub type_ref: TypeRef,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GraphQLField {
    pub name: String,
    pub args: Vec<GraphQLArgument>,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone)]
pub struct GraphQLType {
    pub kind: TypeKind,
    pub name: String,
    pub fields: Vec<GraphQLField>,
    pub enum_values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GraphQLSchema {
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub types: Vec<GraphQLType>,
}

impl GraphQLSchema {
    pub fn type_by_name(&self, name: &str) -> Option<&GraphQLType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Fields of an operation root, empty when the root is absent
    pub fn root_fields(&self, operation: OperationKind) -> &[GraphQLField] {
        let root_name = match operation {
            OperationKind::Query => self.query_type.as_deref(),
            OperationKind::Mutation => self.mutation_type.as_deref(),
        };
        root_name
            .and_then(|name| self.type_by_name(name))
            .map(|t| t.fields.as_slice())
            .unwrap_or(&[])
    }

    /// Parse the `data` object of an introspection response.
    pub fn from_introspection(data: &Value) -> Result<GraphQLSchema> {
        let schema_data = data
            .get("__schema")
            .context("No __schema in introspection response")?;

        let query_type = root_type_name(schema_data, "queryType");
        let mutation_type = root_type_name(schema_data, "mutationType");
        let subscription_type = root_type_name(schema_data, "subscriptionType");

        let mut types = Vec::new();
        if let Some(types_array) = schema_data.get("types").and_then(|t| t.as_array()) {
            for type_def in types_array {
                if let Some(parsed) = parse_type(type_def) {
                    // Skip internal types
                    if parsed.name.starts_with("__") {
                        continue;
                    }
                    types.push(parsed);
                }
            }
        }

        Ok(GraphQLSchema {
            query_type,
            mutation_type,
            subscription_type,
            types,
        })
    }

    /// Parse SDL text into the same model the introspection path produces.
    pub fn from_sdl(sdl: &str) -> Result<GraphQLSchema> {
        use graphql_parser::schema::{Definition, TypeDefinition};

        let document = graphql_parser::schema::parse_schema::<String>(sdl)
            .context("El SDL proporcionado no es válido")?;

        // First pass: collect type kinds so field references can be resolved
        let mut kinds: HashMap<String, TypeKind> = HashMap::new();
        for builtin in ["String", "Int", "Float", "Boolean", "ID"] {
            kinds.insert(builtin.to_string(), TypeKind::Scalar);
        }
        for definition in &document.definitions {
            if let Definition::TypeDefinition(type_def) = definition {
                let (name, kind) = match type_def {
                    TypeDefinition::Scalar(t) => (t.name.clone(), TypeKind::Scalar),
                    TypeDefinition::Object(t) => (t.name.clone(), TypeKind::Object),
                    TypeDefinition::Interface(t) => (t.name.clone(), TypeKind::Interface),
                    TypeDefinition::Union(t) => (t.name.clone(), TypeKind::Union),
                    TypeDefinition::Enum(t) => (t.name.clone(), TypeKind::Enum),
                    TypeDefinition::InputObject(t) => (t.name.clone(), TypeKind::InputObject),
                };
                kinds.insert(name, kind);
            }
        }

        let mut query_type = None;
        let mut mutation_type = None;
        let mut subscription_type = None;
        let mut types = Vec::new();

        for definition in &document.definitions {
            match definition {
                Definition::SchemaDefinition(schema_def) => {
                    query_type = schema_def.query.clone();
                    mutation_type = schema_def.mutation.clone();
                    subscription_type = schema_def.subscription.clone();
                }
                Definition::TypeDefinition(type_def) => match type_def {
                    TypeDefinition::Object(object) => {
                        types.push(GraphQLType {
                            kind: TypeKind::Object,
                            name: object.name.clone(),
                            fields: object
                                .fields
                                .iter()
                                .map(|f| sdl_field(f, &kinds))
                                .collect(),
                            enum_values: Vec::new(),
                        });
                    }
                    TypeDefinition::Interface(interface) => {
                        types.push(GraphQLType {
                            kind: TypeKind::Interface,
                            name: interface.name.clone(),
                            fields: interface
                                .fields
                                .iter()
                                .map(|f| sdl_field(f, &kinds))
                                .collect(),
                            enum_values: Vec::new(),
                        });
                    }
                    TypeDefinition::Scalar(scalar) => {
                        types.push(GraphQLType {
                            kind: TypeKind::Scalar,
                            name: scalar.name.clone(),
                            fields: Vec::new(),
                            enum_values: Vec::new(),
                        });
                    }
                    TypeDefinition::Union(union) => {
                        types.push(GraphQLType {
                            kind: TypeKind::Union,
                            name: union.name.clone(),
                            fields: Vec::new(),
                            enum_values: Vec::new(),
                        });
                    }
                    TypeDefinition::Enum(enumeration) => {
                        types.push(GraphQLType {
                            kind: TypeKind::Enum,
                            name: enumeration.name.clone(),
                            fields: Vec::new(),
                            enum_values: enumeration
                                .values
                                .iter()
                                .map(|v| v.name.clone())
                                .collect(),
                        });
                    }
                    TypeDefinition::InputObject(input) => {
                        types.push(GraphQLType {
                            kind: TypeKind::InputObject,
                            name: input.name.clone(),
                            fields: Vec::new(),
                            enum_values: Vec::new(),
                        });
                    }
                },
                _ => {}
            }
        }

        // No explicit schema definition: fall back to conventional root names
        if query_type.is_none() && types.iter().any(|t| t.name == "Query") {
            query_type = Some("Query".to_string());
        }
        if mutation_type.is_none() && types.iter().any(|t| t.name == "Mutation") {
            mutation_type = Some("Mutation".to_string());
        }

        Ok(GraphQLSchema {
            query_type,
            mutation_type,
            subscription_type,
            types,
        })
    }

    /// Load a schema from the `schema` target field: either a filesystem
    /// path to an SDL file or inline SDL text.
    pub fn from_sdl_source(source: &str) -> Result<GraphQLSchema> {
        let trimmed = source.trim();
        if std::path::Path::new(trimmed).is_file() {
            let sdl = std::fs::read_to_string(trimmed)
                .with_context(|| format!("No se pudo leer el archivo de esquema {}", trimmed))?;
            return Self::from_sdl(&sdl);
        }
        Self::from_sdl(trimmed)
    }
}

fn root_type_name(schema_data: &Value, key: &str) -> Option<String> {
    schema_data
        .get(key)
        .and_then(|t| t.get("name"))
        .and_then(|n| n.as_str())
        .map(|s| s.to_string())
}

fn parse_type(type_def: &Value) -> Option<GraphQLType> {
    let kind = TypeKind::from_introspection(type_def.get("kind")?.as_str()?);
    let name = type_def.get("name")?.as_str()?.to_string();

    let fields = type_def
        .get("fields")
        .and_then(|f| f.as_array())
        .map(|arr| arr.iter().filter_map(parse_field).collect())
        .unwrap_or_default();

    let enum_values = type_def
        .get("enumValues")
        .and_then(|e| e.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.get("name").and_then(|n| n.as_str()).map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Some(GraphQLType {
        kind,
        name,
        fields,
        enum_values,
    })
}

fn parse_field(field_def: &Value) -> Option<GraphQLField> {
    let name = field_def.get("name")?.as_str()?.to_string();
    let type_ref = parse_type_ref(field_def.get("type")?)?;

    let args = field_def
        .get("args")
        .and_then(|a| a.as_array())
        .map(|arr| arr.iter().filter_map(parse_argument).collect())
        .unwrap_or_default();

    Some(GraphQLField {
        name,
        args,
        type_ref,
    })
}

fn parse_argument(arg_def: &Value) -> Option<GraphQLArgument> {
    let name = arg_def.get("name")?.as_str()?.to_string();
    let type_ref = parse_type_ref(arg_def.get("type")?)?;
    let default_value = arg_def
        .get("defaultValue")
        .and_then(|d| d.as_str())
        .map(|s| s.to_string());

    Some(GraphQLArgument {
        name,
        type_ref,
        default_value,
    })
}

/// Unwrap the NON_NULL/LIST chain of an introspection type reference
fn parse_type_ref(type_ref: &Value) -> Option<TypeRef> {
    let kind = type_ref.get("kind").and_then(|k| k.as_str()).unwrap_or("");
    match kind {
        "NON_NULL" => Some(TypeRef::NonNull(Box::new(parse_type_ref(
            type_ref.get("ofType")?,
        )?))),
        "LIST" => Some(TypeRef::List(Box::new(parse_type_ref(
            type_ref.get("ofType")?,
        )?))),
        _ => Some(TypeRef::Named {
            name: type_ref.get("name")?.as_str()?.to_string(),
            kind: TypeKind::from_introspection(kind),
        }),
    }
}

fn sdl_field(
    field: &graphql_parser::schema::Field<'_, String>,
    kinds: &HashMap<String, TypeKind>,
) -> GraphQLField {
    GraphQLField {
        name: field.name.clone(),
        args: field
            .arguments
            .iter()
            .map(|arg| GraphQLArgument {
                name: arg.name.clone(),
                type_ref: sdl_type_ref(&arg.value_type, kinds),
                default_value: arg.default_value.as_ref().map(|v| format!("{:?}", v)),
            })
            .collect(),
        type_ref: sdl_type_ref(&field.field_type, kinds),
    }
}

fn sdl_type_ref(
    sdl_type: &graphql_parser::schema::Type<'_, String>,
    kinds: &HashMap<String, TypeKind>,
) -> TypeRef {
    use graphql_parser::schema::Type;

    match sdl_type {
        Type::NamedType(name) => TypeRef::Named {
            name: name.clone(),
            kind: kinds.get(name).copied().unwrap_or(TypeKind::Scalar),
        },
        Type::ListType(inner) => TypeRef::List(Box::new(sdl_type_ref(inner, kinds))),
        Type::NonNullType(inner) => TypeRef::NonNull(Box::new(sdl_type_ref(inner, kinds))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SDL: &str = r#"
        type Query {
            order(id: ID!): Order
            users(limit: Int): [User!]!
        }

        type Mutation {
            updateOrder(orderId: ID!, total: Int): Order
        }

        type Order {
            id: ID
            total: Int
            owner: User
        }

        type User {
            id: ID
            name: String
            email: String
        }
    "#;

    #[test]
    fn test_sdl_roots_default_to_conventional_names() {
        let schema = GraphQLSchema::from_sdl(SDL).unwrap();
        assert_eq!(schema.query_type.as_deref(), Some("Query"));
        assert_eq!(schema.mutation_type.as_deref(), Some("Mutation"));
        assert_eq!(schema.root_fields(OperationKind::Query).len(), 2);
        assert_eq!(schema.root_fields(OperationKind::Mutation).len(), 1);
    }

    #[test]
    fn test_sdl_explicit_schema_definition() {
        let sdl = r#"
            schema { query: Root }
            type Root { ping: String }
        "#;
        let schema = GraphQLSchema::from_sdl(sdl).unwrap();
        assert_eq!(schema.query_type.as_deref(), Some("Root"));
        assert_eq!(schema.root_fields(OperationKind::Query).len(), 1);
    }

    #[test]
    fn test_sdl_type_ref_wrapping() {
        let schema = GraphQLSchema::from_sdl(SDL).unwrap();
        let users = &schema.root_fields(OperationKind::Query)[1];
        assert_eq!(users.name, "users");
        // [User!]! is a list at the outer level once NonNull is unwrapped
        assert!(users.type_ref.is_list_outer());
        assert!(users.type_ref.is_required());
        assert_eq!(users.type_ref.name(), "User");
        assert_eq!(users.type_ref.kind(), TypeKind::Object);

        let order = &schema.root_fields(OperationKind::Query)[0];
        assert!(!order.type_ref.is_list_outer());
        assert!(order.args[0].type_ref.is_required());
        assert_eq!(order.args[0].type_ref.name(), "ID");
    }

    #[test]
    fn test_introspection_parse_minimal_schema() {
        let data = json!({
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
                        ]
                    },
                    {
                        "kind": "OBJECT",
                        "name": "Order",
                        "fields": [
                            {"name": "id", "args": [], "type": {"kind": "SCALAR", "name": "ID", "ofType": null}},
                            {"name": "total", "args": [], "type": {"kind": "SCALAR", "name": "Int", "ofType": null}}
                        ]
                    },
                    {
                        "kind": "OBJECT",
                        "name": "__Schema",
                        "fields": []
                    }
                ]
            }
        });

        let schema = GraphQLSchema::from_introspection(&data).unwrap();
        assert_eq!(schema.query_type.as_deref(), Some("Query"));
        // Internal __ types are skipped
        assert_eq!(schema.types.len(), 2);

        let order = &schema.root_fields(OperationKind::Query)[0];
        assert_eq!(order.name, "order");
        assert_eq!(order.args[0].name, "id");
        assert!(order.args[0].type_ref.is_required());
        assert_eq!(order.args[0].type_ref.name(), "ID");
        assert_eq!(order.type_ref.kind(), TypeKind::Object);
    }

    #[test]
    fn test_introspection_missing_schema_key_fails() {
        assert!(GraphQLSchema::from_introspection(&json!({"other": 1})).is_err());
    }

    #[test]
    fn test_field_order_is_declaration_order() {
        let schema = GraphQLSchema::from_sdl(SDL).unwrap();
        let user = schema.type_by_name("User").unwrap();
        let names: Vec<&str> = user.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "email"]);
    }
}
