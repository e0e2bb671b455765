//! Project GraphQL input types onto JSON Schema

use schemars::{Schema, json_schema};
use serde_json::{Map, Value};

use crate::schema::{GraphQLSchema, InputValue, TypeDefinition, TypeRef};

/// Generate an MCP tool input schema from a Rust type deriving `JsonSchema`
#[macro_export]
macro_rules! schema_from_type {
    ($type:ty) => {{
        match serde_json::to_value(schemars::schema_for!($type)) {
            Ok(serde_json::Value::Object(schema)) => schema,
            _ => serde_json::Map::new(),
        }
    }};
}

/// How many levels of wrapped input types are projected before giving up
pub const MAX_DEPTH: usize = 3;

/// A projected JSON Schema, plus whether the GraphQL type was non-null.
///
/// JSON Schema records required-ness on the parent object, so the flag is
/// consumed by whoever assembles the enclosing `properties` map.
#[derive(Debug, Clone)]
pub struct Projection {
    pub schema: Schema,
    pub required: bool,
}

pub struct TypeProjector<'a> {
    schema: &'a GraphQLSchema,
    max_depth: usize,
}

impl<'a> TypeProjector<'a> {
    pub fn new(schema: &'a GraphQLSchema) -> Self {
        Self {
            schema,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn project(&self, ty: &TypeRef) -> Projection {
        self.project_at(ty, 1)
    }

    fn project_at(&self, ty: &TypeRef, depth: usize) -> Projection {
        if depth > self.max_depth {
            return Projection {
                schema: json_schema!({
                    "type": "object",
                    "description": "Max depth reached",
                }),
                required: false,
            };
        }

        match ty {
            TypeRef::NonNull(inner) => Projection {
                required: true,
                ..self.project_at(inner, depth)
            },
            TypeRef::List(inner) => {
                let items = self.project_at(inner, depth + 1).schema;
                Projection {
                    schema: json_schema!({
                        "type": "array",
                        "items": items,
                    }),
                    required: false,
                }
            }
            TypeRef::Named(name) => Projection {
                schema: self.project_named(name),
                required: false,
            },
        }
    }

    fn project_named(&self, name: &str) -> Schema {
        match self.schema.type_definition(name) {
            Some(TypeDefinition::Scalar(_)) => scalar(name),
            None if builtin_scalar(name).is_some() => scalar(name),
            Some(TypeDefinition::Enum(r#enum)) => {
                let values: Vec<&str> = r#enum.values.iter().map(|v| v.name.as_str()).collect();
                json_schema!({
                    "type": "string",
                    "enum": values,
                    "description": r#enum
                        .description
                        .clone()
                        .unwrap_or_else(|| format!("GraphQL enum: {name}")),
                })
            }
            Some(TypeDefinition::InputObject(_)) => json_schema!({
                "type": "object",
                "description": format!("{name} — use lookupInputType('{name}') to see structure"),
                "additionalProperties": true,
            }),
            _ => json_schema!({
                "type": "string",
                "description": format!("Unknown GraphQL type: {name}"),
            }),
        }
    }

    /// Project a field argument into a tool input property.
    ///
    /// Returns the property schema and whether callers must supply it.
    pub fn argument(&self, argument: &InputValue) -> (Schema, bool) {
        let Projection {
            mut schema,
            required,
        } = self.project(&argument.ty);

        let description = [
            argument.description.clone(),
            Some(format!("GraphQL type: {}", argument.ty)),
            argument
                .default_value
                .as_ref()
                .map(|default| format!("Default: {default}")),
            schema
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(". ");
        schema.insert("description".to_string(), Value::String(description));

        (schema, required && argument.default_value.is_none())
    }

    /// Build the object schema accepted by a tool taking these arguments
    pub fn arguments<'b>(
        &self,
        arguments: impl IntoIterator<Item = &'b InputValue>,
    ) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for argument in arguments {
            let (schema, is_required) = self.argument(argument);
            if is_required {
                required.push(Value::String(argument.name.clone()));
            }
            properties.insert(argument.name.clone(), schema.to_value());
        }

        let mut object = Map::new();
        object.insert("type".to_string(), Value::String("object".to_string()));
        object.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            object.insert("required".to_string(), Value::Array(required));
        }
        object
    }
}

fn builtin_scalar(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "string" | "id" => Some("string"),
        "int" => Some("integer"),
        "float" => Some("number"),
        "boolean" => Some("boolean"),
        _ => None,
    }
}

fn scalar(name: &str) -> Schema {
    match builtin_scalar(name) {
        Some(json_type) => json_schema!({ "type": json_type }),
        None => json_schema!({
            "type": "string",
            "description": format!("GraphQL scalar: {name}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn schema() -> GraphQLSchema {
        GraphQLSchema::from_sdl(
            r#"
            scalar DateTime

            type Query {
                orders(where: OrderWhereInput, take: Int!, skip: Int! = 0, status: OrderStatusType): [String]
            }

            input OrderWhereInput {
                id: ID
                AND: [OrderWhereInput!]
            }

            enum OrderStatusType {
                pending
                completed
                canceled
            }
            "#,
            "schema.graphql",
        )
        .unwrap()
    }

    fn list(inner: TypeRef) -> TypeRef {
        TypeRef::List(Box::new(inner))
    }

    fn non_null(inner: TypeRef) -> TypeRef {
        TypeRef::NonNull(Box::new(inner))
    }

    fn named(name: &str) -> TypeRef {
        TypeRef::Named(name.to_string())
    }

    #[rstest]
    #[case(named("String"), json!({ "type": "string" }))]
    #[case(named("ID"), json!({ "type": "string" }))]
    #[case(named("Int"), json!({ "type": "integer" }))]
    #[case(named("Float"), json!({ "type": "number" }))]
    #[case(named("Boolean"), json!({ "type": "boolean" }))]
    #[case(named("DateTime"), json!({ "type": "string", "description": "GraphQL scalar: DateTime" }))]
    #[case(named("Missing"), json!({ "type": "string", "description": "Unknown GraphQL type: Missing" }))]
    fn projects_named_types(schema: GraphQLSchema, #[case] ty: TypeRef, #[case] expected: Value) {
        let projection = TypeProjector::new(&schema).project(&ty);
        assert_eq!(projection.schema.to_value(), expected);
        assert!(!projection.required);
    }

    #[rstest]
    fn non_null_marks_required_without_changing_the_schema(schema: GraphQLSchema) {
        let projection = TypeProjector::new(&schema).project(&non_null(named("Int")));
        assert_eq!(projection.schema.to_value(), json!({ "type": "integer" }));
        assert!(projection.required);
    }

    #[rstest]
    fn input_objects_defer_to_lookup(schema: GraphQLSchema) {
        let projection = TypeProjector::new(&schema).project(&named("OrderWhereInput"));
        assert_eq!(
            projection.schema.to_value(),
            json!({
                "type": "object",
                "description": "OrderWhereInput — use lookupInputType('OrderWhereInput') to see structure",
                "additionalProperties": true,
            })
        );
    }

    #[rstest]
    fn enums_list_their_values(schema: GraphQLSchema) {
        let projection = TypeProjector::new(&schema).project(&named("OrderStatusType"));
        assert_eq!(
            projection.schema.to_value(),
            json!({
                "type": "string",
                "enum": ["pending", "completed", "canceled"],
                "description": "GraphQL enum: OrderStatusType",
            })
        );
    }

    #[rstest]
    fn nested_lists_stop_at_max_depth(schema: GraphQLSchema) {
        let ty = list(list(list(named("Int"))));
        let projection = TypeProjector::new(&schema).project(&ty);
        assert_eq!(
            projection.schema.to_value(),
            json!({
                "type": "array",
                "items": {
                    "type": "array",
                    "items": {
                        "type": "array",
                        "items": { "type": "object", "description": "Max depth reached" },
                    },
                },
            })
        );
    }

    #[rstest]
    fn depth_limit_is_configurable(schema: GraphQLSchema) {
        let projection = TypeProjector::new(&schema)
            .with_max_depth(1)
            .project(&list(named("Int")));
        assert_eq!(
            projection.schema.to_value(),
            json!({
                "type": "array",
                "items": { "type": "object", "description": "Max depth reached" },
            })
        );
    }

    #[rstest]
    fn builds_tool_input_schema_from_arguments(schema: GraphQLSchema) {
        let (_, orders) = schema.find_root_field("orders").unwrap();
        let input = TypeProjector::new(&schema).arguments(&orders.arguments);
        assert_eq!(
            Value::Object(input),
            json!({
                "type": "object",
                "properties": {
                    "where": {
                        "type": "object",
                        "description": "GraphQL type: OrderWhereInput. OrderWhereInput — use lookupInputType('OrderWhereInput') to see structure",
                        "additionalProperties": true,
                    },
                    "take": {
                        "type": "integer",
                        "description": "GraphQL type: Int!",
                    },
                    "skip": {
                        "type": "integer",
                        "description": "GraphQL type: Int!. Default: 0",
                    },
                    "status": {
                        "type": "string",
                        "enum": ["pending", "completed", "canceled"],
                        "description": "GraphQL type: OrderStatusType. GraphQL enum: OrderStatusType",
                    },
                },
                "required": ["take"],
            })
        );
    }
}
