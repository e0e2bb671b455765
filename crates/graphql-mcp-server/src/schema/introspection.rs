//! Build a [`GraphQLSchema`] from a standard introspection response

use serde::Deserialize;
use serde_json::Value;

use crate::errors::IntrospectionError;

use super::{
    EnumType, EnumValue, FieldDefinition, GraphQLSchema, InputObjectType, InputValue, ObjectType,
    ScalarType, TypeDefinition, TypeRef, UnionType,
};

/// The introspection query sent to the upstream endpoint
pub const INTROSPECTION_QUERY: &str = r#"query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    types {
      ...FullType
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args {
      ...InputValue
    }
    type {
      ...TypeRef
    }
  }
  inputFields {
    ...InputValue
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type {
    ...TypeRef
  }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<Data>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(rename = "__schema")]
    schema: Schema,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Schema {
    query_type: Option<RootType>,
    mutation_type: Option<RootType>,
    types: Vec<FullType>,
}

#[derive(Debug, Deserialize)]
struct RootType {
    name: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullType {
    kind: TypeKind,
    name: Option<String>,
    description: Option<String>,
    fields: Option<Vec<Field>>,
    input_fields: Option<Vec<InputValueJson>>,
    enum_values: Option<Vec<EnumValueJson>>,
    possible_types: Option<Vec<TypeRefJson>>,
}

#[derive(Debug, Deserialize)]
struct Field {
    name: String,
    description: Option<String>,
    #[serde(default)]
    args: Vec<InputValueJson>,
    #[serde(rename = "type")]
    ty: TypeRefJson,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputValueJson {
    name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    ty: TypeRefJson,
    default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnumValueJson {
    name: String,
    description: Option<String>,
    deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeRefJson {
    kind: TypeKind,
    name: Option<String>,
    of_type: Option<Box<TypeRefJson>>,
}

impl TryFrom<TypeRefJson> for TypeRef {
    type Error = IntrospectionError;

    fn try_from(value: TypeRefJson) -> Result<Self, Self::Error> {
        match value.kind {
            TypeKind::NonNull | TypeKind::List => {
                let inner = value.of_type.ok_or_else(|| {
                    IntrospectionError::Malformed(format!(
                        "{:?} type reference without ofType",
                        value.kind
                    ))
                })?;
                let inner = Box::new(TypeRef::try_from(*inner)?);
                Ok(if value.kind == TypeKind::NonNull {
                    TypeRef::NonNull(inner)
                } else {
                    TypeRef::List(inner)
                })
            }
            _ => value.name.map(TypeRef::Named).ok_or_else(|| {
                IntrospectionError::Malformed("named type reference without a name".to_string())
            }),
        }
    }
}

impl TryFrom<InputValueJson> for InputValue {
    type Error = IntrospectionError;

    fn try_from(value: InputValueJson) -> Result<Self, Self::Error> {
        Ok(InputValue {
            name: value.name,
            description: value.description,
            ty: value.ty.try_into()?,
            default_value: value.default_value,
        })
    }
}

impl TryFrom<Field> for FieldDefinition {
    type Error = IntrospectionError;

    fn try_from(value: Field) -> Result<Self, Self::Error> {
        Ok(FieldDefinition {
            name: value.name,
            description: value.description,
            arguments: value
                .args
                .into_iter()
                .map(InputValue::try_from)
                .collect::<Result<_, _>>()?,
            ty: value.ty.try_into()?,
        })
    }
}

fn object_type(
    name: String,
    description: Option<String>,
    fields: Option<Vec<Field>>,
) -> Result<ObjectType, IntrospectionError> {
    Ok(ObjectType {
        name,
        description,
        fields: fields
            .unwrap_or_default()
            .into_iter()
            .map(FieldDefinition::try_from)
            .collect::<Result<_, _>>()?,
    })
}

impl TryFrom<FullType> for TypeDefinition {
    type Error = IntrospectionError;

    fn try_from(value: FullType) -> Result<Self, Self::Error> {
        let FullType {
            kind,
            name,
            description,
            fields,
            input_fields,
            enum_values,
            possible_types,
        } = value;
        let name = name.ok_or_else(|| {
            IntrospectionError::Malformed(format!("{kind:?} type without a name"))
        })?;

        Ok(match kind {
            TypeKind::Scalar => TypeDefinition::Scalar(ScalarType { name, description }),
            TypeKind::Object => TypeDefinition::Object(object_type(name, description, fields)?),
            TypeKind::Interface => {
                TypeDefinition::Interface(object_type(name, description, fields)?)
            }
            TypeKind::Union => TypeDefinition::Union(UnionType {
                name,
                description,
                possible_types: possible_types
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|possible| possible.name)
                    .collect(),
            }),
            TypeKind::Enum => TypeDefinition::Enum(EnumType {
                name,
                description,
                values: enum_values
                    .unwrap_or_default()
                    .into_iter()
                    .map(|value| EnumValue {
                        name: value.name,
                        description: value.description,
                        deprecation_reason: value.deprecation_reason,
                    })
                    .collect(),
            }),
            TypeKind::InputObject => TypeDefinition::InputObject(InputObjectType {
                name,
                description,
                fields: input_fields
                    .unwrap_or_default()
                    .into_iter()
                    .map(InputValue::try_from)
                    .collect::<Result<_, _>>()?,
            }),
            TypeKind::List | TypeKind::NonNull => {
                return Err(IntrospectionError::Malformed(format!(
                    "wrapper kind {kind:?} listed as a named type {name}"
                )));
            }
        })
    }
}

impl GraphQLSchema {
    /// Build a schema from the JSON body of an introspection response
    pub fn from_introspection(response: Value) -> Result<Self, IntrospectionError> {
        let response: Response = serde_json::from_value(response)?;

        if let Some(errors) = response
            .errors
            .filter(|errors| errors.as_array().is_some_and(|errors| !errors.is_empty()))
        {
            return Err(IntrospectionError::GraphQL(errors));
        }

        let schema = response
            .data
            .ok_or_else(|| IntrospectionError::Malformed("response has no data".to_string()))?
            .schema;

        Ok(GraphQLSchema::new(
            schema.query_type.map(|root| root.name),
            schema.mutation_type.map(|root| root.name),
            schema
                .types
                .into_iter()
                .map(TypeDefinition::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }
}
