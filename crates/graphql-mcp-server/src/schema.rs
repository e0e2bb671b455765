//! The GraphQL type graph
//!
//! A read-only, closed representation of the types reachable from a schema's
//! root operations. Instances are built once per fetch, either from an
//! introspection response or from SDL, and are never mutated afterwards.

pub(crate) mod introspection;
mod sdl;

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

pub use introspection::INTROSPECTION_QUERY;

/// The root operation kinds that can be exposed as tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
}

impl Display for OperationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Query => f.write_str("query"),
            OperationType::Mutation => f.write_str("mutation"),
        }
    }
}

/// A reference to a type, possibly wrapped in list or non-null modifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    /// The innermost named type
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::NonNull(inner) | TypeRef::List(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Display form without non-null markers, e.g. `[Order!]!` becomes `[Order]`
    pub fn simplified(&self) -> String {
        match self {
            TypeRef::Named(name) => name.clone(),
            TypeRef::NonNull(inner) => inner.simplified(),
            TypeRef::List(inner) => format!("[{}]", inner.simplified()),
        }
    }
}

/// Renders the full GraphQL type string, e.g. `[Order!]!`
impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// A named type definition
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Scalar(ScalarType),
    Enum(EnumType),
    InputObject(InputObjectType),
    Object(ObjectType),
    Interface(ObjectType),
    Union(UnionType),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Scalar(scalar) => &scalar.name,
            TypeDefinition::Enum(r#enum) => &r#enum.name,
            TypeDefinition::InputObject(input) => &input.name,
            TypeDefinition::Object(object) | TypeDefinition::Interface(object) => &object.name,
            TypeDefinition::Union(union) => &union.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            TypeDefinition::Scalar(scalar) => scalar.description.as_deref(),
            TypeDefinition::Enum(r#enum) => r#enum.description.as_deref(),
            TypeDefinition::InputObject(input) => input.description.as_deref(),
            TypeDefinition::Object(object) | TypeDefinition::Interface(object) => {
                object.description.as_deref()
            }
            TypeDefinition::Union(union) => union.description.as_deref(),
        }
    }

    /// Short label for the kind of type
    pub fn kind(&self) -> &'static str {
        match self {
            TypeDefinition::Scalar(_) => "scalar",
            TypeDefinition::Enum(_) => "enum",
            TypeDefinition::InputObject(_) => "input",
            TypeDefinition::Object(_) => "object",
            TypeDefinition::Interface(_) => "interface",
            TypeDefinition::Union(_) => "union",
        }
    }

    /// Whether this is one of the schema's own introspection types
    pub fn is_introspection(&self) -> bool {
        self.name().starts_with("__")
    }
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<InputValue>,
}

/// An argument or input object field
#[derive(Debug, Clone)]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<String>,
}

impl InputValue {
    /// Non-null without a default, so a value must always be supplied
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValue>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: Vec<String>,
}

/// An introspected GraphQL schema
#[derive(Debug, Clone, Default)]
pub struct GraphQLSchema {
    query_type: Option<String>,
    mutation_type: Option<String>,
    types: BTreeMap<String, TypeDefinition>,
}

impl GraphQLSchema {
    pub(crate) fn new(
        query_type: Option<String>,
        mutation_type: Option<String>,
        types: impl IntoIterator<Item = TypeDefinition>,
    ) -> Self {
        Self {
            query_type,
            mutation_type,
            types: types
                .into_iter()
                .map(|definition| (definition.name().to_string(), definition))
                .collect(),
        }
    }

    /// Look up a named type
    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// All named types, ordered by name
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn input_object(&self, name: &str) -> Option<&InputObjectType> {
        match self.types.get(name) {
            Some(TypeDefinition::InputObject(input)) => Some(input),
            _ => None,
        }
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        match self.types.get(name) {
            Some(TypeDefinition::Enum(r#enum)) => Some(r#enum),
            _ => None,
        }
    }

    /// Fields of an object or interface type
    pub fn object_like(&self, name: &str) -> Option<&ObjectType> {
        match self.types.get(name) {
            Some(TypeDefinition::Object(object) | TypeDefinition::Interface(object)) => {
                Some(object)
            }
            _ => None,
        }
    }

    /// The root object type for an operation kind, if the schema defines one
    pub fn root_type(&self, operation_type: OperationType) -> Option<&ObjectType> {
        let name = match operation_type {
            OperationType::Query => self.query_type.as_deref(),
            OperationType::Mutation => self.mutation_type.as_deref(),
        }?;
        match self.types.get(name) {
            Some(TypeDefinition::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Root fields for an operation kind, skipping introspection fields
    pub fn root_fields(
        &self,
        operation_type: OperationType,
    ) -> impl Iterator<Item = &FieldDefinition> {
        self.root_type(operation_type)
            .into_iter()
            .flat_map(|root| root.fields.iter())
            .filter(|field| !field.name.starts_with("__"))
    }

    /// Find a root field by name, checking queries before mutations
    pub fn find_root_field(&self, name: &str) -> Option<(OperationType, &FieldDefinition)> {
        [OperationType::Query, OperationType::Mutation]
            .into_iter()
            .find_map(|operation_type| {
                self.root_fields(operation_type)
                    .find(|field| field.name == name)
                    .map(|field| (operation_type, field))
            })
    }
}
