//! Build a [`GraphQLSchema`] from SDL text using `apollo-compiler`

use apollo_compiler::ast::{self, OperationType as AstOperationType};
use apollo_compiler::schema::{Component, ExtendedType, FieldDefinition as AstFieldDefinition};
use apollo_compiler::{Node, Schema};

use crate::errors::IntrospectionError;

use super::{
    EnumType, EnumValue, FieldDefinition, GraphQLSchema, InputObjectType, InputValue, ObjectType,
    ScalarType, TypeDefinition, TypeRef, UnionType,
};

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

impl From<&ast::Type> for TypeRef {
    fn from(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => TypeRef::Named(name.to_string()),
            ast::Type::NonNullNamed(name) => {
                TypeRef::NonNull(Box::new(TypeRef::Named(name.to_string())))
            }
            ast::Type::List(inner) => TypeRef::List(Box::new(TypeRef::from(inner.as_ref()))),
            ast::Type::NonNullList(inner) => TypeRef::NonNull(Box::new(TypeRef::List(Box::new(
                TypeRef::from(inner.as_ref()),
            )))),
        }
    }
}

fn description(description: &Option<Node<str>>) -> Option<String> {
    description.as_ref().map(|d| d.to_string())
}

fn input_value(value: &ast::InputValueDefinition) -> InputValue {
    InputValue {
        name: value.name.to_string(),
        description: description(&value.description),
        ty: TypeRef::from(&*value.ty),
        default_value: value.default_value.as_ref().map(|d| d.to_string()),
    }
}

fn fields<'a>(
    fields: impl Iterator<Item = &'a Component<AstFieldDefinition>>,
) -> Vec<FieldDefinition> {
    fields
        .map(|field| FieldDefinition {
            name: field.name.to_string(),
            description: description(&field.description),
            arguments: field.arguments.iter().map(|arg| input_value(arg)).collect(),
            ty: TypeRef::from(&field.ty),
        })
        .collect()
}

fn type_definition(extended_type: &ExtendedType) -> TypeDefinition {
    match extended_type {
        ExtendedType::Scalar(scalar) => TypeDefinition::Scalar(ScalarType {
            name: scalar.name.to_string(),
            description: description(&scalar.description),
        }),
        ExtendedType::Object(object) => TypeDefinition::Object(ObjectType {
            name: object.name.to_string(),
            description: description(&object.description),
            fields: fields(object.fields.values()),
        }),
        ExtendedType::Interface(interface) => TypeDefinition::Interface(ObjectType {
            name: interface.name.to_string(),
            description: description(&interface.description),
            fields: fields(interface.fields.values()),
        }),
        ExtendedType::Union(union) => TypeDefinition::Union(UnionType {
            name: union.name.to_string(),
            description: description(&union.description),
            possible_types: union
                .members
                .iter()
                .map(|member| member.name.to_string())
                .collect(),
        }),
        ExtendedType::Enum(r#enum) => TypeDefinition::Enum(EnumType {
            name: r#enum.name.to_string(),
            description: description(&r#enum.description),
            values: r#enum
                .values
                .values()
                .map(|value| EnumValue {
                    name: value.value.to_string(),
                    description: description(&value.description),
                    deprecation_reason: value.directives.get("deprecated").map(|deprecated| {
                        deprecated
                            .specified_argument_by_name("reason")
                            .and_then(|reason| reason.as_str())
                            .unwrap_or(DEFAULT_DEPRECATION_REASON)
                            .to_string()
                    }),
                })
                .collect(),
        }),
        ExtendedType::InputObject(input) => TypeDefinition::InputObject(InputObjectType {
            name: input.name.to_string(),
            description: description(&input.description),
            fields: input
                .fields
                .values()
                .map(|field| input_value(field))
                .collect(),
        }),
    }
}

impl GraphQLSchema {
    /// Parse and validate SDL text into a schema
    pub fn from_sdl(sdl: &str, path: &str) -> Result<Self, IntrospectionError> {
        let schema = Schema::parse_and_validate(sdl, path)
            .map_err(|errors| IntrospectionError::Sdl(errors.to_string()))?;

        Ok(GraphQLSchema::new(
            schema
                .root_operation(AstOperationType::Query)
                .map(|name| name.to_string()),
            schema
                .root_operation(AstOperationType::Mutation)
                .map(|name| name.to_string()),
            schema.types.values().map(type_definition),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OperationType;

    const SDL: &str = r#"
        type Query {
            orders(where: OrderWhereInput, take: Int! = 10): [Order!]!
        }

        type Mutation {
            cancelOrder(id: ID!): Order
        }

        "A customer order"
        type Order {
            id: ID!
            status: OrderStatusType
        }

        input OrderWhereInput {
            id: ID
            AND: [OrderWhereInput!]
        }

        enum OrderStatusType {
            pending
            legacy @deprecated(reason: "Use pending")
        }
    "#;

    #[test]
    fn converts_sdl_types() {
        let schema = GraphQLSchema::from_sdl(SDL, "schema.graphql").unwrap();

        let (operation_type, orders) = schema.find_root_field("orders").unwrap();
        assert_eq!(operation_type, OperationType::Query);
        assert_eq!(orders.ty.to_string(), "[Order!]!");

        let take = orders.arguments.iter().find(|arg| arg.name == "take").unwrap();
        assert_eq!(take.ty.to_string(), "Int!");
        assert_eq!(take.default_value.as_deref(), Some("10"));
        assert!(!take.is_required());

        let and = &schema.input_object("OrderWhereInput").unwrap().fields;
        assert_eq!(and.last().unwrap().ty.to_string(), "[OrderWhereInput!]");

        let status = schema.enum_type("OrderStatusType").unwrap();
        assert_eq!(
            status.values.last().unwrap().deprecation_reason.as_deref(),
            Some("Use pending")
        );

        assert!(matches!(
            schema.find_root_field("cancelOrder"),
            Some((OperationType::Mutation, _))
        ));
    }

    #[test]
    fn rejects_invalid_sdl() {
        let result = GraphQLSchema::from_sdl("type Query { order: Missing }", "schema.graphql");
        assert!(matches!(result, Err(IntrospectionError::Sdl(_))));
    }
}
