//! Describe a single input object or enum type, one level deep

use rmcp::model::{CallToolResult, Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ToolError;
use crate::schema::{EnumType, GraphQLSchema, InputObjectType};
use crate::schema_from_type;

use super::json_output;

pub const LOOKUP_INPUT_TYPE_TOOL_NAME: &str = "lookupInputType";
pub const LOOKUP_WHERE_INPUT_TOOL_NAME: &str = "lookupWhereInput";
pub const LOOKUP_ENUM_VALUES_TOOL_NAME: &str = "lookupEnumValues";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InputField<'a> {
    name: &'a str,
    /// Display form without non-null markers
    #[serde(rename = "type")]
    ty: String,
    required: bool,
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_value: Option<&'a str>,
}

#[derive(Serialize)]
struct InputTypeDescription<'a> {
    name: &'a str,
    description: Option<&'a str>,
    fields: Vec<InputField<'a>>,
}

impl<'a> From<&'a InputObjectType> for InputTypeDescription<'a> {
    fn from(input: &'a InputObjectType) -> Self {
        Self {
            name: &input.name,
            description: input.description.as_deref(),
            fields: input
                .fields
                .iter()
                .map(|field| InputField {
                    name: &field.name,
                    ty: field.ty.simplified(),
                    required: field.is_required(),
                    description: field.description.as_deref(),
                    default_value: field.default_value.as_deref(),
                })
                .collect(),
        }
    }
}

fn describe_input_type(
    schema: &GraphQLSchema,
    type_name: &str,
) -> Result<CallToolResult, ToolError> {
    let input = schema
        .input_object(type_name)
        .ok_or_else(|| ToolError::not_found("Input type", type_name))?;
    json_output(&InputTypeDescription::from(input))
}

/// Input for the input type lookup tools
#[derive(JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// The exact name of a GraphQL input type, e.g. `OrderCreateInput`
    type_name: String,
}

/// Describes the fields of any input object type
#[derive(Clone)]
pub struct LookupInputType {
    pub tool: Tool,
}

impl Default for LookupInputType {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupInputType {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                LOOKUP_INPUT_TYPE_TOOL_NAME,
                "Show the fields of a GraphQL input type, with each field's type and whether it is required. Call again for nested input types named in the field types.",
                schema_from_type!(Input),
            ),
        }
    }

    pub fn execute(
        &self,
        schema: &GraphQLSchema,
        input: Input,
    ) -> Result<CallToolResult, ToolError> {
        describe_input_type(schema, &input.type_name)
    }
}

/// Describes filter input types such as `OrderWhereInput`
#[derive(Clone)]
pub struct LookupWhereInput {
    pub tool: Tool,
}

impl Default for LookupWhereInput {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupWhereInput {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                LOOKUP_WHERE_INPUT_TOOL_NAME,
                "Show the filter fields of a GraphQL where input type (e.g. OrderWhereInput) used by the `where` argument of queries",
                schema_from_type!(Input),
            ),
        }
    }

    pub fn execute(
        &self,
        schema: &GraphQLSchema,
        input: Input,
    ) -> Result<CallToolResult, ToolError> {
        describe_input_type(schema, &input.type_name)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnumValueDescription<'a> {
    name: &'a str,
    value: &'a str,
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deprecation_reason: Option<&'a str>,
}

#[derive(Serialize)]
struct EnumDescription<'a> {
    name: &'a str,
    description: Option<&'a str>,
    values: Vec<EnumValueDescription<'a>>,
}

impl<'a> From<&'a EnumType> for EnumDescription<'a> {
    fn from(r#enum: &'a EnumType) -> Self {
        Self {
            name: &r#enum.name,
            description: r#enum.description.as_deref(),
            values: r#enum
                .values
                .iter()
                .map(|value| EnumValueDescription {
                    name: &value.name,
                    // Enum values serialize as their name
                    value: &value.name,
                    description: value.description.as_deref(),
                    deprecation_reason: value.deprecation_reason.as_deref(),
                })
                .collect(),
        }
    }
}

/// Input for the lookupEnumValues tool
#[derive(JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumInput {
    /// The exact name of a GraphQL enum type, e.g. `OrderStatusType`
    enum_name: String,
}

/// Lists the allowed values of an enum type
#[derive(Clone)]
pub struct LookupEnumValues {
    pub tool: Tool,
}

impl Default for LookupEnumValues {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupEnumValues {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                LOOKUP_ENUM_VALUES_TOOL_NAME,
                "List the allowed values of a GraphQL enum type",
                schema_from_type!(EnumInput),
            ),
        }
    }

    pub fn execute(
        &self,
        schema: &GraphQLSchema,
        input: EnumInput,
    ) -> Result<CallToolResult, ToolError> {
        let r#enum = schema
            .enum_type(&input.enum_name)
            .ok_or_else(|| ToolError::not_found("Enum", &input.enum_name))?;
        json_output(&EnumDescription::from(r#enum))
    }
}
