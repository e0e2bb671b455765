//! MCP tools that let an agent explore the schema one type at a time

pub mod lookup;
pub mod search;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ToolError;
use crate::schema::GraphQLSchema;

use lookup::{LookupEnumValues, LookupInputType, LookupWhereInput};
use search::{ListAllModels, SearchModels};

/// The fixed set of discovery tools, advertised ahead of the schema's operations
#[derive(Clone)]
pub struct Discovery {
    search_models: SearchModels,
    list_all_models: ListAllModels,
    lookup_input_type: LookupInputType,
    lookup_where_input: LookupWhereInput,
    lookup_enum_values: LookupEnumValues,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Discovery {
    pub fn new() -> Self {
        Self {
            search_models: SearchModels::new(),
            list_all_models: ListAllModels::new(),
            lookup_input_type: LookupInputType::new(),
            lookup_where_input: LookupWhereInput::new(),
            lookup_enum_values: LookupEnumValues::new(),
        }
    }

    pub fn tools(&self) -> Vec<Tool> {
        vec![
            self.search_models.tool.clone(),
            self.list_all_models.tool.clone(),
            self.lookup_input_type.tool.clone(),
            self.lookup_where_input.tool.clone(),
            self.lookup_enum_values.tool.clone(),
        ]
    }

    /// Run a discovery tool, or return `None` if `name` is not one
    pub fn call(
        &self,
        name: &str,
        schema: &GraphQLSchema,
        arguments: Option<JsonObject>,
    ) -> Option<Result<CallToolResult, ToolError>> {
        let result = match name {
            search::SEARCH_MODELS_TOOL_NAME => convert_arguments(arguments)
                .and_then(|input| self.search_models.execute(schema, input)),
            search::LIST_ALL_MODELS_TOOL_NAME => self.list_all_models.execute(schema),
            lookup::LOOKUP_INPUT_TYPE_TOOL_NAME => convert_arguments(arguments)
                .and_then(|input| self.lookup_input_type.execute(schema, input)),
            lookup::LOOKUP_WHERE_INPUT_TOOL_NAME => convert_arguments(arguments)
                .and_then(|input| self.lookup_where_input.execute(schema, input)),
            lookup::LOOKUP_ENUM_VALUES_TOOL_NAME => convert_arguments(arguments)
                .and_then(|input| self.lookup_enum_values.execute(schema, input)),
            _ => return None,
        };
        Some(result)
    }
}

fn convert_arguments<T: DeserializeOwned>(arguments: Option<JsonObject>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Discovery results are returned as a single pretty-printed JSON text block
fn json_output(output: &impl Serialize) -> Result<CallToolResult, ToolError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(output)?,
    )]))
}
