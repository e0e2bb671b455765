//! Find types in the schema and the operations that touch them

use rmcp::model::{CallToolResult, Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ToolError;
use crate::schema::{FieldDefinition, GraphQLSchema, OperationType, TypeDefinition};
use crate::schema_from_type;

use super::json_output;

pub const SEARCH_MODELS_TOOL_NAME: &str = "searchModels";
pub const LIST_ALL_MODELS_TOOL_NAME: &str = "listAllModels";

/// The most matches returned by a single search
pub const MAX_RESULTS: usize = 10;

/// Suffixes stripped from type names before matching them against operation names
const TYPE_SUFFIXES: &[&str] = &[
    "WhereUniqueInput",
    "WhereInput",
    "OrderByInput",
    "CreateInput",
    "UpdateInput",
    "Input",
    "Type",
];

/// Verbs stripped from mutation names before matching them against type names
const OPERATION_PREFIXES: &[&str] = &["create", "update", "delete", "upsert"];

/// Stems shorter than this match too many operation names to be useful
const MIN_STEM_LEN: usize = 3;

#[derive(Debug, Default, Serialize)]
struct RelatedOperations<'a> {
    queries: Vec<&'a str>,
    mutations: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Model<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    description: Option<&'a str>,
    related_operations: RelatedOperations<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tip: Option<String>,
}

impl<'a> Model<'a> {
    fn new(schema: &'a GraphQLSchema, definition: &'a TypeDefinition) -> Self {
        Self {
            name: definition.name(),
            kind: None,
            description: definition.description(),
            related_operations: related_operations(schema, definition.name()),
            tip: None,
        }
    }

    fn with_kind(mut self, definition: &TypeDefinition) -> Self {
        self.kind = Some(definition.kind());
        self.tip = Some(tip(definition));
        self
    }
}

/// Best-effort match of root fields to a type: by return type, by argument
/// type, or by name stem overlap in either direction (`orders` and `OrderLineItem`)
fn related_operations<'a>(schema: &'a GraphQLSchema, type_name: &str) -> RelatedOperations<'a> {
    let stem = stem(type_name);
    let lowercase_type_name = type_name.to_lowercase();
    let is_related = |field: &FieldDefinition| {
        let field_stem = field_stem(&field.name);
        field.ty.named_type() == type_name
            || field
                .arguments
                .iter()
                .any(|arg| arg.ty.named_type() == type_name)
            || (stem.len() >= MIN_STEM_LEN && field.name.to_lowercase().contains(&stem))
            || (field_stem.len() >= MIN_STEM_LEN && lowercase_type_name.contains(&field_stem))
    };
    let names = |operation_type: OperationType| -> Vec<&'a str> {
        schema
            .root_fields(operation_type)
            .filter(|field| is_related(field))
            .map(|field| field.name.as_str())
            .collect()
    };

    RelatedOperations {
        queries: names(OperationType::Query),
        mutations: names(OperationType::Mutation),
    }
}

fn stem(type_name: &str) -> String {
    TYPE_SUFFIXES
        .iter()
        .find_map(|suffix| type_name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(type_name)
        .to_lowercase()
}

/// `updateOrderStatus` -> `orderstatus`, `lineItems` -> `lineitem`
fn field_stem(field_name: &str) -> String {
    let name = OPERATION_PREFIXES
        .iter()
        .find_map(|prefix| {
            field_name
                .strip_prefix(prefix)
                .filter(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
        })
        .unwrap_or(field_name);
    name.strip_suffix('s').unwrap_or(name).to_lowercase()
}

fn tip(definition: &TypeDefinition) -> String {
    let name = definition.name();
    match definition {
        TypeDefinition::InputObject(_) => {
            format!("Use lookupInputType('{name}') to see the fields it accepts")
        }
        TypeDefinition::Enum(_) => {
            format!("Use lookupEnumValues('{name}') to see the allowed values")
        }
        TypeDefinition::Object(_) | TypeDefinition::Interface(_) => {
            "Returned by its related operations; fields are selected automatically".to_string()
        }
        TypeDefinition::Scalar(_) => "Pass scalar values as plain JSON values".to_string(),
        TypeDefinition::Union(_) => "Union results are returned as __typename only".to_string(),
    }
}

/// Searches type names and descriptions
#[derive(Clone)]
pub struct SearchModels {
    pub tool: Tool,
}

/// Input for the searchModels tool
#[derive(JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// Case-insensitive text to find in type names and descriptions
    search_term: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput<'a> {
    search_term: &'a str,
    total_found: usize,
    models: Vec<Model<'a>>,
}

impl Default for SearchModels {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchModels {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                SEARCH_MODELS_TOOL_NAME,
                "Search the GraphQL schema for types (models, inputs, enums) whose name or description contains the search term, along with the queries and mutations related to each match",
                schema_from_type!(Input),
            ),
        }
    }

    pub fn execute(
        &self,
        schema: &GraphQLSchema,
        input: Input,
    ) -> Result<CallToolResult, ToolError> {
        let term = input.search_term.to_lowercase();
        let matches: Vec<&TypeDefinition> = schema
            .types()
            .filter(|definition| !definition.is_introspection())
            .filter(|definition| {
                definition.name().to_lowercase().contains(&term)
                    || definition
                        .description()
                        .is_some_and(|description| description.to_lowercase().contains(&term))
            })
            .collect();
        debug!(search_term = %input.search_term, found = matches.len(), "Searched models");

        json_output(&SearchOutput {
            search_term: &input.search_term,
            total_found: matches.len(),
            models: matches
                .into_iter()
                .take(MAX_RESULTS)
                .map(|definition| Model::new(schema, definition))
                .collect(),
        })
    }
}

/// Lists every type in the schema
#[derive(Clone)]
pub struct ListAllModels {
    pub tool: Tool,
}

/// Input for the listAllModels tool
#[derive(JsonSchema, Deserialize)]
pub struct ListInput {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListOutput<'a> {
    total_models: usize,
    models: Vec<Model<'a>>,
}

impl Default for ListAllModels {
    fn default() -> Self {
        Self::new()
    }
}

impl ListAllModels {
    pub fn new() -> Self {
        Self {
            tool: Tool::new(
                LIST_ALL_MODELS_TOOL_NAME,
                "List every type in the GraphQL schema, sorted by name, with its kind, related operations, and a hint on how to explore it further",
                schema_from_type!(ListInput),
            ),
        }
    }

    pub fn execute(&self, schema: &GraphQLSchema) -> Result<CallToolResult, ToolError> {
        // Types are stored ordered by name
        let models: Vec<Model> = schema
            .types()
            .filter(|definition| !definition.is_introspection())
            .map(|definition| Model::new(schema, definition).with_kind(definition))
            .collect();

        json_output(&ListOutput {
            total_models: models.len(),
            models,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::{commerce, text_output};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn search(schema: &GraphQLSchema, term: &str) -> Value {
        let input: Input = serde_json::from_value(json!({ "searchTerm": term })).unwrap();
        text_output(&SearchModels::new().execute(schema, input).unwrap())
    }

    fn model<'a>(output: &'a Value, name: &str) -> Option<&'a Value> {
        output["models"]
            .as_array()
            .unwrap()
            .iter()
            .find(|model| model["name"] == name)
    }

    #[rstest]
    fn search_matches_names_case_insensitively(commerce: GraphQLSchema) {
        let output = search(&commerce, "order");

        let order = model(&output, "Order").unwrap();
        assert_eq!(
            order["relatedOperations"],
            json!({
                "queries": ["orders", "order"],
                "mutations": ["createOrder", "updateOrderStatus"],
            })
        );
        assert_eq!(order["description"], "A customer order");

        let order_line_item = model(&output, "OrderLineItem").unwrap();
        assert_eq!(
            order_line_item["relatedOperations"],
            json!({
                "queries": ["orders", "order", "lineItems"],
                "mutations": ["createOrder"],
            })
        );

        assert!(model(&output, "LineItem").is_none());
        assert_eq!(
            output["totalFound"],
            output["models"].as_array().unwrap().len()
        );
    }

    #[rstest]
    fn search_matches_descriptions(commerce: GraphQLSchema) {
        let output = search(&commerce, "PURCHASABLE");
        assert_eq!(output["totalFound"], 1);
        assert_eq!(output["models"][0]["name"], "LineItem");
        assert_eq!(
            output["models"][0]["relatedOperations"]["queries"],
            json!(["lineItems"])
        );
    }

    #[rstest]
    fn search_results_are_capped(commerce: GraphQLSchema) {
        let output = search(&commerce, "");
        assert!(output["totalFound"].as_u64().unwrap() > MAX_RESULTS as u64);
        assert_eq!(output["models"].as_array().unwrap().len(), MAX_RESULTS);
    }

    #[rstest]
    fn search_skips_introspection_types(commerce: GraphQLSchema) {
        let output = search(&commerce, "__");
        assert_eq!(output["totalFound"], 0);
    }

    #[rstest]
    fn lists_all_models_sorted_with_kinds(commerce: GraphQLSchema) {
        let output = text_output(&ListAllModels::new().execute(&commerce).unwrap());
        let models = output["models"].as_array().unwrap();

        let names: Vec<&str> = models
            .iter()
            .map(|model| model["name"].as_str().unwrap())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(!names.iter().any(|name| name.starts_with("__")));
        assert_eq!(output["totalModels"], models.len());

        let where_input = model(&output, "OrderWhereInput").unwrap();
        assert_eq!(where_input["kind"], "input");
        assert_eq!(
            where_input["tip"],
            "Use lookupInputType('OrderWhereInput') to see the fields it accepts"
        );
        assert_eq!(
            where_input["relatedOperations"]["queries"],
            json!(["orders", "order"])
        );
        assert_eq!(model(&output, "OrderStatusType").unwrap()["kind"], "enum");
        assert_eq!(model(&output, "DateTime").unwrap()["kind"], "scalar");
        assert_eq!(model(&output, "Order").unwrap()["kind"], "object");
    }

    #[rstest]
    #[case("OrderWhereInput", "order")]
    #[case("OrderStatusType", "orderstatus")]
    #[case("Input", "input")]
    #[case("LineItem", "lineitem")]
    fn stems_strip_known_suffixes(#[case] type_name: &str, #[case] expected: &str) {
        assert_eq!(stem(type_name), expected);
    }

    #[rstest]
    #[case("orders", "order")]
    #[case("lineItems", "lineitem")]
    #[case("createOrder", "order")]
    #[case("updateOrderStatus", "orderstatus")]
    #[case("created", "created")]
    fn field_stems_strip_verbs_and_plurals(#[case] field_name: &str, #[case] expected: &str) {
        assert_eq!(field_stem(field_name), expected);
    }
}
