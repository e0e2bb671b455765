//! The tool list and `tools/call` dispatch shared by every transport

use std::collections::HashSet;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::discovery::Discovery;
use crate::errors::{IntrospectionError, ToolError};
use crate::graphql::{self, GraphQLClient};
use crate::json_schema::TypeProjector;
use crate::operations::{self, SelectionSynthesizer};
use crate::schema::{FieldDefinition, GraphQLSchema, OperationType};
use crate::schema_cache::SchemaCache;

#[derive(Clone)]
pub struct ToolRegistry {
    cache: Arc<SchemaCache>,
    client: GraphQLClient,
    discovery: Discovery,
}

impl ToolRegistry {
    pub fn new(cache: Arc<SchemaCache>, client: GraphQLClient) -> Self {
        Self {
            cache,
            client,
            discovery: Discovery::new(),
        }
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// The schema for the configured endpoint, from cache when fresh
    pub async fn schema(
        &self,
        credential: Option<&Credential>,
    ) -> Result<Arc<GraphQLSchema>, IntrospectionError> {
        self.cache.get(self.client.endpoint(), credential).await
    }

    /// Discovery tools first, then one tool per query field, then one per mutation field.
    ///
    /// A name is listed once; discovery tools shadow root fields and queries
    /// shadow mutations, matching how calls are dispatched.
    pub async fn list_tools(
        &self,
        credential: Option<&Credential>,
    ) -> Result<Vec<Tool>, IntrospectionError> {
        let schema = self.schema(credential).await?;
        let projector = TypeProjector::new(&schema);

        let mut tools = self.discovery.tools();
        let mut seen: HashSet<String> = tools.iter().map(|tool| tool.name.to_string()).collect();
        for operation_type in [OperationType::Query, OperationType::Mutation] {
            for field in schema.root_fields(operation_type) {
                if seen.insert(field.name.clone()) {
                    tools.push(operation_tool(&projector, operation_type, field));
                } else {
                    debug!(name = %field.name, "Skipping shadowed {operation_type} tool");
                }
            }
        }
        Ok(tools)
    }

    /// Call a tool by name.
    ///
    /// Never fails: errors are reported to the caller as error content.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        credential: Option<&Credential>,
    ) -> CallToolResult {
        match self.dispatch(name, arguments, credential).await {
            Ok(result) => result,
            Err(error) => {
                warn!(tool = %name, %error, "Tool call failed");
                CallToolResult::error(vec![Content::text(format!(
                    "Error executing {name}: {error}"
                ))])
            }
        }
    }

    async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        credential: Option<&Credential>,
    ) -> Result<CallToolResult, ToolError> {
        let schema = self.schema(credential).await?;

        if let Some(result) = self.discovery.call(name, &schema, arguments.clone()) {
            return result;
        }

        let (operation_type, field) = schema
            .find_root_field(name)
            .ok_or_else(|| ToolError::not_found("Tool", name))?;
        let selection = SelectionSynthesizer::new(&schema).for_field(field);
        let operation = operations::build(
            field,
            operation_type,
            arguments.unwrap_or_default(),
            &selection,
        );
        debug!(
            tool = %name,
            variables = %operation.variables,
            "Synthesized {operation_type}:\n{}",
            operation.document
        );

        let response = self
            .client
            .execute(graphql::Request {
                document: &operation.document,
                variables: &operation.variables,
                credential,
            })
            .await?;

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response)?,
        )]))
    }
}

fn operation_tool(
    projector: &TypeProjector<'_>,
    operation_type: OperationType,
    field: &FieldDefinition,
) -> Tool {
    let summary = format!("GraphQL {operation_type} `{}` returning {}", field.name, field.ty);
    let description = match &field.description {
        Some(description) => format!("{description}\n\n{summary}"),
        None => summary,
    };
    Tool::new(
        field.name.clone(),
        description,
        projector.arguments(&field.arguments),
    )
}
