//! Expose a GraphQL API to AI agents as MCP tools
//!
//! Every query and mutation of the upstream schema becomes a tool whose input
//! schema is projected from the field's arguments. Calling a tool synthesizes
//! a GraphQL document with a bounded selection set and executes it against the
//! upstream endpoint. Five discovery tools let an agent explore input types and
//! enums on demand.

pub mod credential;
pub mod discovery;
pub mod errors;
pub mod graphql;
pub mod health;
pub mod json_schema;
pub mod operations;
pub mod registry;
pub mod schema;
pub mod schema_cache;
pub mod server;
pub mod server_handler;
