//! JSON schemas for config fields whose types don't derive one

use std::collections::BTreeMap;

use schemars::JsonSchema;

/// Headers are configured as a plain map of names to values
pub(super) fn header_map(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
    BTreeMap::<String, String>::json_schema(generator)
}

pub(super) fn level(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
    /// Log level
    #[derive(JsonSchema)]
    #[schemars(rename_all = "lowercase")]
    #[allow(dead_code)]
    enum Level {
        Trace,
        Debug,
        Info,
        Warn,
        Error,
    }

    Level::json_schema(generator)
}
