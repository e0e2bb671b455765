//! Assemble executable GraphQL documents for root fields
//!
//! Not every argument of a field becomes a variable. Only required arguments
//! and those the caller supplied are declared, so an omitted optional argument
//! is absent from the document instead of being sent as an explicit `null`.

use serde_json::{Map, Value};

use crate::schema::{FieldDefinition, InputValue, OperationType};

use super::selection::SelectionNode;

const INDENT: &str = "  ";

/// A synthesized operation, ready to send upstream
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operation_type: OperationType,
    pub name: String,
    pub document: String,
    pub variables: Value,
}

/// Build the operation that invokes a single root field.
///
/// Each argument the caller supplied, plus each argument the schema requires,
/// is declared as a variable of the argument's exact type. Optional arguments
/// the caller left out are not declared, so upstream defaults still apply.
/// The caller's variables are sent as-is.
pub fn build(
    field: &FieldDefinition,
    operation_type: OperationType,
    variables: Map<String, Value>,
    selection: &[SelectionNode],
) -> Operation {
    let arguments: Vec<&InputValue> = field
        .arguments
        .iter()
        .filter(|arg| arg.is_required() || variables.contains_key(&arg.name))
        .collect();

    let name = operation_name(&field.name);
    let mut document = format!("{operation_type} {name}");
    if !arguments.is_empty() {
        let declarations = arguments
            .iter()
            .map(|arg| format!("${}: {}", arg.name, arg.ty))
            .collect::<Vec<_>>()
            .join(", ");
        document.push_str(&format!("({declarations})"));
    }
    document.push_str(" {\n");

    document.push_str(INDENT);
    document.push_str(&field.name);
    if !arguments.is_empty() {
        let invocation = arguments
            .iter()
            .map(|arg| format!("{0}: ${0}", arg.name))
            .collect::<Vec<_>>()
            .join(", ");
        document.push_str(&format!("({invocation})"));
    }
    render_selection(&mut document, selection, 1);
    document.push_str("\n}");

    Operation {
        operation_type,
        name,
        document,
        variables: Value::Object(variables),
    }
}

/// Append ` { ... }` for a non-empty selection at the given nesting level
fn render_selection(document: &mut String, selection: &[SelectionNode], level: usize) {
    if selection.is_empty() {
        return;
    }

    document.push_str(" {\n");
    for node in selection {
        document.push_str(&INDENT.repeat(level + 1));
        document.push_str(&node.name);
        if let Some(children) = &node.children {
            render_selection(document, children, level + 1);
        }
        document.push('\n');
    }
    document.push_str(&INDENT.repeat(level));
    document.push('}');
}

fn operation_name(field_name: &str) -> String {
    let mut chars = field_name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
