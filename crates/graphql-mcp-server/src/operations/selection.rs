//! Synthesize bounded field selections for GraphQL output types

use crate::schema::{FieldDefinition, GraphQLSchema, ObjectType, TypeDefinition};

/// How many levels of nested object fields are selected
pub const MAX_DEPTH: usize = 3;

/// A selected field. Leaves have no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionNode {
    pub name: String,
    pub children: Option<Vec<SelectionNode>>,
}

impl SelectionNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: None,
        }
    }

    pub fn branch(name: impl Into<String>, children: Vec<SelectionNode>) -> Self {
        Self {
            name: name.into(),
            children: Some(children),
        }
    }
}

pub struct SelectionSynthesizer<'a> {
    schema: &'a GraphQLSchema,
    max_depth: usize,
}

impl<'a> SelectionSynthesizer<'a> {
    pub fn new(schema: &'a GraphQLSchema) -> Self {
        Self {
            schema,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Select every field of an object type that can be fetched without arguments.
    ///
    /// Interior nodes always have at least one child. Object fields below the
    /// depth limit are dropped rather than selected with empty braces.
    pub fn build(&self, object: &ObjectType) -> Vec<SelectionNode> {
        self.build_at(object, 1)
    }

    /// The selection for a root field's return type.
    ///
    /// Scalar and enum results need no selection. Composite results that have
    /// nothing selectable fall back to `__typename` to keep the document valid.
    pub fn for_field(&self, field: &FieldDefinition) -> Vec<SelectionNode> {
        match self.schema.type_definition(field.ty.named_type()) {
            Some(TypeDefinition::Object(object) | TypeDefinition::Interface(object)) => {
                let selection = self.build(object);
                if selection.is_empty() {
                    vec![SelectionNode::leaf("__typename")]
                } else {
                    selection
                }
            }
            Some(TypeDefinition::Union(_)) => vec![SelectionNode::leaf("__typename")],
            _ => Vec::new(),
        }
    }

    fn build_at(&self, object: &ObjectType, depth: usize) -> Vec<SelectionNode> {
        object
            .fields
            .iter()
            .filter(|field| !field.name.starts_with("__"))
            .filter(|field| !field.arguments.iter().any(|arg| arg.is_required()))
            .filter_map(|field| self.node(field, depth))
            .collect()
    }

    fn node(&self, field: &FieldDefinition, depth: usize) -> Option<SelectionNode> {
        match self.schema.type_definition(field.ty.named_type()) {
            Some(TypeDefinition::Scalar(_) | TypeDefinition::Enum(_)) | None => {
                Some(SelectionNode::leaf(&field.name))
            }
            Some(TypeDefinition::Object(object) | TypeDefinition::Interface(object))
                if depth < self.max_depth =>
            {
                let children = self.build_at(object, depth + 1);
                (!children.is_empty()).then(|| SelectionNode::branch(&field.name, children))
            }
            // Unions need fragments and input types never appear as outputs
            Some(
                TypeDefinition::Object(_)
                | TypeDefinition::Interface(_)
                | TypeDefinition::Union(_)
                | TypeDefinition::InputObject(_),
            ) => None,
        }
    }
}
