//! Resource schemas
//!
//! A [`Schema`] is the root of the schema tree: named attributes and named
//! blocks, plus a version used for state upgrades. It resolves [`Path`]s to
//! the attribute, block or type they address and runs the static schema
//! checks.

use crate::attribute::{Attribute, NestedAttributeObject};
use crate::attribute_type::AttributeType;
use crate::block::{Block, NestedBlockObject};
use crate::diagnostics::Diagnostics;
use crate::error::PathStepError;
use crate::path::{Path, PathStep};
use crate::validation;
use std::collections::BTreeMap;

/// Schema is returned by resources. Version is used for state migration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub attributes: BTreeMap<String, Attribute>,
    pub blocks: BTreeMap<String, Block>,
    pub version: i64,
    pub description: String,
    pub markdown_description: String,
    pub deprecation_message: String,
}

/// A node reached while walking a path through a schema
#[derive(Debug, Clone)]
pub enum SchemaNode<'a> {
    Schema(&'a Schema),
    Attribute(&'a Attribute),
    Block(&'a Block),
    NestedAttributeObject(&'a NestedAttributeObject),
    NestedBlockObject(&'a NestedBlockObject),
    /// Below a plain attribute only the type is known
    Type(AttributeType),
}

impl<'a> SchemaNode<'a> {
    pub fn apply_path_step(&self, step: &PathStep) -> Result<SchemaNode<'a>, PathStepError> {
        match self {
            SchemaNode::Schema(schema) => schema.apply_path_step(step),
            SchemaNode::Attribute(attribute) => attribute.apply_path_step(step),
            SchemaNode::Block(block) => block.apply_path_step(step),
            SchemaNode::NestedAttributeObject(nested) => nested.apply_path_step(step),
            SchemaNode::NestedBlockObject(nested) => nested.apply_path_step(step),
            SchemaNode::Type(ty) => ty.apply_path_step(step).map(SchemaNode::Type),
        }
    }

    /// Type of the value found at this node.
    pub fn get_type(&self) -> AttributeType {
        match self {
            SchemaNode::Schema(schema) => schema.get_type(),
            SchemaNode::Attribute(attribute) => attribute.get_type(),
            SchemaNode::Block(block) => block.get_type(),
            SchemaNode::NestedAttributeObject(nested) => nested.object_type(),
            SchemaNode::NestedBlockObject(nested) => nested.object_type(),
            SchemaNode::Type(ty) => ty.clone(),
        }
    }

    pub fn kind_name(&self) -> String {
        match self {
            SchemaNode::Schema(_) => "Schema".to_string(),
            SchemaNode::Attribute(attribute) => attribute.kind_name().to_string(),
            SchemaNode::Block(block) => block.kind_name().to_string(),
            SchemaNode::NestedAttributeObject(_) => "NestedAttributeObject".to_string(),
            SchemaNode::NestedBlockObject(_) => "NestedBlockObject".to_string(),
            SchemaNode::Type(ty) => ty.type_name().to_string(),
        }
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn get_attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    pub fn get_blocks(&self) -> &BTreeMap<String, Block> {
        &self.blocks
    }

    pub fn get_version(&self) -> i64 {
        self.version
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_markdown_description(&self) -> &str {
        &self.markdown_description
    }

    pub fn get_deprecation_message(&self) -> &str {
        &self.deprecation_message
    }

    /// Object type of the whole resource, attributes and blocks together.
    pub fn get_type(&self) -> AttributeType {
        let attributes = self
            .attributes
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.get_type()));
        let blocks = self
            .blocks
            .iter()
            .map(|(name, block)| (name.clone(), block.get_type()));
        AttributeType::Object(attributes.chain(blocks).collect())
    }

    pub fn apply_path_step(&self, step: &PathStep) -> Result<SchemaNode<'_>, PathStepError> {
        let PathStep::AttributeName(name) = step else {
            return Err(PathStepError::CannotApply {
                step: step.kind(),
                target: "schema".to_string(),
            });
        };
        if let Some(attribute) = self.attributes.get(name) {
            return Ok(SchemaNode::Attribute(attribute));
        }
        if let Some(block) = self.blocks.get(name) {
            return Ok(SchemaNode::Block(block));
        }
        Err(PathStepError::NoSuchAttribute {
            name: name.clone(),
            target: "schema".to_string(),
        })
    }

    /// Walks `path` from the root. On failure the error names the steps that
    /// could not be applied, starting with the failing one.
    pub fn resolve_path(&self, path: &Path) -> Result<SchemaNode<'_>, PathStepError> {
        let steps = path.steps();
        let mut node = SchemaNode::Schema(self);
        for (idx, step) in steps.iter().enumerate() {
            node = node
                .apply_path_step(step)
                .map_err(|source| PathStepError::Remaining {
                    remaining: steps[idx..]
                        .iter()
                        .map(PathStep::describe)
                        .collect::<Vec<_>>()
                        .join("."),
                    source: Box::new(source),
                })?;
        }
        Ok(node)
    }

    /// Attribute at `path`. A path ending on a block fails with
    /// [`PathStepError::PathIsBlock`] so callers can tell the two apart.
    pub fn lookup_attribute(&self, path: &Path) -> Result<&Attribute, PathStepError> {
        match self.resolve_path(path)? {
            SchemaNode::Attribute(attribute) => Ok(attribute),
            SchemaNode::Block(_) => Err(PathStepError::PathIsBlock),
            other => Err(PathStepError::UnexpectedNode {
                kind: other.kind_name(),
            }),
        }
    }

    /// Like [`Schema::lookup_attribute`], reporting failures as an
    /// "Invalid Schema Path" diagnostic.
    pub fn attribute_at_path(&self, path: &Path) -> Result<&Attribute, Diagnostics> {
        self.lookup_attribute(path).map_err(|err| {
            let mut diagnostics = Diagnostics::new();
            diagnostics.add_attribute_error(
                path.clone(),
                "Invalid Schema Path",
                format!(
                    "When attempting to get the framework attribute associated with a schema path, \
                     an unexpected error was returned. This is always an issue with the provider. \
                     Please report this to the provider developers.\n\nPath: {}\nOriginal Error: {}",
                    path, err
                ),
            );
            diagnostics
        })
    }

    /// Type of the value at `path`. Blocks resolve to their list, set or
    /// object type and the empty path to the schema's own object type.
    pub fn type_at_path(&self, path: &Path) -> Result<AttributeType, Diagnostics> {
        match self.resolve_path(path) {
            Ok(node) => Ok(node.get_type()),
            Err(err) => {
                let mut diagnostics = Diagnostics::new();
                diagnostics.add_attribute_error(
                    path.clone(),
                    "Invalid Schema Path",
                    format!(
                        "When attempting to get the framework type associated with a schema path, \
                         an unexpected error was returned. This is always an issue with the provider. \
                         Please report this to the provider developers.\n\nPath: {}\nOriginal Error: {}",
                        path, err
                    ),
                );
                Err(diagnostics)
            }
        }
    }

    /// Field-name, reserved-name and default-without-computed checks over
    /// the whole tree, one diagnostic per offending node.
    pub fn validate(&self) -> Diagnostics {
        validation::validate_schema(self)
    }

    /// Per-kind definition checks over the whole tree.
    pub fn validate_implementation(&self) -> Diagnostics {
        validation::validate_schema_implementation(self)
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema::default(),
        }
    }

    /// Set schema version
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.schema.attributes.insert(name.into(), attribute);
        self
    }

    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.schema.blocks.insert(name.into(), block);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = description.into();
        self
    }

    pub fn markdown_description(mut self, description: impl Into<String>) -> Self {
        self.schema.markdown_description = description.into();
        self
    }

    pub fn deprecation_message(mut self, message: impl Into<String>) -> Self {
        self.schema.deprecation_message = message.into();
        self
    }

    /// Finalize the schema
    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::NestedBlockObject;
    use crate::types::Value;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::builder()
            .version(1)
            .description("Test resource schema")
            .attribute("id", Attribute::string().computed())
            .attribute("tags", Attribute::map(AttributeType::String).optional())
            .attribute(
                "disks",
                Attribute::list_nested(NestedAttributeObject::new([
                    ("size", Attribute::int64().required()),
                ]))
                .optional(),
            )
            .block(
                "network",
                Block::set(NestedBlockObject::new().attribute("bridge", Attribute::string().required())),
            )
            .build()
    }

    #[test]
    fn schema_builder_creates_schema_with_attributes() {
        let schema = schema();
        assert_eq!(schema.get_version(), 1);
        assert_eq!(schema.get_attributes().len(), 3);
        assert_eq!(schema.get_blocks().len(), 1);
        assert_eq!(schema.get_description(), "Test resource schema");
    }

    #[test]
    fn schema_type_includes_blocks() {
        let ty = schema().get_type();
        assert_eq!(
            ty.attribute_types().and_then(|attrs| attrs.get("network")).cloned(),
            Some(AttributeType::set(AttributeType::object([(
                "bridge",
                AttributeType::String
            )])))
        );
    }

    #[test]
    fn attribute_at_nested_path() {
        let schema = schema();
        let attribute = schema
            .attribute_at_path(&Path::root("disks").at_list_index(0).at_name("size"))
            .unwrap();
        assert!(attribute.is_required());

        let bridge = schema
            .attribute_at_path(
                &Path::root("network")
                    .at_set_value(Value::object_from([("bridge", Value::string("vmbr0"))]))
                    .at_name("bridge"),
            )
            .unwrap();
        assert_eq!(bridge.get_type(), AttributeType::String);
    }

    #[test]
    fn attribute_at_block_path_fails_distinctly() {
        let schema = schema();
        assert_eq!(
            schema.lookup_attribute(&Path::root("network")).unwrap_err(),
            PathStepError::PathIsBlock
        );
        let diagnostics = schema.attribute_at_path(&Path::root("network")).unwrap_err();
        assert_eq!(
            diagnostics.as_slice()[0].detail,
            "When attempting to get the framework attribute associated with a schema path, \
             an unexpected error was returned. This is always an issue with the provider. \
             Please report this to the provider developers.\n\nPath: network\n\
             Original Error: path leads to block, not an attribute"
        );
    }

    #[test]
    fn attribute_at_invalid_path_reports_remaining_steps() {
        let schema = schema();
        let err = schema
            .lookup_attribute(&Path::root("tags").at_list_index(0))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "ElementKeyInt(0) still remains in the path: cannot apply step ElementKeyInt to MapType"
        );

        let err = schema
            .lookup_attribute(&Path::root("missing").at_name("x"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "AttributeName(\"missing\").AttributeName(\"x\") still remains in the path: \
             no attribute or block \"missing\" on schema"
        );
    }

    #[test]
    fn attribute_at_path_rejects_non_attribute_nodes() {
        let schema = schema();
        assert_eq!(
            schema.lookup_attribute(&Path::empty()).unwrap_err(),
            PathStepError::UnexpectedNode {
                kind: "Schema".to_string()
            }
        );
        assert_eq!(
            schema
                .lookup_attribute(&Path::root("tags").at_map_key("env"))
                .unwrap_err()
                .to_string(),
            "got unexpected type StringType"
        );
    }

    #[test]
    fn type_at_path() {
        let schema = schema();
        assert_eq!(
            schema.type_at_path(&Path::root("tags").at_map_key("env")).unwrap(),
            AttributeType::String
        );
        assert_eq!(
            schema.type_at_path(&Path::root("disks").at_list_index(2)).unwrap(),
            AttributeType::object([("size", AttributeType::Int64)])
        );
        assert_eq!(
            schema.type_at_path(&Path::root("network")).unwrap(),
            AttributeType::set(AttributeType::object([("bridge", AttributeType::String)]))
        );
        assert!(schema.type_at_path(&Path::root("nope")).is_err());
    }

    #[test]
    fn type_at_path_on_empty_schema() {
        let schema = Schema::default();
        assert_eq!(
            schema.type_at_path(&Path::empty()).unwrap(),
            AttributeType::Object(BTreeMap::new())
        );
    }
}
