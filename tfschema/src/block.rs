//! Schema blocks
//!
//! Blocks are structural groupings written in configuration as nested
//! `name { ... }` sections. A block never has Required/Optional/Computed
//! flags and never has a default; its value is an object (single block) or a
//! list or set of objects.

use crate::attribute::{descriptions_equal, Attribute};
use crate::attribute_type::AttributeType;
use crate::diagnostics::Diagnostics;
use crate::error::PathStepError;
use crate::path::PathStep;
use crate::plan_modifier::PlanModifier;
use crate::schema::SchemaNode;
use crate::validation::{self, ValidateImplementationRequest};
use crate::validator::Validator;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Block nesting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    List,
    Set,
    Single,
}

impl BlockKind {
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::List => "ListNestedBlock",
            BlockKind::Set => "SetNestedBlock",
            BlockKind::Single => "SingleNestedBlock",
        }
    }
}

/// Block represents a nested configuration block
#[derive(Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub nested_object: NestedBlockObject,
    pub description: String,
    pub markdown_description: String,
    pub deprecation_message: String,
    /// Overrides the list or set type derived from the nested object
    pub custom_type: Option<AttributeType>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub validators: Vec<Arc<dyn Validator>>,
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("kind", &self.kind)
            .field("nested_object", &self.nested_object)
            .field("description", &self.description)
            .field("deprecation_message", &self.deprecation_message)
            .field("custom_type", &self.custom_type)
            .field(
                "plan_modifiers",
                &format!("{} plan modifiers", self.plan_modifiers.len()),
            )
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .finish()
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.nested_object == other.nested_object
            && self.description == other.description
            && self.markdown_description == other.markdown_description
            && self.deprecation_message == other.deprecation_message
            && self.custom_type == other.custom_type
            && descriptions_equal(&self.plan_modifiers, &other.plan_modifiers, |m| {
                m.description()
            })
            && descriptions_equal(&self.validators, &other.validators, |v| v.description())
    }
}

impl Block {
    pub fn new(kind: BlockKind, nested_object: NestedBlockObject) -> Self {
        Self {
            kind,
            nested_object,
            description: String::new(),
            markdown_description: String::new(),
            deprecation_message: String::new(),
            custom_type: None,
            plan_modifiers: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn list(nested_object: NestedBlockObject) -> Self {
        Self::new(BlockKind::List, nested_object)
    }

    pub fn set(nested_object: NestedBlockObject) -> Self {
        Self::new(BlockKind::Set, nested_object)
    }

    pub fn single(nested_object: NestedBlockObject) -> Self {
        Self::new(BlockKind::Single, nested_object)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn markdown_description(mut self, description: impl Into<String>) -> Self {
        self.markdown_description = description.into();
        self
    }

    pub fn deprecation_message(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = message.into();
        self
    }

    pub fn custom_type(mut self, ty: AttributeType) -> Self {
        self.custom_type = Some(ty);
        self
    }

    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.plan_modifiers.push(Arc::new(modifier));
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
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

    pub fn get_nested_object(&self) -> &NestedBlockObject {
        &self.nested_object
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn get_type(&self) -> AttributeType {
        if let Some(custom) = &self.custom_type {
            return custom.clone();
        }
        let object = self.nested_object.object_type();
        match self.kind {
            BlockKind::List => AttributeType::list(object),
            BlockKind::Set => AttributeType::set(object),
            BlockKind::Single => object,
        }
    }

    pub fn apply_path_step(&self, step: &PathStep) -> Result<SchemaNode<'_>, PathStepError> {
        match (self.kind, step) {
            (BlockKind::List, PathStep::ElementKeyInt(_))
            | (BlockKind::Set, PathStep::ElementKeyValue(_)) => {
                Ok(SchemaNode::NestedBlockObject(&self.nested_object))
            }
            (BlockKind::Single, PathStep::AttributeName(name)) => {
                self.nested_object.child(name).ok_or_else(|| {
                    PathStepError::NoSuchAttribute {
                        name: name.clone(),
                        target: self.kind_name().to_string(),
                    }
                })
            }
            _ => Err(PathStepError::CannotApply {
                step: step.kind(),
                target: self.kind_name().to_string(),
            }),
        }
    }

    /// Static checks of this block's definition. See
    /// [`validation::validate_block_implementation`].
    pub fn validate_implementation(
        &self,
        request: &ValidateImplementationRequest,
        diagnostics: &mut Diagnostics,
    ) {
        validation::validate_block_implementation(self, request, diagnostics);
    }
}

/// Attributes and blocks of one block element
#[derive(Clone, Default)]
pub struct NestedBlockObject {
    pub attributes: BTreeMap<String, Attribute>,
    pub blocks: BTreeMap<String, Block>,
    pub custom_type: Option<AttributeType>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub validators: Vec<Arc<dyn Validator>>,
}

impl fmt::Debug for NestedBlockObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedBlockObject")
            .field("attributes", &self.attributes)
            .field("blocks", &self.blocks)
            .field("custom_type", &self.custom_type)
            .finish_non_exhaustive()
    }
}

impl PartialEq for NestedBlockObject {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.blocks == other.blocks
            && self.custom_type == other.custom_type
            && descriptions_equal(&self.plan_modifiers, &other.plan_modifiers, |m| {
                m.description()
            })
            && descriptions_equal(&self.validators, &other.validators, |v| v.description())
    }
}

impl NestedBlockObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    pub fn custom_type(mut self, ty: AttributeType) -> Self {
        self.custom_type = Some(ty);
        self
    }

    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.plan_modifiers.push(Arc::new(modifier));
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Object type of one block element, attributes and blocks together.
    pub fn object_type(&self) -> AttributeType {
        if let Some(custom) = &self.custom_type {
            return custom.clone();
        }
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

    fn child(&self, name: &str) -> Option<SchemaNode<'_>> {
        self.attributes
            .get(name)
            .map(SchemaNode::Attribute)
            .or_else(|| self.blocks.get(name).map(SchemaNode::Block))
    }

    pub fn apply_path_step(&self, step: &PathStep) -> Result<SchemaNode<'_>, PathStepError> {
        match step {
            PathStep::AttributeName(name) => {
                self.child(name)
                    .ok_or_else(|| PathStepError::NoSuchAttribute {
                        name: name.clone(),
                        target: "NestedBlockObject".to_string(),
                    })
            }
            _ => Err(PathStepError::CannotApply {
                step: step.kind(),
                target: "NestedBlockObject".to_string(),
            }),
        }
    }
}
