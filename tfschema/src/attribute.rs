//! Schema attributes
//!
//! An [`Attribute`] is a named schema leaf (scalar, collection or object
//! attribute) or branch (nested attribute). The closed set of variants is
//! [`AttributeKind`]; every capability that differs per variant is a match
//! over it.

use crate::attribute_type::AttributeType;
use crate::defaults::{self, DefaultRequest, DefaultResponse};
use crate::diagnostics::Diagnostics;
use crate::error::PathStepError;
use crate::path::{Path, PathStep};
use crate::plan_modifier::PlanModifier;
use crate::schema::SchemaNode;
use crate::types::Value;
use crate::validation::{self, ValidateImplementationRequest};
use crate::validator::Validator;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Variant of an [`Attribute`]
#[derive(Clone, PartialEq)]
pub enum AttributeKind {
    Bool,
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Number,
    Dynamic,
    /// `element_type` may only be omitted when the attribute has a custom type
    List { element_type: Option<AttributeType> },
    Set { element_type: Option<AttributeType> },
    Map { element_type: Option<AttributeType> },
    /// `attribute_types` may only be omitted when the attribute has a custom type
    Object {
        attribute_types: Option<BTreeMap<String, AttributeType>>,
    },
    ListNested(NestedAttributeObject),
    SetNested(NestedAttributeObject),
    MapNested(NestedAttributeObject),
    SingleNested(NestedAttributeObject),
}

impl fmt::Debug for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::List { element_type }
            | AttributeKind::Set { element_type }
            | AttributeKind::Map { element_type } => {
                write!(f, "{}({:?})", self.name(), element_type)
            }
            AttributeKind::Object { attribute_types } => {
                write!(f, "{}({:?})", self.name(), attribute_types)
            }
            AttributeKind::ListNested(nested)
            | AttributeKind::SetNested(nested)
            | AttributeKind::MapNested(nested)
            | AttributeKind::SingleNested(nested) => {
                write!(f, "{}({:?})", self.name(), nested)
            }
            _ => f.write_str(self.name()),
        }
    }
}

impl AttributeKind {
    /// Name used in path step errors, e.g. `ListNestedAttribute`
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::Bool => "BoolAttribute",
            AttributeKind::String => "StringAttribute",
            AttributeKind::Int32 => "Int32Attribute",
            AttributeKind::Int64 => "Int64Attribute",
            AttributeKind::Float32 => "Float32Attribute",
            AttributeKind::Float64 => "Float64Attribute",
            AttributeKind::Number => "NumberAttribute",
            AttributeKind::Dynamic => "DynamicAttribute",
            AttributeKind::List { .. } => "ListAttribute",
            AttributeKind::Set { .. } => "SetAttribute",
            AttributeKind::Map { .. } => "MapAttribute",
            AttributeKind::Object { .. } => "ObjectAttribute",
            AttributeKind::ListNested(_) => "ListNestedAttribute",
            AttributeKind::SetNested(_) => "SetNestedAttribute",
            AttributeKind::MapNested(_) => "MapNestedAttribute",
            AttributeKind::SingleNested(_) => "SingleNestedAttribute",
        }
    }
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub write_only: bool,
    pub description: String,
    pub markdown_description: String,
    pub deprecation_message: String,
    /// Overrides the type derived from `kind`
    pub custom_type: Option<AttributeType>,
    pub default: Option<Arc<dyn defaults::Default>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub validators: Vec<Arc<dyn Validator>>,
}

// Manual Debug implementation since defaults, modifiers and validators don't implement Debug
impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("write_only", &self.write_only)
            .field("description", &self.description)
            .field("deprecation_message", &self.deprecation_message)
            .field("custom_type", &self.custom_type)
            .field(
                "default",
                &self.default.as_ref().map(|d| d.description()),
            )
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

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(&self.kind) != std::mem::discriminant(&other.kind) {
            return false;
        }
        self.kind == other.kind
            && self.required == other.required
            && self.optional == other.optional
            && self.computed == other.computed
            && self.sensitive == other.sensitive
            && self.write_only == other.write_only
            && self.description == other.description
            && self.markdown_description == other.markdown_description
            && self.deprecation_message == other.deprecation_message
            && self.custom_type == other.custom_type
            && self.defaults_equal(other)
            && descriptions_equal(&self.plan_modifiers, &other.plan_modifiers, |m| {
                m.description()
            })
            && descriptions_equal(&self.validators, &other.validators, |v| v.description())
    }
}

/// Modifier and validator lists compare by their descriptions, in order.
pub(crate) fn descriptions_equal<T: ?Sized>(
    a: &[Arc<T>],
    b: &[Arc<T>],
    describe: impl Fn(&T) -> String,
) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| describe(x.as_ref()) == describe(y.as_ref()))
}

impl Attribute {
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            write_only: false,
            description: String::new(),
            markdown_description: String::new(),
            deprecation_message: String::new(),
            custom_type: None,
            default: None,
            plan_modifiers: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn bool() -> Self {
        Self::new(AttributeKind::Bool)
    }

    pub fn string() -> Self {
        Self::new(AttributeKind::String)
    }

    pub fn int32() -> Self {
        Self::new(AttributeKind::Int32)
    }

    pub fn int64() -> Self {
        Self::new(AttributeKind::Int64)
    }

    pub fn float32() -> Self {
        Self::new(AttributeKind::Float32)
    }

    pub fn float64() -> Self {
        Self::new(AttributeKind::Float64)
    }

    pub fn number() -> Self {
        Self::new(AttributeKind::Number)
    }

    pub fn dynamic() -> Self {
        Self::new(AttributeKind::Dynamic)
    }

    pub fn list(element_type: AttributeType) -> Self {
        Self::new(AttributeKind::List {
            element_type: Some(element_type),
        })
    }

    pub fn set(element_type: AttributeType) -> Self {
        Self::new(AttributeKind::Set {
            element_type: Some(element_type),
        })
    }

    pub fn map(element_type: AttributeType) -> Self {
        Self::new(AttributeKind::Map {
            element_type: Some(element_type),
        })
    }

    pub fn object<I, K>(attribute_types: I) -> Self
    where
        I: IntoIterator<Item = (K, AttributeType)>,
        K: Into<String>,
    {
        Self::new(AttributeKind::Object {
            attribute_types: Some(
                attribute_types
                    .into_iter()
                    .map(|(k, t)| (k.into(), t))
                    .collect(),
            ),
        })
    }

    pub fn list_nested(nested: NestedAttributeObject) -> Self {
        Self::new(AttributeKind::ListNested(nested))
    }

    pub fn set_nested(nested: NestedAttributeObject) -> Self {
        Self::new(AttributeKind::SetNested(nested))
    }

    pub fn map_nested(nested: NestedAttributeObject) -> Self {
        Self::new(AttributeKind::MapNested(nested))
    }

    pub fn single_nested(nested: NestedAttributeObject) -> Self {
        Self::new(AttributeKind::SingleNested(nested))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
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

    pub fn default(mut self, default: impl defaults::Default + 'static) -> Self {
        self.default = Some(Arc::new(default));
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

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_computed(&self) -> bool {
        self.computed
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    pub fn is_write_only(&self) -> bool {
        self.write_only
    }

    /// Import plans do not consult attribute roles yet.
    pub fn is_required_for_import(&self) -> bool {
        false
    }

    pub fn is_optional_for_import(&self) -> bool {
        false
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

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn get_nested_object(&self) -> Option<&NestedAttributeObject> {
        match &self.kind {
            AttributeKind::ListNested(nested)
            | AttributeKind::SetNested(nested)
            | AttributeKind::MapNested(nested)
            | AttributeKind::SingleNested(nested) => Some(nested),
            _ => None,
        }
    }

    /// The attribute's type. A custom type takes precedence. A collection or
    /// object attribute missing both its custom type and its element or
    /// attribute types falls back to dynamic elements; implementation
    /// validation reports that schema as invalid.
    pub fn get_type(&self) -> AttributeType {
        if let Some(custom) = &self.custom_type {
            return custom.clone();
        }
        let element = |ty: &Option<AttributeType>| ty.clone().unwrap_or(AttributeType::Dynamic);
        match &self.kind {
            AttributeKind::Bool => AttributeType::Bool,
            AttributeKind::String => AttributeType::String,
            AttributeKind::Int32 => AttributeType::Int32,
            AttributeKind::Int64 => AttributeType::Int64,
            AttributeKind::Float32 => AttributeType::Float32,
            AttributeKind::Float64 => AttributeType::Float64,
            AttributeKind::Number => AttributeType::Number,
            AttributeKind::Dynamic => AttributeType::Dynamic,
            AttributeKind::List { element_type } => AttributeType::list(element(element_type)),
            AttributeKind::Set { element_type } => AttributeType::set(element(element_type)),
            AttributeKind::Map { element_type } => AttributeType::map(element(element_type)),
            AttributeKind::Object { attribute_types } => {
                AttributeType::Object(attribute_types.clone().unwrap_or_default())
            }
            AttributeKind::ListNested(nested) => AttributeType::list(nested.object_type()),
            AttributeKind::SetNested(nested) => AttributeType::set(nested.object_type()),
            AttributeKind::MapNested(nested) => AttributeType::map(nested.object_type()),
            AttributeKind::SingleNested(nested) => nested.object_type(),
        }
    }

    /// Applies one path step. Nested attributes step into their nested
    /// object; every other attribute defers to its type.
    pub fn apply_path_step(&self, step: &PathStep) -> Result<SchemaNode<'_>, PathStepError> {
        let cannot_apply = || PathStepError::CannotApply {
            step: step.kind(),
            target: self.kind_name().to_string(),
        };
        match (&self.kind, step) {
            (AttributeKind::ListNested(nested), PathStep::ElementKeyInt(_))
            | (AttributeKind::SetNested(nested), PathStep::ElementKeyValue(_))
            | (AttributeKind::MapNested(nested), PathStep::ElementKeyString(_)) => {
                Ok(SchemaNode::NestedAttributeObject(nested))
            }
            (AttributeKind::SingleNested(nested), PathStep::AttributeName(name)) => nested
                .attributes
                .get(name)
                .map(SchemaNode::Attribute)
                .ok_or_else(|| PathStepError::NoSuchObjectAttribute {
                    name: name.clone(),
                    target: self.kind_name().to_string(),
                }),
            (
                AttributeKind::ListNested(_)
                | AttributeKind::SetNested(_)
                | AttributeKind::MapNested(_)
                | AttributeKind::SingleNested(_),
                _,
            ) => Err(cannot_apply()),
            _ => self.get_type().apply_path_step(step).map(SchemaNode::Type),
        }
    }

    /// Runs the default for `path`, seeding the response with a null value
    /// of the attribute's type.
    pub fn default_value(&self, path: &Path) -> Option<DefaultResponse> {
        let default = self.default.as_ref()?;
        let mut response = DefaultResponse {
            plan_value: Value::null(self.get_type()),
            diagnostics: Diagnostics::new(),
        };
        default.default_value(&DefaultRequest { path: path.clone() }, &mut response);
        Some(response)
    }

    /// Defaults compare by behaviour: same description and same produced value.
    fn defaults_equal(&self, other: &Self) -> bool {
        match (&self.default, &other.default) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.description() == b.description()
                    && self.default_value(&Path::empty()).map(|r| r.plan_value)
                        == other.default_value(&Path::empty()).map(|r| r.plan_value)
            }
            _ => false,
        }
    }

    /// Static checks of this attribute's definition. See
    /// [`validation::validate_attribute_implementation`].
    pub fn validate_implementation(
        &self,
        request: &ValidateImplementationRequest,
        diagnostics: &mut Diagnostics,
    ) {
        validation::validate_attribute_implementation(self, request, diagnostics);
    }
}

/// Child attributes of a nested attribute, plus modifiers and validators on
/// the whole object
#[derive(Clone, Default)]
pub struct NestedAttributeObject {
    pub attributes: BTreeMap<String, Attribute>,
    pub custom_type: Option<AttributeType>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub validators: Vec<Arc<dyn Validator>>,
}

impl fmt::Debug for NestedAttributeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedAttributeObject")
            .field("attributes", &self.attributes)
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

impl PartialEq for NestedAttributeObject {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.custom_type == other.custom_type
            && descriptions_equal(&self.plan_modifiers, &other.plan_modifiers, |m| {
                m.description()
            })
            && descriptions_equal(&self.validators, &other.validators, |v| v.description())
    }
}

impl NestedAttributeObject {
    pub fn new<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(name, attribute)| (name.into(), attribute))
                .collect(),
            ..Self::default()
        }
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

    /// Object type of one element. A custom type takes precedence.
    pub fn object_type(&self) -> AttributeType {
        if let Some(custom) = &self.custom_type {
            return custom.clone();
        }
        AttributeType::Object(
            self.attributes
                .iter()
                .map(|(name, attribute)| (name.clone(), attribute.get_type()))
                .collect(),
        )
    }

    pub fn apply_path_step(&self, step: &PathStep) -> Result<SchemaNode<'_>, PathStepError> {
        match step {
            PathStep::AttributeName(name) => self
                .attributes
                .get(name)
                .map(SchemaNode::Attribute)
                .ok_or_else(|| PathStepError::NoSuchObjectAttribute {
                    name: name.clone(),
                    target: "NestedAttributeObject".to_string(),
                }),
            _ => Err(PathStepError::CannotApply {
                step: step.kind(),
                target: "NestedAttributeObject".to_string(),
            }),
        }
    }
}
