//! Plan modification over a whole schema
//!
//! [`modify_plan`] walks every root attribute and block of a [`Schema`] and,
//! for each one:
//!
//! 1. fills an unknown planned value from the attribute's default when the
//!    attribute is computed and left unset in configuration,
//! 2. folds the attribute's plan modifiers over the planned value in
//!    declared order,
//! 3. descends into nested attributes or blocks, element by element.
//!
//! Nested descent is skipped when the planned value is null or unknown, or
//! when the attribute's own modifiers reported an error.

use crate::attribute::{Attribute, AttributeKind};
use crate::attribute_type::AttributeType;
use crate::block::{Block, BlockKind};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::path::{normalize_paths, Path};
use crate::plan_modifier::{PlanModifier, PlanModifyRequest, PlanModifyResponse};
use crate::schema::Schema;
use crate::types::{PrivateData, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What to do with the remaining modifiers of an attribute once one of them
/// reports an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifierErrorPolicy {
    /// Run every modifier, accumulating diagnostics
    #[default]
    Continue,
    /// Stop the attribute's chain at the first error
    StopAttribute,
}

/// Plan pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanConfig {
    pub error_policy: ModifierErrorPolicy,
    /// Fill unknown computed values from attribute defaults
    pub apply_defaults: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            error_policy: ModifierErrorPolicy::Continue,
            apply_defaults: true,
        }
    }
}

impl PlanConfig {
    /// Create a new plan configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_policy(mut self, policy: ModifierErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_defaults(mut self, apply_defaults: bool) -> Self {
        self.apply_defaults = apply_defaults;
        self
    }
}

/// Whole-resource inputs to [`modify_plan`]
#[derive(Debug, Clone)]
pub struct ModifyPlanRequest<'a> {
    pub config: &'a Value,
    /// Proposed new state
    pub plan: &'a Value,
    /// Prior state, null on create
    pub state: &'a Value,
    pub private: PrivateData,
}

#[derive(Debug, Clone)]
pub struct ModifyPlanResponse {
    pub plan: Value,
    /// Sorted, without duplicates
    pub requires_replace: Vec<Path>,
    pub diagnostics: Diagnostics,
    pub private: PrivateData,
}

/// Result of planning one attribute, block or nested object
#[derive(Debug, Clone)]
pub struct AttributePlanResponse {
    pub plan_value: Value,
    pub requires_replace: Vec<Path>,
    pub diagnostics: Diagnostics,
    pub private: PrivateData,
}

impl AttributePlanResponse {
    fn new(plan_value: Value, private: PrivateData) -> Self {
        Self {
            plan_value,
            requires_replace: Vec::new(),
            diagnostics: Diagnostics::new(),
            private,
        }
    }

    /// Takes over the child's side effects and returns its planned value.
    fn absorb(&mut self, child: AttributePlanResponse) -> Value {
        self.diagnostics.append(child.diagnostics);
        self.requires_replace.extend(child.requires_replace);
        self.private = child.private;
        child.plan_value
    }
}

/// Runs defaults and plan modifiers over every attribute and block of the
/// schema. A null proposed plan is a destroy and is returned untouched.
pub fn modify_plan(
    schema: &Schema,
    request: &ModifyPlanRequest<'_>,
    config: &PlanConfig,
) -> ModifyPlanResponse {
    let mut response = ModifyPlanResponse {
        plan: request.plan.clone(),
        requires_replace: Vec::new(),
        diagnostics: Diagnostics::new(),
        private: request.private.clone(),
    };

    if request.plan.is_null() {
        tracing::trace!("Skipping plan modification for resource destroy");
        return response;
    }
    if !request.plan.is_known() {
        tracing::trace!("Skipping plan modification for unknown plan");
        return response;
    }

    let children = schema
        .attributes
        .iter()
        .map(|(name, attribute)| (name, Child::Attribute(attribute)))
        .chain(schema.blocks.iter().map(|(name, block)| (name, Child::Block(block))));

    for (name, child) in children {
        let path = Path::root(name);
        let ty = child.get_type();
        let values = (
            value_at(request.config, &path, &ty, "configuration"),
            value_at(request.plan, &path, &ty, "plan"),
            value_at(request.state, &path, &ty, "prior state"),
        );
        let (config_value, plan_value, state_value) = match values {
            (Ok(c), Ok(p), Ok(s)) => (c, p, s),
            (c, p, s) => {
                response
                    .diagnostics
                    .extend([c.err(), p.err(), s.err()].into_iter().flatten());
                continue;
            }
        };

        let private = response.private.clone();
        let child_request = PlanModifyRequest {
            path,
            config: request.config,
            plan: request.plan,
            state: request.state,
            config_value,
            plan_value,
            state_value,
            private: &private,
        };
        let child_response = match child {
            Child::Attribute(attribute) => attribute_modify_plan(attribute, &child_request, config),
            Child::Block(block) => block_modify_plan(block, &child_request, config),
        };

        response.diagnostics.append(child_response.diagnostics);
        response.requires_replace.extend(child_response.requires_replace);
        response.private = child_response.private;
        if let Some(attributes) = response.plan.attributes_mut() {
            attributes.insert(name.clone(), child_response.plan_value);
        }
    }

    normalize_paths(&mut response.requires_replace);
    response
}

/// Plans a single attribute: default, modifiers, then nested attributes.
pub fn attribute_modify_plan(
    attribute: &Attribute,
    request: &PlanModifyRequest<'_>,
    config: &PlanConfig,
) -> AttributePlanResponse {
    let mut response = AttributePlanResponse::new(request.plan_value.clone(), request.private.clone());

    if config.apply_defaults
        && attribute.computed
        && request.plan_value.is_unknown()
        && request.config_value.is_null()
    {
        if let Some(default) = &attribute.default {
            tracing::debug!(
                path = %request.path,
                description = %default.description(),
                "Calling provider defined default"
            );
            if let Some(default_response) = attribute.default_value(&request.path) {
                tracing::debug!(
                    path = %request.path,
                    description = %default.description(),
                    "Called provider defined default"
                );
                let failed = default_response.diagnostics.has_error();
                response.diagnostics.append(default_response.diagnostics);
                if failed {
                    return response;
                }
                replace_plan_value(
                    &mut response,
                    default_response.plan_value,
                    &request.path,
                    &default.description(),
                );
            }
        }
    }

    if !run_modifiers(&attribute.plan_modifiers, request, &mut response, config) {
        return response;
    }

    let Some(nested) = attribute.get_nested_object() else {
        return response;
    };
    if !descend(request, &response) {
        return response;
    }

    let nesting = match &attribute.kind {
        AttributeKind::ListNested(_) => Nesting::List,
        AttributeKind::SetNested(_) => Nesting::Set,
        AttributeKind::MapNested(_) => Nesting::Map,
        _ => Nesting::Single,
    };
    let no_blocks = BTreeMap::new();
    modify_nested(nesting, request, &mut response, |element_request| {
        object_modify_plan(
            &nested.plan_modifiers,
            &nested.attributes,
            &no_blocks,
            element_request,
            config,
        )
    });
    response
}

/// Plans a single block: block modifiers, then each element's nested
/// attributes and blocks.
pub fn block_modify_plan(
    block: &Block,
    request: &PlanModifyRequest<'_>,
    config: &PlanConfig,
) -> AttributePlanResponse {
    let mut response = AttributePlanResponse::new(request.plan_value.clone(), request.private.clone());

    if !run_modifiers(&block.plan_modifiers, request, &mut response, config) {
        return response;
    }
    if !descend(request, &response) {
        return response;
    }

    let nesting = match block.kind {
        BlockKind::List => Nesting::List,
        BlockKind::Set => Nesting::Set,
        BlockKind::Single => Nesting::Single,
    };
    let nested = block.get_nested_object();
    modify_nested(nesting, request, &mut response, |element_request| {
        object_modify_plan(
            &nested.plan_modifiers,
            &nested.attributes,
            &nested.blocks,
            element_request,
            config,
        )
    });
    response
}

/// Whether nested descent should happen after the modifier chain.
fn descend(request: &PlanModifyRequest<'_>, response: &AttributePlanResponse) -> bool {
    if response.diagnostics.has_error() {
        tracing::trace!(path = %request.path, "Skipping nested plan modification after error");
        return false;
    }
    if response.plan_value.is_null() || response.plan_value.is_unknown() {
        tracing::trace!(path = %request.path, "Skipping nested plan modification of null or unknown value");
        return false;
    }
    true
}

/// Folds `modifiers` over the response's planned value. Each modifier starts
/// with `requires_replace` unset; the path is recorded as soon as any of them
/// sets it. Returns false when the chain stopped on an error.
fn run_modifiers(
    modifiers: &[Arc<dyn PlanModifier>],
    request: &PlanModifyRequest<'_>,
    response: &mut AttributePlanResponse,
    config: &PlanConfig,
) -> bool {
    for modifier in modifiers {
        let description = modifier.description();
        let private = response.private.clone();
        let modifier_request = derived_request(
            request,
            request.path.clone(),
            request.config_value.clone(),
            response.plan_value.clone(),
            request.state_value.clone(),
            &private,
        );
        let mut modifier_response =
            PlanModifyResponse::new(response.plan_value.clone(), private.clone());

        tracing::debug!(
            path = %request.path,
            description = %description,
            "Calling provider defined plan modifier"
        );
        modifier.modify_plan(&modifier_request, &mut modifier_response);
        tracing::debug!(
            path = %request.path,
            description = %description,
            "Called provider defined plan modifier"
        );

        let failed = modifier_response.diagnostics.has_error();
        response.diagnostics.append(modifier_response.diagnostics);
        replace_plan_value(response, modifier_response.plan_value, &request.path, &description);
        if modifier_response.requires_replace
            && !response.requires_replace.contains(&request.path)
        {
            response.requires_replace.push(request.path.clone());
        }
        response.private = modifier_response.private;

        if failed && config.error_policy == ModifierErrorPolicy::StopAttribute {
            return false;
        }
    }
    true
}

/// Accepts `value` as the new planned value unless its type differs from
/// the current one.
fn replace_plan_value(response: &mut AttributePlanResponse, value: Value, path: &Path, source: &str) {
    if value.ty() == response.plan_value.ty() {
        response.plan_value = value;
        return;
    }
    response.diagnostics.push(
        Diagnostic::error(
            "Invalid Plan Modification",
            format!(
                "{:?} returned a planned value of type {} at {}, but the attribute has type {}. \
                 This is always an issue with the provider and should be reported to the provider developers.",
                source,
                value.ty(),
                path,
                response.plan_value.ty()
            ),
        )
        .with_attribute(path.clone()),
    );
}

enum Child<'a> {
    Attribute(&'a Attribute),
    Block(&'a Block),
}

impl Child<'_> {
    fn get_type(&self) -> AttributeType {
        match self {
            Child::Attribute(attribute) => attribute.get_type(),
            Child::Block(block) => block.get_type(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Nesting {
    List,
    Set,
    Map,
    Single,
}

/// Runs `modify_element` over every element of the planned collection (or
/// over the single object) and writes the results back. Config and state
/// elements are matched by index for lists and sets and by key for maps; a
/// missing counterpart is null.
fn modify_nested<F>(
    nesting: Nesting,
    request: &PlanModifyRequest<'_>,
    response: &mut AttributePlanResponse,
    mut modify_element: F,
) where
    F: FnMut(&PlanModifyRequest<'_>) -> AttributePlanResponse,
{
    match nesting {
        Nesting::Single => {
            let private = response.private.clone();
            let object_request = derived_request(
                request,
                request.path.clone(),
                request.config_value.clone(),
                response.plan_value.clone(),
                request.state_value.clone(),
                &private,
            );
            let object_response = modify_element(&object_request);
            response.plan_value = response.absorb(object_response);
        }
        Nesting::List | Nesting::Set => {
            let Some(plan_elements) = response.plan_value.elements().map(<[Value]>::to_vec) else {
                return;
            };
            let mut planned = Vec::with_capacity(plan_elements.len());
            for (idx, plan_element) in plan_elements.into_iter().enumerate() {
                let ty = plan_element.ty().clone();
                let path = match nesting {
                    Nesting::Set => request.path.at_set_value(plan_element.clone()),
                    _ => request.path.at_list_index(idx as i64),
                };
                let private = response.private.clone();
                let element = derived_request(
                    request,
                    path,
                    nth_element(&request.config_value, idx, &ty),
                    plan_element,
                    nth_element(&request.state_value, idx, &ty),
                    &private,
                );
                let element_response = modify_element(&element);
                planned.push(response.absorb(element_response));
            }
            if let Some(elements) = response.plan_value.elements_mut() {
                *elements = planned;
            }
        }
        Nesting::Map => {
            let Some(plan_entries) = response.plan_value.attributes().cloned() else {
                return;
            };
            let mut planned = BTreeMap::new();
            for (key, plan_element) in plan_entries {
                let ty = plan_element.ty().clone();
                let private = response.private.clone();
                let element = derived_request(
                    request,
                    request.path.at_map_key(key.clone()),
                    map_entry(&request.config_value, &key, &ty),
                    plan_element,
                    map_entry(&request.state_value, &key, &ty),
                    &private,
                );
                let element_response = modify_element(&element);
                planned.insert(key, response.absorb(element_response));
            }
            if let Some(entries) = response.plan_value.attributes_mut() {
                *entries = planned;
            }
        }
    }
}

/// Plans one object: object-level modifiers, then every attribute, then
/// every block.
fn object_modify_plan(
    modifiers: &[Arc<dyn PlanModifier>],
    attributes: &BTreeMap<String, Attribute>,
    blocks: &BTreeMap<String, Block>,
    request: &PlanModifyRequest<'_>,
    config: &PlanConfig,
) -> AttributePlanResponse {
    let mut response = AttributePlanResponse::new(request.plan_value.clone(), request.private.clone());

    if !run_modifiers(modifiers, request, &mut response, config) {
        return response;
    }
    if !descend(request, &response) {
        return response;
    }

    let children = attributes
        .iter()
        .map(|(name, attribute)| (name, Child::Attribute(attribute)))
        .chain(blocks.iter().map(|(name, block)| (name, Child::Block(block))));

    for (name, child) in children {
        let ty = child.get_type();
        let private = response.private.clone();
        let child_request = derived_request(
            request,
            request.path.at_name(name.clone()),
            map_entry(&request.config_value, name, &ty),
            map_entry(&response.plan_value, name, &ty),
            map_entry(&request.state_value, name, &ty),
            &private,
        );
        let child_response = match child {
            Child::Attribute(attribute) => attribute_modify_plan(attribute, &child_request, config),
            Child::Block(block) => block_modify_plan(block, &child_request, config),
        };
        let planned = response.absorb(child_response);
        if let Some(values) = response.plan_value.attributes_mut() {
            values.insert(name.clone(), planned);
        }
    }
    response
}

/// Request for a node below `parent`, sharing its whole-resource values.
fn derived_request<'a>(
    parent: &PlanModifyRequest<'a>,
    path: Path,
    config_value: Value,
    plan_value: Value,
    state_value: Value,
    private: &'a PrivateData,
) -> PlanModifyRequest<'a> {
    PlanModifyRequest {
        path,
        config: parent.config,
        plan: parent.plan,
        state: parent.state,
        config_value,
        plan_value,
        state_value,
        private,
    }
}

/// Reads the value at `path` of a whole-resource value, reporting a
/// mismatch between the value and the schema.
fn value_at(whole: &Value, path: &Path, ty: &AttributeType, source: &str) -> Result<Value, Diagnostic> {
    match whole.value_at_path(path) {
        Ok(value) if value.ty() == ty || value.ty() == &AttributeType::Dynamic => Ok(value),
        Ok(value) => Err(read_error(path, source, format!(
            "expected type {}, got {}",
            ty,
            value.ty()
        ))),
        Err(err) => Err(read_error(path, source, err.to_string())),
    }
}

fn read_error(path: &Path, source: &str, err: String) -> Diagnostic {
    Diagnostic::error(
        "Unable to Read Attribute Value",
        format!(
            "An unexpected error was encountered trying to read an attribute from the {}. \
             This is always an error in the provider. Please report the following to the provider developer:\n\n{}",
            source, err
        ),
    )
    .with_attribute(path.clone())
}

/// Element `idx` of a list or set. Unknown collections have unknown
/// elements; null collections and missing indexes read as null.
fn nth_element(collection: &Value, idx: usize, ty: &AttributeType) -> Value {
    if collection.is_unknown() {
        return Value::unknown(ty.clone());
    }
    collection
        .elements()
        .and_then(|elements| elements.get(idx))
        .cloned()
        .unwrap_or_else(|| Value::null(ty.clone()))
}

/// Entry `key` of a map or attribute of an object, with the same unknown
/// and null handling as [`nth_element`].
fn map_entry(map: &Value, key: &str, ty: &AttributeType) -> Value {
    if map.is_unknown() {
        return Value::unknown(ty.clone());
    }
    map.attributes()
        .and_then(|entries| entries.get(key))
        .cloned()
        .unwrap_or_else(|| Value::null(ty.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::NestedAttributeObject;
    use crate::block::NestedBlockObject;
    use crate::defaults::{static_int64, static_string};
    use crate::plan_modifier::{
        RequiresReplace, RequiresReplaceIfConfigured, UseStateForUnknown, WillNotBeNull,
    };
    use pretty_assertions::assert_eq;

    /// Replaces the planned value with a fixed one.
    struct SetValue(Value);

    impl PlanModifier for SetValue {
        fn description(&self) -> String {
            format!("sets {}", self.0)
        }

        fn modify_plan(&self, _request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
            response.plan_value = self.0.clone();
        }
    }

    /// Reports an error without touching the plan.
    struct Fail;

    impl PlanModifier for Fail {
        fn description(&self) -> String {
            "always fails".to_string()
        }

        fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
            response
                .diagnostics
                .add_attribute_error(request.path.clone(), "Failed", "modifier failed");
        }
    }

    /// Appends the incoming planned value to the string, showing chain order.
    struct Append(&'static str);

    impl PlanModifier for Append {
        fn description(&self) -> String {
            format!("appends {}", self.0)
        }

        fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
            let current = request.plan_value.as_str().unwrap_or_default();
            response.plan_value = Value::string(format!("{}{}", current, self.0));
        }
    }

    fn request<'a>(
        path: Path,
        config_value: Value,
        plan_value: Value,
        state_value: Value,
        whole: &'a Value,
        private: &'a PrivateData,
    ) -> PlanModifyRequest<'a> {
        PlanModifyRequest {
            path,
            config: whole,
            plan: whole,
            state: whole,
            config_value,
            plan_value,
            state_value,
            private,
        }
    }

    #[test]
    fn modifiers_fold_in_order() {
        let attribute = Attribute::string()
            .optional()
            .plan_modifier(Append("a"))
            .plan_modifier(Append("b"));
        let whole = Value::object_from([("name", Value::string(""))]);
        let private = PrivateData::new();
        let response = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("name"),
                Value::string(""),
                Value::string(""),
                Value::string(""),
                &whole,
                &private,
            ),
            &PlanConfig::default(),
        );
        assert_eq!(response.plan_value, Value::string("ab"));
    }

    #[test]
    fn default_fills_unknown_computed_value() {
        let attribute = Attribute::int64().optional().computed().default(static_int64(30));
        let whole = Value::null(AttributeType::object([("timeout", AttributeType::Int64)]));
        let private = PrivateData::new();
        let response = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("timeout"),
                Value::null(AttributeType::Int64),
                Value::unknown(AttributeType::Int64),
                Value::null(AttributeType::Int64),
                &whole,
                &private,
            ),
            &PlanConfig::default(),
        );
        assert_eq!(response.plan_value, Value::int64(30));

        let skipped = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("timeout"),
                Value::null(AttributeType::Int64),
                Value::unknown(AttributeType::Int64),
                Value::null(AttributeType::Int64),
                &whole,
                &private,
            ),
            &PlanConfig::new().with_defaults(false),
        );
        assert!(skipped.plan_value.is_unknown());
    }

    #[test]
    fn default_ignored_when_configured() {
        let attribute = Attribute::string().optional().computed().default(static_string("x"));
        let whole = Value::null(AttributeType::object([("name", AttributeType::String)]));
        let private = PrivateData::new();
        let response = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("name"),
                Value::unknown(AttributeType::String),
                Value::unknown(AttributeType::String),
                Value::null(AttributeType::String),
                &whole,
                &private,
            ),
            &PlanConfig::default(),
        );
        assert!(response.plan_value.is_unknown());
    }

    #[test]
    fn error_policy_controls_remaining_modifiers() {
        let attribute = Attribute::string()
            .optional()
            .plan_modifier(Fail)
            .plan_modifier(SetValue(Value::string("after")));
        let whole = Value::object_from([("name", Value::string("x"))]);
        let private = PrivateData::new();
        let run = |config: PlanConfig| {
            attribute_modify_plan(
                &attribute,
                &request(
                    Path::root("name"),
                    Value::string("x"),
                    Value::string("x"),
                    Value::string("x"),
                    &whole,
                    &private,
                ),
                &config,
            )
        };

        let continued = run(PlanConfig::default());
        assert_eq!(continued.plan_value, Value::string("after"));
        assert_eq!(continued.diagnostics.len(), 1);

        let stopped = run(PlanConfig::new().with_error_policy(ModifierErrorPolicy::StopAttribute));
        assert_eq!(stopped.plan_value, Value::string("x"));
        assert_eq!(stopped.diagnostics.len(), 1);
    }

    #[test]
    fn type_changing_modifier_is_rejected() {
        let attribute = Attribute::string()
            .optional()
            .plan_modifier(SetValue(Value::bool(true)));
        let whole = Value::object_from([("name", Value::string("x"))]);
        let private = PrivateData::new();
        let response = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("name"),
                Value::string("x"),
                Value::string("x"),
                Value::string("x"),
                &whole,
                &private,
            ),
            &PlanConfig::default(),
        );
        assert_eq!(response.plan_value, Value::string("x"));
        assert_eq!(response.diagnostics.as_slice()[0].summary, "Invalid Plan Modification");
    }

    #[test]
    fn nested_list_elements_get_indexed_paths() {
        let nested = NestedAttributeObject::new([(
            "name",
            Attribute::string().required().plan_modifier(RequiresReplace),
        )]);
        let attribute = Attribute::list_nested(nested).optional();
        let object = AttributeType::object([("name", AttributeType::String)]);
        let list = |names: &[&str]| {
            Value::list(
                object.clone(),
                names
                    .iter()
                    .map(|n| Value::object_from([("name", Value::string(*n))]))
                    .collect(),
            )
            .unwrap()
        };
        let whole = Value::object_from([("items", list(&["a", "b"]))]);
        let private = PrivateData::new();
        let response = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("items"),
                list(&["a", "c"]),
                list(&["a", "c"]),
                list(&["a", "b"]),
                &whole,
                &private,
            ),
            &PlanConfig::default(),
        );
        assert_eq!(
            response.requires_replace,
            vec![Path::root("items").at_list_index(1).at_name("name")]
        );
    }

    #[test]
    fn nested_descent_skips_unknown_collections() {
        let nested = NestedAttributeObject::new([("name", Attribute::string().plan_modifier(Fail))]);
        let attribute = Attribute::set_nested(nested).computed();
        let ty = attribute.get_type();
        let whole = Value::null(AttributeType::object([("items", ty.clone())]));
        let private = PrivateData::new();
        let response = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("items"),
                Value::null(ty.clone()),
                Value::unknown(ty.clone()),
                Value::null(ty),
                &whole,
                &private,
            ),
            &PlanConfig::default(),
        );
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn block_modifiers_run_before_nested_attributes() {
        let block = Block::single(
            NestedBlockObject::new().attribute(
                "id",
                Attribute::string().computed().plan_modifier(WillNotBeNull),
            ),
        );
        let ty = block.get_type();
        let plan = Value::object_from([("id", Value::unknown(AttributeType::String))]);
        let config = Value::object_from([("id", Value::null(AttributeType::String))]);
        let whole = Value::null(AttributeType::object([("settings", ty.clone())]));
        let private = PrivateData::new();
        let response = block_modify_plan(
            &block,
            &request(Path::root("settings"), config, plan, Value::null(ty), &whole, &private),
            &PlanConfig::default(),
        );
        let id = response.plan_value.attributes().unwrap()["id"].clone();
        assert!(id.is_unknown());
        assert!(id.not_null_refinement());
    }

    #[test]
    fn schema_modify_plan_skips_destroy() {
        let schema = Schema::builder()
            .attribute("id", Attribute::string().computed().plan_modifier(UseStateForUnknown))
            .build();
        let ty = schema.get_type();
        let plan = Value::null(ty.clone());
        let state = Value::object_from([("id", Value::string("abc"))]);
        let config = Value::null(ty);
        let response = modify_plan(
            &schema,
            &ModifyPlanRequest {
                config: &config,
                plan: &plan,
                state: &state,
                private: PrivateData::new(),
            },
            &PlanConfig::default(),
        );
        assert!(response.plan.is_null());
        assert!(response.diagnostics.is_empty());
    }

    /// Explicitly clears the replacement flag.
    struct KeepInPlace;

    impl PlanModifier for KeepInPlace {
        fn description(&self) -> String {
            "never replaces".to_string()
        }

        fn modify_plan(&self, _request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
            response.requires_replace = false;
        }
    }

    fn changed_name(attribute: &Attribute, config: &PlanConfig) -> AttributePlanResponse {
        let whole = Value::object_from([("name", Value::string("new"))]);
        let private = PrivateData::new();
        attribute_modify_plan(
            attribute,
            &request(
                Path::root("name"),
                Value::string("new"),
                Value::string("new"),
                Value::string("old"),
                &whole,
                &private,
            ),
            config,
        )
    }

    #[test]
    fn later_modifier_cannot_clear_replacement() {
        let attribute = Attribute::string()
            .required()
            .plan_modifier(RequiresReplace)
            .plan_modifier(KeepInPlace);
        let response = changed_name(&attribute, &PlanConfig::default());
        assert_eq!(response.requires_replace, vec![Path::root("name")]);
    }

    #[test]
    fn replacement_recorded_before_stopping_on_error() {
        let attribute = Attribute::string()
            .required()
            .plan_modifier(RequiresReplace)
            .plan_modifier(Fail)
            .plan_modifier(RequiresReplace);
        let response = changed_name(
            &attribute,
            &PlanConfig::new().with_error_policy(ModifierErrorPolicy::StopAttribute),
        );
        assert_eq!(response.requires_replace, vec![Path::root("name")]);
        assert_eq!(response.diagnostics.len(), 1);
    }

    #[test]
    fn unknown_config_collection_keeps_children_unknown() {
        let nested = NestedAttributeObject::new([(
            "id",
            Attribute::string().computed().plan_modifier(UseStateForUnknown),
        )]);
        let attribute = Attribute::map_nested(nested).optional();
        let ty = attribute.get_type();
        let object = AttributeType::object([("id", AttributeType::String)]);
        let entry = |id: Value| {
            Value::map(
                object.clone(),
                [("k".to_string(), Value::object_from([("id", id)]))].into_iter().collect(),
            )
            .unwrap()
        };
        let state = entry(Value::string("old"));
        let whole = Value::object_from([("items", state.clone())]);
        let private = PrivateData::new();
        let response = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("items"),
                Value::unknown(ty),
                entry(Value::unknown(AttributeType::String)),
                state,
                &whole,
                &private,
            ),
            &PlanConfig::default(),
        );
        assert!(response.diagnostics.is_empty());
        assert_eq!(response.plan_value, entry(Value::unknown(AttributeType::String)));
    }

    #[test]
    fn unknown_config_list_is_not_unconfigured() {
        let nested = NestedAttributeObject::new([(
            "name",
            Attribute::string().optional().plan_modifier(RequiresReplaceIfConfigured),
        )]);
        let attribute = Attribute::list_nested(nested).optional();
        let ty = attribute.get_type();
        let object = AttributeType::object([("name", AttributeType::String)]);
        let list = |name: &str| {
            Value::list(object.clone(), vec![Value::object_from([("name", Value::string(name))])])
                .unwrap()
        };
        let whole = Value::object_from([("items", list("a"))]);
        let private = PrivateData::new();
        let response = attribute_modify_plan(
            &attribute,
            &request(
                Path::root("items"),
                Value::unknown(ty),
                list("b"),
                list("a"),
                &whole,
                &private,
            ),
            &PlanConfig::default(),
        );
        assert_eq!(
            response.requires_replace,
            vec![Path::root("items").at_list_index(0).at_name("name")]
        );
    }
}
