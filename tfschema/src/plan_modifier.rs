//! Plan modifiers
//!
//! A plan modifier adjusts the planned value of one attribute, block or
//! nested object given its prior state, proposed plan and configuration. An
//! attribute's modifiers run in declared order and each one sees the response
//! left behind by the previous one.
//!
//! The built-in modifiers cover the common cases:
//! - [`UseStateForUnknown`] keeps a computed value stable across plans
//! - [`RequiresReplace`] forces replacement when the value changes
//! - [`WillNotBeNull`] refines an unknown value as not null

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::path::Path;
use crate::types::{PrivateData, Value};

/// Request passed to a [`PlanModifier`]
#[derive(Debug, Clone)]
pub struct PlanModifyRequest<'a> {
    pub path: Path,
    /// Whole-resource configuration
    pub config: &'a Value,
    /// Whole-resource proposed plan
    pub plan: &'a Value,
    /// Whole-resource prior state, null on create
    pub state: &'a Value,
    pub config_value: Value,
    pub plan_value: Value,
    pub state_value: Value,
    pub private: &'a PrivateData,
}

/// Response from a [`PlanModifier`]. `plan_value` is seeded with the output
/// of the previous modifier in the chain.
#[derive(Debug, Clone)]
pub struct PlanModifyResponse {
    pub plan_value: Value,
    pub requires_replace: bool,
    pub diagnostics: Diagnostics,
    pub private: PrivateData,
}

impl PlanModifyResponse {
    pub fn new(plan_value: Value, private: PrivateData) -> Self {
        Self {
            plan_value,
            requires_replace: false,
            diagnostics: Diagnostics::new(),
            private,
        }
    }
}

/// Trait for modifying terraform plan behavior
///
/// Plan modifiers can:
/// - Modify the planned value
/// - Mark an attribute as requiring replacement
/// - Add warnings or errors to the plan
pub trait PlanModifier: Send + Sync {
    /// Human-readable description
    fn description(&self) -> String;

    fn markdown_description(&self) -> String {
        self.description()
    }

    /// Modify the plan for an attribute
    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse);
}

/// Error reported when [`UseStateForUnknown`] is used beneath a list or set.
/// Elements of those collections do not realign between plan and state.
pub fn use_state_for_unknown_under_list_or_set(path: &Path) -> Diagnostic {
    Diagnostic::error(
        "Invalid Attribute Schema",
        format!(
            "Attributes under a list or set cannot use the UseStateForUnknown() plan modifier. \
             This is always an issue with the provider and should be reported to the provider developers.\n\n\
             Path: {}\n",
            path
        ),
    )
    .with_attribute(path.clone())
}

/// Shared gates of the UseStateForUnknown family. Returns false when the
/// state value must not be copied.
fn state_usable_for_unknown(request: &PlanModifyRequest<'_>) -> bool {
    // No state on create
    if request.state.is_null() {
        return false;
    }
    if !request.plan_value.is_unknown() {
        return false;
    }
    // An unknown config means the practitioner is interpolating a value that
    // may legitimately change during apply.
    !request.config_value.is_unknown()
}

/// Copies the prior state value into an unknown planned value
///
/// Null state values are known values too and get copied. Using this
/// modifier beneath a list or set is a provider error.
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "Once set, the value of this attribute in state will not change.".to_string()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        if request.path.has_list_or_set_step() {
            response
                .diagnostics
                .push(use_state_for_unknown_under_list_or_set(&request.path));
            return;
        }
        if !state_usable_for_unknown(request) {
            return;
        }
        response.plan_value = request.state_value.clone();
    }
}

/// Like [`UseStateForUnknown`], but only copies the state when the predicate
/// returns true. The predicate is only called once every gate has passed.
pub struct UseStateForUnknownIf<F>
where
    F: Fn(&PlanModifyRequest<'_>) -> bool + Send + Sync,
{
    predicate: F,
    description: String,
}

impl<F> UseStateForUnknownIf<F>
where
    F: Fn(&PlanModifyRequest<'_>) -> bool + Send + Sync,
{
    pub fn new(predicate: F, description: impl Into<String>) -> Self {
        Self {
            predicate,
            description: description.into(),
        }
    }
}

impl<F> PlanModifier for UseStateForUnknownIf<F>
where
    F: Fn(&PlanModifyRequest<'_>) -> bool + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        if request.path.has_list_or_set_step() {
            response
                .diagnostics
                .push(use_state_for_unknown_under_list_or_set(&request.path));
            return;
        }
        if !state_usable_for_unknown(request) {
            return;
        }
        if (self.predicate)(request) {
            response.plan_value = request.state_value.clone();
        }
    }
}

/// Like [`UseStateForUnknown`], but leaves the plan unknown when the prior
/// state value is null.
pub struct UseNonNullStateForUnknown;

impl PlanModifier for UseNonNullStateForUnknown {
    fn description(&self) -> String {
        "Once set to a non-null value, the value of this attribute in state will not change."
            .to_string()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        if request.path.has_list_or_set_step() {
            response
                .diagnostics
                .push(use_state_for_unknown_under_list_or_set(&request.path));
            return;
        }
        if !state_usable_for_unknown(request) || request.state_value.is_null() {
            return;
        }
        response.plan_value = request.state_value.clone();
    }
}

/// Shared gates of the RequiresReplace family. Returns true when the planned
/// value differs from the state in a way that may warrant replacement.
fn replacement_candidate(request: &PlanModifyRequest<'_>) -> bool {
    // Create
    if request.state.is_null() || request.state_value.is_null() {
        return false;
    }
    // Destroy
    if request.plan.is_null() || request.plan_value.is_null() {
        return false;
    }
    request.plan_value != request.state_value
}

/// Marks the resource for replacement when the value changes
pub struct RequiresReplace;

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "If the value of this attribute changes, Terraform will destroy and recreate the resource."
            .to_string()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        if replacement_candidate(request) {
            response.requires_replace = true;
        }
    }
}

/// Marks the resource for replacement when the value changes and the
/// predicate returns true
pub struct RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest<'_>) -> bool + Send + Sync,
{
    predicate: F,
    description: String,
}

impl<F> RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest<'_>) -> bool + Send + Sync,
{
    pub fn new(predicate: F, description: impl Into<String>) -> Self {
        Self {
            predicate,
            description: description.into(),
        }
    }
}

impl<F> PlanModifier for RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest<'_>) -> bool + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        if replacement_candidate(request) && (self.predicate)(request) {
            response.requires_replace = true;
        }
    }
}

/// Marks the resource for replacement when a configured value changes.
/// Changes to unconfigured values never trigger replacement.
pub struct RequiresReplaceIfConfigured;

impl PlanModifier for RequiresReplaceIfConfigured {
    fn description(&self) -> String {
        "If the value of this attribute is configured and changes, Terraform will destroy and recreate the resource."
            .to_string()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        if request.config_value.is_null() {
            return;
        }
        if replacement_candidate(request) {
            response.requires_replace = true;
        }
    }
}

/// Refines an unknown planned value as not null when the configuration
/// value is known
pub struct WillNotBeNull;

impl PlanModifier for WillNotBeNull {
    fn description(&self) -> String {
        "Promises the value of this attribute will not be null once it is known.".to_string()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        if !response.plan_value.is_unknown() || request.config_value.is_unknown() {
            return;
        }
        response.plan_value = response.plan_value.refine_as_not_null();
    }
}
