//! Configuration validation
//!
//! [`validate_config`] checks a practitioner's configuration against the
//! schema: role flags (required, read-only), provider defined validators on
//! attributes, nested objects and blocks, and deprecation warnings. Every
//! diagnostic is scoped to the configuration path it concerns.

use crate::attribute::{Attribute, AttributeKind, NestedAttributeObject};
use crate::attribute_type::AttributeType;
use crate::block::{Block, BlockKind, NestedBlockObject};
use crate::diagnostics::Diagnostics;
use crate::path::Path;
use crate::schema::Schema;
use crate::types::Value;
use crate::validator::{Validator, ValidatorRequest};
use std::sync::Arc;

/// Validates the whole configuration of a resource.
pub fn validate_config(schema: &Schema, config: &Value) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    if schema.get_type() != *config.ty() {
        diagnostics.add_error(
            "Invalid Configuration",
            format!(
                "The configuration has type {}, but the schema expects {}. \
                 This is always an issue with the provider and should be reported to the provider developers.",
                config.ty(),
                schema.get_type()
            ),
        );
        return diagnostics;
    }

    for (name, attribute) in &schema.attributes {
        let config_value = child_value(config, name, &attribute.get_type());
        validate_attribute(attribute, &Path::root(name), config, config_value, &mut diagnostics);
    }
    for (name, block) in &schema.blocks {
        let config_value = child_value(config, name, &block.get_type());
        validate_block(block, &Path::root(name), config, config_value, &mut diagnostics);
    }
    diagnostics
}

/// Validates one attribute's configured value, then its nested attributes.
pub fn validate_attribute(
    attribute: &Attribute,
    path: &Path,
    config: &Value,
    config_value: Value,
    diagnostics: &mut Diagnostics,
) {
    if !attribute.required && !attribute.optional && !attribute.computed {
        diagnostics.add_attribute_error(
            path.clone(),
            "Invalid Attribute Definition",
            "Attribute missing Required, Optional, or Computed definition. \
             This is always a problem with the provider and should be reported to the provider developer.",
        );
        return;
    }

    if attribute.write_only && attribute.computed {
        diagnostics.add_attribute_error(
            path.clone(),
            "Invalid Attribute Definition",
            "WriteOnly Attributes cannot be set with Computed. \
             This is always a problem with the provider and should be reported to the provider developer.",
        );
    }

    if attribute.computed && !attribute.optional && !config_value.is_null() {
        diagnostics.add_attribute_error(
            path.clone(),
            "Invalid Configuration for Read-Only Attribute",
            "Cannot set value for this attribute as the provider has marked it as read-only. \
             Remove the configuration line setting the value.\n\n\
             Refer to the provider documentation or contact the provider developers for additional \
             information about configurable and read-only attributes that are supported.",
        );
    }

    if attribute.required && config_value.is_null() {
        diagnostics.add_attribute_error(
            path.clone(),
            "Missing Configuration for Required Attribute",
            format!(
                "Must set a configuration value for the {} attribute as the provider has marked it as required.\n\n\
                 Refer to the provider documentation or contact the provider developers for additional \
                 information about configurable attributes that are required.",
                path
            ),
        );
    }

    run_validators(&attribute.validators, path, config, &config_value, diagnostics);

    if let Some(nested) = attribute.get_nested_object() {
        match &attribute.kind {
            AttributeKind::SingleNested(_) => {
                if config_value.is_known() {
                    validate_nested_attribute_object(nested, path, config, &config_value, diagnostics);
                }
            }
            AttributeKind::MapNested(_) => {
                for (key, element) in config_value.attributes().into_iter().flatten() {
                    validate_nested_attribute_object(
                        nested,
                        &path.at_map_key(key.clone()),
                        config,
                        element,
                        diagnostics,
                    );
                }
            }
            AttributeKind::SetNested(_) => {
                for element in config_value.elements().into_iter().flatten() {
                    validate_nested_attribute_object(
                        nested,
                        &path.at_set_value(element.clone()),
                        config,
                        element,
                        diagnostics,
                    );
                }
            }
            _ => {
                for (idx, element) in config_value.elements().into_iter().flatten().enumerate() {
                    validate_nested_attribute_object(
                        nested,
                        &path.at_list_index(idx as i64),
                        config,
                        element,
                        diagnostics,
                    );
                }
            }
        }
    }

    if !attribute.deprecation_message.is_empty() && config_value.is_known() {
        diagnostics.add_attribute_warning(
            path.clone(),
            "Attribute Deprecated",
            attribute.deprecation_message.clone(),
        );
    }
}

/// Validates one block's configured value, then each element's nested
/// attributes and blocks.
pub fn validate_block(
    block: &Block,
    path: &Path,
    config: &Value,
    config_value: Value,
    diagnostics: &mut Diagnostics,
) {
    run_validators(&block.validators, path, config, &config_value, diagnostics);

    let nested = block.get_nested_object();
    match block.kind {
        BlockKind::Single => {
            if config_value.is_known() {
                validate_nested_block_object(nested, path, config, &config_value, diagnostics);
            }
        }
        BlockKind::Set => {
            for element in config_value.elements().into_iter().flatten() {
                validate_nested_block_object(
                    nested,
                    &path.at_set_value(element.clone()),
                    config,
                    element,
                    diagnostics,
                );
            }
        }
        BlockKind::List => {
            for (idx, element) in config_value.elements().into_iter().flatten().enumerate() {
                validate_nested_block_object(
                    nested,
                    &path.at_list_index(idx as i64),
                    config,
                    element,
                    diagnostics,
                );
            }
        }
    }

    if !block.deprecation_message.is_empty() && config_value.is_known() {
        diagnostics.add_attribute_warning(
            path.clone(),
            "Block Deprecated",
            block.deprecation_message.clone(),
        );
    }
}

fn validate_nested_attribute_object(
    nested: &NestedAttributeObject,
    path: &Path,
    config: &Value,
    object: &Value,
    diagnostics: &mut Diagnostics,
) {
    run_validators(&nested.validators, path, config, object, diagnostics);
    for (name, attribute) in &nested.attributes {
        let value = child_value(object, name, &attribute.get_type());
        validate_attribute(attribute, &path.at_name(name), config, value, diagnostics);
    }
}

fn validate_nested_block_object(
    nested: &NestedBlockObject,
    path: &Path,
    config: &Value,
    object: &Value,
    diagnostics: &mut Diagnostics,
) {
    run_validators(&nested.validators, path, config, object, diagnostics);
    for (name, attribute) in &nested.attributes {
        let value = child_value(object, name, &attribute.get_type());
        validate_attribute(attribute, &path.at_name(name), config, value, diagnostics);
    }
    for (name, block) in &nested.blocks {
        let value = child_value(object, name, &block.get_type());
        validate_block(block, &path.at_name(name), config, value, diagnostics);
    }
}

fn run_validators(
    validators: &[Arc<dyn Validator>],
    path: &Path,
    config: &Value,
    config_value: &Value,
    diagnostics: &mut Diagnostics,
) {
    if validators.is_empty() {
        return;
    }
    let request = ValidatorRequest {
        path: path.clone(),
        config,
        config_value: config_value.clone(),
    };
    for validator in validators {
        let description = validator.description();
        tracing::debug!(path = %path, description = %description, "Calling provider defined validator");
        validator.validate(&request, diagnostics);
        tracing::debug!(path = %path, description = %description, "Called provider defined validator");
    }
}

/// Attribute `name` of an object value. Unknown objects have unknown
/// attributes; null objects and absent attributes read as null.
fn child_value(object: &Value, name: &str, ty: &AttributeType) -> Value {
    if object.is_unknown() {
        return Value::unknown(ty.clone());
    }
    object
        .attributes()
        .and_then(|attributes| attributes.get(name))
        .cloned()
        .unwrap_or_else(|| Value::null(ty.clone()))
}
