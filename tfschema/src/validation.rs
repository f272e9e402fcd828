//! Static schema checks
//!
//! Two passes live here. [`validate_schema`] backs [`Schema::validate`]: the
//! field-name, reserved-name and default-without-computed rules, reported
//! against the offending schema path. [`validate_schema_implementation`]
//! backs [`Schema::validate_implementation`]: per-kind definition checks
//! that would otherwise surface as confusing errors at plan time.
//!
//! Both only ever report provider bugs, never practitioner mistakes.

use crate::attribute::{Attribute, AttributeKind, NestedAttributeObject};
use crate::attribute_type::AttributeType;
use crate::block::{Block, NestedBlockObject};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::path::Path;
use crate::schema::Schema;

/// Root names Terraform reserves as resource meta-arguments.
pub const RESERVED_RESOURCE_NAMES: [&str; 7] = [
    "connection",
    "count",
    "depends_on",
    "for_each",
    "lifecycle",
    "provider",
    "provisioner",
];

const IMPLEMENTATION_ISSUE: &str = "When validating the schema, an implementation issue was found. \
This is always an issue with the provider and should be reported to the provider developers.\n\n";

/// Characters Terraform accepts in a schema field name.
fn is_field_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Field names that also start with a letter or underscore.
fn is_attribute_name(name: &str) -> bool {
    is_field_name(name) && !name.starts_with(|c: char| c.is_ascii_digit())
}

/// Identifies the attribute or block under implementation validation.
#[derive(Debug, Clone)]
pub struct ValidateImplementationRequest {
    pub name: String,
    /// Schema path made of attribute names only
    pub path: Path,
}

impl ValidateImplementationRequest {
    pub fn root(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: Path::root(name.clone()),
            name,
        }
    }

    fn child(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: self.path.at_name(name),
        }
    }
}

// Schema::validate

pub fn validate_schema(schema: &Schema) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for (name, attribute) in &schema.attributes {
        let path = Path::root(name);
        check_reserved_field_name(name, &path, &mut diagnostics);
        check_attribute(name, attribute, &path, &mut diagnostics);
    }
    for (name, block) in &schema.blocks {
        let path = Path::root(name);
        check_reserved_field_name(name, &path, &mut diagnostics);
        check_block(name, block, &path, &mut diagnostics);
    }
    diagnostics
}

fn check_field_name(name: &str, path: &Path, diagnostics: &mut Diagnostics) {
    if !is_field_name(name) {
        diagnostics.add_attribute_error(
            path.clone(),
            "Invalid Schema Field Name",
            format!(
                "Field name {:?} is invalid, the only allowed characters are a-z, 0-9 and _. \
                 This is always a problem with the provider and should be reported to the provider developer.",
                name
            ),
        );
    }
}

fn check_reserved_field_name(name: &str, path: &Path, diagnostics: &mut Diagnostics) {
    if RESERVED_RESOURCE_NAMES.contains(&name) {
        diagnostics.add_attribute_error(
            path.clone(),
            "Schema Using Reserved Field Name",
            format!("{:?} is a reserved field name", name),
        );
    }
}

fn check_attribute(name: &str, attribute: &Attribute, path: &Path, diagnostics: &mut Diagnostics) {
    check_field_name(name, path, diagnostics);
    if attribute.default.is_some() && !attribute.computed {
        diagnostics.add_attribute_error(
            path.clone(),
            "Schema Using Attribute Default For Non-Computed Attribute",
            format!("attribute \"{}\" must be computed when using default", path),
        );
    }
    if let Some(nested) = attribute.get_nested_object() {
        for (child_name, child) in &nested.attributes {
            check_attribute(child_name, child, &path.at_name(child_name), diagnostics);
        }
    }
}

fn check_block(name: &str, block: &Block, path: &Path, diagnostics: &mut Diagnostics) {
    check_field_name(name, path, diagnostics);
    let nested = block.get_nested_object();
    for (child_name, child) in &nested.blocks {
        check_block(child_name, child, &path.at_name(child_name), diagnostics);
    }
    for (child_name, child) in &nested.attributes {
        check_attribute(child_name, child, &path.at_name(child_name), diagnostics);
    }
}

// Schema::validate_implementation

pub fn validate_schema_implementation(schema: &Schema) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for (name, attribute) in &schema.attributes {
        let request = ValidateImplementationRequest::root(name);
        diagnostics.extend(reserved_root_name(&request.name, &request.path));
        validate_attribute_tree(attribute, &request, &mut diagnostics);
    }
    for (name, block) in &schema.blocks {
        let request = ValidateImplementationRequest::root(name);
        diagnostics.extend(reserved_root_name(&request.name, &request.path));
        validate_block_tree(block, &request, &mut diagnostics);
    }
    diagnostics
}

/// Reports a reserved resource meta-argument name. Only root paths are
/// checked; nested names cannot collide with meta-arguments.
pub fn reserved_root_name(name: &str, path: &Path) -> Option<Diagnostic> {
    if path.steps().len() != 1 || !RESERVED_RESOURCE_NAMES.contains(&name) {
        return None;
    }
    Some(Diagnostic::error(
        "Reserved Root Attribute/Block Name",
        format!(
            "When validating the resource or data source schema, an implementation issue was found. \
             This is always an issue with the provider and should be reported to the provider developers.\n\n\
             {:?} is a reserved root attribute/block name. \
             This is to prevent practitioners from needing special Terraform configuration syntax.",
            name
        ),
    ))
}

/// Reports a name Terraform cannot address in configuration.
pub fn invalid_attribute_name(name: &str, path: &Path) -> Option<Diagnostic> {
    if is_attribute_name(name) {
        return None;
    }
    let rule = if is_field_name(name) {
        "Names must begin with a lowercase alphabet character (a-z) or underscore (_) and \
         must only contain lowercase alphanumeric characters (a-z, 0-9) and underscores (_)."
    } else {
        "Names must only contain lowercase alphanumeric characters (a-z, 0-9) and underscores (_)."
    };
    Some(Diagnostic::error(
        "Invalid Attribute/Block Name",
        format!(
            "{}{:?} at schema path {:?} is an invalid attribute/block name. {}",
            IMPLEMENTATION_ISSUE,
            name,
            path.to_string(),
            rule
        ),
    ))
}

fn validate_attribute_tree(
    attribute: &Attribute,
    request: &ValidateImplementationRequest,
    diagnostics: &mut Diagnostics,
) {
    diagnostics.extend(invalid_attribute_name(&request.name, &request.path));
    attribute.validate_implementation(request, diagnostics);
    if let Some(nested) = attribute.get_nested_object() {
        for (name, child) in &nested.attributes {
            validate_attribute_tree(child, &request.child(name), diagnostics);
        }
    }
}

fn validate_block_tree(
    block: &Block,
    request: &ValidateImplementationRequest,
    diagnostics: &mut Diagnostics,
) {
    diagnostics.extend(invalid_attribute_name(&request.name, &request.path));
    block.validate_implementation(request, diagnostics);
    let nested = block.get_nested_object();
    for (name, child) in &nested.attributes {
        validate_attribute_tree(child, &request.child(name), diagnostics);
    }
    for (name, child) in &nested.blocks {
        validate_block_tree(child, &request.child(name), diagnostics);
    }
}

/// Definition checks for a single attribute, without recursing into its
/// nested attributes.
pub fn validate_attribute_implementation(
    attribute: &Attribute,
    request: &ValidateImplementationRequest,
    diagnostics: &mut Diagnostics,
) {
    let path = request.path.to_string();
    let no_custom_type = attribute.custom_type.is_none();

    match &attribute.kind {
        AttributeKind::List { element_type }
        | AttributeKind::Set { element_type }
        | AttributeKind::Map { element_type } => {
            if element_type.is_none() && no_custom_type {
                diagnostics.push(missing_type(&path, "ElementType", "collection"));
            }
            if no_custom_type && element_type.as_ref().is_some_and(AttributeType::uses_dynamic) {
                diagnostics.push(implementation_error(format!(
                    "{:?} is a collection type that contains a dynamic type. \
                     Dynamic types inside of collections are not currently supported in terraform-plugin-framework.",
                    path
                )));
            }
        }
        AttributeKind::Object { attribute_types } => {
            if attribute_types.is_none() && no_custom_type {
                diagnostics.push(missing_type(&path, "AttributeTypes", "object"));
            }
            if no_custom_type && attribute.get_type().contains_collection_with_dynamic() {
                diagnostics.push(implementation_error(format!(
                    "{:?} is an attribute that contains a collection type with a nested dynamic type. \
                     Dynamic types inside of collections are not currently supported in terraform-plugin-framework.",
                    path
                )));
            }
        }
        AttributeKind::ListNested(_) | AttributeKind::SetNested(_) | AttributeKind::MapNested(_) => {
            if no_custom_type && attribute.get_type().contains_collection_with_dynamic() {
                diagnostics.push(implementation_error(format!(
                    "{path:?} is an attribute that contains a collection type with a nested dynamic type.\n\n\
                     Dynamic types inside of collections are not currently supported in terraform-plugin-framework. \
                     If underlying dynamic values are required, replace the {path:?} attribute definition with DynamicAttribute instead."
                )));
            }
        }
        _ => {}
    }

    if let Some(nested) = attribute.get_nested_object() {
        if attribute.write_only && !contains_all_write_only_child_attributes(nested) {
            diagnostics.push(implementation_error(format!(
                "{:?} is a WriteOnly nested attribute that contains a non-WriteOnly child attribute.\n\n\
                 Every child attribute of a WriteOnly nested attribute must also have WriteOnly set to true.",
                path
            )));
        }
        if attribute.computed && contains_any_write_only_child_attributes(nested) {
            diagnostics.push(implementation_error(format!(
                "{:?} is a Computed nested attribute that contains a WriteOnly child attribute.\n\n\
                 Every child attribute of a Computed nested attribute must have WriteOnly set to false.",
                path
            )));
        }
    }

    if attribute.default.is_some() && !attribute.computed {
        diagnostics.push(Diagnostic::error(
            "Schema Using Attribute Default For Non-Computed Attribute",
            format!(
                "Attribute {:?} must be computed when using default. \
                 This is an issue with the provider and should be reported to the provider developers.",
                path
            ),
        ));
    }

    check_default_type(attribute, request, diagnostics);
}

/// The default's value must have the attribute's type. Collections are
/// compared on their element type.
fn check_default_type(
    attribute: &Attribute,
    request: &ValidateImplementationRequest,
    diagnostics: &mut Diagnostics,
) {
    let Some(response) = attribute.default_value(&request.path) else {
        return;
    };
    if response.diagnostics.has_error() {
        diagnostics.append(response.diagnostics);
        return;
    }

    let expected = attribute.get_type();
    let actual = response.plan_value.ty();
    let collection_element = match (&expected, actual) {
        (AttributeType::List(want), AttributeType::List(got))
        | (AttributeType::Set(want), AttributeType::Set(got))
        | (AttributeType::Map(want), AttributeType::Map(got)) => Some((want, got)),
        _ => None,
    };
    let detail = match collection_element {
        Some((want, got)) if want != got => Some(format!(
            "{:?} has a default value of element type {}, but the schema expects a type of {}. \
             The default value must match the type of the schema.",
            request.path.to_string(),
            got,
            want
        )),
        Some(_) => None,
        None if &expected != actual => Some(format!(
            "{:?} has a default value of type {}, but the schema expects a type of {}. \
             The default value must match the type of the schema.",
            request.path.to_string(),
            actual,
            expected
        )),
        None => None,
    };
    if let Some(detail) = detail {
        diagnostics.push(Diagnostic::error(
            "Invalid Attribute Implementation",
            format!("{}{}", IMPLEMENTATION_ISSUE, detail),
        ));
    }
}

/// Definition checks for a single block, without recursing into its nested
/// attributes and blocks.
pub fn validate_block_implementation(
    block: &Block,
    request: &ValidateImplementationRequest,
    diagnostics: &mut Diagnostics,
) {
    if block.custom_type.is_none() && block.get_type().contains_collection_with_dynamic() {
        let path = request.path.to_string();
        diagnostics.push(implementation_error(format!(
            "{path:?} is a block that contains a collection type with a nested dynamic type.\n\n\
             Dynamic types inside of collections are not currently supported in terraform-plugin-framework. \
             If underlying dynamic values are required, replace the {path:?} block definition with a DynamicAttribute."
        )));
    }
}

fn missing_type(path: &str, field: &str, kind: &str) -> Diagnostic {
    Diagnostic::error(
        "Invalid Attribute Implementation",
        format!(
            "{}{:?} is missing the CustomType or {} field on a {} Attribute. \
             One of these fields is required to prevent other unexpected errors or panics.",
            IMPLEMENTATION_ISSUE, path, field, kind
        ),
    )
}

fn implementation_error(detail: String) -> Diagnostic {
    Diagnostic::error(
        "Invalid Schema Implementation",
        format!("{}{}", IMPLEMENTATION_ISSUE, detail),
    )
}

/// True when every child attribute is write-only, following write-only
/// nested children down. An empty object qualifies.
pub fn contains_all_write_only_child_attributes(nested: &NestedAttributeObject) -> bool {
    nested.attributes.values().all(|child| {
        child.write_only
            && child
                .get_nested_object()
                .map_or(true, contains_all_write_only_child_attributes)
    })
}

/// True when any child attribute, at any depth, is write-only.
pub fn contains_any_write_only_child_attributes(nested: &NestedAttributeObject) -> bool {
    nested.attributes.values().any(|child| {
        child.write_only
            || child
                .get_nested_object()
                .is_some_and(contains_any_write_only_child_attributes)
    })
}

/// True when any attribute of the block, or of its nested blocks, is
/// write-only at any depth.
pub fn block_contains_any_write_only_child_attributes(block: &Block) -> bool {
    nested_block_contains_write_only(block.get_nested_object())
}

fn nested_block_contains_write_only(nested: &NestedBlockObject) -> bool {
    nested.attributes.values().any(|child| {
        child.write_only
            || child
                .get_nested_object()
                .is_some_and(contains_any_write_only_child_attributes)
    }) || nested
        .blocks
        .values()
        .any(block_contains_any_write_only_child_attributes)
}
