//! End to end plan modification over whole resource schemas

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use pretty_assertions::assert_eq;
use tfschema::defaults::{static_bool, static_string};
use tfschema::plan_modifier::{
    PlanModifier, PlanModifyRequest, PlanModifyResponse, RequiresReplace,
    RequiresReplaceIfConfigured, UseStateForUnknown,
};
use tfschema::{
    modify_plan, Attribute, AttributeType, Block, ModifierErrorPolicy, ModifyPlanRequest,
    NestedBlockObject, Path, PlanConfig, PrivateData, Schema, Value,
};

fn instance_schema() -> Schema {
    Schema::builder()
        .version(1)
        .attribute("id", Attribute::string().computed().plan_modifier(UseStateForUnknown))
        .attribute(
            "region",
            Attribute::string().required().plan_modifier(RequiresReplace),
        )
        .attribute(
            "name",
            Attribute::string().optional().plan_modifier(RequiresReplaceIfConfigured),
        )
        .attribute(
            "tier",
            Attribute::string().optional().computed().default(static_string("standard")),
        )
        .block(
            "disk",
            Block::list(
                NestedBlockObject::new()
                    .attribute("size", Attribute::int64().required().plan_modifier(RequiresReplace))
                    .attribute("boot", Attribute::bool().optional().computed().default(static_bool(false))),
            ),
        )
        .build()
}

fn disk_type() -> AttributeType {
    AttributeType::object([("boot", AttributeType::Bool), ("size", AttributeType::Int64)])
}

fn disks(entries: &[(Value, i64)]) -> Value {
    Value::list(
        disk_type(),
        entries
            .iter()
            .map(|(boot, size)| Value::object_from([("boot", boot.clone()), ("size", Value::int64(*size))]))
            .collect(),
    )
    .unwrap()
}

fn instance(id: Value, region: &str, name: Value, tier: Value, disk: Value) -> Value {
    Value::object_from([
        ("disk", disk),
        ("id", id),
        ("name", name),
        ("region", Value::string(region)),
        ("tier", tier),
    ])
}

fn plan(schema: &Schema, config: &Value, plan: &Value, state: &Value) -> tfschema::ModifyPlanResponse {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
    modify_plan(
        schema,
        &ModifyPlanRequest {
            config,
            plan,
            state,
            private: PrivateData::new(),
        },
        &PlanConfig::default(),
    )
}

#[test]
fn create_fills_defaults_and_leaves_id_unknown() {
    let schema = instance_schema();
    let unknown_string = Value::unknown(AttributeType::String);
    let null_string = Value::null(AttributeType::String);
    let config = instance(
        null_string.clone(),
        "us-east",
        null_string.clone(),
        null_string.clone(),
        disks(&[(Value::null(AttributeType::Bool), 10)]),
    );
    let proposed = instance(
        unknown_string.clone(),
        "us-east",
        null_string.clone(),
        unknown_string.clone(),
        disks(&[(Value::unknown(AttributeType::Bool), 10)]),
    );
    let state = Value::null(schema.get_type());

    let response = plan(&schema, &config, &proposed, &state);

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert!(response.requires_replace.is_empty());
    assert_eq!(
        response.plan,
        instance(
            unknown_string,
            "us-east",
            null_string,
            Value::string("standard"),
            disks(&[(Value::bool(false), 10)]),
        )
    );
}

#[test]
fn update_keeps_state_id_and_collects_replacement_paths() {
    let schema = instance_schema();
    let null_string = Value::null(AttributeType::String);
    let config = instance(
        null_string.clone(),
        "eu-west",
        Value::string("web-2"),
        null_string,
        disks(&[(Value::null(AttributeType::Bool), 10), (Value::null(AttributeType::Bool), 50)]),
    );
    let proposed = instance(
        Value::unknown(AttributeType::String),
        "eu-west",
        Value::string("web-2"),
        Value::string("standard"),
        disks(&[(Value::bool(true), 10), (Value::bool(false), 50)]),
    );
    let state = instance(
        Value::string("i-123"),
        "us-east",
        Value::string("web-1"),
        Value::string("standard"),
        disks(&[(Value::bool(true), 10), (Value::bool(false), 20)]),
    );

    let response = plan(&schema, &config, &proposed, &state);

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response.plan.attributes().unwrap()["id"],
        Value::string("i-123")
    );
    assert_eq!(
        response.requires_replace,
        vec![
            Path::root("disk").at_list_index(1).at_name("size"),
            Path::root("name"),
            Path::root("region"),
        ]
    );
}

#[test]
fn unconfigured_change_does_not_require_replace() {
    let schema = instance_schema();
    let null_string = Value::null(AttributeType::String);
    let config = instance(
        null_string.clone(),
        "us-east",
        null_string.clone(),
        null_string.clone(),
        disks(&[]),
    );
    let proposed = instance(
        Value::string("i-123"),
        "us-east",
        null_string,
        Value::string("standard"),
        disks(&[]),
    );
    let state = instance(
        Value::string("i-123"),
        "us-east",
        Value::string("web-1"),
        Value::string("standard"),
        disks(&[]),
    );

    let response = plan(&schema, &config, &proposed, &state);

    assert!(response.requires_replace.is_empty());
}

/// Records that it ran in private state.
struct MarkPrivate;

impl PlanModifier for MarkPrivate {
    fn description(&self) -> String {
        "marks private state".to_string()
    }

    fn modify_plan(&self, _request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        if let Err(err) = response.private.set_key("marked", b"true".to_vec()) {
            response
                .diagnostics
                .add_error("Private State Error", err.to_string());
        }
    }
}

/// Copies whether the private mark was visible into the plan.
struct ReadPrivate;

impl PlanModifier for ReadPrivate {
    fn description(&self) -> String {
        "reads private state".to_string()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        response.plan_value = Value::bool(request.private.get_key("marked").is_some());
    }
}

#[test]
fn private_state_flows_between_attributes() {
    let schema = Schema::builder()
        .attribute("a_writer", Attribute::string().optional().plan_modifier(MarkPrivate))
        .attribute("b_reader", Attribute::bool().computed().plan_modifier(ReadPrivate))
        .build();
    let config = Value::object_from([
        ("a_writer", Value::string("x")),
        ("b_reader", Value::null(AttributeType::Bool)),
    ]);
    let proposed = Value::object_from([
        ("a_writer", Value::string("x")),
        ("b_reader", Value::unknown(AttributeType::Bool)),
    ]);
    let state = Value::null(schema.get_type());

    let response = plan(&schema, &config, &proposed, &state);

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.private.get_key("marked"), Some(&b"true"[..]));
    assert_eq!(response.plan.attributes().unwrap()["b_reader"], Value::bool(true));
}

/// Always reports an error.
struct Reject;

impl PlanModifier for Reject {
    fn description(&self) -> String {
        "rejects every plan".to_string()
    }

    fn modify_plan(&self, request: &PlanModifyRequest<'_>, response: &mut PlanModifyResponse) {
        response
            .diagnostics
            .add_attribute_error(request.path.clone(), "Rejected", "plan rejected");
    }
}

#[test]
fn stop_policy_keeps_replacement_flagged_before_error() {
    let schema = Schema::builder()
        .attribute(
            "region",
            Attribute::string()
                .required()
                .plan_modifier(RequiresReplace)
                .plan_modifier(Reject),
        )
        .attribute(
            "zone",
            Attribute::string()
                .required()
                .plan_modifier(Reject)
                .plan_modifier(RequiresReplace),
        )
        .build();
    let config = Value::object_from([
        ("region", Value::string("eu-west")),
        ("zone", Value::string("b")),
    ]);
    let state = Value::object_from([
        ("region", Value::string("us-east")),
        ("zone", Value::string("a")),
    ]);
    let run = |policy| {
        modify_plan(
            &schema,
            &ModifyPlanRequest {
                config: &config,
                plan: &config,
                state: &state,
                private: PrivateData::new(),
            },
            &PlanConfig::new().with_error_policy(policy),
        )
    };

    let continued = run(ModifierErrorPolicy::Continue);
    assert_eq!(continued.diagnostics.len(), 2);
    assert_eq!(
        continued.requires_replace,
        vec![Path::root("region"), Path::root("zone")]
    );

    let stopped = run(ModifierErrorPolicy::StopAttribute);
    assert_eq!(stopped.diagnostics.len(), 2);
    assert_eq!(stopped.requires_replace, vec![Path::root("region")]);
    assert_eq!(
        stopped.diagnostics.as_slice()[0].path,
        Some(Path::root("region"))
    );
}

#[test]
fn unknown_plan_is_returned_untouched() {
    let schema = instance_schema();
    let proposed = Value::unknown(schema.get_type());
    let config = Value::null(schema.get_type());

    let response = plan(&schema, &config, &proposed, &config);

    assert_eq!(response.plan, proposed);
    assert!(response.diagnostics.is_empty());
}
