//! Plans an update to a small VM resource and prints what the pipeline did.
//!
//! Run with `cargo run --example plan_walkthrough` to see the debug logs
//! emitted around every provider defined default and plan modifier.

use tfschema::defaults::static_int64;
use tfschema::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfschema::{
    modify_plan, validate_config, Attribute, AttributeType, Block, ModifyPlanRequest,
    NestedBlockObject, PlanConfig, PrivateData, Schema, Value,
};

fn vm_schema() -> Schema {
    Schema::builder()
        .version(1)
        .description("A virtual machine")
        .attribute("id", Attribute::string().computed().plan_modifier(UseStateForUnknown))
        .attribute(
            "node",
            Attribute::string()
                .required()
                .description("Node hosting the VM")
                .plan_modifier(RequiresReplace),
        )
        .attribute(
            "memory",
            Attribute::int64()
                .optional()
                .computed()
                .description("Memory in MiB")
                .default(static_int64(512)),
        )
        .block(
            "disk",
            Block::list(
                NestedBlockObject::new()
                    .attribute("size", Attribute::int64().required().plan_modifier(RequiresReplace)),
            ),
        )
        .build()
}

fn disks(sizes: &[i64]) -> tfschema::Result<Value> {
    let ty = AttributeType::object([("size", AttributeType::Int64)]);
    Value::list(
        ty,
        sizes
            .iter()
            .map(|size| Value::object_from([("size", Value::int64(*size))]))
            .collect(),
    )
}

fn vm(id: Value, node: &str, memory: Value, disk: Value) -> Value {
    Value::object_from([
        ("disk", disk),
        ("id", id),
        ("memory", memory),
        ("node", Value::string(node)),
    ])
}

fn main() -> tfschema::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let schema = vm_schema();
    let diagnostics = schema.validate();
    println!("schema diagnostics: {}", diagnostics.len());

    let config = vm(
        Value::null(AttributeType::String),
        "pve-2",
        Value::null(AttributeType::Int64),
        disks(&[32, 64])?,
    );
    let proposed = vm(
        Value::unknown(AttributeType::String),
        "pve-2",
        Value::unknown(AttributeType::Int64),
        disks(&[32, 64])?,
    );
    let state = vm(Value::string("vm-100"), "pve-1", Value::int64(512), disks(&[32, 32])?);

    let config_diagnostics = validate_config(&schema, &config);
    for diagnostic in config_diagnostics.iter() {
        println!("config: {}", diagnostic);
    }

    let response = modify_plan(
        &schema,
        &ModifyPlanRequest {
            config: &config,
            plan: &proposed,
            state: &state,
            private: PrivateData::new(),
        },
        &PlanConfig::default(),
    );

    println!("planned: {}", serde_json::to_string_pretty(&response.plan.to_json()?)?);
    for path in &response.requires_replace {
        println!("requires replace: {}", path);
    }
    for diagnostic in response.diagnostics.iter() {
        println!("plan: {}", diagnostic);
    }
    Ok(())
}
