//! tfschema - Terraform resource schemas and plan modification for Rust
//!
//! The schema half of a Terraform provider: a three-state value model with
//! refinements, attribute and block definitions, path resolution, defaults,
//! the plan modifier pipeline and static schema validation. Wire transport
//! and server bootstrapping live elsewhere.

// Core modules
pub mod attribute_type;
pub mod diagnostics;
pub mod error;
pub mod path;
pub mod types;

// Schema definition modules
pub mod attribute;
pub mod block;
pub mod schema;

// Helper modules
pub mod defaults;
pub mod plan_modifier;
pub mod validator;

// Schema walks
pub mod config_validation;
pub mod plan;
pub mod validation;

// Re-exports for convenience
pub use attribute::{Attribute, AttributeKind, NestedAttributeObject};
pub use attribute_type::AttributeType;
pub use block::{Block, BlockKind, NestedBlockObject};
pub use config_validation::validate_config;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, PathStepError, Result};
pub use path::{Path, PathStep};
pub use plan::{modify_plan, ModifierErrorPolicy, ModifyPlanRequest, ModifyPlanResponse, PlanConfig};
pub use schema::{Schema, SchemaBuilder, SchemaNode};
pub use types::{PrivateData, Refinements, Value, ValueState};
