//! Structural attribute types
//!
//! Types describe the shape a value must conform to. They compare
//! structurally: two list types are equal when their element types are equal.

use crate::error::{Error, PathStepError};
use crate::path::PathStep;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    Bool,
    String,
    Number,
    Int32,
    Int64,
    Float32,
    Float64,
    Dynamic,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(BTreeMap<String, AttributeType>),
    Tuple(Vec<AttributeType>),
}

impl AttributeType {
    pub fn list(element: AttributeType) -> Self {
        AttributeType::List(Box::new(element))
    }

    pub fn set(element: AttributeType) -> Self {
        AttributeType::Set(Box::new(element))
    }

    pub fn map(element: AttributeType) -> Self {
        AttributeType::Map(Box::new(element))
    }

    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, AttributeType)>,
        K: Into<String>,
    {
        AttributeType::Object(
            attributes
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        )
    }

    /// Short kind name used in error messages, without element types.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeType::Bool => "BoolType",
            AttributeType::String => "StringType",
            AttributeType::Number => "NumberType",
            AttributeType::Int32 => "Int32Type",
            AttributeType::Int64 => "Int64Type",
            AttributeType::Float32 => "Float32Type",
            AttributeType::Float64 => "Float64Type",
            AttributeType::Dynamic => "DynamicType",
            AttributeType::List(_) => "ListType",
            AttributeType::Set(_) => "SetType",
            AttributeType::Map(_) => "MapType",
            AttributeType::Object(_) => "ObjectType",
            AttributeType::Tuple(_) => "TupleType",
        }
    }

    /// Element type of a list, set or map type.
    pub fn element_type(&self) -> Option<&AttributeType> {
        match self {
            AttributeType::List(elem) | AttributeType::Set(elem) | AttributeType::Map(elem) => {
                Some(elem)
            }
            _ => None,
        }
    }

    pub fn attribute_types(&self) -> Option<&BTreeMap<String, AttributeType>> {
        match self {
            AttributeType::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AttributeType::Number
                | AttributeType::Int32
                | AttributeType::Int64
                | AttributeType::Float32
                | AttributeType::Float64
        )
    }

    /// True when this type is, or contains at any depth, the dynamic type.
    pub fn uses_dynamic(&self) -> bool {
        match self {
            AttributeType::Dynamic => true,
            AttributeType::List(elem) | AttributeType::Set(elem) | AttributeType::Map(elem) => {
                elem.uses_dynamic()
            }
            AttributeType::Object(attrs) => attrs.values().any(AttributeType::uses_dynamic),
            AttributeType::Tuple(elems) => elems.iter().any(AttributeType::uses_dynamic),
            _ => false,
        }
    }

    /// True when this type contains a list, set or map whose element type
    /// uses the dynamic type. A bare dynamic type, or an object with a dynamic
    /// attribute, does not count.
    pub fn contains_collection_with_dynamic(&self) -> bool {
        match self {
            AttributeType::List(elem) | AttributeType::Set(elem) | AttributeType::Map(elem) => {
                elem.uses_dynamic()
            }
            AttributeType::Object(attrs) => attrs
                .values()
                .any(AttributeType::contains_collection_with_dynamic),
            AttributeType::Tuple(elems) => elems
                .iter()
                .any(AttributeType::contains_collection_with_dynamic),
            _ => false,
        }
    }

    /// Applies a single path step to the type, returning the type it leads to.
    ///
    /// Objects accept attribute names, lists and tuples accept integer keys,
    /// maps accept string keys and sets accept element values. The dynamic
    /// type accepts every step and yields itself since it carries no
    /// information about its underlying value.
    pub fn apply_path_step(&self, step: &PathStep) -> Result<AttributeType, PathStepError> {
        match (self, step) {
            (AttributeType::Dynamic, _) => Ok(AttributeType::Dynamic),
            (AttributeType::Object(attrs), PathStep::AttributeName(name)) => attrs
                .get(name)
                .cloned()
                .ok_or_else(|| PathStepError::NoSuchObjectAttribute {
                    name: name.clone(),
                    target: self.type_name().to_string(),
                }),
            (AttributeType::List(elem), PathStep::ElementKeyInt(_))
            | (AttributeType::Set(elem), PathStep::ElementKeyValue(_))
            | (AttributeType::Map(elem), PathStep::ElementKeyString(_)) => Ok((**elem).clone()),
            (AttributeType::Tuple(elems), PathStep::ElementKeyInt(idx)) => usize::try_from(*idx)
                .ok()
                .and_then(|i| elems.get(i))
                .cloned()
                .ok_or(PathStepError::IndexOutOfRange {
                    index: *idx,
                    target: self.type_name().to_string(),
                }),
            _ => Err(PathStepError::CannotApply {
                step: step.kind(),
                target: self.type_name().to_string(),
            }),
        }
    }

    /// Decodes Terraform's JSON type constraint encoding. Numbers decode as
    /// [`AttributeType::Number`] since the encoding does not keep the
    /// integer or float kind.
    pub fn from_type_json(json: &serde_json::Value) -> crate::error::Result<AttributeType> {
        let invalid = || Error::Conversion(format!("invalid type constraint {}", json));
        if let Some(name) = json.as_str() {
            return match name {
                "bool" => Ok(AttributeType::Bool),
                "string" => Ok(AttributeType::String),
                "number" => Ok(AttributeType::Number),
                "dynamic" => Ok(AttributeType::Dynamic),
                _ => Err(invalid()),
            };
        }
        let [kind, inner] = json.as_array().map(Vec::as_slice).ok_or_else(invalid)? else {
            return Err(invalid());
        };
        match kind.as_str().ok_or_else(invalid)? {
            "list" => Ok(AttributeType::list(Self::from_type_json(inner)?)),
            "set" => Ok(AttributeType::set(Self::from_type_json(inner)?)),
            "map" => Ok(AttributeType::map(Self::from_type_json(inner)?)),
            "object" => {
                let attrs = inner.as_object().ok_or_else(invalid)?;
                let attrs = attrs
                    .iter()
                    .map(|(name, ty)| Ok((name.clone(), Self::from_type_json(ty)?)))
                    .collect::<crate::error::Result<BTreeMap<_, _>>>()?;
                Ok(AttributeType::Object(attrs))
            }
            "tuple" => {
                let elems = inner.as_array().ok_or_else(invalid)?;
                let elems = elems
                    .iter()
                    .map(Self::from_type_json)
                    .collect::<crate::error::Result<Vec<_>>>()?;
                Ok(AttributeType::Tuple(elems))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::List(elem) | AttributeType::Set(elem) | AttributeType::Map(elem) => {
                write!(f, "{}[{}]", self.type_name(), elem)
            }
            AttributeType::Object(attrs) => {
                write!(f, "ObjectType[")?;
                for (i, (name, ty)) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}:{}", name, ty)?;
                }
                write!(f, "]")
            }
            AttributeType::Tuple(elems) => {
                write!(f, "TupleType[")?;
                for (i, ty) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, "]")
            }
            _ => f.write_str(self.type_name()),
        }
    }
}

/// Serializes to Terraform's JSON type constraint encoding, e.g. `"string"`
/// or `["list","string"]`. Integer and float kinds all encode as `"number"`.
impl Serialize for AttributeType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            AttributeType::Bool => serializer.serialize_str("bool"),
            AttributeType::String => serializer.serialize_str("string"),
            AttributeType::Number
            | AttributeType::Int32
            | AttributeType::Int64
            | AttributeType::Float32
            | AttributeType::Float64 => serializer.serialize_str("number"),
            AttributeType::Dynamic => serializer.serialize_str("dynamic"),
            AttributeType::List(elem) | AttributeType::Set(elem) | AttributeType::Map(elem) => {
                let kind = match self {
                    AttributeType::List(_) => "list",
                    AttributeType::Set(_) => "set",
                    _ => "map",
                };
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(kind)?;
                seq.serialize_element(elem.as_ref())?;
                seq.end()
            }
            AttributeType::Object(attrs) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("object")?;
                seq.serialize_element(&ObjectAttributes(attrs))?;
                seq.end()
            }
            AttributeType::Tuple(elems) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("tuple")?;
                seq.serialize_element(elems)?;
                seq.end()
            }
        }
    }
}

struct ObjectAttributes<'a>(&'a BTreeMap<String, AttributeType>);

impl Serialize for ObjectAttributes<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, ty) in self.0 {
            map.serialize_entry(name, ty)?;
        }
        map.end()
    }
}
