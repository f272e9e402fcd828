//! Core value system for tfschema
//!
//! Every attribute value is in exactly one of three states: Known (carries a
//! payload), Null, or Unknown (determined during apply). Unknown values may
//! carry [`Refinements`], sound facts about the value they will become.
//!
//! A [`Value`] always carries its [`AttributeType`], so equality is type
//! aware: a null string and a null bool are different values.

use crate::attribute_type::AttributeType;
use crate::error::{Error, Result};
use crate::path::{Path, PathStep};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix refinements longer than this are truncated.
pub const MAX_PREFIX_LENGTH: usize = 256;

/// Bound value of a numeric refinement, kept in the value's own number kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundValue {
    Int(i64),
    Float(f64),
    Number(f64),
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Int(i) => write!(f, "{}", i),
            BoundValue::Float(v) => write!(f, "{:.6}", v),
            BoundValue::Number(v) => write!(f, "{}", v),
        }
    }
}

/// A lower or upper bound refinement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: BoundValue,
    pub inclusive: bool,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.inclusive { "inclusive" } else { "exclusive" };
        write!(f, "{} ({})", self.value, kind)
    }
}

/// Refinements carried by an unknown value.
///
/// Only unknown values hold refinements; a null or known value never does.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Refinements {
    not_null: bool,
    prefix: Option<String>,
    lower_bound: Option<Bound>,
    upper_bound: Option<Bound>,
}

impl Refinements {
    pub fn is_empty(&self) -> bool {
        !self.not_null
            && self.prefix.is_none()
            && self.lower_bound.is_none()
            && self.upper_bound.is_none()
    }

    pub fn not_null(&self) -> bool {
        self.not_null
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn lower_bound(&self) -> Option<&Bound> {
        self.lower_bound.as_ref()
    }

    pub fn upper_bound(&self) -> Option<&Bound> {
        self.upper_bound.as_ref()
    }
}

impl fmt::Display for Refinements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.not_null {
            parts.push("not null".to_string());
        }
        if let Some(prefix) = &self.prefix {
            parts.push(format!("prefix = {:?}", prefix));
        }
        if let Some(bound) = &self.lower_bound {
            parts.push(format!("lower bound = {}", bound));
        }
        if let Some(bound) = &self.upper_bound {
            parts.push(format!("upper bound = {}", bound));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Payload of a known value
#[derive(Debug, Clone)]
pub enum Payload {
    Bool(bool),
    String(String),
    /// Int32 and Int64 values
    Int(i64),
    /// Number, Float32 and Float64 values
    Float(f64),
    List(Vec<Value>),
    /// Set elements, compared without regard to order
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(BTreeMap<String, Value>),
    Tuple(Vec<Value>),
    /// Underlying value of a dynamic value
    Dynamic(Box<Value>),
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::String(a), Payload::String(b)) => a == b,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b,
            (Payload::List(a), Payload::List(b)) | (Payload::Tuple(a), Payload::Tuple(b)) => a == b,
            (Payload::Set(a), Payload::Set(b)) => {
                a.len() == b.len()
                    && a.iter().all(|x| b.contains(x))
                    && b.iter().all(|y| a.contains(y))
            }
            (Payload::Map(a), Payload::Map(b)) | (Payload::Object(a), Payload::Object(b)) => a == b,
            (Payload::Dynamic(a), Payload::Dynamic(b)) => a == b,
            _ => false,
        }
    }
}

/// The three states a value may occupy
#[derive(Debug, Clone, PartialEq)]
pub enum ValueState {
    Known(Payload),
    Null,
    Unknown(Refinements),
}

/// Value is a typed attribute value in one of the Known, Null or Unknown states
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    ty: AttributeType,
    state: ValueState,
}

impl Value {
    fn known(ty: AttributeType, payload: Payload) -> Self {
        Self {
            ty,
            state: ValueState::Known(payload),
        }
    }

    pub fn null(ty: AttributeType) -> Self {
        Self {
            ty,
            state: ValueState::Null,
        }
    }

    pub fn unknown(ty: AttributeType) -> Self {
        Self {
            ty,
            state: ValueState::Unknown(Refinements::default()),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self::known(AttributeType::Bool, Payload::Bool(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::known(AttributeType::String, Payload::String(value.into()))
    }

    pub fn int32(value: i32) -> Self {
        Self::known(AttributeType::Int32, Payload::Int(i64::from(value)))
    }

    pub fn int64(value: i64) -> Self {
        Self::known(AttributeType::Int64, Payload::Int(value))
    }

    pub fn float32(value: f32) -> Self {
        Self::known(AttributeType::Float32, Payload::Float(f64::from(value)))
    }

    pub fn float64(value: f64) -> Self {
        Self::known(AttributeType::Float64, Payload::Float(value))
    }

    pub fn number(value: f64) -> Self {
        Self::known(AttributeType::Number, Payload::Float(value))
    }

    /// Builds a known list, checking every element against `element_type`.
    pub fn list(element_type: AttributeType, elements: Vec<Value>) -> Result<Self> {
        check_elements(&element_type, &elements)?;
        Ok(Self::known(
            AttributeType::list(element_type),
            Payload::List(elements),
        ))
    }

    /// Builds a known set, checking every element against `element_type`.
    /// Duplicate elements collapse into the first occurrence.
    pub fn set(element_type: AttributeType, elements: Vec<Value>) -> Result<Self> {
        check_elements(&element_type, &elements)?;
        let mut unique: Vec<Value> = Vec::with_capacity(elements.len());
        for element in elements {
            if !unique.contains(&element) {
                unique.push(element);
            }
        }
        Ok(Self::known(
            AttributeType::set(element_type),
            Payload::Set(unique),
        ))
    }

    /// Builds a known map, checking every element against `element_type`.
    pub fn map(element_type: AttributeType, elements: BTreeMap<String, Value>) -> Result<Self> {
        check_elements(&element_type, elements.values())?;
        Ok(Self::known(
            AttributeType::map(element_type),
            Payload::Map(elements),
        ))
    }

    /// Builds a known object. The attribute names must match `attribute_types`
    /// exactly and every value must have its declared type.
    pub fn object(
        attribute_types: BTreeMap<String, AttributeType>,
        attributes: BTreeMap<String, Value>,
    ) -> Result<Self> {
        for (name, ty) in &attribute_types {
            match attributes.get(name) {
                Some(value) if value.ty() == ty => {}
                Some(value) => {
                    return Err(Error::TypeMismatch {
                        expected: format!("{} for attribute {:?}", ty, name),
                        actual: value.ty().to_string(),
                    })
                }
                None => {
                    return Err(Error::Conversion(format!(
                        "missing value for object attribute {:?}",
                        name
                    )))
                }
            }
        }
        if let Some(extra) = attributes.keys().find(|k| !attribute_types.contains_key(*k)) {
            return Err(Error::Conversion(format!(
                "undeclared object attribute {:?}",
                extra
            )));
        }
        Ok(Self::known(
            AttributeType::Object(attribute_types),
            Payload::Object(attributes),
        ))
    }

    /// Builds a known object whose type is derived from the given values.
    pub fn object_from<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let attributes: BTreeMap<String, Value> = attributes
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        let types = attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.ty.clone()))
            .collect();
        Self::known(AttributeType::Object(types), Payload::Object(attributes))
    }

    pub fn tuple(element_types: Vec<AttributeType>, elements: Vec<Value>) -> Result<Self> {
        if element_types.len() != elements.len() {
            return Err(Error::Conversion(format!(
                "tuple expects {} elements, got {}",
                element_types.len(),
                elements.len()
            )));
        }
        for (ty, value) in element_types.iter().zip(&elements) {
            if value.ty() != ty {
                return Err(Error::TypeMismatch {
                    expected: ty.to_string(),
                    actual: value.ty().to_string(),
                });
            }
        }
        Ok(Self::known(
            AttributeType::Tuple(element_types),
            Payload::Tuple(elements),
        ))
    }

    /// Wraps a value as a known dynamic value.
    pub fn dynamic(underlying: Value) -> Self {
        Self::known(AttributeType::Dynamic, Payload::Dynamic(Box::new(underlying)))
    }

    pub fn ty(&self) -> &AttributeType {
        &self.ty
    }

    pub fn state(&self) -> &ValueState {
        &self.state
    }

    pub fn is_null(&self) -> bool {
        matches!(self.state, ValueState::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.state, ValueState::Unknown(_))
    }

    pub fn is_known(&self) -> bool {
        matches!(self.state, ValueState::Known(_))
    }

    /// True when this value or anything nested inside it is unknown.
    pub fn is_fully_known(&self) -> bool {
        match &self.state {
            ValueState::Null => true,
            ValueState::Unknown(_) => false,
            ValueState::Known(payload) => match payload {
                Payload::List(elems) | Payload::Set(elems) | Payload::Tuple(elems) => {
                    elems.iter().all(Value::is_fully_known)
                }
                Payload::Map(elems) | Payload::Object(elems) => {
                    elems.values().all(Value::is_fully_known)
                }
                Payload::Dynamic(inner) => inner.is_fully_known(),
                _ => true,
            },
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.state {
            ValueState::Known(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.payload()? {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.payload()? {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.payload()? {
            Payload::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric payload as f64, for both integer and float kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match self.payload()? {
            Payload::Float(f) => Some(*f),
            Payload::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Elements of a known list, set or tuple.
    pub fn elements(&self) -> Option<&[Value]> {
        match self.payload()? {
            Payload::List(elems) | Payload::Set(elems) | Payload::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    pub fn elements_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.state {
            ValueState::Known(
                Payload::List(elems) | Payload::Set(elems) | Payload::Tuple(elems),
            ) => Some(elems),
            _ => None,
        }
    }

    /// Entries of a known map or attributes of a known object.
    pub fn attributes(&self) -> Option<&BTreeMap<String, Value>> {
        match self.payload()? {
            Payload::Map(attrs) | Payload::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match &mut self.state {
            ValueState::Known(Payload::Map(attrs) | Payload::Object(attrs)) => Some(attrs),
            _ => None,
        }
    }

    /// Underlying value of a known dynamic value.
    pub fn underlying(&self) -> Option<&Value> {
        match self.payload()? {
            Payload::Dynamic(inner) => Some(inner),
            _ => None,
        }
    }

    /// Number of elements of a known collection.
    pub fn len(&self) -> Option<usize> {
        match self.payload()? {
            Payload::List(elems) | Payload::Set(elems) | Payload::Tuple(elems) => {
                Some(elems.len())
            }
            Payload::Map(elems) | Payload::Object(elems) => Some(elems.len()),
            Payload::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn refinements(&self) -> Option<&Refinements> {
        match &self.state {
            ValueState::Unknown(refinements) => Some(refinements),
            _ => None,
        }
    }

    /// True when the value is unknown and refined to never become null.
    pub fn not_null_refinement(&self) -> bool {
        self.refinements().is_some_and(Refinements::not_null)
    }

    pub fn prefix_refinement(&self) -> Option<&str> {
        self.refinements().and_then(Refinements::prefix)
    }

    pub fn lower_bound_refinement(&self) -> Option<&Bound> {
        self.refinements().and_then(Refinements::lower_bound)
    }

    pub fn upper_bound_refinement(&self) -> Option<&Bound> {
        self.refinements().and_then(Refinements::upper_bound)
    }

    fn refine(&self, apply: impl FnOnce(&mut Refinements)) -> Value {
        match &self.state {
            ValueState::Unknown(refinements) => {
                let mut refinements = refinements.clone();
                refinements.not_null = true;
                apply(&mut refinements);
                Value {
                    ty: self.ty.clone(),
                    state: ValueState::Unknown(refinements),
                }
            }
            _ => self.clone(),
        }
    }

    /// Returns an unknown value that will not be null once known.
    ///
    /// Known and null values are returned unchanged. Refining twice is the
    /// same as refining once.
    pub fn refine_as_not_null(&self) -> Value {
        self.refine(|_| {})
    }

    /// Returns an unknown string that will start with `prefix` once known.
    /// Also implies not null. Empty prefixes are ignored and long prefixes
    /// truncated. Non-string values are returned unchanged.
    pub fn refine_with_prefix(&self, prefix: &str) -> Value {
        if self.ty != AttributeType::String {
            return self.clone();
        }
        self.refine(|refinements| {
            if !prefix.is_empty() {
                refinements.prefix = Some(prefix.chars().take(MAX_PREFIX_LENGTH).collect());
            }
        })
    }

    /// Returns an unknown number that will not be below `bound` once known.
    /// Also implies not null. Non-numeric values are returned unchanged.
    ///
    /// Integer values round a fractional bound up to the next integer, which
    /// then becomes inclusive.
    pub fn refine_with_lower_bound(&self, bound: f64, inclusive: bool) -> Value {
        let bound = match self.ty {
            AttributeType::Int32 | AttributeType::Int64 if bound.fract() != 0.0 => {
                self.bound_value(bound.ceil()).map(|value| Bound { value, inclusive: true })
            }
            _ => self.bound_value(bound).map(|value| Bound { value, inclusive }),
        };
        match bound {
            Some(bound) => self.refine(|r| r.lower_bound = Some(bound)),
            None => self.clone(),
        }
    }

    /// Returns an unknown number that will not be above `bound` once known.
    /// Also implies not null. Non-numeric values are returned unchanged.
    ///
    /// Integer values round a fractional bound down, inclusively.
    pub fn refine_with_upper_bound(&self, bound: f64, inclusive: bool) -> Value {
        let bound = match self.ty {
            AttributeType::Int32 | AttributeType::Int64 if bound.fract() != 0.0 => {
                self.bound_value(bound.floor()).map(|value| Bound { value, inclusive: true })
            }
            _ => self.bound_value(bound).map(|value| Bound { value, inclusive }),
        };
        match bound {
            Some(bound) => self.refine(|r| r.upper_bound = Some(bound)),
            None => self.clone(),
        }
    }

    fn bound_value(&self, bound: f64) -> Option<BoundValue> {
        match self.ty {
            AttributeType::Int32 | AttributeType::Int64 => Some(BoundValue::Int(bound as i64)),
            AttributeType::Float32 | AttributeType::Float64 => Some(BoundValue::Float(bound)),
            AttributeType::Number => Some(BoundValue::Number(bound)),
            _ => None,
        }
    }

    /// Returns the value at `path` relative to this value.
    ///
    /// Stepping into a null or unknown value yields a null or unknown value of
    /// the stepped type. Missing list indexes and map keys yield null.
    pub fn value_at_path(&self, path: &Path) -> Result<Value> {
        let mut current = self.clone();
        for step in path.steps() {
            current = current.apply_path_step(step)?;
        }
        Ok(current)
    }

    fn apply_path_step(&self, step: &PathStep) -> Result<Value> {
        if let Some(inner) = self.underlying() {
            return inner.apply_path_step(step);
        }
        let ty = self.ty.apply_path_step(step)?;
        let payload = match &self.state {
            ValueState::Null => return Ok(Value::null(ty)),
            ValueState::Unknown(_) => return Ok(Value::unknown(ty)),
            ValueState::Known(payload) => payload,
        };
        let found = match (payload, step) {
            (Payload::Object(attrs), PathStep::AttributeName(name))
            | (Payload::Map(attrs), PathStep::ElementKeyString(name)) => attrs.get(name).cloned(),
            (Payload::List(elems) | Payload::Tuple(elems), PathStep::ElementKeyInt(idx)) => {
                usize::try_from(*idx).ok().and_then(|i| elems.get(i)).cloned()
            }
            (Payload::Set(elems), PathStep::ElementKeyValue(wanted)) => {
                elems.iter().find(|e| *e == wanted).cloned()
            }
            _ => None,
        };
        Ok(found.unwrap_or_else(|| Value::null(ty)))
    }

    /// Encodes the value as JSON, the way Terraform encodes state.
    ///
    /// Unknown values have no JSON form and produce an error. Dynamic values
    /// encode as `{"value": ..., "type": ...}`.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        if !self.is_fully_known() {
            return Err(Error::UnknownValue(self.ty.to_string()));
        }
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes a JSON value of the given type.
    pub fn from_json(ty: &AttributeType, json: &serde_json::Value) -> Result<Value> {
        if json.is_null() {
            return Ok(Value::null(ty.clone()));
        }

        let mismatch = || Error::TypeMismatch {
            expected: ty.to_string(),
            actual: json_kind(json).to_string(),
        };

        match ty {
            AttributeType::Bool => json.as_bool().map(Value::bool).ok_or_else(mismatch),
            AttributeType::String => json.as_str().map(Value::string).ok_or_else(mismatch),
            AttributeType::Int32 => {
                let i = json.as_i64().ok_or_else(mismatch)?;
                let i = i32::try_from(i)
                    .map_err(|_| Error::Conversion(format!("{} overflows Int32", i)))?;
                Ok(Value::int32(i))
            }
            AttributeType::Int64 => json.as_i64().map(Value::int64).ok_or_else(mismatch),
            AttributeType::Float32 => json
                .as_f64()
                .map(|f| Value::float32(f as f32))
                .ok_or_else(mismatch),
            AttributeType::Float64 => json.as_f64().map(Value::float64).ok_or_else(mismatch),
            AttributeType::Number => json.as_f64().map(Value::number).ok_or_else(mismatch),
            AttributeType::List(elem) | AttributeType::Set(elem) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                let elements = items
                    .iter()
                    .map(|item| Value::from_json(elem, item))
                    .collect::<Result<Vec<_>>>()?;
                if matches!(ty, AttributeType::List(_)) {
                    Value::list((**elem).clone(), elements)
                } else {
                    Value::set((**elem).clone(), elements)
                }
            }
            AttributeType::Map(elem) => {
                let entries = json.as_object().ok_or_else(mismatch)?;
                let elements = entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_json(elem, v)?)))
                    .collect::<Result<BTreeMap<_, _>>>()?;
                Value::map((**elem).clone(), elements)
            }
            AttributeType::Object(attr_types) => {
                let entries = json.as_object().ok_or_else(mismatch)?;
                if let Some(extra) = entries.keys().find(|k| !attr_types.contains_key(*k)) {
                    return Err(Error::Conversion(format!(
                        "unsupported attribute {:?}",
                        extra
                    )));
                }
                let attributes = attr_types
                    .iter()
                    .map(|(name, attr_ty)| {
                        let value = match entries.get(name) {
                            Some(v) => Value::from_json(attr_ty, v)?,
                            None => Value::null(attr_ty.clone()),
                        };
                        Ok((name.clone(), value))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?;
                Value::object(attr_types.clone(), attributes)
            }
            AttributeType::Tuple(elem_types) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                if items.len() != elem_types.len() {
                    return Err(mismatch());
                }
                let elements = elem_types
                    .iter()
                    .zip(items)
                    .map(|(t, item)| Value::from_json(t, item))
                    .collect::<Result<Vec<_>>>()?;
                Value::tuple(elem_types.clone(), elements)
            }
            AttributeType::Dynamic => {
                let (Some(type_json), Some(value_json)) = (json.get("type"), json.get("value"))
                else {
                    return Err(Error::Conversion(
                        "dynamic value must be encoded as {\"value\", \"type\"}".to_string(),
                    ));
                };
                let underlying_ty = AttributeType::from_type_json(type_json)?;
                match &underlying_ty {
                    AttributeType::Dynamic => Err(Error::Conversion(
                        "dynamic value cannot have dynamic underlying type".to_string(),
                    )),
                    _ => Ok(Value::dynamic(Value::from_json(&underlying_ty, value_json)?)),
                }
            }
        }
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn check_elements<'a>(
    element_type: &AttributeType,
    elements: impl IntoIterator<Item = &'a Value>,
) -> Result<()> {
    for element in elements {
        if element.ty() != element_type {
            return Err(Error::TypeMismatch {
                expected: element_type.to_string(),
                actual: element.ty().to_string(),
            });
        }
    }
    Ok(())
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let payload = match &self.state {
            ValueState::Null => return serializer.serialize_unit(),
            ValueState::Unknown(_) => {
                return Err(S::Error::custom(Error::UnknownValue(self.ty.to_string())))
            }
            ValueState::Known(payload) => payload,
        };
        match payload {
            Payload::Bool(b) => serializer.serialize_bool(*b),
            Payload::String(s) => serializer.serialize_str(s),
            Payload::Int(i) => serializer.serialize_i64(*i),
            Payload::Float(f) => {
                if f.is_finite() {
                    serializer.serialize_f64(*f)
                } else {
                    Err(S::Error::custom(format!("{} has no JSON encoding", f)))
                }
            }
            Payload::List(elems) | Payload::Set(elems) | Payload::Tuple(elems) => {
                let mut seq = serializer.serialize_seq(Some(elems.len()))?;
                for elem in elems {
                    seq.serialize_element(elem)?;
                }
                seq.end()
            }
            Payload::Map(entries) | Payload::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Payload::Dynamic(inner) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("value", inner.as_ref())?;
                map.serialize_entry("type", inner.ty())?;
                map.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = match &self.state {
            ValueState::Null => return f.write_str("<null>"),
            ValueState::Unknown(refinements) if refinements.is_empty() => {
                return f.write_str("<unknown>")
            }
            ValueState::Unknown(refinements) => return write!(f, "<unknown, {}>", refinements),
            ValueState::Known(payload) => payload,
        };
        match payload {
            Payload::Bool(b) => write!(f, "{}", b),
            Payload::String(s) => write!(f, "{:?}", s),
            Payload::Int(i) => write!(f, "{}", i),
            Payload::Float(v) => write!(f, "{}", v),
            Payload::List(elems) | Payload::Set(elems) | Payload::Tuple(elems) => {
                f.write_str("[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", elem)?;
                }
                f.write_str("]")
            }
            Payload::Map(entries) | Payload::Object(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{:?}:{}", k, v)?;
                }
                f.write_str("}")
            }
            Payload::Dynamic(inner) => write!(f, "{}", inner),
        }
    }
}

/// Provider-private data threaded through plan modification.
///
/// Values must be valid UTF-8 JSON. Keys starting with a period are reserved
/// for the framework.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrivateData {
    data: BTreeMap<String, Vec<u8>>,
}

impl PrivateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_key(&self, key: &str) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Stores `value` under `key`. An empty value removes the key.
    pub fn set_key(&mut self, key: &str, value: impl Into<Vec<u8>>) -> Result<()> {
        if key.starts_with('.') {
            return Err(Error::PrivateState(format!(
                "key {:?} is reserved for framework usage",
                key
            )));
        }
        let value = value.into();
        if value.is_empty() {
            self.data.remove(key);
            return Ok(());
        }
        if std::str::from_utf8(&value).is_err() {
            return Err(Error::PrivateState(format!(
                "value for key {:?} is not valid UTF-8",
                key
            )));
        }
        serde_json::from_slice::<serde_json::Value>(&value).map_err(|e| {
            Error::PrivateState(format!("value for key {:?} is not valid JSON: {}", key, e))
        })?;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Encodes all keys as a single JSON object of raw JSON values.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut object = serde_json::Map::new();
        for (key, raw) in &self.data {
            object.insert(key.clone(), serde_json::from_slice(raw)?);
        }
        Ok(serde_json::to_vec(&object)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::new());
        }
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(bytes)?;
        let mut data = Self::new();
        for (key, value) in object {
            data.set_key(&key, serde_json::to_vec(&value)?)?;
        }
        Ok(data)
    }
}
