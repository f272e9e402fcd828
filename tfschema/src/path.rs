//! Attribute paths
//!
//! A [`Path`] is an ordered sequence of [`PathStep`]s locating a node inside a
//! schema or a value tree. Paths double as the location tag on diagnostics.

use crate::types::Value;
use std::fmt;

/// Individual step in a [`Path`]
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// Access attribute by name in an object, nested object or block
    AttributeName(String),
    /// Access element by integer index (lists and tuples)
    ElementKeyInt(i64),
    /// Access element by string key (maps)
    ElementKeyString(String),
    /// Access set element by its value
    ElementKeyValue(Value),
}

/// The kind of a [`PathStep`], without its payload. Used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    AttributeName,
    ElementKeyInt,
    ElementKeyString,
    ElementKeyValue,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::AttributeName => "AttributeName",
            StepKind::ElementKeyInt => "ElementKeyInt",
            StepKind::ElementKeyString => "ElementKeyString",
            StepKind::ElementKeyValue => "ElementKeyValue",
        };
        f.write_str(name)
    }
}

impl PathStep {
    pub fn kind(&self) -> StepKind {
        match self {
            PathStep::AttributeName(_) => StepKind::AttributeName,
            PathStep::ElementKeyInt(_) => StepKind::ElementKeyInt,
            PathStep::ElementKeyString(_) => StepKind::ElementKeyString,
            PathStep::ElementKeyValue(_) => StepKind::ElementKeyValue,
        }
    }

    /// Debug-style rendering used when a step is left over after a failed walk,
    /// e.g. `ElementKeyString("test")`.
    pub fn describe(&self) -> String {
        match self {
            PathStep::AttributeName(name) => format!("AttributeName({:?})", name),
            PathStep::ElementKeyInt(idx) => format!("ElementKeyInt({})", idx),
            PathStep::ElementKeyString(key) => format!("ElementKeyString({:?})", key),
            PathStep::ElementKeyValue(value) => format!("ElementKeyValue({})", value),
        }
    }
}

/// Path represents a location within a schema or value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    /// An empty path, pointing at the root of the schema or value.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// A path starting at a root attribute or block.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            steps: vec![PathStep::AttributeName(name.into())],
        }
    }

    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn at_name(&self, name: impl Into<String>) -> Self {
        self.with_step(PathStep::AttributeName(name.into()))
    }

    pub fn at_list_index(&self, idx: i64) -> Self {
        self.with_step(PathStep::ElementKeyInt(idx))
    }

    pub fn at_map_key(&self, key: impl Into<String>) -> Self {
        self.with_step(PathStep::ElementKeyString(key.into()))
    }

    pub fn at_set_value(&self, value: Value) -> Self {
        self.with_step(PathStep::ElementKeyValue(value))
    }

    fn with_step(&self, step: PathStep) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend(self.steps.iter().cloned());
        steps.push(step);
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_step(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// The path with its last step removed. The parent of an empty path is empty.
    pub fn parent_path(&self) -> Self {
        let mut steps = self.steps.clone();
        steps.pop();
        Self { steps }
    }

    /// True when any step addresses a list or set element.
    ///
    /// Map keys do not count: map elements realign by key between plan and
    /// state, list and set elements do not.
    pub fn has_list_or_set_step(&self) -> bool {
        self.steps.iter().any(|step| {
            matches!(
                step,
                PathStep::ElementKeyInt(_) | PathStep::ElementKeyValue(_)
            )
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::AttributeName(name) => write!(f, ".{}", name)?,
                PathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
                PathStep::ElementKeyString(key) => write!(f, "[{:?}]", key)?,
                PathStep::ElementKeyValue(value) => write!(f, "[Value({})]", value)?,
            }
        }
        Ok(())
    }
}

/// Sorts paths by their rendered form and removes duplicates.
pub fn normalize_paths(paths: &mut Vec<Path>) {
    paths.sort_by_cached_key(|p| p.to_string());
    paths.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_names_and_element_keys() {
        let path = Path::root("disks")
            .at_list_index(0)
            .at_name("labels")
            .at_map_key("env");
        assert_eq!(path.to_string(), "disks[0].labels[\"env\"]");

        let path = Path::root("tags").at_set_value(Value::string("web"));
        assert_eq!(path.to_string(), "tags[Value(\"web\")]");

        assert_eq!(Path::empty().to_string(), "");
        assert_eq!(Path::empty().at_list_index(0).to_string(), "[0]");
    }

    #[test]
    fn parent_path_drops_last_step() {
        let path = Path::root("a").at_name("b");
        assert_eq!(path.parent_path(), Path::root("a"));
        assert_eq!(Path::empty().parent_path(), Path::empty());
    }

    #[test]
    fn list_or_set_detection_ignores_maps() {
        assert!(Path::root("a").at_list_index(1).at_name("b").has_list_or_set_step());
        assert!(Path::root("a")
            .at_set_value(Value::bool(true))
            .has_list_or_set_step());
        assert!(!Path::root("a").at_map_key("k").at_name("b").has_list_or_set_step());
        assert!(!Path::root("a").at_name("b").has_list_or_set_step());
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let mut paths = vec![Path::root("b"), Path::root("a"), Path::root("b")];
        normalize_paths(&mut paths);
        assert_eq!(paths, vec![Path::root("a"), Path::root("b")]);
    }

    #[test]
    fn step_descriptions() {
        assert_eq!(PathStep::ElementKeyInt(0).describe(), "ElementKeyInt(0)");
        assert_eq!(
            PathStep::ElementKeyString("test".into()).describe(),
            "ElementKeyString(\"test\")"
        );
        assert_eq!(
            PathStep::ElementKeyValue(Value::string("test")).describe(),
            "ElementKeyValue(\"test\")"
        );
        assert_eq!(StepKind::AttributeName.to_string(), "AttributeName");
    }
}
