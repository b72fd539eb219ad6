//! Compiled validator tree. No shape parsing here; see `shape` and `compiler`.
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{Location, PropValidationFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub required: bool,
    pub kind: ValidatorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorKind {
    /// Accepts any present value.
    Any,
    /// Object with these keys; undeclared keys are ignored.
    Shape(IndexMap<String, Arc<Validator>>),
    /// Literal array, every element checked against the item.
    ArrayOf(Arc<Validator>),
}

/// Compiled props validators, keyed by top-level prop name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropTypes {
    props: IndexMap<String, Arc<Validator>>,
}

/// Type name as host frameworks report it in failure messages.
pub fn prop_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Per-check context threaded through the recursion.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub component: &'a str,
    pub location: Location,
}

impl Validator {
    pub fn any(required: bool) -> Self {
        Self { required, kind: ValidatorKind::Any }
    }

    pub fn shape(required: bool, fields: IndexMap<String, Arc<Validator>>) -> Self {
        Self { required, kind: ValidatorKind::Shape(fields) }
    }

    pub fn array_of(required: bool, item: Arc<Validator>) -> Self {
        Self { required, kind: ValidatorKind::ArrayOf(item) }
    }

    pub fn fields(&self) -> Option<&IndexMap<String, Arc<Validator>>> {
        match &self.kind {
            ValidatorKind::Shape(fields) => Some(fields),
            _ => None,
        }
    }

    /// Check one value. `None` and JSON `null` both count as "not specified".
    /// `prop` is the full name used in messages (`people.0.name`, `people[2]`).
    pub fn check(
        &self,
        value: Option<&Value>,
        prop: &str,
        cx: CheckContext<'_>,
    ) -> Result<(), PropValidationFailure> {
        let value = match value {
            None | Some(Value::Null) => {
                if self.required {
                    return Err(PropValidationFailure::Missing {
                        location: cx.location,
                        prop: prop.to_owned(),
                        component: cx.component.to_owned(),
                    });
                }
                return Ok(());
            }
            Some(value) => value,
        };

        match &self.kind {
            ValidatorKind::Any => Ok(()),
            ValidatorKind::Shape(fields) => {
                let Value::Object(object) = value else {
                    return Err(PropValidationFailure::NotAnObject {
                        location: cx.location,
                        prop: prop.to_owned(),
                        component: cx.component.to_owned(),
                        actual: prop_type(value),
                    });
                };
                for (key, field) in fields {
                    field.check(object.get(key), &format!("{prop}.{key}"), cx)?;
                }
                Ok(())
            }
            ValidatorKind::ArrayOf(item) => {
                let Value::Array(items) = value else {
                    return Err(PropValidationFailure::NotAnArray {
                        location: cx.location,
                        prop: prop.to_owned(),
                        component: cx.component.to_owned(),
                        actual: prop_type(value),
                    });
                };
                for (ix, element) in items.iter().enumerate() {
                    item.check(Some(element), &format!("{prop}[{ix}]"), cx)?;
                }
                Ok(())
            }
        }
    }
}

impl PropTypes {
    pub fn new(props: IndexMap<String, Arc<Validator>>) -> Self {
        Self { props }
    }

    pub fn get(&self, name: &str) -> Option<&Validator> {
        self.props.get(name).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Validator)> {
        self.props.iter().map(|(name, v)| (name.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Check every declared prop independently, in declaration order.
    /// At most one failure is returned per prop.
    pub fn check(
        &self,
        props: &Map<String, Value>,
        component: &str,
        location: Location,
    ) -> Vec<PropValidationFailure> {
        let cx = CheckContext { component, location };
        self.props
            .iter()
            .filter_map(|(name, validator)| validator.check(props.get(name), name, cx).err())
            .collect()
    }

    /// Like [`PropTypes::check`] for a whole JSON document. A non-object
    /// document has no props at all.
    pub fn check_value(
        &self,
        props: &Value,
        component: &str,
        location: Location,
    ) -> Vec<PropValidationFailure> {
        match props {
            Value::Object(map) => self.check(map, component, location),
            _ => self.check(&Map::new(), component, location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COMPONENT: &str = "Component";

    fn messages(types: &PropTypes, props: Value) -> Vec<String> {
        types
            .check_value(&props, COMPONENT, Location::Prop)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn people(validator: Validator) -> PropTypes {
        PropTypes::new(IndexMap::from([("people".to_owned(), Arc::new(validator))]))
    }

    #[test]
    fn required_any() {
        let types = people(Validator::any(true));
        assert!(messages(&types, json!({"people": "hi"})).is_empty());
        assert_eq!(
            messages(&types, json!({})),
            ["Required prop `people` was not specified in `Component`."]
        );
        assert_eq!(messages(&types, json!({"people": null})).len(), 1);
    }

    #[test]
    fn optional_any() {
        let types = people(Validator::any(false));
        assert!(messages(&types, json!({})).is_empty());
        assert!(messages(&types, json!({"people": 3})).is_empty());
    }

    #[test]
    fn shape_reports_nested_path_and_type() {
        let name = IndexMap::from([("name".to_owned(), Arc::new(Validator::any(true)))]);
        let types = people(Validator::shape(true, name));

        assert!(messages(&types, json!({"people": {"name": "hi", "extra": 1}})).is_empty());
        assert_eq!(
            messages(&types, json!({"people": {}})),
            ["Required prop `people.name` was not specified in `Component`."]
        );
        assert_eq!(
            messages(&types, json!({"people": "hi"})),
            ["Invalid prop `people` of type `string` supplied to `Component`, expected `object`."]
        );
        assert_eq!(
            messages(&types, json!({"people": []})),
            ["Invalid prop `people` of type `array` supplied to `Component`, expected `object`."]
        );
    }

    #[test]
    fn array_of_checks_each_element() {
        let item = Arc::new(Validator::shape(
            true,
            IndexMap::from([("name".to_owned(), Arc::new(Validator::any(true)))]),
        ));
        let types = people(Validator::array_of(true, item));

        assert!(messages(&types, json!({"people": [{"name": 1}, {"name": 2}]})).is_empty());
        assert!(messages(&types, json!({"people": []})).is_empty());
        assert_eq!(
            messages(&types, json!({"people": {"0": {"name": 1}}})),
            ["Invalid prop `people` of type `object` supplied to `Component`, expected an array."]
        );
        assert_eq!(
            messages(&types, json!({"people": [{"name": 1}, {}]})),
            ["Required prop `people[1].name` was not specified in `Component`."]
        );
    }

    #[test]
    fn one_failure_per_prop() {
        let types = PropTypes::new(IndexMap::from([
            ("a".to_owned(), Arc::new(Validator::any(true))),
            ("b".to_owned(), Arc::new(Validator::any(true))),
        ]));
        assert_eq!(
            messages(&types, json!({})),
            [
                "Required prop `a` was not specified in `Component`.",
                "Required prop `b` was not specified in `Component`.",
            ]
        );
        assert_eq!(messages(&types, json!("not props")).len(), 2);
    }

    #[test]
    fn location_changes_wording() {
        let types = people(Validator::any(true));
        let failures = types.check(&Map::new(), COMPONENT, Location::Context);
        assert_eq!(
            failures[0].to_string(),
            "Required context `people` was not specified in `Component`."
        );
    }
}
