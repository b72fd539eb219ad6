//! JSON description of a compiled validator tree.
//!
//! ```text
//! { "people": { "type": "shape", "required": true, "fields": { "0": { "type": "any", "required": false } } } }
//! ```
use serde_json::{Map, Value, json};

use crate::validator::{PropTypes, Validator, ValidatorKind};

pub fn describe(types: &PropTypes) -> Value {
    let mut out = Map::new();
    for (name, validator) in types.iter() {
        out.insert(name.to_owned(), describe_validator(validator));
    }
    Value::Object(out)
}

pub fn describe_validator(v: &Validator) -> Value {
    match &v.kind {
        ValidatorKind::Any => json!({ "type": "any", "required": v.required }),
        ValidatorKind::Shape(fields) => {
            let mut props = Map::new();
            for (k, f) in fields {
                props.insert(k.clone(), describe_validator(f));
            }
            json!({ "type": "shape", "required": v.required, "fields": props })
        }
        ValidatorKind::ArrayOf(item) => json!({
            "type": "arrayOf",
            "required": v.required,
            "items": describe_validator(item),
        }),
    }
}
