//! Falcor shape → prop validators.
//!
//! Turns a Falcor path shape (the nested object a component uses to declare
//! which fields it requests from the data graph) into a tree of prop
//! validators, and checks JSON props against that tree with the exact
//! failure messages UI frameworks print.
//!
//! ```
//! use falcor_shapes::{falcor_shapes_prop_types, Location};
//! use serde_json::json;
//!
//! let types = falcor_shapes_prop_types(&json!({
//!     "people": { "$": [{ "from": 0, "to": 1 }, { "name": true }] }
//! }), false).unwrap();
//!
//! let failures = types.check_value(&json!({ "people": { "0": "hi" } }), "Component", Location::Prop);
//! assert_eq!(
//!     failures[0].to_string(),
//!     "Invalid prop `people.0` of type `string` supplied to `Component`, expected `object`."
//! );
//! ```

pub mod cli;
pub mod compiler;
pub mod emit;
pub mod error;
pub mod path_de;
pub mod report;
pub mod shape;
pub mod validator;

pub use compiler::{CollectionMode, CompileOptions, compile, falcor_shapes_prop_types};
pub use error::{ConfigurationError, Location, PropValidationFailure, Result};
pub use report::PropTypeReporter;
pub use shape::{Bounds, Shape, ShapeMap};
pub use validator::{PropTypes, Validator, ValidatorKind};
