//! Error types for shape compilation and prop checking.

use std::fmt;

use clap::ValueEnum;
use thiserror::Error;

/// Result type for shape compilation
pub type Result<T> = std::result::Result<T, ConfigurationError>;

/// A shape that cannot be compiled. Always a bug in the caller-authored shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("shape must be a plain object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("range marker `$` is not allowed at the top level of a shape")]
    TopLevelRange,

    #[error("at `{path}`: range marker `$` must be a two-element array `[bounds, shape]`")]
    MalformedRangeMarker { path: String },

    #[error("at `{path}`: invalid range bounds: {message}")]
    InvalidBounds { path: String, message: String },

    #[error("at `{path}`: Must specify either `to` or `length` for an array.")]
    MissingRangeEnd { path: String },

    #[error("at `{path}`: range must specify only one of `to` or `length`")]
    AmbiguousRangeEnd { path: String },

    #[error("at `{path}`: range `from` must not be negative, got {from}")]
    NegativeStart { path: String, from: i64 },

    #[error("at `{path}`: range end `to` ({to}) is less than `from` ({from})")]
    InvertedRange { path: String, from: i64, to: i64 },

    #[error("at `{path}`: range `length` must not be negative, got {length}")]
    NegativeLength { path: String, length: i64 },

    #[error("at `{path}`: range covers {entries} entries, more than the limit of {limit}")]
    RangeTooLarge { path: String, entries: u64, limit: u64 },

    #[error("range starting at {from} with {len} entries ends past the largest index")]
    BoundsOverflow { from: u64, len: u64 },

    #[error("at `{path}`: dense collections cannot have named siblings of `$`, found {fields:?}")]
    DenseRangeSiblings { path: String, fields: Vec<String> },
}

/// Where a checked value came from. Only changes the wording of failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Location {
    #[default]
    Prop,
    Context,
    ChildContext,
}

impl Location {
    pub fn name(self) -> &'static str {
        match self {
            Location::Prop => "prop",
            Location::Context => "context",
            Location::ChildContext => "child context",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value that does not satisfy a compiled validator.
///
/// `Display` renders the exact message host frameworks print, e.g.
/// ``Required prop `people` was not specified in `Component`.``
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropValidationFailure {
    #[error("Required {location} `{prop}` was not specified in `{component}`.")]
    Missing {
        location: Location,
        prop: String,
        component: String,
    },

    #[error("Invalid {location} `{prop}` of type `{actual}` supplied to `{component}`, expected `object`.")]
    NotAnObject {
        location: Location,
        prop: String,
        component: String,
        actual: &'static str,
    },

    #[error("Invalid {location} `{prop}` of type `{actual}` supplied to `{component}`, expected an array.")]
    NotAnArray {
        location: Location,
        prop: String,
        component: String,
        actual: &'static str,
    },
}

impl PropValidationFailure {
    /// Full dotted name of the offending prop (e.g. `people.0.name`).
    pub fn prop(&self) -> &str {
        match self {
            PropValidationFailure::Missing { prop, .. }
            | PropValidationFailure::NotAnObject { prop, .. }
            | PropValidationFailure::NotAnArray { prop, .. } => prop,
        }
    }

    /// The message as a framework warning: `Failed propType: <message>`.
    pub fn warning(&self) -> String {
        format!("Failed propType: {self}")
    }
}
