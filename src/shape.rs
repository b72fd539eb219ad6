//! Falcor shape grammar.
//!
//! A shape names the fields a component wants from the data graph:
//!
//! ```text
//! Shape        = Mapping<FieldName, SubShape>
//! SubShape     = Leaf | Mapping<FieldName, SubShape> | RangeMapping
//! RangeMapping = { "$": [Bounds, SubShape], ...otherFields }
//! Bounds       = { from: Integer, to: Integer } | { from: Integer, length: Integer }
//! Leaf         = any non-mapping value
//! ```
//!
//! Parsing decides the node kind once and validates range bounds, so the
//! compiler never sees a malformed range.
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ConfigurationError, Result};
use crate::path_de;

/// Reserved key marking a ranged collection.
pub const RANGE_KEY: &str = "$";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Field must exist; its value is not inspected.
    Leaf,
    /// Nested object with named fields.
    Object(IndexMap<String, Shape>),
    /// Sparse collection keyed by index, plus any ordinary sibling fields.
    Range {
        marker: RangeMarker,
        fields: IndexMap<String, Shape>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeMarker {
    pub bounds: Bounds,
    pub item: Box<Shape>,
}

/// A well-formed, non-negative index range: `from .. from + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    from: u64,
    len: u64,
}

/// Top level of a shape: always a mapping of prop names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShapeMap {
    fields: IndexMap<String, Shape>,
}

/// Bounds as written in the shape, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename = "Bounds")]
struct RawBounds {
    from: i64,
    #[serde(default)]
    to: Option<i64>,
    #[serde(default)]
    length: Option<i64>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Shape {
    /// Parse any sub-shape. Non-objects are leaves.
    pub fn from_value(value: &Value) -> Result<Shape> {
        parse_node(value, &mut Vec::new())
    }

    pub fn range(bounds: Bounds, item: Shape) -> Shape {
        Shape::Range {
            marker: RangeMarker { bounds, item: Box::new(item) },
            fields: IndexMap::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Shape::Leaf)
    }
}

impl Bounds {
    /// `from .. from + len`. The end must fit in a `u64`.
    pub fn new(from: u64, len: u64) -> Result<Self> {
        match from.checked_add(len) {
            Some(_) => Ok(Self { from, len }),
            None => Err(ConfigurationError::BoundsOverflow { from, len }),
        }
    }

    pub fn start(&self) -> u64 {
        self.from
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Last index covered, `None` for an empty range.
    pub fn end_inclusive(&self) -> Option<u64> {
        self.len.checked_sub(1).and_then(|last| self.from.checked_add(last))
    }

    pub fn indices(&self) -> std::ops::Range<u64> {
        // `new` and `resolve` both guarantee the end fits
        self.from..self.from + self.len
    }

    fn resolve(raw: RawBounds, path: &str) -> Result<Bounds> {
        let from = raw.from;
        let path = path.to_owned();
        let len = match (raw.to, raw.length) {
            (None, None) => return Err(ConfigurationError::MissingRangeEnd { path }),
            (Some(_), Some(_)) => return Err(ConfigurationError::AmbiguousRangeEnd { path }),
            _ if from < 0 => return Err(ConfigurationError::NegativeStart { path, from }),
            (Some(to), None) => {
                if to < from {
                    return Err(ConfigurationError::InvertedRange { path, from, to });
                }
                (to - from) as u64 + 1
            }
            (None, Some(length)) => {
                if length < 0 {
                    return Err(ConfigurationError::NegativeLength { path, length });
                }
                length as u64
            }
        };
        Ok(Bounds { from: from as u64, len })
    }
}

impl ShapeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the top level of a shape. It must be an object, and `$` is
    /// rejected there since every prop needs a name.
    pub fn from_value(value: &Value) -> Result<ShapeMap> {
        let Value::Object(map) = value else {
            return Err(ConfigurationError::NotAnObject {
                found: crate::validator::prop_type(value),
            });
        };
        if map.contains_key(RANGE_KEY) {
            return Err(ConfigurationError::TopLevelRange);
        }
        let fields = parse_fields(map, &mut Vec::new())?;
        Ok(ShapeMap { fields })
    }

    pub fn with_field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.insert(name.into(), shape);
        self
    }

    pub fn fields(&self) -> &IndexMap<String, Shape> {
        &self.fields
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Shape> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Shape)> for ShapeMap {
    fn from_iter<I: IntoIterator<Item = (String, Shape)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_node(value: &Value, path: &mut Vec<String>) -> Result<Shape> {
    let Value::Object(map) = value else {
        return Ok(Shape::Leaf);
    };
    let fields = parse_fields(map, path)?;
    match map.get(RANGE_KEY) {
        None => Ok(Shape::Object(fields)),
        Some(marker) => {
            let marker = parse_marker(marker, path)?;
            Ok(Shape::Range { marker, fields })
        }
    }
}

fn parse_fields(map: &Map<String, Value>, path: &mut Vec<String>) -> Result<IndexMap<String, Shape>> {
    let mut fields = IndexMap::with_capacity(map.len());
    for (key, sub) in map {
        if key == RANGE_KEY {
            continue;
        }
        path.push(key.clone());
        let shape = parse_node(sub, path);
        path.pop();
        fields.insert(key.clone(), shape?);
    }
    Ok(fields)
}

fn parse_marker(value: &Value, path: &mut Vec<String>) -> Result<RangeMarker> {
    let here = display_path(path);
    let Some([bounds, item]) = value.as_array().map(Vec::as_slice) else {
        return Err(ConfigurationError::MalformedRangeMarker { path: here });
    };

    let raw = path_de::from_value_with_path::<RawBounds>(bounds).map_err(|err| {
        ConfigurationError::InvalidBounds { path: here.clone(), message: err.to_string() }
    })?;
    let bounds = Bounds::resolve(raw, &here)?;

    path.push(RANGE_KEY.to_owned());
    let item = parse_node(item, path);
    path.pop();

    Ok(RangeMarker { bounds, item: Box::new(item?) })
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() { "<root>".to_owned() } else { path.join(".") }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
