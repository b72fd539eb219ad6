//! Shape → validator compiler.
//!
//! One depth-first pass over a parsed [`ShapeMap`]. Objects become shape
//! validators, leaves accept anything, and ranges expand into one keyed entry
//! per index, all sharing a single compiled item validator. Range items are
//! always optional since Falcor returns collections as sparse objects keyed by
//! the requested indices.
use std::sync::Arc;

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigurationError, Result};
use crate::shape::{RangeMarker, Shape, ShapeMap};
use crate::validator::{PropTypes, Validator};

/// Default cap on synthesized entries for a single range.
pub const DEFAULT_MAX_RANGE_ENTRIES: u64 = 65_536;

/// How `$` ranges are compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// Keyed object, one optional entry per index.
    #[default]
    Sparse,
    /// Literal array of items. Bounds are not enforced and `$` may not
    /// have named siblings.
    Dense,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Mark every field optional.
    pub optional: bool,
    pub collections: CollectionMode,
    pub max_range_entries: u64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optional: false,
            collections: CollectionMode::Sparse,
            max_range_entries: DEFAULT_MAX_RANGE_ENTRIES,
        }
    }
}

impl CompileOptions {
    pub fn optional(optional: bool) -> Self {
        Self { optional, ..Self::default() }
    }
}

/// Parse and compile a JSON shape in one step.
pub fn falcor_shapes_prop_types(shape: &Value, optional: bool) -> Result<PropTypes> {
    let shape = ShapeMap::from_value(shape)?;
    compile(&shape, &CompileOptions::optional(optional))
}

pub fn compile(shape: &ShapeMap, options: &CompileOptions) -> Result<PropTypes> {
    let mut compiler = Compiler { options, path: Vec::new() };
    let mut props = IndexMap::with_capacity(shape.len());
    for (name, sub) in shape.iter() {
        compiler.path.push(name.clone());
        let validator = compiler.node(sub, false)?;
        compiler.path.pop();
        props.insert(name.clone(), validator);
    }
    debug!(props = props.len(), optional = options.optional, "compiled shape");
    Ok(PropTypes::new(props))
}

struct Compiler<'a> {
    options: &'a CompileOptions,
    path: Vec<String>,
}

impl Compiler<'_> {
    fn node(&mut self, shape: &Shape, force_optional: bool) -> Result<Arc<Validator>> {
        let required = !(self.options.optional || force_optional);
        let validator = match shape {
            Shape::Leaf => Validator::any(required),
            Shape::Object(fields) => Validator::shape(required, self.fields(fields)?),
            Shape::Range { marker, fields } => match self.options.collections {
                CollectionMode::Sparse => {
                    let mut entries = self.range_entries(marker)?;
                    // named siblings win over a synthesized index of the same name
                    entries.extend(self.fields(fields)?);
                    Validator::shape(required, entries)
                }
                CollectionMode::Dense => {
                    if !fields.is_empty() {
                        return Err(ConfigurationError::DenseRangeSiblings {
                            path: self.path.join("."),
                            fields: fields.keys().cloned().collect(),
                        });
                    }
                    self.path.push(crate::shape::RANGE_KEY.to_owned());
                    let item = self.node(&marker.item, false);
                    self.path.pop();
                    Validator::array_of(required, item?)
                }
            },
        };
        Ok(Arc::new(validator))
    }

    fn fields(&mut self, fields: &IndexMap<String, Shape>) -> Result<IndexMap<String, Arc<Validator>>> {
        let mut out = IndexMap::with_capacity(fields.len());
        for (name, sub) in fields {
            self.path.push(name.clone());
            let validator = self.node(sub, false);
            self.path.pop();
            out.insert(name.clone(), validator?);
        }
        Ok(out)
    }

    fn range_entries(&mut self, marker: &RangeMarker) -> Result<IndexMap<String, Arc<Validator>>> {
        self.check_range_size(marker)?;

        // compiled once, shared by every index
        self.path.push(crate::shape::RANGE_KEY.to_owned());
        let item = self.node(&marker.item, true);
        self.path.pop();
        let item = item?;

        let bounds = marker.bounds;
        debug!(
            path = %self.path.join("."),
            from = bounds.start(),
            to = ?bounds.end_inclusive(),
            "expanding range"
        );
        Ok(bounds
            .indices()
            .map(|ix| (ix.to_string(), Arc::clone(&item)))
            .collect())
    }

    fn check_range_size(&self, marker: &RangeMarker) -> Result<()> {
        let entries = marker.bounds.len();
        let limit = self.options.max_range_entries;
        if entries > limit {
            return Err(ConfigurationError::RangeTooLarge {
                path: self.path.join("."),
                entries,
                limit,
            });
        }
        Ok(())
    }
}
