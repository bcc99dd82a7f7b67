//! Named-value tag store: the persistence seam between the engine and the dashboard.
//!
//! The engine never holds state between ticks. Every counter is read back from a
//! [`TagStore`], advanced, and written forward again, so the store is the only
//! place simulation state lives.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// In-memory store with JSON snapshots.
pub mod memory;
pub mod paths;

pub use memory::MemoryTagStore;
pub use paths::TagPaths;

/// A single scalar value held by a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
}

impl TagValue {
    /// Numeric view of the value. Integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Float(v) => Some(*v),
            TagValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer view of the value. Floats are accepted only when they carry no
    /// fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TagValue::Int(v) => Some(*v),
            TagValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            TagValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TagValue::Bool(_) => "bool",
            TagValue::Int(_) => "int",
            TagValue::Float(_) => "float",
            TagValue::Timestamp(_) => "timestamp",
        }
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Bool(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::Float(v)
    }
}

impl From<NaiveDateTime> for TagValue {
    fn from(v: NaiveDateTime) -> Self {
        TagValue::Timestamp(v)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(v) => write!(f, "{v}"),
            TagValue::Int(v) => write!(f, "{v}"),
            TagValue::Float(v) => write!(f, "{v:.4}"),
            TagValue::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Failures reported by a [`TagStore`] implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("unknown tag `{0}`")]
    UnknownTag(String),
    #[error("batch has {paths} paths but {values} values")]
    LengthMismatch { paths: usize, values: usize },
}

/// Batched access to named values.
///
/// Reads are order-preserving and fail as a whole if any path cannot be
/// resolved. Writes take equal-length path/value slices and apply them in the
/// order given.
pub trait TagStore {
    /// Reads one value per path, in the same order as `paths`.
    fn read(&self, paths: &[String]) -> Result<Vec<TagValue>, StoreError>;

    /// Writes `values[i]` to `paths[i]` for every `i`.
    fn write(&mut self, paths: &[String], values: &[TagValue]) -> Result<(), StoreError>;
}
