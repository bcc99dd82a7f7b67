use std::fmt;

use thiserror::Error;

use crate::tags::{StoreError, TagStore, TagValue};

/// The three independently isolated parts of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EnergySources,
    Equipment,
    Shift,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::EnergySources => "energy_sources",
            Stage::Equipment => "equipment",
            Stage::Shift => "shift",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a stage contributed no writes this tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("value read failed: {0}")]
    Read(#[source] StoreError),
    #[error("value write failed: {0}")]
    Write(#[source] StoreError),
    #[error("computation fault: {0}")]
    Computation(String),
}

/// Reads a batch of numeric tags. Non-numeric or non-finite values are
/// computation faults; a store answering with the wrong number of values is
/// a read failure.
pub(crate) fn read_numbers<S: TagStore>(
    store: &S,
    paths: &[String],
) -> Result<Vec<f64>, StageError> {
    let values = store.read(paths).map_err(StageError::Read)?;
    if values.len() != paths.len() {
        return Err(StageError::Read(StoreError::LengthMismatch {
            paths: paths.len(),
            values: values.len(),
        }));
    }
    paths
        .iter()
        .zip(&values)
        .map(|(path, value)| match value.as_f64() {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(StageError::Computation(format!("tag `{path}` holds {v}"))),
            None => Err(StageError::Computation(format!(
                "tag `{path}` holds a {} value, expected a number",
                value.kind()
            ))),
        })
        .collect()
}

/// Writes one batch, mapping store rejection to [`StageError::Write`].
pub(crate) fn write_batch<S: TagStore>(
    store: &mut S,
    paths: &[String],
    values: Vec<TagValue>,
) -> Result<(), StageError> {
    store.write(paths, &values).map_err(StageError::Write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::MemoryTagStore;

    #[test]
    fn numbers_read_back_in_order() {
        let mut store = MemoryTagStore::new();
        store.insert("a", TagValue::Float(1.5));
        store.insert("b", TagValue::Int(4));
        let got = read_numbers(&store, &["b".to_string(), "a".to_string()]);
        assert_eq!(got, Ok(vec![4.0, 1.5]));
    }

    #[test]
    fn nan_is_a_computation_fault() {
        let mut store = MemoryTagStore::new();
        store.insert("a", TagValue::Float(f64::NAN));
        let got = read_numbers(&store, &["a".to_string()]);
        assert!(matches!(got, Err(StageError::Computation(_))));
    }

    #[test]
    fn wrong_type_is_a_computation_fault() {
        let mut store = MemoryTagStore::new();
        store.insert("a", TagValue::Bool(true));
        let got = read_numbers(&store, &["a".to_string()]);
        assert!(matches!(got, Err(StageError::Computation(msg)) if msg.contains("bool")));
    }

    #[test]
    fn missing_tag_is_a_read_failure() {
        let store = MemoryTagStore::new();
        let got = read_numbers(&store, &["a".to_string()]);
        assert!(matches!(got, Err(StageError::Read(StoreError::UnknownTag(_)))));
    }

    /// Answers every read with its last value missing.
    struct TruncatingStore(MemoryTagStore);

    impl TagStore for TruncatingStore {
        fn read(&self, paths: &[String]) -> Result<Vec<TagValue>, StoreError> {
            let mut values = self.0.read(paths)?;
            values.pop();
            Ok(values)
        }

        fn write(&mut self, paths: &[String], values: &[TagValue]) -> Result<(), StoreError> {
            self.0.write(paths, values)
        }
    }

    #[test]
    fn short_read_is_a_read_failure() {
        let mut inner = MemoryTagStore::new();
        inner.insert("a", TagValue::Float(1.0));
        inner.insert("b", TagValue::Float(2.0));
        let store = TruncatingStore(inner);
        let got = read_numbers(&store, &["a".to_string(), "b".to_string()]);
        assert_eq!(
            got,
            Err(StageError::Read(StoreError::LengthMismatch {
                paths: 2,
                values: 1
            }))
        );
    }

    #[test]
    fn stage_names_are_snake_case() {
        assert_eq!(Stage::EnergySources.to_string(), "energy_sources");
        assert_eq!(Stage::Shift.name(), "shift");
    }
}
