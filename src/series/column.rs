use serde::ser::{Serialize, SerializeSeq, Serializer};

/// A chart column: a metric name followed by its values across epochs.
///
/// `None` marks an epoch before the metric first appeared. Columns are
/// derived from the store on every render and never kept around.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column { name: name.into(), values }
    }

    /// Value at epoch `idx`; `None` when absent or out of range.
    pub fn value_at(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Serializes as `["name", v0, v1, ...]` with `null` holes, the shape chart
/// widgets take as a column.
impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.values.len() + 1))?;
        seq.serialize_element(&self.name)?;
        for v in &self.values {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_name_then_values_with_null_holes() {
        let col = Column::new("acc", vec![None, Some(0.7)]);
        assert_eq!(serde_json::to_string(&col).unwrap(), r#"["acc",null,0.7]"#);
    }

    #[test]
    fn value_at_out_of_range_is_none() {
        let col = Column::new("loss", vec![Some(0.9)]);
        assert_eq!(col.value_at(0), Some(0.9));
        assert_eq!(col.value_at(3), None);
    }
}
