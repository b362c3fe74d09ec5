//! Column typing from a sample chunk.
//!
//! A column is numeric when every non-missing sample value parses as a number.
//! Columns with no values in the sample are treated as categorical so that the
//! literal fallback applies to them.

use hmerge_core::schema::{DataType, Field, Schema};
use hmerge_core::types::{RowBatch, Scalar};

pub fn infer_schema(sample: &RowBatch) -> Schema {
    Schema::new(
        sample
            .columns
            .iter()
            .map(|c| Field::new(c.name.clone(), infer_values(&c.values), true))
            .collect(),
    )
}

fn infer_values(values: &[Scalar]) -> DataType {
    let mut seen = false;
    let mut all_int = true;
    for v in values {
        let s = match v {
            Scalar::Null => continue,
            Scalar::I64(_) => {
                seen = true;
                continue;
            }
            Scalar::F64(_) => {
                seen = true;
                all_int = false;
                continue;
            }
            Scalar::Str(s) => s.trim(),
        };
        seen = true;
        if s.parse::<i64>().is_ok() {
            continue;
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => all_int = false,
            _ => return DataType::Utf8,
        }
    }
    match (seen, all_int) {
        (false, _) => DataType::Utf8,
        (true, true) => DataType::Int64,
        (true, false) => DataType::Float64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmerge_core::types::Column;

    fn strs(name: &str, vals: &[Option<&str>]) -> Column {
        Column::new(
            name,
            vals.iter()
                .map(|v| v.map(|s| Scalar::Str(s.into())).unwrap_or(Scalar::Null))
                .collect(),
        )
    }

    #[test]
    fn infers_kinds() {
        let batch = RowBatch::new(vec![
            strs("id", &[Some("1"), Some("2"), None]),
            strs("x", &[Some("10.5"), None, Some("3")]),
            strs("dx", &[Some("I10"), Some("5"), None]),
            strs("blank", &[None, None, None]),
        ]);
        let schema = infer_schema(&batch);
        let types: Vec<DataType> = schema.fields.iter().map(|f| f.data_type).collect();
        assert_eq!(
            types,
            vec![DataType::Int64, DataType::Float64, DataType::Utf8, DataType::Utf8]
        );
    }
}
