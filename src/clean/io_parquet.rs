// Writes the cleaned dataset as a Parquet file.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Int64Array, ListBuilder, StringArray, StringBuilder,
    StringDictionaryBuilder,
};
use arrow::datatypes::{Field, Int32Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::clean::{io_common::simplify_file_name, *};

/// The Arrow representation of a column.
///
/// Columns with a vocabulary are dictionary-encoded, list-valued columns become
/// lists of strings. Other columns are typed from their values.
fn column_to_arrow(c: &Column) -> CleanResult<(Field, ArrayRef)> {
    let column = c.name.as_str();
    let mut metadata: HashMap<String, String> = HashMap::new();
    let is_list = c.values.iter().any(|v| matches!(v, Value::List(_)));

    let array: ArrayRef = if let Some(cats) = &c.categories {
        let dictionary = StringArray::from(cats.labels.clone());
        let mut builder =
            StringDictionaryBuilder::<Int32Type>::new_with_dictionary(c.values.len(), &dictionary)
                .context(ArrowSnafu { column })?;
        for (row, v) in c.values.iter().enumerate() {
            if v.is_missing() {
                builder.append_null();
                continue;
            }
            match v.label() {
                // The dictionary is fixed: unknown labels are not added to it.
                Some(l) if cats.labels.contains(&l) => {
                    builder.append(l).context(ArrowSnafu { column })?;
                }
                _ => {
                    return Err(CleanError::Dataset {
                        source: CleaningErrors::TypeMismatch {
                            field: column.to_string(),
                            row,
                            expected: format!("a label of {:?}", cats.labels),
                            found: format!("{:?}", v),
                        },
                    });
                }
            }
        }
        metadata.insert(
            "categories".to_string(),
            serde_json::to_string(&cats.labels).context(ParsingJsonSnafu {})?,
        );
        metadata.insert("ordered".to_string(), cats.ordered.to_string());
        Arc::new(builder.finish())
    } else if is_list {
        let mut builder = ListBuilder::new(StringBuilder::new());
        for (row, v) in c.values.iter().enumerate() {
            match v {
                Value::List(labels) => {
                    for l in labels {
                        builder.values().append_value(l);
                    }
                    builder.append(true);
                }
                Value::Missing => builder.append_null(),
                _ => {
                    return Err(CleanError::Dataset {
                        source: CleaningErrors::TypeMismatch {
                            field: column.to_string(),
                            row,
                            expected: "list".to_string(),
                            found: format!("{:?}", v),
                        },
                    });
                }
            }
        }
        Arc::new(builder.finish())
    } else if has_only(c, |v| matches!(v, Value::Int(_))) {
        let values: Vec<Option<i64>> = c
            .values
            .iter()
            .map(|v| match v {
                Value::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        Arc::new(Int64Array::from(values))
    } else if has_only(c, |v| matches!(v, Value::Bool(_))) {
        let values: Vec<Option<bool>> = c
            .values
            .iter()
            .map(|v| match v {
                Value::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Arc::new(BooleanArray::from(values))
    } else {
        let values: Vec<Option<String>> = c.values.iter().map(|v| v.label()).collect();
        Arc::new(StringArray::from(values))
    };

    let field = Field::new(column, array.data_type().clone(), true).with_metadata(metadata);
    Ok((field, array))
}

// At least one value, and all the values that are present pass the check.
fn has_only(c: &Column, check: impl Fn(&Value) -> bool) -> bool {
    let mut present = c.values.iter().filter(|v| !v.is_missing()).peekable();
    present.peek().is_some() && present.all(check)
}

pub fn dataset_to_batch(ds: &Dataset) -> CleanResult<RecordBatch> {
    if ds.columns().is_empty() {
        whatever!("The dataset has no column to write");
    }
    let mut fields: Vec<Field> = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for c in ds.columns() {
        let (field, array) = column_to_arrow(c)?;
        debug!("dataset_to_batch: {:?}: {:?}", c.name, field.data_type());
        fields.push(field);
        arrays.push(array);
    }
    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, arrays).context(ArrowSnafu { column: "" })
}

/// Writes the dataset to a temporary file first, then moves it to its final location.
pub fn write_parquet(ds: &Dataset, path: &str) -> CleanResult<()> {
    let batch = dataset_to_batch(ds)?;
    let temp_path = format!("{}.tmp", path);

    let file = fs::File::create(&temp_path).context(WritingFileSnafu {
        path: temp_path.clone(),
    })?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context(WritingParquetSnafu { path })?;
    writer
        .write(&batch)
        .context(WritingParquetSnafu { path })?;
    writer.close().context(WritingParquetSnafu { path })?;

    fs::rename(&temp_path, path).context(WritingFileSnafu { path })?;
    info!(
        "write_parquet: {}: {} rows, {} columns",
        simplify_file_name(path),
        batch.num_rows(),
        batch.num_columns()
    );
    Ok(())
}
