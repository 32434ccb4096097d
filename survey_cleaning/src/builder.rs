pub use crate::config::*;
use crate::dataset::{Column, Dataset};

/// A builder for assembling a dataset one respondent at a time.
///
/// The readers of survey exports go through the builder, which checks that every
/// row has the shape announced by the header.
///
/// ```
/// use survey_cleaning::builder::Builder;
/// use survey_cleaning::{CleaningErrors, Value};
///
/// let mut builder = Builder::new(&["role".to_string(), "size".to_string()])?;
/// builder.add_row(vec![Value::text("owner"), Value::Int(4)])?;
/// builder.add_row_simple(&["employee", ""])?;
///
/// let ds = builder.build()?;
/// assert_eq!(ds.num_rows(), 2);
/// assert_eq!(ds.get("size", 1)?, &Value::Missing);
///
/// # Ok::<(), CleaningErrors>(())
/// ```
pub struct Builder {
    pub(crate) _header: Vec<String>,
    pub(crate) _columns: Vec<Vec<Value>>,
}

impl Builder {
    pub fn new(header: &[String]) -> Result<Builder, CleaningErrors> {
        for (idx, name) in header.iter().enumerate() {
            if header[..idx].contains(name) {
                return Err(CleaningErrors::DuplicateColumn(name.clone()));
            }
        }
        Ok(Builder {
            _header: header.to_vec(),
            _columns: header.iter().map(|_| Vec::new()).collect(),
        })
    }

    /// Adds a row of text cells. Empty strings are recorded as missing.
    pub fn add_row_simple(&mut self, cells: &[&str]) -> Result<(), CleaningErrors> {
        let values: Vec<Value> = cells
            .iter()
            .map(|s| {
                if s.is_empty() {
                    Value::Missing
                } else {
                    Value::text(s)
                }
            })
            .collect();
        self.add_row(values)
    }

    pub fn add_row(&mut self, values: Vec<Value>) -> Result<(), CleaningErrors> {
        if values.len() != self._header.len() {
            return Err(CleaningErrors::LengthMismatch {
                field: format!("row {}", self.num_rows()),
                expected: self._header.len(),
                found: values.len(),
            });
        }
        for (col, v) in self._columns.iter_mut().zip(values) {
            col.push(v);
        }
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self._columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn build(self) -> Result<Dataset, CleaningErrors> {
        let num_rows = self.num_rows();
        let mut ds = Dataset::new(num_rows);
        for (name, values) in self._header.iter().zip(self._columns) {
            ds.insert_column(Column::new(name, values))?;
        }
        Ok(ds)
    }
}
