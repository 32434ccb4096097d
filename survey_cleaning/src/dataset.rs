use log::debug;
use std::collections::{HashMap, HashSet};

use crate::config::*;

/// One question of the survey: a name and one value per respondent.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
    /// Set once the column has been cast to a fixed vocabulary.
    pub categories: Option<Categories>,
}

impl Column {
    pub fn new(name: &str, values: Vec<Value>) -> Column {
        Column {
            name: name.to_string(),
            values,
            categories: None,
        }
    }
}

/// An in-memory table: rows are respondents, columns are questions.
///
/// Invariant: all the columns have the same number of rows and the names are unique.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Dataset {
    num_rows: usize,
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(num_rows: usize) -> Dataset {
        Dataset {
            num_rows,
            columns: Vec::new(),
        }
    }

    /// Builds a dataset from columns of the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Dataset, CleaningErrors> {
        let num_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut ds = Dataset::new(num_rows);
        for c in columns {
            if ds.position(&c.name).is_some() {
                return Err(CleaningErrors::DuplicateColumn(c.name));
            }
            ds.insert_column(c)?;
        }
        Ok(ds)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<&Column, CleaningErrors> {
        let idx = self.index_of(name)?;
        Ok(&self.columns[idx])
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, CleaningErrors> {
        let idx = self.index_of(name)?;
        Ok(&mut self.columns[idx])
    }

    pub fn get(&self, name: &str, row: usize) -> Result<&Value, CleaningErrors> {
        let col = self.column(name)?;
        col.values
            .get(row)
            .ok_or(CleaningErrors::LengthMismatch {
                field: name.to_string(),
                expected: row + 1,
                found: col.values.len(),
            })
    }

    /// Adds a column at the end, or replaces the column with the same name in place.
    pub fn insert_column(&mut self, column: Column) -> Result<(), CleaningErrors> {
        if column.values.len() != self.num_rows {
            return Err(CleaningErrors::LengthMismatch {
                field: column.name,
                expected: self.num_rows,
                found: column.values.len(),
            });
        }
        match self.position(&column.name) {
            Some(idx) => {
                debug!("insert_column: replacing column {:?}", column.name);
                self.columns[idx] = column;
            }
            None => {
                self.columns.push(column);
            }
        }
        Ok(())
    }

    pub fn drop_columns(&mut self, names: &[String]) -> Result<(), CleaningErrors> {
        for n in names {
            self.index_of(n)?;
        }
        let to_drop: HashSet<&String> = names.iter().collect();
        self.columns.retain(|c| !to_drop.contains(&c.name));
        Ok(())
    }

    /// Renames columns. Names absent from the mapping are kept.
    pub fn rename_columns(&mut self, mapping: &HashMap<String, String>) -> Result<(), CleaningErrors> {
        for old in mapping.keys() {
            self.index_of(old)?;
        }
        let mut seen: HashSet<String> = HashSet::new();
        for c in self.columns.iter() {
            let new_name = mapping.get(&c.name).unwrap_or(&c.name);
            if !seen.insert(new_name.clone()) {
                return Err(CleaningErrors::DuplicateColumn(new_name.clone()));
            }
        }
        for c in self.columns.iter_mut() {
            if let Some(new_name) = mapping.get(&c.name) {
                c.name = new_name.clone();
            }
        }
        Ok(())
    }

    /// Keeps exactly the given columns, in the given order.
    pub fn select_columns(&mut self, order: &[String]) -> Result<(), CleaningErrors> {
        let mut res: Vec<Column> = Vec::with_capacity(order.len());
        let mut seen: HashSet<&String> = HashSet::new();
        for n in order {
            if !seen.insert(n) {
                return Err(CleaningErrors::DuplicateColumn(n.clone()));
            }
            res.push(self.column(n)?.clone());
        }
        self.columns = res;
        Ok(())
    }

    /// The names of the columns that contain the given fragment, in column order.
    pub fn matching_columns(&self, fragment: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.name.contains(fragment))
            .map(|c| c.name.clone())
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn index_of(&self, name: &str) -> Result<usize, CleaningErrors> {
        self.position(name)
            .ok_or_else(|| CleaningErrors::UnknownField(name.to_string()))
    }
}
