// Primitives for reading CSV exports.

use crate::clean::{io_common::simplify_file_name, *};
use survey_cleaning::builder::Builder;

pub fn read_csv_export(path: &str, input: &InputSource) -> CleanResult<Dataset> {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true);
    if let Some(delim) = &input.csv_delimiter {
        match delim.as_bytes() {
            [b] => {
                builder.delimiter(*b);
            }
            _ => whatever!("The CSV delimiter must be a single character, got {:?}", delim),
        }
    }
    let mut rdr = builder.from_path(path).context(CsvOpenSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_export: header: {:?}", header);
    let mut ds_builder = Builder::new(&header).context(DatasetSnafu {})?;

    let mut lines: Vec<csv::StringRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        lines.push(line_r.context(CsvLineParseSnafu { lineno })?);
    }

    let int_columns: Vec<bool> = (0..header.len())
        .map(|col| is_int_column(&lines, col))
        .collect();
    debug!("read_csv_export: integer columns: {:?}", int_columns);

    for line in lines.iter() {
        let values: Vec<Value> = line
            .iter()
            .zip(int_columns.iter())
            .map(|(cell, is_int)| read_cell(cell, *is_int))
            .collect();
        ds_builder.add_row(values).context(DatasetSnafu {})?;
    }

    info!(
        "read_csv_export: {}: {} rows",
        simplify_file_name(path),
        ds_builder.num_rows()
    );
    ds_builder.build().context(DatasetSnafu {})
}

// A column is read as integers when all its non-empty cells are integers.
fn is_int_column(lines: &[csv::StringRecord], col: usize) -> bool {
    let mut present = lines
        .iter()
        .filter_map(|line| line.get(col))
        .filter(|s| !s.is_empty())
        .peekable();
    present.peek().is_some() && present.all(|s| s.parse::<i64>().is_ok())
}

fn read_cell(cell: &str, is_int: bool) -> Value {
    if cell.is_empty() {
        return Value::Missing;
    }
    match (is_int, cell.parse::<i64>()) {
        (true, Ok(i)) => Value::Int(i),
        _ => Value::text(cell),
    }
}
