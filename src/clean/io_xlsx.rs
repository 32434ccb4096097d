// Primitives for reading Excel exports.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::clean::{io_common::simplify_file_name, *};
use survey_cleaning::builder::Builder;

pub fn read_excel_export(path: &str, input: &InputSource) -> CleanResult<Dataset> {
    let wrange = get_range(path, input)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyExcelSnafu { path })?;
    let header: Vec<String> = header_row.iter().map(cell_text).collect();
    debug!("read_excel_export: header: {:?}", header);
    let mut ds_builder = Builder::new(&header).context(DatasetSnafu {})?;

    for (idx, row) in iter.enumerate() {
        // The header is on the first line.
        let lineno = (idx + 2) as u64;
        let mut values: Vec<Value> = Vec::with_capacity(row.len());
        for cell in row {
            values.push(read_cell(lineno, cell)?);
        }
        ds_builder.add_row(values).context(DatasetSnafu {})?;
    }

    info!(
        "read_excel_export: {}: {} rows",
        simplify_file_name(path),
        ds_builder.num_rows()
    );
    ds_builder.build().context(DatasetSnafu {})
}

fn read_cell(lineno: u64, cell: &DataType) -> CleanResult<Value> {
    match cell {
        DataType::Empty => Ok(Value::Missing),
        DataType::String(s) if s.is_empty() => Ok(Value::Missing),
        DataType::String(s) => Ok(Value::Text(s.clone())),
        DataType::Int(i) => Ok(Value::Int(*i)),
        // Excel stores all the numbers as floats.
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < (i64::MAX as f64) => {
            Ok(Value::Int(*f as i64))
        }
        DataType::Float(f) => Ok(Value::Text(f.to_string())),
        DataType::Bool(b) => Ok(Value::Bool(*b)),
        DataType::DateTime(_) => Ok(Value::Text(cell_text(cell))),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) | DataType::DateTime(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => "".to_string(),
        _ => format!("{:?}", cell),
    }
}

fn get_range(path: &str, input: &InputSource) -> CleanResult<Range<DataType>> {
    let worksheet_name_o = input.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
                path,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu { path }.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "get_range: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => {
                let names: Vec<String> = all_worksheets.iter().map(|(n, _)| n.clone()).collect();
                whatever!(
                    "The file {} has several worksheets {:?}, the name of the worksheet to read must be provided",
                    path,
                    names
                )
            }
        }
    }
}
