use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_cleaning::*;

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use std::collections::BTreeMap;
use text_diff::print_diff;

use crate::clean::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_parquet;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum CleanError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("No worksheet to read in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Cannot understand the cell on line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Step {step}: invalid value {content}"))]
    InvalidValue { step: usize, content: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Failed to clean the data at step {step}"))]
    Cleaning {
        source: CleaningErrors,
        step: usize,
    },
    #[snafu(display("Invalid dataset"))]
    Dataset { source: CleaningErrors },
    #[snafu(display("Cannot convert column {column:?}"))]
    Arrow {
        source: arrow::error::ArrowError,
        column: String,
    },
    #[snafu(display("Error writing parquet file {path}"))]
    WritingParquet {
        source: parquet::errors::ParquetError,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CleanResult<T> = Result<T, CleanError>;

fn read_survey_data(root_path: &Path, input: &InputSource) -> CleanResult<Dataset> {
    let file_path = match &input.file_path {
        Some(p) => io_common::resolve_path(root_path, p),
        None => whatever!("No input file provided"),
    };
    let provider = input.provider.clone().unwrap_or_else(|| "csv".to_string());
    info!("Attempting to read {} file {:?}", provider, file_path);
    match provider.as_str() {
        "csv" => io_csv::read_csv_export(&file_path, input),
        "xlsx" | "excel" => io_xlsx::read_excel_export(&file_path, input),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn apply_step(ds: &mut Dataset, step: usize, cs: &CleaningStep) -> CleanResult<()> {
    debug!("apply_step: {}: {:?}", step, cs);
    match cs {
        CleaningStep::Collapse(c) => {
            let opts = c.options(step)?;
            collapse_select_all(ds, &c.selector(), &opts).context(CleaningSnafu { step })?;
        }
        CleaningStep::NotAsked(na) => {
            let filter = read_filter(step, &na.filters)?;
            let value = read_value(step, &na.value)?;
            let count = set_not_asked_responses(ds, &na.column, &filter, &value)
                .context(CleaningSnafu { step })?;
            info!("step {}: {:?}: {} rows not asked", step, na.column, count);
        }
        CleaningStep::Flag(f) => {
            let filter = read_filter(step, &f.filters)?;
            flag_rows(ds, &f.column, &filter).context(CleaningSnafu { step })?;
        }
        CleaningStep::Merge(m) => {
            merge_two_questions(
                ds,
                &m.first,
                &m.second,
                &m.merged_column_name,
                m.remove_merge_columns,
            )
            .context(CleaningSnafu { step })?;
        }
        CleaningStep::Categories(c) => {
            let categories = Categories {
                labels: c.labels.clone(),
                ordered: c.ordered.unwrap_or(false),
            };
            cast_categorical(ds, &c.column, &categories).context(CleaningSnafu { step })?;
        }
        CleaningStep::Drop(d) => {
            ds.drop_columns(&d.columns).context(CleaningSnafu { step })?;
        }
    }
    Ok(())
}

/// Applies the cleaning steps in order.
pub fn clean_dataset(ds: &mut Dataset, steps: &[CleaningStep]) -> CleanResult<()> {
    for (step, cs) in steps.iter().enumerate() {
        apply_step(ds, step, cs)?;
    }
    Ok(())
}

fn finalize_columns(ds: &mut Dataset, output: &OutputSettings) -> CleanResult<()> {
    if let Some(names) = &output.column_names {
        ds.rename_columns(names).context(DatasetSnafu {})?;
    }
    if let Some(order) = &output.column_order {
        ds.select_columns(order).context(DatasetSnafu {})?;
    }
    Ok(())
}

/// The counts of each label, for each column.
fn build_summary_js(ds: &Dataset) -> JSValue {
    let mut columns: Vec<JSValue> = Vec::new();
    for c in ds.columns() {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut missing: u64 = 0;
        for v in c.values.iter() {
            match v {
                _ if v.is_missing() => missing += 1,
                Value::List(labels) => {
                    for l in labels {
                        *counts.entry(l.clone()).or_insert(0) += 1;
                    }
                }
                _ => {
                    if let Some(l) = v.label() {
                        *counts.entry(l).or_insert(0) += 1;
                    }
                }
            }
        }
        let mut counts_js: JSMap<String, JSValue> = JSMap::new();
        for (l, n) in counts {
            counts_js.insert(l, json!(n));
        }
        let mut col_js = json!({
            "name": c.name,
            "missing": missing,
            "counts": counts_js,
        });
        if let Some(cats) = &c.categories {
            col_js["categories"] = json!(cats.labels);
            col_js["ordered"] = json!(cats.ordered);
        }
        columns.push(col_js);
    }
    json!({"rows": ds.num_rows(), "columns": columns})
}

#[allow(clippy::too_many_arguments)]
pub fn run_cleaning(
    config_path: Option<String>,
    input_path: Option<String>,
    input_type: Option<String>,
    excel_worksheet_name: Option<String>,
    out_path: Option<String>,
    summary_path: Option<String>,
    check_summary_path: Option<String>,
) -> CleanResult<()> {
    let (mut config, root_path) = match &config_path {
        Some(p) => {
            let config = read_config(p)?;
            let root_p = Path::new(p.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        None => (CleaningConfig::default(), Path::new(".").to_path_buf()),
    };
    info!("config: {:?}", config);

    // The command line takes precedence over the configuration file.
    // Its paths are relative to the working directory.
    if let Some(p) = input_path {
        config.input.file_path = Some(io_common::from_working_dir(&p));
    }
    if input_type.is_some() {
        config.input.provider = input_type;
    }
    if excel_worksheet_name.is_some() {
        config.input.excel_worksheet_name = excel_worksheet_name;
    }
    if let Some(p) = out_path {
        config.output.file_path = Some(io_common::from_working_dir(&p));
    }

    let mut ds = read_survey_data(root_path.as_path(), &config.input)?;
    info!(
        "Read {} rows and {} columns",
        ds.num_rows(),
        ds.columns().len()
    );

    clean_dataset(&mut ds, &config.steps)?;
    finalize_columns(&mut ds, &config.output)?;

    if let Some(p) = &config.output.file_path {
        let out_p = io_common::resolve_path(root_path.as_path(), p);
        io_parquet::write_parquet(&ds, &out_p)?;
    } else {
        warn!("No output file provided, the cleaned data is not saved");
    }

    let result_js = build_summary_js(&ds);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match summary_path.as_deref() {
        Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(p) if !p.is_empty() => {
            fs::write(p, &pretty_js_stats).context(WritingFileSnafu { path: p })?;
            info!("Summary written to {:?}", p);
        }
        _ => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        debug!("summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}
