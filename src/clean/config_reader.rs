use crate::clean::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::HashMap;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputSource {
    /// csv or xlsx
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "csvDelimiter")]
    pub csv_delimiter: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    /// From the names used during cleaning to the final names.
    #[serde(rename = "columnNames")]
    pub column_names: Option<HashMap<String, String>>,
    /// The final columns, in order. Uses the final names.
    #[serde(rename = "columnOrder")]
    pub column_order: Option<Vec<String>>,
}

/// The names of the raw columns of a response group.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnsSpec {
    Fragment(String),
    Exact(Vec<String>),
}

/// A `[field, operator, value]` triple.
pub type ConditionSpec = (String, String, JSValue);

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapseStep {
    pub columns: ColumnsSpec,
    pub collapsed_column_name: String,
    #[serde(default)]
    pub remove_collapsed_columns: bool,
    pub responses: Option<Vec<String>>,
    #[serde(default)]
    pub recode_other: bool,
    #[serde(default)]
    pub save_other_as_new_column: bool,
    pub new_other_column_name: Option<String>,
    pub other_text: Option<String>,
    pub other_replace: Option<String>,
    /// reject, first or join
    pub free_text: Option<String>,
    pub free_text_separator: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct NotAskedStep {
    pub column: String,
    pub filters: Vec<Vec<ConditionSpec>>,
    pub value: JSValue,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FlagStep {
    pub column: String,
    pub filters: Vec<Vec<ConditionSpec>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStep {
    pub first: String,
    pub second: String,
    pub merged_column_name: String,
    #[serde(default)]
    pub remove_merge_columns: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesStep {
    pub column: String,
    pub labels: Vec<String>,
    pub ordered: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DropStep {
    pub columns: Vec<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CleaningStep {
    Collapse(CollapseStep),
    NotAsked(NotAskedStep),
    Flag(FlagStep),
    Merge(MergeStep),
    Categories(CategoriesStep),
    Drop(DropStep),
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct CleaningConfig {
    #[serde(default)]
    pub input: InputSource,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub steps: Vec<CleaningStep>,
}

impl CollapseStep {
    pub fn selector(&self) -> ColumnSelector {
        match &self.columns {
            ColumnsSpec::Fragment(s) => ColumnSelector::Contains(s.clone()),
            ColumnsSpec::Exact(names) => ColumnSelector::Exact(names.clone()),
        }
    }

    pub fn options(&self, step: usize) -> CleanResult<CollapseOptions> {
        let mut opts = CollapseOptions::new(&self.collapsed_column_name);
        opts.remove_collapsed_columns = self.remove_collapsed_columns;
        opts.responses = self.responses.clone();
        opts.recode_other = self.recode_other;
        opts.save_other_as_new_column = self.save_other_as_new_column;
        opts.new_other_column_name = self.new_other_column_name.clone();
        if let Some(s) = &self.other_text {
            opts.other_text = s.clone();
        }
        if let Some(s) = &self.other_replace {
            opts.other_replace = s.clone();
        }
        opts.free_text_policy = match self.free_text.as_deref() {
            None | Some("reject") => FreeTextPolicy::Reject,
            Some("first") => FreeTextPolicy::First,
            Some("join") => FreeTextPolicy::Join(
                self.free_text_separator
                    .clone()
                    .unwrap_or_else(|| "; ".to_string()),
            ),
            Some(x) => {
                whatever!("step {}: unknown freeText policy {:?}", step, x)
            }
        };
        Ok(opts)
    }
}

pub fn read_config(path: &str) -> CleanResult<CleaningConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: CleaningConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> CleanResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Converts a JSON value to a cell value.
///
/// Arrays become lists of labels.
pub fn read_value(step: usize, js: &JSValue) -> CleanResult<Value> {
    match js {
        JSValue::Null => Ok(Value::Missing),
        JSValue::String(s) => Ok(Value::Text(s.clone())),
        JSValue::Bool(b) => Ok(Value::Bool(*b)),
        JSValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => InvalidValueSnafu {
                step,
                content: js.to_string(),
            }
            .fail(),
        },
        JSValue::Array(elts) => {
            let mut labels: Vec<String> = Vec::new();
            for elt in elts {
                match elt {
                    JSValue::String(s) => labels.push(s.clone()),
                    _ => {
                        return InvalidValueSnafu {
                            step,
                            content: js.to_string(),
                        }
                        .fail();
                    }
                }
            }
            Ok(Value::List(labels))
        }
        JSValue::Object(_) => InvalidValueSnafu {
            step,
            content: js.to_string(),
        }
        .fail(),
    }
}

fn read_operand(step: usize, op: Operator, js: &JSValue) -> CleanResult<Operand> {
    match (op, js) {
        (Operator::In | Operator::NotIn, JSValue::Array(elts)) => {
            let mut vs: Vec<Value> = Vec::new();
            for elt in elts {
                if elt.is_array() {
                    return InvalidValueSnafu {
                        step,
                        content: js.to_string(),
                    }
                    .fail();
                }
                vs.push(read_value(step, elt)?);
            }
            Ok(Operand::Many(vs))
        }
        _ => Ok(Operand::One(read_value(step, js)?)),
    }
}

/// Builds the filter from the clauses of a step.
pub fn read_filter(step: usize, clauses: &[Vec<ConditionSpec>]) -> CleanResult<Filter> {
    let mut res: Vec<Vec<Condition>> = Vec::new();
    for clause in clauses {
        let mut conditions: Vec<Condition> = Vec::new();
        for (field, op_s, js) in clause {
            let op: Operator = op_s.parse().context(CleaningSnafu { step })?;
            let operand = read_operand(step, op, js)?;
            conditions.push((field.clone(), op, operand));
        }
        res.push(conditions);
    }
    Filter::from_clauses(res).context(CleaningSnafu { step })
}
