// ********* Cell data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The content of one cell of a survey dataset.
///
/// A cell holds the answer of one respondent (a row) to one question (a column).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Value {
    /// No data recorded.
    Missing,
    /// A categorical label or some free text.
    Text(String),
    /// An integer-coded answer.
    Int(i64),
    /// A per-row flag, usually computed while cleaning.
    Bool(bool),
    /// The selections of a "select all that apply" question.
    /// The empty list means that no selection was recorded.
    List(Vec<String>),
}

impl Value {
    pub fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    pub fn list(labels: &[&str]) -> Value {
        Value::List(labels.iter().map(|s| s.to_string()).collect())
    }

    /// True for `Missing` and for the empty list.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::List(l) => l.is_empty(),
            _ => false,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    /// The label of a scalar value, as it would appear in a vocabulary.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Missing | Value::List(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Text(_) => "text",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// The fixed vocabulary of a categorical column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Categories {
    pub labels: Vec<String>,
    pub ordered: bool,
}

// ********* Collapse configuration **********

/// How the raw one-hot columns of a response group are found.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ColumnSelector {
    /// Every column whose name contains the fragment.
    /// Matching no column at all is accepted.
    Contains(String),
    /// An explicit list of column names. All of them must exist.
    Exact(Vec<String>),
}

/// What to do when a row carries more than one free-text entry.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FreeTextPolicy {
    /// Fail with `CleaningErrors::AmbiguousFreeText`.
    Reject,
    /// Keep the first entry, in column order.
    First,
    /// Concatenate all the entries with the given separator.
    Join(String),
}

pub const DEFAULT_OTHER_TEXT: &str = "Other (please specify)";
pub const DEFAULT_OTHER_REPLACE: &str = "Other";

/// Options for `collapse_select_all`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CollapseOptions {
    pub collapsed_column_name: String,
    pub remove_collapsed_columns: bool,
    /// The valid (enumerated) responses. Required when recoding or saving
    /// the 'Other' answers.
    pub responses: Option<Vec<String>>,
    pub recode_other: bool,
    pub save_other_as_new_column: bool,
    /// Defaults to `"<collapsed column name>: Other"`.
    pub new_other_column_name: Option<String>,
    /// The label used by the export for the 'Other' option.
    pub other_text: String,
    /// The label that replaces the 'Other' option and its free text.
    pub other_replace: String,
    pub free_text_policy: FreeTextPolicy,
}

impl CollapseOptions {
    pub fn new(collapsed_column_name: &str) -> CollapseOptions {
        CollapseOptions {
            collapsed_column_name: collapsed_column_name.to_string(),
            remove_collapsed_columns: false,
            responses: None,
            recode_other: false,
            save_other_as_new_column: false,
            new_other_column_name: None,
            other_text: DEFAULT_OTHER_TEXT.to_string(),
            other_replace: DEFAULT_OTHER_REPLACE.to_string(),
            free_text_policy: FreeTextPolicy::Reject,
        }
    }
}

// ******** Errors *********

/// Errors that stop the cleaning of a dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CleaningErrors {
    /// A column name that does not exist in the dataset.
    UnknownField(String),
    /// A comparison or a cast that does not fit the type of the cell.
    TypeMismatch {
        field: String,
        row: usize,
        expected: String,
        found: String,
    },
    MalformedFilter(String),
    /// Recoding or extracting 'Other' answers requires the list of valid responses.
    MissingResponses(String),
    AmbiguousFreeText {
        field: String,
        row: usize,
        entries: Vec<String>,
    },
    /// Both questions of a merge were answered.
    ConflictingValues { row: usize },
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },
    DuplicateColumn(String),
}

impl Error for CleaningErrors {}

impl Display for CleaningErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleaningErrors::UnknownField(name) => write!(f, "unknown field {:?}", name),
            CleaningErrors::TypeMismatch {
                field,
                row,
                expected,
                found,
            } => write!(
                f,
                "type mismatch in field {:?} at row {}: expected {}, found {}",
                field, row, expected, found
            ),
            CleaningErrors::MalformedFilter(msg) => write!(f, "malformed filter: {}", msg),
            CleaningErrors::MissingResponses(name) => write!(
                f,
                "the list of responses is required to handle 'Other' answers in {:?}",
                name
            ),
            CleaningErrors::AmbiguousFreeText {
                field,
                row,
                entries,
            } => write!(
                f,
                "more than one free-text answer in {:?} at row {}: {:?}",
                field, row, entries
            ),
            CleaningErrors::ConflictingValues { row } => {
                write!(f, "row {} has a value in both merged questions", row)
            }
            CleaningErrors::LengthMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "column {:?} has {} values but the dataset has {} rows",
                field, found, expected
            ),
            CleaningErrors::DuplicateColumn(name) => write!(f, "duplicate column {:?}", name),
        }
    }
}
