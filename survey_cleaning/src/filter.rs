use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use crate::config::*;
use crate::dataset::Dataset;

/// A comparison between the value of a field and an operand.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// The value is one of the operands.
    In,
    NotIn,
    /// The list-valued field contains the label.
    Contains,
    NotContains,
}

impl FromStr for Operator {
    type Err = CleaningErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" | "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::LtEq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::GtEq),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "contains" => Ok(Operator::Contains),
            "not contains" => Ok(Operator::NotContains),
            x => Err(CleaningErrors::MalformedFilter(format!(
                "unknown operator {:?}",
                x
            ))),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Contains => "contains",
            Operator::NotContains => "not contains",
        };
        write!(f, "{}", s)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Operand {
    One(Value),
    Many(Vec<Value>),
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::One(v)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::One(Value::text(s))
    }
}

/// A boolean row predicate over the fields of a dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Filter {
    Compare {
        field: String,
        op: Operator,
        operand: Operand,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

/// One `(field, operator, operand)` condition.
pub type Condition = (String, Operator, Operand);

impl Filter {
    pub fn compare(field: &str, op: Operator, operand: impl Into<Operand>) -> Filter {
        Filter::Compare {
            field: field.to_string(),
            op,
            operand: operand.into(),
        }
    }

    /// A filter that matches when all the conditions hold.
    pub fn from_conjunction(conditions: Vec<Condition>) -> Result<Filter, CleaningErrors> {
        if conditions.is_empty() {
            return Err(CleaningErrors::MalformedFilter(
                "empty list of conditions".to_string(),
            ));
        }
        let mut res: Vec<Filter> = Vec::new();
        for (field, op, operand) in conditions {
            check_operand(&field, op, &operand)?;
            res.push(Filter::Compare { field, op, operand });
        }
        Ok(Filter::And(res))
    }

    /// A filter that matches when any of the clauses matches. Each clause matches
    /// when all its conditions hold.
    pub fn from_clauses(clauses: Vec<Vec<Condition>>) -> Result<Filter, CleaningErrors> {
        if clauses.is_empty() {
            return Err(CleaningErrors::MalformedFilter(
                "empty list of clauses".to_string(),
            ));
        }
        let res: Result<Vec<Filter>, CleaningErrors> =
            clauses.into_iter().map(Filter::from_conjunction).collect();
        Ok(Filter::Or(res?))
    }

    /// The fields referenced by this filter, in order of first appearance.
    pub fn fields(&self) -> Vec<String> {
        let mut res: Vec<String> = Vec::new();
        self.collect_fields(&mut res);
        res
    }

    fn collect_fields(&self, acc: &mut Vec<String>) {
        match self {
            Filter::Compare { field, .. } => {
                if !acc.contains(field) {
                    acc.push(field.clone());
                }
            }
            Filter::And(fs) | Filter::Or(fs) => {
                for f in fs {
                    f.collect_fields(acc);
                }
            }
        }
    }

    /// Evaluates the filter against the current values of a row.
    pub fn matches(&self, ds: &Dataset, row: usize) -> Result<bool, CleaningErrors> {
        match self {
            Filter::Compare { field, op, operand } => {
                let cell = ds.get(field, row)?;
                evaluate(field, row, cell, *op, operand)
            }
            Filter::And(fs) => {
                for f in fs {
                    if !f.matches(ds, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(fs) => {
                for f in fs {
                    if f.matches(ds, row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// The indexes of all the rows matching the filter.
    pub fn matching_rows(&self, ds: &Dataset) -> Result<Vec<usize>, CleaningErrors> {
        for f in self.fields() {
            ds.column(&f)?;
        }
        let mut res: Vec<usize> = Vec::new();
        for row in 0..ds.num_rows() {
            if self.matches(ds, row)? {
                res.push(row);
            }
        }
        Ok(res)
    }
}

fn check_operand(field: &str, op: Operator, operand: &Operand) -> Result<(), CleaningErrors> {
    match (op, operand) {
        (Operator::In | Operator::NotIn, Operand::Many(_)) => Ok(()),
        (Operator::In | Operator::NotIn, Operand::One(_)) => Err(CleaningErrors::MalformedFilter(
            format!("{} {}: expected a list of values", field, op),
        )),
        (Operator::Contains | Operator::NotContains, Operand::One(Value::Text(_))) => Ok(()),
        (Operator::Contains | Operator::NotContains, _) => Err(CleaningErrors::MalformedFilter(
            format!("{} {}: expected a single label", field, op),
        )),
        (_, Operand::Many(_)) => Err(CleaningErrors::MalformedFilter(format!(
            "{} {}: expected a single value",
            field, op
        ))),
        (_, Operand::One(Value::List(_))) => Err(CleaningErrors::MalformedFilter(format!(
            "{} {}: cannot compare with a list",
            field, op
        ))),
        _ => Ok(()),
    }
}

fn mismatch(field: &str, row: usize, expected: &str, found: &Value) -> CleaningErrors {
    CleaningErrors::TypeMismatch {
        field: field.to_string(),
        row,
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
}

// Scalar equality. Missing is only equal to Missing.
fn scalar_eq(field: &str, row: usize, cell: &Value, v: &Value) -> Result<bool, CleaningErrors> {
    match (cell, v) {
        (Value::List(_), _) => Err(mismatch(field, row, "a scalar", cell)),
        (_, Value::List(_)) => Err(mismatch(field, row, "a scalar operand", v)),
        (Value::Missing, _) | (_, Value::Missing) => Ok(cell == v),
        (a, b) if a.kind() != b.kind() => Err(mismatch(field, row, b.kind(), a)),
        (a, b) => Ok(a == b),
    }
}

fn scalar_cmp(
    field: &str,
    row: usize,
    cell: &Value,
    v: &Value,
) -> Result<Option<Ordering>, CleaningErrors> {
    match (cell, v) {
        (Value::Missing, _) | (_, Value::Missing) => Ok(None),
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::Text(a), Value::Text(b)) => Ok(Some(a.cmp(b))),
        (a, b) => Err(mismatch(field, row, b.kind(), a)),
    }
}

fn evaluate(
    field: &str,
    row: usize,
    cell: &Value,
    op: Operator,
    operand: &Operand,
) -> Result<bool, CleaningErrors> {
    match (op, operand) {
        (Operator::Eq, Operand::One(v)) => scalar_eq(field, row, cell, v),
        (Operator::NotEq, Operand::One(v)) => scalar_eq(field, row, cell, v).map(|b| !b),
        (Operator::Lt, Operand::One(v)) => {
            Ok(scalar_cmp(field, row, cell, v)? == Some(Ordering::Less))
        }
        (Operator::LtEq, Operand::One(v)) => Ok(matches!(
            scalar_cmp(field, row, cell, v)?,
            Some(Ordering::Less | Ordering::Equal)
        )),
        (Operator::Gt, Operand::One(v)) => {
            Ok(scalar_cmp(field, row, cell, v)? == Some(Ordering::Greater))
        }
        (Operator::GtEq, Operand::One(v)) => Ok(matches!(
            scalar_cmp(field, row, cell, v)?,
            Some(Ordering::Greater | Ordering::Equal)
        )),
        (Operator::In, Operand::Many(vs)) => {
            for v in vs {
                if scalar_eq(field, row, cell, v)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        (Operator::NotIn, Operand::Many(_)) => {
            evaluate(field, row, cell, Operator::In, operand).map(|b| !b)
        }
        (Operator::Contains, Operand::One(Value::Text(label))) => match cell {
            Value::List(l) => Ok(l.contains(label)),
            Value::Missing => Ok(false),
            _ => Err(mismatch(field, row, "list", cell)),
        },
        (Operator::NotContains, Operand::One(Value::Text(_))) => {
            evaluate(field, row, cell, Operator::Contains, operand).map(|b| !b)
        }
        _ => Err(CleaningErrors::MalformedFilter(format!(
            "{} {} {:?}",
            field, op, operand
        ))),
    }
}
