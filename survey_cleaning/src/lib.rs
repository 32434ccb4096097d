mod config;
mod dataset;
mod filter;
use log::{debug, info, warn};

use std::collections::HashSet;

pub mod builder;
pub mod manual;

pub use crate::config::*;
pub use crate::dataset::{Column, Dataset};
pub use crate::filter::{Condition, Filter, Operand, Operator};

/// Collapses the one-hot columns of a "select all that apply" question into a
/// single list-valued column.
///
/// Arguments:
/// * `ds` the dataset, updated in place
/// * `selector` the raw columns of the response group
/// * `options` the name of the collapsed column and the treatment of the 'Other' answers
///
/// For each row, the collapsed list holds the text cells of the group, in column
/// order. A row without any selection gets the empty list.
///
/// When `recode_other` or `save_other_as_new_column` is set, the rows that contain
/// an entry outside of the valid responses are handled further: the free text can be
/// copied into its own column, and the free text and the 'Other' option of the export
/// are replaced by a single 'Other' label.
pub fn collapse_select_all(
    ds: &mut Dataset,
    selector: &ColumnSelector,
    options: &CollapseOptions,
) -> Result<(), CleaningErrors> {
    let collapsed_name = options.collapsed_column_name.as_str();
    let group = resolve_group(ds, selector)?;
    if group.is_empty() {
        warn!(
            "collapse_select_all: no column found for {:?}, {:?} will only contain empty lists",
            selector, collapsed_name
        );
    }
    debug!("collapse_select_all: {:?}: group: {:?}", collapsed_name, group);

    let handle_other = options.recode_other || options.save_other_as_new_column;
    let responses: Option<HashSet<&str>> = match (&options.responses, handle_other) {
        (Some(rs), _) => Some(rs.iter().map(|s| s.as_str()).collect()),
        (None, true) => {
            return Err(CleaningErrors::MissingResponses(collapsed_name.to_string()));
        }
        (None, false) => None,
    };

    let other_column_name: Option<String> = if options.save_other_as_new_column {
        Some(match &options.new_other_column_name {
            Some(n) => n.clone(),
            None => {
                let n = format!("{}: Other", collapsed_name);
                warn!(
                    "collapse_select_all: new_other_column_name not provided, using {:?}",
                    n
                );
                n
            }
        })
    } else {
        None
    };

    let mut collapsed: Vec<Value> = Vec::with_capacity(ds.num_rows());
    let mut other_values: Vec<Value> = Vec::new();
    let mut num_touched: usize = 0;
    for row in 0..ds.num_rows() {
        let mut items: Vec<String> = Vec::new();
        for name in group.iter() {
            if let Value::Text(s) = ds.get(name, row)? {
                items.push(s.clone());
            }
        }

        if let (true, Some(rs)) = (handle_other, &responses) {
            let touched = items.iter().any(|item| !rs.contains(item.as_str()));
            if touched {
                num_touched += 1;
                debug!(
                    "collapse_select_all: {:?}: row {}: other answers in {:?}",
                    collapsed_name, row, items
                );
            }
            if options.save_other_as_new_column {
                let other = if touched {
                    let free_text: Vec<String> = items
                        .iter()
                        .filter(|item| {
                            !rs.contains(item.as_str()) && **item != options.other_text
                        })
                        .cloned()
                        .collect();
                    extract_free_text(collapsed_name, row, free_text, &options.free_text_policy)?
                } else {
                    Value::Missing
                };
                other_values.push(other);
            }
            if options.recode_other && touched {
                items = recode_other_entries(items, rs, &options.other_replace);
            }
        }
        collapsed.push(Value::List(items));
    }

    ds.insert_column(Column::new(collapsed_name, collapsed))?;
    if let Some(other_name) = &other_column_name {
        ds.insert_column(Column::new(other_name, other_values))?;
    }

    if options.remove_collapsed_columns {
        let to_remove: Vec<String> = group
            .into_iter()
            .filter(|n| n != collapsed_name && Some(n) != other_column_name.as_ref())
            .collect();
        debug!("collapse_select_all: removing columns {:?}", to_remove);
        ds.drop_columns(&to_remove)?;
    }

    info!(
        "collapse_select_all: {:?}: collapsed {} rows, {} rows with other answers",
        collapsed_name,
        ds.num_rows(),
        num_touched
    );
    Ok(())
}

fn resolve_group(ds: &Dataset, selector: &ColumnSelector) -> Result<Vec<String>, CleaningErrors> {
    match selector {
        ColumnSelector::Contains(fragment) => Ok(ds.matching_columns(fragment)),
        ColumnSelector::Exact(names) => {
            for n in names {
                ds.column(n)?;
            }
            Ok(names.clone())
        }
    }
}

fn extract_free_text(
    field: &str,
    row: usize,
    free_text: Vec<String>,
    policy: &FreeTextPolicy,
) -> Result<Value, CleaningErrors> {
    match (free_text.as_slice(), policy) {
        ([], _) => Ok(Value::Missing),
        ([s], _) => Ok(Value::Text(s.clone())),
        (_, FreeTextPolicy::Reject) => Err(CleaningErrors::AmbiguousFreeText {
            field: field.to_string(),
            row,
            entries: free_text,
        }),
        ([s, ..], FreeTextPolicy::First) => {
            warn!(
                "extract_free_text: {:?}: row {}: keeping {:?} out of {:?}",
                field, row, s, free_text
            );
            Ok(Value::Text(s.clone()))
        }
        (_, FreeTextPolicy::Join(sep)) => Ok(Value::Text(free_text.join(sep))),
    }
}

// The 'Other' option and the free text both become the replacement label,
// which is kept once at the position of its first occurence.
fn recode_other_entries(
    items: Vec<String>,
    responses: &HashSet<&str>,
    other_replace: &str,
) -> Vec<String> {
    let mut res: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let new_item = if responses.contains(item.as_str()) {
            item
        } else {
            other_replace.to_string()
        };
        if new_item == other_replace && res.iter().any(|s| s == other_replace) {
            continue;
        }
        res.push(new_item);
    }
    res
}

/// Marks the rows where a question was not asked.
///
/// Arguments:
/// * `ds` the dataset, updated in place
/// * `column` the question that may have been skipped
/// * `filter` the skip condition, evaluated against the current values of the other fields
/// * `not_asked_value` the value stored in every matching row. For list-valued
/// questions, it is usually a list with a single label.
///
/// Returns the number of rows that matched.
///
/// The not-asked status of upstream questions is not propagated implicitly: the filter
/// must check for it when it should be carried forward.
pub fn set_not_asked_responses(
    ds: &mut Dataset,
    column: &str,
    filter: &Filter,
    not_asked_value: &Value,
) -> Result<usize, CleaningErrors> {
    if let Some(cats) = &ds.column(column)?.categories {
        // A column with a vocabulary only accepts its labels.
        let accepted = match not_asked_value {
            Value::Missing => true,
            Value::List(_) => false,
            v => v
                .label()
                .map(|l| cats.labels.contains(&l))
                .unwrap_or(false),
        };
        if !accepted {
            return Err(CleaningErrors::TypeMismatch {
                field: column.to_string(),
                row: 0,
                expected: format!("a label of {:?}", cats.labels),
                found: format!("{:?}", not_asked_value),
            });
        }
    }
    let exclusion_columns = filter.fields();
    debug!(
        "set_not_asked_responses: {:?}: exclusion columns: {:?}",
        column, exclusion_columns
    );
    for c in exclusion_columns.iter() {
        ds.column(c)?;
    }

    // All the rows are evaluated before writing anything.
    let rows = filter.matching_rows(ds)?;
    if rows.is_empty() {
        debug!("set_not_asked_responses: {:?}: no matching row", column);
        return Ok(0);
    }

    let col = ds.column_mut(column)?;
    for row in rows.iter() {
        // Every cell gets its own copy of the value.
        col.values[*row] = not_asked_value.clone();
    }
    info!(
        "set_not_asked_responses: {:?}: {} rows set to {:?}",
        column,
        rows.len(),
        not_asked_value
    );
    Ok(rows.len())
}

/// Stores the outcome of a filter as a boolean column.
///
/// This is used to combine the not-asked status of several upstream questions
/// into a single flag, which can then drive another `set_not_asked_responses` pass.
///
/// Returns the number of rows flagged.
pub fn flag_rows(ds: &mut Dataset, column: &str, filter: &Filter) -> Result<usize, CleaningErrors> {
    let rows: HashSet<usize> = filter.matching_rows(ds)?.into_iter().collect();
    let values: Vec<Value> = (0..ds.num_rows())
        .map(|row| Value::Bool(rows.contains(&row)))
        .collect();
    ds.insert_column(Column::new(column, values))?;
    debug!("flag_rows: {:?}: {} rows flagged", column, rows.len());
    Ok(rows.len())
}

/// Merges two versions of the same question that were shown to disjoint groups of
/// respondents (for example the owner and the employee variants).
///
/// A row may have a value in at most one of the two columns.
pub fn merge_two_questions(
    ds: &mut Dataset,
    merge_column_1: &str,
    merge_column_2: &str,
    merge_column_name: &str,
    remove_merge_columns: bool,
) -> Result<(), CleaningErrors> {
    let mut merged: Vec<Value> = Vec::with_capacity(ds.num_rows());
    for row in 0..ds.num_rows() {
        let first = ds.get(merge_column_1, row)?;
        let second = ds.get(merge_column_2, row)?;
        let v = match (first.is_missing(), second.is_missing()) {
            (false, true) | (true, true) => first.clone(),
            (true, false) => second.clone(),
            (false, false) => {
                return Err(CleaningErrors::ConflictingValues { row });
            }
        };
        merged.push(v);
    }
    ds.insert_column(Column::new(merge_column_name, merged))?;

    if remove_merge_columns {
        let to_remove: Vec<String> = [merge_column_1, merge_column_2]
            .iter()
            .filter(|n| **n != merge_column_name)
            .map(|n| n.to_string())
            .collect();
        ds.drop_columns(&to_remove)?;
    }
    Ok(())
}

/// Assigns a fixed vocabulary to a scalar column.
///
/// The values that are not part of the vocabulary are replaced by `Value::Missing`.
/// In particular, a not-asked label must be included in the vocabulary to be kept.
///
/// Returns the number of values that were discarded.
pub fn cast_categorical(
    ds: &mut Dataset,
    column: &str,
    categories: &Categories,
) -> Result<usize, CleaningErrors> {
    let labels: HashSet<&str> = categories.labels.iter().map(|s| s.as_str()).collect();
    let col = ds.column_mut(column)?;
    if let Some((row, v)) = col
        .values
        .iter()
        .enumerate()
        .find(|(_, v)| matches!(v, Value::List(_)))
    {
        return Err(CleaningErrors::TypeMismatch {
            field: column.to_string(),
            row,
            expected: "a scalar".to_string(),
            found: v.kind().to_string(),
        });
    }
    let mut discarded: Vec<String> = Vec::new();
    for v in col.values.iter_mut() {
        if let Some(label) = v.label() {
            if !labels.contains(label.as_str()) {
                discarded.push(label);
                *v = Value::Missing;
            }
        }
    }
    col.categories = Some(categories.clone());
    if !discarded.is_empty() {
        warn!(
            "cast_categorical: {:?}: {} values outside of the vocabulary were discarded: {:?}",
            column,
            discarded.len(),
            discarded
        );
    }
    Ok(discarded.len())
}

#[cfg(test)]
mod tests {
    use super::builder::Builder;
    use super::*;

    const NOT_ASKED: &str = "Not asked";

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn options_xy() -> CollapseOptions {
        let mut opts = CollapseOptions::new("7. Options");
        opts.responses = Some(vec!["X".to_string(), "Y".to_string()]);
        opts
    }

    // The group of "7. Options": X, Y and the free text of Other.
    fn group_data() -> Dataset {
        let mut b = Builder::new(&header(&[
            "id",
            "7. Options: X",
            "7. Options: Y",
            "7. Options: Other",
            "8. Next",
        ]))
        .unwrap();
        b.add_row_simple(&["r1", "", "Y", "custom text", "a"]).unwrap();
        b.add_row_simple(&["r2", "X", "Y", "", "b"]).unwrap();
        b.add_row_simple(&["r3", "", "", "", "c"]).unwrap();
        b.add_row_simple(&["r4", "X", "", "Other (please specify)", "d"])
            .unwrap();
        b.build().unwrap()
    }

    fn skip_data() -> Dataset {
        let mut b = Builder::new(&header(&["role", "size", "owns_company_size"])).unwrap();
        b.add_row_simple(&["employee", "large", "5-10"]).unwrap();
        b.add_row_simple(&["owner", "small", "5-10"]).unwrap();
        b.add_row_simple(&["owner", "large", "50+"]).unwrap();
        b.add_row_simple(&["contractor", "small", ""]).unwrap();
        b.build().unwrap()
    }

    fn role_is_not_owner() -> Filter {
        Filter::compare("role", Operator::NotEq, "owner")
    }

    #[test]
    fn collapse_keeps_exactly_the_selections() {
        init();
        let mut ds = group_data();
        let opts = CollapseOptions::new("7. Options");
        collapse_select_all(&mut ds, &ColumnSelector::Contains("7. Options".to_string()), &opts)
            .unwrap();
        let col = ds.column("7. Options").unwrap();
        assert_eq!(
            col.values,
            vec![
                Value::list(&["Y", "custom text"]),
                Value::list(&["X", "Y"]),
                Value::list(&[]),
                Value::list(&["X", "Other (please specify)"]),
            ]
        );
        // The raw columns are kept by default.
        assert!(ds.has_column("7. Options: X"));
    }

    #[test]
    fn collapse_recodes_and_saves_other() {
        init();
        let mut ds = group_data();
        let mut opts = options_xy();
        opts.recode_other = true;
        opts.save_other_as_new_column = true;
        opts.new_other_column_name = Some("7o. Options: Other".to_string());
        opts.remove_collapsed_columns = true;
        collapse_select_all(&mut ds, &ColumnSelector::Contains("7. Options".to_string()), &opts)
            .unwrap();

        assert_eq!(
            ds.column_names(),
            vec!["id", "8. Next", "7. Options", "7o. Options: Other"]
        );
        assert_eq!(ds.get("7. Options", 0).unwrap(), &Value::list(&["Y", "Other"]));
        assert_eq!(
            ds.get("7o. Options: Other", 0).unwrap(),
            &Value::text("custom text")
        );
        assert_eq!(ds.get("7. Options", 1).unwrap(), &Value::list(&["X", "Y"]));
        assert_eq!(ds.get("7o. Options: Other", 1).unwrap(), &Value::Missing);
        assert_eq!(ds.get("7. Options", 2).unwrap(), &Value::list(&[]));
        // The 'Other' option without free text.
        assert_eq!(ds.get("7. Options", 3).unwrap(), &Value::list(&["X", "Other"]));
        assert_eq!(ds.get("7o. Options: Other", 3).unwrap(), &Value::Missing);
    }

    #[test]
    fn recoded_lists_never_keep_free_text() {
        init();
        let mut ds = group_data();
        let mut opts = options_xy();
        opts.recode_other = true;
        opts.save_other_as_new_column = true;
        collapse_select_all(&mut ds, &ColumnSelector::Contains("7. Options".to_string()), &opts)
            .unwrap();
        for row in 0..ds.num_rows() {
            let items = ds.get("7. Options", row).unwrap().as_list().unwrap().to_vec();
            let other = ds.get("7. Options: Other", row).unwrap();
            for item in items.iter() {
                assert!(["X", "Y", "Other"].contains(&item.as_str()), "{:?}", item);
            }
            if let Value::Text(s) = other {
                assert!(!items.contains(s));
                assert!(items.contains(&"Other".to_string()));
            }
        }
    }

    #[test]
    fn collapse_saves_other_without_recoding() {
        init();
        let mut ds = group_data();
        let mut opts = options_xy();
        opts.save_other_as_new_column = true;
        collapse_select_all(&mut ds, &ColumnSelector::Contains("7. Options".to_string()), &opts)
            .unwrap();
        assert_eq!(
            ds.get("7. Options", 0).unwrap(),
            &Value::list(&["Y", "custom text"])
        );
        assert_eq!(
            ds.get("7. Options: Other", 0).unwrap(),
            &Value::text("custom text")
        );
    }

    #[test]
    fn collapse_without_matching_columns() {
        init();
        let mut ds = group_data();
        let opts = CollapseOptions::new("99. Nothing");
        collapse_select_all(&mut ds, &ColumnSelector::Contains("99.".to_string()), &opts)
            .unwrap();
        let col = ds.column("99. Nothing").unwrap();
        assert!(col.values.iter().all(|v| *v == Value::list(&[])));
    }

    #[test]
    fn collapse_exact_columns_are_validated() {
        let mut ds = group_data();
        let opts = CollapseOptions::new("7. Options");
        let sel = ColumnSelector::Exact(vec![
            "7. Options: X".to_string(),
            "7. Options: Z".to_string(),
        ]);
        assert_eq!(
            collapse_select_all(&mut ds, &sel, &opts),
            Err(CleaningErrors::UnknownField("7. Options: Z".to_string()))
        );

        let sel = ColumnSelector::Exact(vec!["7. Options: X".to_string()]);
        collapse_select_all(&mut ds, &sel, &opts).unwrap();
        assert_eq!(ds.get("7. Options", 1).unwrap(), &Value::list(&["X"]));
    }

    #[test]
    fn collapse_replaces_raw_column_with_same_name() {
        let mut b = Builder::new(&header(&["11. Work", "11. Work: B"])).unwrap();
        b.add_row_simple(&["A", "B"]).unwrap();
        b.add_row_simple(&["", "B"]).unwrap();
        let mut ds = b.build().unwrap();
        let mut opts = CollapseOptions::new("11. Work");
        opts.remove_collapsed_columns = true;
        collapse_select_all(&mut ds, &ColumnSelector::Contains("11. Work".to_string()), &opts)
            .unwrap();
        assert_eq!(ds.column_names(), vec!["11. Work"]);
        assert_eq!(ds.get("11. Work", 0).unwrap(), &Value::list(&["A", "B"]));
        assert_eq!(ds.get("11. Work", 1).unwrap(), &Value::list(&["B"]));
    }

    #[test]
    fn collapse_requires_responses_for_other() {
        let mut ds = group_data();
        let mut opts = CollapseOptions::new("7. Options");
        opts.recode_other = true;
        assert_eq!(
            collapse_select_all(&mut ds, &ColumnSelector::Contains("7. Options".to_string()), &opts),
            Err(CleaningErrors::MissingResponses("7. Options".to_string()))
        );
    }

    #[test]
    fn several_free_texts() {
        let mut b = Builder::new(&header(&["q: A", "q: other 1", "q: other 2"])).unwrap();
        b.add_row_simple(&["A", "first", "second"]).unwrap();
        let raw = b.build().unwrap();
        let mut opts = CollapseOptions::new("q");
        opts.responses = Some(vec!["A".to_string()]);
        opts.save_other_as_new_column = true;
        opts.recode_other = true;
        let sel = ColumnSelector::Contains("q: ".to_string());

        let mut ds = raw.clone();
        assert!(matches!(
            collapse_select_all(&mut ds, &sel, &opts),
            Err(CleaningErrors::AmbiguousFreeText { row: 0, .. })
        ));

        let mut ds = raw.clone();
        opts.free_text_policy = FreeTextPolicy::First;
        collapse_select_all(&mut ds, &sel, &opts).unwrap();
        assert_eq!(ds.get("q: Other", 0).unwrap(), &Value::text("first"));
        assert_eq!(ds.get("q", 0).unwrap(), &Value::list(&["A", "Other"]));

        let mut ds = raw;
        opts.free_text_policy = FreeTextPolicy::Join("; ".to_string());
        collapse_select_all(&mut ds, &sel, &opts).unwrap();
        assert_eq!(ds.get("q: Other", 0).unwrap(), &Value::text("first; second"));
    }

    #[test]
    fn not_asked_for_non_owners() {
        init();
        let mut ds = skip_data();
        let n = set_not_asked_responses(
            &mut ds,
            "owns_company_size",
            &role_is_not_owner(),
            &Value::text(NOT_ASKED),
        )
        .unwrap();
        assert_eq!(n, 2);
        let col = ds.column("owns_company_size").unwrap();
        assert_eq!(
            col.values,
            vec![
                Value::text(NOT_ASKED),
                Value::text("5-10"),
                Value::text("50+"),
                Value::text(NOT_ASKED),
            ]
        );
    }

    #[test]
    fn not_asked_is_idempotent() {
        init();
        // The filter depends on the column that gets overwritten.
        let filter = Filter::from_clauses(vec![
            vec![(
                "owns_company_size".to_string(),
                Operator::NotEq,
                "5-10".into(),
            )],
            vec![("role".to_string(), Operator::Eq, "employee".into())],
        ])
        .unwrap();
        let mut once = skip_data();
        set_not_asked_responses(&mut once, "owns_company_size", &filter, &Value::text(NOT_ASKED))
            .unwrap();
        let mut twice = once.clone();
        set_not_asked_responses(&mut twice, "owns_company_size", &filter, &Value::text(NOT_ASKED))
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn two_branch_points() {
        init();
        let mut ds = skip_data();
        let sentinel = Value::text(NOT_ASKED);
        set_not_asked_responses(&mut ds, "owns_company_size", &role_is_not_owner(), &sentinel)
            .unwrap();
        let large = Filter::compare("size", Operator::Eq, "large");
        set_not_asked_responses(&mut ds, "owns_company_size", &large, &sentinel).unwrap();
        let col = ds.column("owns_company_size").unwrap();
        assert_eq!(
            col.values,
            vec![
                sentinel.clone(),
                Value::text("5-10"),
                sentinel.clone(),
                sentinel,
            ]
        );
    }

    #[test]
    fn multi_field_filter() {
        let mut ds = skip_data();
        let filter = Filter::from_clauses(vec![
            vec![("role".to_string(), Operator::Eq, "owner".into()),
                 ("size".to_string(), Operator::Eq, "large".into())],
            vec![("role".to_string(), Operator::Eq, "contractor".into())],
        ])
        .unwrap();
        let n = set_not_asked_responses(&mut ds, "owns_company_size", &filter, &Value::Int(-1))
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(ds.get("owns_company_size", 2).unwrap(), &Value::Int(-1));
        assert_eq!(ds.get("owns_company_size", 3).unwrap(), &Value::Int(-1));
    }

    #[test]
    fn list_sentinels_are_independent() {
        init();
        let mut ds = skip_data();
        ds.insert_column(Column::new(
            "regions",
            vec![Value::list(&["England"]); 4],
        ))
        .unwrap();
        let everyone = Filter::compare("role", Operator::NotEq, "nobody");
        let n = set_not_asked_responses(&mut ds, "regions", &everyone, &Value::list(&[NOT_ASKED]))
            .unwrap();
        assert_eq!(n, 4);

        if let Value::List(l) = &mut ds.column_mut("regions").unwrap().values[0] {
            l.push("Wales".to_string());
        }
        assert_eq!(
            ds.get("regions", 0).unwrap(),
            &Value::list(&[NOT_ASKED, "Wales"])
        );
        for row in 1..4 {
            assert_eq!(ds.get("regions", row).unwrap(), &Value::list(&[NOT_ASKED]));
        }
    }

    #[test]
    fn not_asked_errors() {
        let mut ds = skip_data();
        let sentinel = Value::text(NOT_ASKED);
        assert_eq!(
            set_not_asked_responses(&mut ds, "nope", &role_is_not_owner(), &sentinel),
            Err(CleaningErrors::UnknownField("nope".to_string()))
        );
        let bad = Filter::compare("rôle", Operator::Eq, "owner");
        assert_eq!(
            set_not_asked_responses(&mut ds, "owns_company_size", &bad, &sentinel),
            Err(CleaningErrors::UnknownField("rôle".to_string()))
        );
        let nothing = Filter::compare("role", Operator::Eq, "astronaut");
        let before = ds.clone();
        assert_eq!(
            set_not_asked_responses(&mut ds, "owns_company_size", &nothing, &sentinel),
            Ok(0)
        );
        assert_eq!(before, ds);
    }

    #[test]
    fn joint_exclusion_through_flag() {
        init();
        // 9a is only asked to owners, 9b only to employees. 10 is skipped when
        // both were not asked.
        let mut b = Builder::new(&header(&["9a", "9b", "10"])).unwrap();
        b.add_row_simple(&["yes", NOT_ASKED, "a"]).unwrap();
        b.add_row_simple(&[NOT_ASKED, "no", "b"]).unwrap();
        b.add_row_simple(&[NOT_ASKED, NOT_ASKED, "c"]).unwrap();
        let mut ds = b.build().unwrap();

        let both = Filter::from_conjunction(vec![
            ("9a".to_string(), Operator::Eq, NOT_ASKED.into()),
            ("9b".to_string(), Operator::Eq, NOT_ASKED.into()),
        ])
        .unwrap();
        assert_eq!(flag_rows(&mut ds, "_skip_10", &both).unwrap(), 1);
        let flag = Filter::compare("_skip_10", Operator::Eq, Value::Bool(true));
        set_not_asked_responses(&mut ds, "10", &flag, &Value::text(NOT_ASKED)).unwrap();
        ds.drop_columns(&["_skip_10".to_string()]).unwrap();

        assert_eq!(ds.column_names(), vec!["9a", "9b", "10"]);
        assert_eq!(ds.get("10", 0).unwrap(), &Value::text("a"));
        assert_eq!(ds.get("10", 1).unwrap(), &Value::text("b"));
        assert_eq!(ds.get("10", 2).unwrap(), &Value::text(NOT_ASKED));
    }

    #[test]
    fn casting_drops_labels_outside_vocabulary() {
        init();
        let mut ds = skip_data();
        set_not_asked_responses(
            &mut ds,
            "owns_company_size",
            &role_is_not_owner(),
            &Value::text(NOT_ASKED),
        )
        .unwrap();

        let mut with_sentinel = ds.clone();
        let cats = Categories {
            labels: vec!["5-10".to_string(), "50+".to_string(), NOT_ASKED.to_string()],
            ordered: true,
        };
        assert_eq!(
            cast_categorical(&mut with_sentinel, "owns_company_size", &cats).unwrap(),
            0
        );
        assert_eq!(
            with_sentinel.column("owns_company_size").unwrap().categories,
            Some(cats)
        );

        let cats = Categories {
            labels: vec!["5-10".to_string(), "50+".to_string()],
            ordered: true,
        };
        assert_eq!(cast_categorical(&mut ds, "owns_company_size", &cats).unwrap(), 2);
        assert_eq!(ds.get("owns_company_size", 0).unwrap(), &Value::Missing);
        assert_eq!(ds.get("owns_company_size", 1).unwrap(), &Value::text("5-10"));
    }

    #[test]
    fn not_asked_after_casting_must_be_in_vocabulary() {
        init();
        let mut ds = skip_data();
        let cats = Categories {
            labels: vec!["small".to_string(), "large".to_string()],
            ordered: false,
        };
        cast_categorical(&mut ds, "size", &cats).unwrap();
        let before = ds.clone();
        assert!(matches!(
            set_not_asked_responses(&mut ds, "size", &role_is_not_owner(), &Value::text(NOT_ASKED)),
            Err(CleaningErrors::TypeMismatch { .. })
        ));
        assert!(matches!(
            set_not_asked_responses(
                &mut ds,
                "size",
                &role_is_not_owner(),
                &Value::list(&[NOT_ASKED])
            ),
            Err(CleaningErrors::TypeMismatch { .. })
        ));
        assert_eq!(ds, before);

        // Labels of the vocabulary and missing values are accepted.
        assert_eq!(
            set_not_asked_responses(&mut ds, "size", &role_is_not_owner(), &Value::text("small"))
                .unwrap(),
            2
        );
        assert_eq!(
            set_not_asked_responses(&mut ds, "size", &role_is_not_owner(), &Value::Missing)
                .unwrap(),
            2
        );
        assert_eq!(ds.column("size").unwrap().categories, Some(cats));
    }

    #[test]
    fn casting_rejects_lists() {
        let mut ds = group_data();
        collapse_select_all(
            &mut ds,
            &ColumnSelector::Contains("7. Options".to_string()),
            &CollapseOptions::new("7. Options"),
        )
        .unwrap();
        let cats = Categories {
            labels: vec!["X".to_string()],
            ordered: false,
        };
        assert!(matches!(
            cast_categorical(&mut ds, "7. Options", &cats),
            Err(CleaningErrors::TypeMismatch { .. })
        ));
    }

    #[test]
    fn merge_disjoint_questions() {
        let mut b = Builder::new(&header(&["6a", "6b"])).unwrap();
        b.add_row_simple(&["small", ""]).unwrap();
        b.add_row_simple(&["", "large"]).unwrap();
        b.add_row_simple(&["", ""]).unwrap();
        let mut ds = b.build().unwrap();
        merge_two_questions(&mut ds, "6a", "6b", "6. Size", true).unwrap();
        assert_eq!(ds.column_names(), vec!["6. Size"]);
        assert_eq!(
            ds.column("6. Size").unwrap().values,
            vec![Value::text("small"), Value::text("large"), Value::Missing]
        );
    }

    #[test]
    fn merge_rejects_conflicts() {
        let mut b = Builder::new(&header(&["6a", "6b"])).unwrap();
        b.add_row_simple(&["small", ""]).unwrap();
        b.add_row_simple(&["small", "large"]).unwrap();
        let mut ds = b.build().unwrap();
        assert_eq!(
            merge_two_questions(&mut ds, "6a", "6b", "6", false),
            Err(CleaningErrors::ConflictingValues { row: 1 })
        );
    }
}
