/*!

This is the long-form manual for `survey_cleaning` and `surveyclean`.

## The three states of an answer

Branching surveys only show some questions to some respondents. After cleaning,
every cell of a conditional question is in exactly one of these states:

* answered: a label, or a non-empty list of labels for "select all that apply" questions
* not asked: the not-asked label (for example `Not asked`), or a list containing only this label
* missing: the question was shown but no answer was recorded. This is `null` for
  scalar questions and the empty list for "select all that apply" questions.

## Cleaning a question

The cleaning of one question follows the same sequence:

1. collapse the one-hot columns of the export into a list (`collapse_select_all`),
   if the question accepts several answers
2. stamp the not-asked label with one `set_not_asked_responses` pass for each branch of
   the survey that may have skipped the question, outermost branch first
3. assign the vocabulary of the question (`cast_categorical`), including the not-asked label

Not-asked status is never propagated implicitly. When question 9 is only shown to the
respondents who were asked question 8, the filter of question 9 must check for the
not-asked label of question 8.

When the decision depends on two branches that exclude each other, compute a flag column
first (`flag_rows`), use it in the filter, then drop it.

## Input formats

### `csv`

The first row holds the names of the columns. Empty cells are missing values.
A column whose non-empty cells are all integers is read as integers, like the
numbers of an Excel worksheet, so that `>= 5` compares numbers. All the other
columns are read as text, and the ordering operators compare text in
lexicographic order (`"10" < "5"`).

```text
id,5. Are you responding as...,7. Family: Spouse,7. Family: Children,7. Family: Other
r1,The owner or co-owner of a firm,Spouse,,
r2,An employee of a firm,,,
```

### `xlsx`

The same layout, in an Excel worksheet. The name of the worksheet must be provided when
the file has more than one.

## Configuration

`surveyclean` reads a JSON file describing the input, the output and the ordered list of
cleaning steps. Relative paths are resolved from the directory of the configuration file.

```text
{
  "input": { "provider": "csv", "filePath": "export.csv" },
  "output": {
    "filePath": "clean.parquet",
    "columnNames": { "role": "5. Are you responding to this survey as…" },
    "columnOrder": ["5. Are you responding to this survey as…", "6a. What size company do you own?"]
  },
  "steps": [
    { "kind": "collapse", "columns": "7. Family", "collapsedColumnName": "7. Family",
      "removeCollapsedColumns": true, "responses": ["Spouse", "Children"],
      "recodeOther": true, "saveOtherAsNewColumn": true },
    { "kind": "notAsked", "column": "6a. What size company do you own?",
      "filters": [[["role", "!=", "The owner or co-owner of a firm"]]],
      "value": "Not asked" },
    { "kind": "notAsked", "column": "7. Family",
      "filters": [[["6a. What size company do you own?", "not in", ["Sole trader", "5 or fewer"]]]],
      "value": ["Not asked"] },
    { "kind": "categories", "column": "6a. What size company do you own?",
      "labels": ["Sole trader", "5 or fewer", "6 or more", "Not asked"], "ordered": true }
  ]
}
```

The filters are a list of clauses. A row matches when all the conditions of at least one
clause hold. The conditions are `[field, operator, value]` triples, with the operators
`==`, `!=`, `<`, `<=`, `>`, `>=`, `in`, `not in` (the value is a list),
`contains` and `not contains` (the field is a list, the value a single label).

Other steps:
 - `flag` (`column`, `filters`): stores the outcome of the filters as a boolean column.
 - `merge` (`first`, `second`, `mergedColumnName`, `removeMergeColumns`): merges two
   questions shown to disjoint groups of respondents.
 - `drop` (`columns`): removes columns.

Options of `collapse`:
 - `columns` (string or array of strings): a fragment of the names of the raw columns, or the
   exact list of names.
 - `otherText` (default `Other (please specify)`), `otherReplace` (default `Other`).
 - `newOtherColumnName` (optional): defaults to the collapsed name followed by `: Other`.
 - `freeText` (`reject`, `first` or `join`, default `reject`) and `freeTextSeparator`:
   what to do when a row holds several free-text answers.

 */
