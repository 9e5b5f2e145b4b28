/*!

This is the long-form manual for `pairwise_survey` and `pairsurv`.

## What the program does

`pairsurv` runs a pairwise-comparison questionnaire: for every unordered
pair of criteria in a stage, the operator states which criterion matters
more (and how strongly) or that both matter equally. Once every pair of
every stage has an answer, the full set of judgments is exported.

A survey is made of one or more *stages*. Each stage has its own ordered
criteria list and its own intensity scale. A stage with N criteria
produces exactly N·(N−1)/2 comparisons, presented in the standard
2-combination order of the criteria list: for criteria `a,b,c,d` the
comparisons are `a_b, a_c, a_d, b_c, b_d, c_d`.

## Judgment tokens

Every answer is stored as a compact token. The shape is fixed so that
exports stay comparable across program versions:

* `0` — both criteria of the pair are equally important;
* `<intensity><id>` — the criterion `<id>` wins with the given intensity,
  for example `2c` for criterion `c` at intensity 2.

Criterion identifiers are single lowercase letters, so the equal token
can never collide with a winner token.

## Configuration

The survey content is described in a JSON file:

```text
{
  "outputSettings": {
    "surveyName": "Net-zero project assessment",
    "outputDirectory": "exports",
    "resultsTable": "exports/results.csv"
  },
  "stages": [
    {
      "stageId": "themes",
      "name": "Theme priority",
      "scale": { "maxIntensity": 3, "labels": ["weak", "moderate", "very strong"] },
      "criteria": [
        { "id": "a", "label": "Cost", "description": "Total cost of ownership." },
        { "id": "b", "label": "Impact" }
      ]
    }
  ]
}
```

Instead of an inline `criteria` array, a stage may point at an Excel
worksheet with `"criteriaFile": { "filePath": "criteria.xlsx" }`. The
worksheet is expected to have a header row followed by one row per
criterion with the columns id, label and an optional description.

## Answers

When `--answers` is given, the judgments are read from a CSV file with
one line per pair and no header:

```text
themes,a_b,2b
themes,a_c,0
themes,b_c,3c
```

Without `--answers`, the program prompts on the terminal for each pair in
order. Valid replies are a judgment token (`0`, `2b`, ...), `back` to
return to the previous pair, or `quit` to leave the survey unfinished
(the in-memory answers of the run are then discarded).

## Exports

A completed survey is exported exactly once, automatically. The record
holds the operator name, the optional organization, a timestamp and the
nested `{stage: {pair: token}}` map.

* If `resultsTable` points at a usable CSV file, the record is appended
  to it as a single row of four columns: timestamp, name, organization,
  JSON-serialized map.
* Otherwise a standalone pretty-printed JSON file named
  `survey_<name>_<timestamp>.json` is written to the output directory
  (the operator name is sanitized for path safety).

A failed append falls back to the JSON file; a failure of both is
reported and the session stays intact, so the export can be retried with
`--resave`, which always produces a fresh row or file and never mutates
a previous record.

*/
