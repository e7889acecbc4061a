/*!

This is the long-form manual for `ranked_survey` and `rsurvey`.

## Scoring

Each question asks every voter to order the whole roster. A name at position
`p` (starting at 1) earns `p` points, or `N + 1 - p` points for an inverted
question, `N` being the size of the roster. The score of a participant is the
mean of the points received over the voters who answered, so the lowest score
comes first in the leaderboard. Equal scores keep the roster order.

Only rankings of exactly `N` distinct names are scored. Shorter or longer
rankings, and rankings that name someone twice, are ignored for that record.
Names that are not on the roster are skipped, their position still counting
for the others.

The blended leaderboard of a section adds the points of all its questions and
divides them by `N * number of questions`, which is the number of rankings
expected once everyone voted.

## Reveal gate

Every section is locked until each roster member completed it:
- with the `markerQuestion` rule (the default), one non-empty answer to the
  marker question of the section is enough;
- with the `allQuestions` rule, every question of the section must have been
  answered, possibly through several submissions.

Submissions are never merged by overwriting: a record that omits a question
does not cancel the answer of an earlier record. Records without a voter name,
or with a name that is not on the roster, are scored but never complete a
section.

## Configuration

`rsurvey` reads a JSON file:

```text
{
  "surveyName": "Friends survey",
  "roster": ["Babbolat", "Egemit", "LD"],
  "questions": [
    {"key": "wealth", "label": "Wealth"},
    {"key": "difficulty", "label": "Difficulty", "direction": "inverted"}
  ],
  "sections": [
    {"name": "general", "questions": ["wealth", "difficulty"], "markerQuestion": "wealth"}
  ],
  "voteSources": [{"provider": "json", "filePath": "responses.json"}]
}
```

Questions:
 - `key` (string): the identifier of the question.
 - `label` (string, optional): the title displayed. Defaults to the key.
 - `direction` (`bestFirst` or `inverted`, optional): defaults to `bestFirst`.
 - `field` (string, optional): the name of the column holding the rankings in
   the vote sources. Defaults to `<key>_rank`.

Sections:
 - `name` (string), `label` (string, optional)
 - `questions` (array of question keys)
 - `markerQuestion` (string, optional): defaults to the first question.
 - `completionRule` (`markerQuestion` or `allQuestions`, optional)

Other options:
 - `voterField` (string, optional): the column holding the voter name.
   Defaults to `voter_name`.
 - `refreshIntervalSecs` (number, optional): the polling period of `watch`.
   Defaults to 5.

## Vote sources

### `json`

An array of objects, for example exported from a hosted table:

```text
[
  {"voter_name": "LD", "wealth_rank": ["LD", "Egemit", "Babbolat"], "difficulty_rank": null}
]
```

Submissions made with `rsurvey submit` are appended to the first `json` source.

### `csv`

A header row, then one row per submission. Rankings are written in a single
cell, separated by `rankingDelimiter` (`;` by default):

```text
voter_name,wealth_rank,difficulty_rank
LD,LD;Egemit;Babbolat,
```

### `xlsx`

The same layout as `csv`, in an Excel worksheet (the first one unless
`excelWorksheetName` is set).

 */
