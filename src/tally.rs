use log::{debug, info, warn};

use ranked_survey::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::time::Duration;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::tally::config_reader::*;
use crate::tally::refresh::Refresher;
use crate::tally::store::{FileStore, VoteStore};

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_xlsx;
pub mod refresh;
pub mod store;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("The configuration file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Invalid survey description"))]
    InvalidSurvey { source: SurveyError },
    #[snafu(display("Unknown direction {direction:?} for question {key}"))]
    UnknownDirection { key: String, direction: String },
    #[snafu(display("Unknown completion rule {rule:?} for section {section}"))]
    UnknownCompletionRule { section: String, rule: String },
    #[snafu(display("The column {field} is used more than once"))]
    DuplicateField { field: String },
    #[snafu(display("Provider not implemented: {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("No vote source configured"))]
    NoVoteSource {},
    #[snafu(display("The refresh interval must be a positive number of seconds"))]
    InvalidInterval {},

    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected an array of rows in {path}"))]
    NotAnArray { path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Missing column {column} in {path}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Missing worksheet {name} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The worksheet of {path} is empty"))]
    EmptyExcel { path: String },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },

    #[snafu(display("Error writing {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not lock the vote store {path}"))]
    LockingStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing JSON"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("None of the vote sources accepts submissions (a json source is required)"))]
    ReadOnlyStore {},
    #[snafu(display("Submission refused"))]
    InvalidSubmission { source: SubmissionError },
    #[snafu(display("Could not understand answer {arg:?}, expected key=name;name;..."))]
    MalformedAnswerArg { arg: String },
    #[snafu(display(
        "Difference detected between calculated summary and reference summary {path}"
    ))]
    ReferenceMismatch { path: String },
}

pub type TallyResult<T> = Result<T, TallyError>;

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::BestFirst => "bestFirst",
        Direction::Inverted => "inverted",
    }
}

fn leaderboard_to_json(entries: &[RankedEntry]) -> Vec<JSValue> {
    entries
        .iter()
        .map(|e| json!({"name": e.name, "score": e.score}))
        .collect()
}

fn section_to_json(section: &SectionSnapshot) -> JSValue {
    // Nothing computed for a locked section leaves this function.
    let results = if section.is_locked() {
        JSValue::Null
    } else {
        let questions: Vec<JSValue> = section
            .questions
            .iter()
            .map(|qs| {
                let details: Vec<JSValue> = section
                    .details(&qs.question.key)
                    .unwrap_or_default()
                    .iter()
                    .map(|row| json!({"voter": row.voter, "ranking": row.ranking}))
                    .collect();
                json!({
                    "key": qs.question.key,
                    "label": qs.question.label,
                    "direction": direction_name(qs.question.direction),
                    "leaderboard": leaderboard_to_json(&qs.leaderboard),
                    "details": details
                })
            })
            .collect();
        json!({"blended": leaderboard_to_json(&section.blended), "questions": questions})
    };
    json!({
        "name": section.name,
        "label": section.label,
        "locked": section.is_locked(),
        "completed": section.gate.completed,
        "missing": section.gate.missing,
        "results": results
    })
}

pub fn build_summary_js(survey_name: &str, snapshot: &Snapshot) -> JSValue {
    let overall = snapshot.overall();
    let sections: Vec<JSValue> = snapshot.sections().iter().map(section_to_json).collect();
    json!({
        "survey": survey_name,
        "records": snapshot.record_count(),
        "locked": overall.locked,
        "missing": overall.missing,
        "sections": sections
    })
}

fn write_leaderboard(out: &mut String, title: &str, entries: &[RankedEntry]) {
    out.push_str(&format!("  {}\n", title));
    for (idx, e) in entries.iter().enumerate() {
        out.push_str(&format!("    {}. {:<16} {:.1}\n", idx + 1, e.name, e.score));
    }
}

/// A plain-text dashboard. Locked sections only show who is still expected.
pub fn render_text(survey_name: &str, snapshot: &Snapshot) -> String {
    let total = snapshot.roster().len();
    let mut out = format!("{} ({} records)\n", survey_name, snapshot.record_count());
    for section in snapshot.sections() {
        let gate = &section.gate;
        if section.is_locked() {
            out.push_str(&format!(
                "[locked] {}: {} / {} voted\n",
                section.label,
                gate.completed.len(),
                total
            ));
            out.push_str(&format!("  waiting for: {}\n", gate.missing.join(", ")));
            if !gate.completed.is_empty() {
                out.push_str(&format!("  done: {}\n", gate.completed.join(", ")));
            }
        } else {
            out.push_str(&format!("[open] {}\n", section.label));
            write_leaderboard(&mut out, "Overall", &section.blended);
            for qs in section.questions.iter() {
                write_leaderboard(&mut out, &qs.question.label, &qs.leaderboard);
            }
        }
    }
    out
}

pub fn read_summary(path: &str) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> TallyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    Ok(())
}

/// Parses `key=name;name;...` as given to `rsurvey submit --answer`.
fn parse_answer_arg(arg: &str) -> TallyResult<(String, Vec<String>)> {
    let (key, names) = arg.split_once('=').context(MalformedAnswerArgSnafu { arg })?;
    let key = key.trim();
    ensure!(!key.is_empty(), MalformedAnswerArgSnafu { arg });
    Ok((
        key.to_string(),
        io_common::split_ranking(names, io_common::DEFAULT_DELIMITER),
    ))
}

fn file_store(loaded: &LoadedSurvey) -> FileStore {
    FileStore::new(loaded.sources.clone(), loaded.fields.clone())
}

/// Fetches the votes once, prints the dashboard and optionally writes the
/// summary and compares it with a reference.
pub async fn run_tally(
    config_path: &str,
    out: Option<String>,
    reference: Option<String>,
) -> TallyResult<()> {
    let loaded = load_survey(config_path)?;
    let mut refresher = Refresher::new(file_store(&loaded), loaded.survey.clone());
    let snapshot = refresher.refresh().await?;

    println!("{}", render_text(&loaded.name, snapshot));

    let summary_js = build_summary_js(&loaded.name, snapshot);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(SerializingJsonSnafu {})?;
    match out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => {
            fs::write(path, &pretty_js_stats).context(WritingFileSnafu { path })?;
            info!("Summary written to {}", path);
        }
        None => {}
    }

    if let Some(reference_path) = reference {
        check_reference(&reference_path, &pretty_js_stats)?;
    }
    Ok(())
}

/// Polls the vote sources and prints the dashboard whenever it changes, until
/// interrupted.
pub async fn run_watch(
    config_path: &str,
    interval_secs: Option<u64>,
    until_unlocked: bool,
) -> TallyResult<()> {
    let loaded = load_survey(config_path)?;
    let period = match interval_secs {
        Some(0) => return InvalidIntervalSnafu {}.fail(),
        Some(secs) => Duration::from_secs(secs),
        None => loaded.refresh_interval,
    };
    let mut refresher = Refresher::new(file_store(&loaded), loaded.survey.clone());
    let name = loaded.name.clone();
    info!("Watching {} every {:?}", name, period);
    tokio::select! {
        res = refresher.watch(period, until_unlocked, |snapshot| {
            println!("{}", render_text(&name, snapshot));
        }) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping");
            Ok(())
        }
    }
}

/// Validates and stores the rankings of one voter.
pub async fn run_submit(config_path: &str, voter: &str, answers: &[String]) -> TallyResult<()> {
    let loaded = load_survey(config_path)?;
    let mut record = VoteRecord::new(Some(voter));
    for arg in answers {
        let (key, ranking) = parse_answer_arg(arg)?;
        record.answers.insert(key, ranking);
    }
    debug!("run_submit: record: {:?}", record);
    validate_submission(&loaded.survey, &record).context(InvalidSubmissionSnafu {})?;
    file_store(&loaded).submit(&record).await?;
    info!("Stored the submission of {}", voter);
    Ok(())
}
