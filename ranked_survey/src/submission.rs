use log::debug;
use snafu::prelude::*;
use std::collections::HashSet;

use crate::builder::Survey;
use crate::config::*;

/// Checks a record before it is handed to storage.
///
/// The record must come from a roster member, every ranking must order the
/// whole roster, and every section it touches must be answered completely.
/// Aggregation tolerates records that fail these checks, but a capture form
/// should never produce them.
pub fn validate_submission(survey: &Survey, record: &VoteRecord) -> Result<(), SubmissionError> {
    let voter = record
        .voter
        .as_deref()
        .filter(|v| !v.is_empty())
        .context(MissingVoterSnafu {})?;
    ensure!(
        survey.roster().iter().any(|n| n == voter),
        UnknownVoterSnafu { voter }
    );

    let mut answered: Vec<&String> = record
        .answers
        .iter()
        .filter(|(_, ranking)| !ranking.is_empty())
        .map(|(key, _)| key)
        .collect();
    answered.sort();
    ensure!(!answered.is_empty(), EmptySubmissionSnafu { voter });

    for key in answered {
        ensure!(
            survey.question(key).is_some(),
            UndeclaredAnswerSnafu { key: key.clone() }
        );
        ensure!(
            is_permutation(&record.answers[key], survey.roster()),
            NotAPermutationSnafu { key: key.clone() }
        );
    }

    for section in survey.sections() {
        let touched = section.questions.iter().any(|k| record.answer(k).is_some());
        if !touched {
            continue;
        }
        for key in section.questions.iter() {
            ensure!(
                record.answer(key).is_some(),
                IncompleteSectionSnafu {
                    section: section.name.clone(),
                    key: key.clone()
                }
            );
        }
        debug!("validate_submission: {} completes {}", voter, section.name);
    }
    Ok(())
}

fn is_permutation(ranking: &[String], roster: &[Participant]) -> bool {
    let seen: HashSet<&str> = ranking.iter().map(|s| s.as_str()).collect();
    ranking.len() == roster.len()
        && seen.len() == roster.len()
        && roster.iter().all(|n| seen.contains(n.as_str()))
}
