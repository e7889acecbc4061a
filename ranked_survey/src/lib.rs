/*!
Mean-rank aggregation for ranked surveys held among a small, fixed group.

Every voter ranks the whole roster for each question. The rankings are
turned into a leaderboard per question and into a blended leaderboard per
section, and a reveal gate keeps each section hidden until every participant
on the roster has answered it.

All the functions of this crate are pure: they take the complete set of
stored records and recompute everything from it.
*/
mod config;
mod gate;
mod snapshot;
mod submission;

pub mod builder;
pub mod manual;

use log::debug;
use std::{
    collections::{HashMap, HashSet},
    ops::AddAssign,
};

pub use crate::builder::Survey;
pub use crate::config::*;
pub use crate::gate::{classify, classify_all};
pub use crate::snapshot::{compute_snapshot, QuestionSnapshot, SectionSnapshot, Snapshot};
pub use crate::submission::validate_submission;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct ParticipantId(usize);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct PointCount(u64);

impl PointCount {
    const EMPTY: PointCount = PointCount(0);
}

impl AddAssign for PointCount {
    fn add_assign(&mut self, rhs: PointCount) {
        self.0 += rhs.0;
    }
}

/// The state of one stored ranking, with respect to the roster.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub(crate) enum AnswerState {
    /// Absent, null or empty.
    Missing,
    /// Present, but not of the size of the roster, or naming someone twice.
    Malformed,
    /// One distinct entry per roster member. It may still mention unknown
    /// names, which are skipped when scoring.
    Complete,
}

fn has_repeats(ranking: &[String]) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    !ranking.iter().all(|name| seen.insert(name.as_str()))
}

pub(crate) fn answer_state(ranking: Option<&[String]>, roster_size: usize) -> AnswerState {
    match ranking {
        None => AnswerState::Missing,
        Some(r) if r.is_empty() => AnswerState::Missing,
        Some(r) if r.len() != roster_size => AnswerState::Malformed,
        Some(r) if has_repeats(r) => AnswerState::Malformed,
        Some(_) => AnswerState::Complete,
    }
}

// The points of every roster member for one question, indexed by ParticipantId.
#[derive(Eq, PartialEq, Debug, Clone)]
struct QuestionTally {
    points: Vec<PointCount>,
    // Number of records that contributed a complete ranking.
    answered: u64,
}

fn roster_index(roster: &[Participant]) -> HashMap<&str, ParticipantId> {
    let mut index: HashMap<&str, ParticipantId> = HashMap::new();
    for (idx, name) in roster.iter().enumerate() {
        index.entry(name.as_str()).or_insert(ParticipantId(idx));
    }
    index
}

fn tally_question(
    records: &[VoteRecord],
    index: &HashMap<&str, ParticipantId>,
    roster_size: usize,
    question: &Question,
) -> QuestionTally {
    let mut tally = QuestionTally {
        points: vec![PointCount::EMPTY; roster_size],
        answered: 0,
    };
    for (ridx, record) in records.iter().enumerate() {
        let ranking = record.answer(&question.key);
        match answer_state(ranking, roster_size) {
            AnswerState::Missing => continue,
            AnswerState::Malformed => {
                debug!(
                    "tally_question: {}: record {} ({:?}) is not a ranking of the roster, skipping: {:?}",
                    question.key, ridx, record.voter, ranking
                );
                continue;
            }
            AnswerState::Complete => {}
        }
        tally.answered += 1;
        for (pos, name) in ranking.unwrap_or_default().iter().enumerate() {
            match index.get(name.as_str()) {
                Some(pid) => {
                    tally.points[pid.0] += PointCount(question.direction.points(pos, roster_size));
                }
                None => {
                    debug!(
                        "tally_question: {}: record {}: unknown name {:?}",
                        question.key, ridx, name
                    );
                }
            }
        }
    }
    tally
}

// Stable: equal scores keep the roster order.
fn sorted_leaderboard(mut entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| a.score.total_cmp(&b.score));
    entries
}

/// Computes the leaderboard of one question.
///
/// The score of a participant is the mean of the points received over all the
/// records that contain a complete ranking for this question, lower being
/// better (or more extreme, for inverted questions). Every roster member gets
/// exactly one entry, with a score of 0 if nobody answered yet.
///
/// Arguments:
/// * `records` all the stored records, in any order
/// * `roster` the participants, in their canonical order
/// * `question` the question to score
pub fn aggregate(
    records: &[VoteRecord],
    roster: &[Participant],
    question: &Question,
) -> Vec<RankedEntry> {
    let index = roster_index(roster);
    let tally = tally_question(records, &index, roster.len(), question);
    debug!(
        "aggregate: {}: {} answers, points: {:?}",
        question.key, tally.answered, tally.points
    );
    let entries = roster
        .iter()
        .zip(tally.points.iter())
        .map(|(name, points)| RankedEntry {
            name: name.clone(),
            score: if tally.answered > 0 {
                points.0 as f64 / tally.answered as f64
            } else {
                0.0
            },
        })
        .collect();
    sorted_leaderboard(entries)
}

/// Computes the blended leaderboard of several questions.
///
/// The points of every question are summed and divided by the number of
/// answers expected once every participant answered every question, that is
/// `roster.len() * questions.len()`. The scores are therefore only comparable
/// between participants once the section is complete.
pub fn aggregate_section(
    records: &[VoteRecord],
    roster: &[Participant],
    questions: &[&Question],
) -> Vec<RankedEntry> {
    let index = roster_index(roster);
    let mut points: Vec<PointCount> = vec![PointCount::EMPTY; roster.len()];
    for question in questions.iter() {
        let tally = tally_question(records, &index, roster.len(), question);
        for (acc, p) in points.iter_mut().zip(tally.points) {
            *acc += p;
        }
    }
    let denominator = (roster.len() * questions.len()) as f64;
    debug!(
        "aggregate_section: {} questions, points: {:?}",
        questions.len(),
        points
    );
    let entries = roster
        .iter()
        .zip(points.iter())
        .map(|(name, p)| RankedEntry {
            name: name.clone(),
            score: if denominator > 0.0 {
                p.0 as f64 / denominator
            } else {
                0.0
            },
        })
        .collect();
    sorted_leaderboard(entries)
}

/// Lists the ranking given by every record that answered the question, in
/// record order.
///
/// This is the raw material of the "who said what" table. It is not gated
/// here: use [`SectionSnapshot::details`] to respect the reveal gate.
pub fn detail_table(records: &[VoteRecord], question: &Question) -> Vec<DetailRow> {
    records
        .iter()
        .filter_map(|r| {
            r.answer(&question.key).map(|ranking| DetailRow {
                voter: r.voter.clone(),
                ranking: ranking.to_vec(),
            })
        })
        .collect()
}
