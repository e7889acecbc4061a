use std::fmt;

use log::{debug, info};

use crate::builder::Survey;
use crate::config::*;
use crate::gate::{classify, combine};
use crate::{aggregate, aggregate_section, detail_table};

/// The scores of one question.
#[derive(PartialEq, Clone)]
pub struct QuestionSnapshot {
    pub question: Question,
    pub leaderboard: Vec<RankedEntry>,
    details: Vec<DetailRow>,
}

// Only the number of rankings is shown: snapshots get logged whether their
// section is locked or not.
impl fmt::Debug for QuestionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionSnapshot")
            .field("question", &self.question)
            .field("leaderboard", &self.leaderboard)
            .field("answers", &self.details.len())
            .finish_non_exhaustive()
    }
}

/// Everything known about a section at the time of the snapshot.
///
/// Leaderboards are computed whether the section is locked or not, so that
/// they are ready as soon as it unlocks. Callers must check [`Self::is_locked`]
/// before showing them. The detail tables are only handed out once the section
/// is unlocked.
#[derive(PartialEq, Debug, Clone)]
pub struct SectionSnapshot {
    pub name: String,
    pub label: String,
    pub gate: GateStatus,
    pub blended: Vec<RankedEntry>,
    pub questions: Vec<QuestionSnapshot>,
}

impl SectionSnapshot {
    pub fn is_locked(&self) -> bool {
        self.gate.locked
    }

    pub fn question(&self, key: &str) -> Option<&QuestionSnapshot> {
        self.questions.iter().find(|q| q.question.key == key)
    }

    /// Who ranked whom, for one question of this section.
    ///
    /// Returns `None` while the section is locked, or if the key does not
    /// belong to this section.
    pub fn details(&self, key: &str) -> Option<&[DetailRow]> {
        if self.is_locked() {
            return None;
        }
        self.question(key).map(|q| q.details.as_slice())
    }
}

/// The result of one refresh: gates and scores computed from a single set
/// of records.
#[derive(PartialEq, Debug, Clone)]
pub struct Snapshot {
    roster: Vec<Participant>,
    sections: Vec<SectionSnapshot>,
    record_count: usize,
}

impl Snapshot {
    pub fn sections(&self) -> &[SectionSnapshot] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionSnapshot> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// The number of records this snapshot was computed from.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    pub fn overall(&self) -> OverallGate {
        combine(
            &self.roster,
            self.sections.iter().map(|s| s.gate.clone()).collect(),
        )
    }

    pub fn is_fully_unlocked(&self) -> bool {
        self.sections.iter().all(|s| !s.is_locked())
    }
}

/// Computes the gates and all the leaderboards of a survey.
pub fn compute_snapshot(records: &[VoteRecord], survey: &Survey) -> Snapshot {
    let roster = survey.roster();
    info!(
        "compute_snapshot: processing {} records for {} participants",
        records.len(),
        roster.len()
    );
    let sections: Vec<SectionSnapshot> = survey
        .sections()
        .iter()
        .map(|section| {
            let questions = survey.section_questions(section);
            let gate = classify(records, roster, section);
            debug!(
                "compute_snapshot: section {}: locked: {}",
                section.name, gate.locked
            );
            SectionSnapshot {
                name: section.name.clone(),
                label: section.label.clone(),
                gate,
                blended: aggregate_section(records, roster, &questions),
                questions: questions
                    .iter()
                    .map(|q| QuestionSnapshot {
                        question: (*q).clone(),
                        leaderboard: aggregate(records, roster, q),
                        details: detail_table(records, q),
                    })
                    .collect(),
            }
        })
        .collect();
    Snapshot {
        roster: roster.to_vec(),
        sections,
        record_count: records.len(),
    }
}
