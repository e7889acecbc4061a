use log::debug;
use std::collections::HashSet;

use crate::config::*;

/// Decides whether the results of a section may be revealed.
///
/// A participant has completed the section once at least one record declared
/// under their name answers it, as defined by the section's completion rule.
/// Records are merged by the presence of answers, so a later record that omits
/// a question never cancels an earlier answer. For a fixed roster, adding
/// records can only unlock a section, never lock it again.
///
/// An empty roster is never locked.
pub fn classify(records: &[VoteRecord], roster: &[Participant], section: &Section) -> GateStatus {
    let done = completed_voters(records, section);
    for voter in done.iter() {
        if !roster.iter().any(|n| n.as_str() == *voter) {
            debug!(
                "classify: {}: {:?} answered but is not on the roster",
                section.name, voter
            );
        }
    }
    let (completed, missing): (Vec<Participant>, Vec<Participant>) = roster
        .iter()
        .cloned()
        .partition(|name| done.contains(name.as_str()));
    debug!(
        "classify: {}: completed: {:?} missing: {:?}",
        section.name, completed, missing
    );
    GateStatus {
        section: section.name.clone(),
        locked: !missing.is_empty(),
        completed,
        missing,
    }
}

/// Classifies every section. The whole survey is locked as long as one
/// section is.
pub fn classify_all(
    records: &[VoteRecord],
    roster: &[Participant],
    sections: &[Section],
) -> OverallGate {
    let statuses = sections
        .iter()
        .map(|s| classify(records, roster, s))
        .collect();
    combine(roster, statuses)
}

pub(crate) fn combine(roster: &[Participant], sections: Vec<GateStatus>) -> OverallGate {
    let missing = roster
        .iter()
        .filter(|name| sections.iter().any(|s| s.missing.contains(name)))
        .cloned()
        .collect();
    OverallGate {
        locked: sections.iter().any(|s| s.locked),
        missing,
        sections,
    }
}

fn completed_voters<'a>(records: &'a [VoteRecord], section: &Section) -> HashSet<&'a str> {
    match section.completion_rule {
        CompletionRule::MarkerQuestion => voters_answering(records, &section.marker),
        CompletionRule::AllQuestions => section
            .questions
            .iter()
            .map(|key| voters_answering(records, key))
            .reduce(|acc, voters| acc.intersection(&voters).cloned().collect())
            .unwrap_or_default(),
    }
}

fn voters_answering<'a>(records: &'a [VoteRecord], key: &str) -> HashSet<&'a str> {
    records
        .iter()
        .filter(|r| r.answer(key).is_some())
        .filter_map(|r| r.voter.as_deref())
        .collect()
}
