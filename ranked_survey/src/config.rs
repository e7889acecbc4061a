// ********* Input data structures ***********

use snafu::Snafu;
use std::collections::HashMap;

/// A member of the roster.
///
/// Participants carry no data beyond their name.
pub type Participant = String;

/// How a position in a ranking is converted into points.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum Direction {
    /// The first position is the best one and contributes the fewest points.
    #[default]
    BestFirst,
    /// The first position is the most extreme one and contributes the most points.
    /// Used for questions such as "who has the hardest exams?".
    Inverted,
}

impl Direction {
    /// The points earned by the name at the (0-based) `index` of a ranking over
    /// a roster of `roster_size` names.
    pub fn points(&self, index: usize, roster_size: usize) -> u64 {
        let position = (index + 1) as u64;
        match self {
            Direction::BestFirst => position,
            Direction::Inverted => (roster_size as u64 + 1).saturating_sub(position),
        }
    }
}

/// A scoring dimension. Every voter ranks the whole roster for it.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Question {
    pub key: String,
    pub label: String,
    pub direction: Direction,
}

impl Question {
    pub fn new(key: &str, label: &str) -> Question {
        Question {
            key: key.to_string(),
            label: label.to_string(),
            direction: Direction::BestFirst,
        }
    }

    pub fn with_direction(self, direction: Direction) -> Question {
        Question { direction, ..self }
    }
}

/// The policy deciding when a participant has completed a section.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum CompletionRule {
    /// One answer to the marker question is enough.
    #[default]
    MarkerQuestion,
    /// Every question of the section must have been answered, possibly
    /// in different records.
    AllQuestions,
}

/// A group of questions sharing one reveal gate and one blended leaderboard.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Section {
    pub name: String,
    pub label: String,
    /// The keys of the questions, in display order.
    pub questions: Vec<String>,
    /// The question standing in for the whole section under
    /// `CompletionRule::MarkerQuestion`.
    pub marker: String,
    pub completion_rule: CompletionRule,
}

impl Section {
    /// A section whose marker is its first question.
    pub fn new(name: &str, questions: &[&str]) -> Section {
        Section {
            name: name.to_string(),
            label: name.to_string(),
            questions: questions.iter().map(|q| q.to_string()).collect(),
            marker: questions.first().map(|q| q.to_string()).unwrap_or_default(),
            completion_rule: CompletionRule::MarkerQuestion,
        }
    }

    pub fn with_label(self, label: &str) -> Section {
        Section {
            label: label.to_string(),
            ..self
        }
    }

    pub fn with_marker(self, marker: &str) -> Section {
        Section {
            marker: marker.to_string(),
            ..self
        }
    }

    pub fn with_completion_rule(self, completion_rule: CompletionRule) -> Section {
        Section {
            completion_rule,
            ..self
        }
    }
}

/// One stored submission.
///
/// A record may only answer some of the questions: voters submit sections
/// at different times and every submission is stored as a new record.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoteRecord {
    /// The declared name of the voter. It is not verified and may be missing.
    pub voter: Option<String>,
    /// The rankings (best to worst) keyed by question key.
    pub answers: HashMap<String, Vec<String>>,
}

impl VoteRecord {
    pub fn new(voter: Option<&str>) -> VoteRecord {
        VoteRecord {
            voter: voter.map(|v| v.to_string()),
            answers: HashMap::new(),
        }
    }

    pub fn with_answer(mut self, key: &str, ranking: &[&str]) -> VoteRecord {
        self.answers.insert(
            key.to_string(),
            ranking.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    /// The ranking for this question, if the voter answered it.
    ///
    /// An empty ranking counts as no answer.
    pub fn answer(&self, key: &str) -> Option<&[String]> {
        match self.answers.get(key) {
            Some(ranking) if !ranking.is_empty() => Some(ranking.as_slice()),
            _ => None,
        }
    }
}

// ******** Output data structures *********

/// One line of a leaderboard. Lower scores come first.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedEntry {
    pub name: Participant,
    pub score: f64,
}

/// One line of the "who said what" listing of a question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DetailRow {
    pub voter: Option<String>,
    pub ranking: Vec<String>,
}

/// The reveal state of a section.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GateStatus {
    pub section: String,
    pub locked: bool,
    /// In roster order.
    pub completed: Vec<Participant>,
    /// In roster order.
    pub missing: Vec<Participant>,
}

/// The reveal state of all the sections taken together.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OverallGate {
    pub locked: bool,
    /// Everyone missing from at least one section, in roster order, without duplicates.
    pub missing: Vec<Participant>,
    pub sections: Vec<GateStatus>,
}

// ********* Errors **********

/// Errors found while validating the description of a survey.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SurveyError {
    #[snafu(display("The roster contains an empty name"))]
    EmptyParticipantName {},
    #[snafu(display("The roster lists {name} more than once"))]
    DuplicateParticipant { name: String },
    #[snafu(display("A question has an empty key"))]
    EmptyQuestionKey {},
    #[snafu(display("The question {key} is declared more than once"))]
    DuplicateQuestion { key: String },
    #[snafu(display("The section {name} is declared more than once"))]
    DuplicateSection { name: String },
    #[snafu(display("The section {name} has no question"))]
    EmptySection { name: String },
    #[snafu(display("The section {section} refers to the undeclared question {key}"))]
    UnknownQuestion { section: String, key: String },
    #[snafu(display("The marker question {marker} is not part of the section {section}"))]
    MarkerOutsideSection { section: String, marker: String },
    #[snafu(display("The question {key} does not belong to any section"))]
    UnsectionedQuestion { key: String },
    #[snafu(display("The question {key} belongs to both {first} and {second}"))]
    QuestionInSeveralSections {
        key: String,
        first: String,
        second: String,
    },
}

/// Reasons for refusing a record before it is handed to storage.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SubmissionError {
    #[snafu(display("The submission does not declare a voter"))]
    MissingVoter {},
    #[snafu(display("{voter} is not on the roster"))]
    UnknownVoter { voter: String },
    #[snafu(display("The submission of {voter} does not answer any question"))]
    EmptySubmission { voter: String },
    #[snafu(display("The submission answers the undeclared question {key}"))]
    UndeclaredAnswer { key: String },
    #[snafu(display("The ranking for {key} must contain every roster name exactly once"))]
    NotAPermutation { key: String },
    #[snafu(display("The section {section} is incomplete: {key} is not answered"))]
    IncompleteSection { section: String, key: String },
}
