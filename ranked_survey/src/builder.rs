pub use crate::config::*;

use log::debug;
use snafu::prelude::*;
use std::collections::{HashMap, HashSet};

/// A validated survey: the roster, the questions and the sections.
///
/// It can only be obtained through the [`Builder`], which checks that every
/// key used by a section refers to a declared question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Survey {
    roster: Vec<Participant>,
    questions: Vec<Question>,
    sections: Vec<Section>,
}

impl Survey {
    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn question(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// The section that gates the given question.
    pub fn section_of(&self, question_key: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.questions.iter().any(|k| k == question_key))
    }

    /// The questions of a section, in the order of the section.
    pub fn section_questions(&self, section: &Section) -> Vec<&Question> {
        section
            .questions
            .iter()
            .filter_map(|k| self.question(k))
            .collect()
    }
}

/// A builder for surveys.
///
/// ```
/// use ranked_survey::builder::Builder;
/// use ranked_survey::{Direction, Question, Section, SurveyError};
///
/// let survey = Builder::new()
///     .roster(&["Anna".to_string(), "Bob".to_string()])?
///     .question(Question::new("wealth", "Wealth"))?
///     .question(Question::new("difficulty", "Difficulty").with_direction(Direction::Inverted))?
///     .section(Section::new("general", &["wealth", "difficulty"]))?
///     .build()?;
///
/// assert_eq!(survey.section_of("difficulty").map(|s| s.name.as_str()), Some("general"));
/// # Ok::<(), SurveyError>(())
/// ```
pub struct Builder {
    pub(crate) _roster: Vec<Participant>,
    pub(crate) _questions: Vec<Question>,
    pub(crate) _sections: Vec<Section>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _roster: Vec::new(),
            _questions: Vec::new(),
            _sections: Vec::new(),
        }
    }

    /// Sets the roster. The order of the names is the order used for the
    /// missing lists and for breaking ties between equal scores.
    pub fn roster(self, names: &[String]) -> Result<Builder, SurveyError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for name in names {
            ensure!(!name.is_empty(), EmptyParticipantNameSnafu {});
            ensure!(
                seen.insert(name.as_str()),
                DuplicateParticipantSnafu { name: name.clone() }
            );
        }
        Ok(Builder {
            _roster: names.to_vec(),
            ..self
        })
    }

    pub fn question(mut self, question: Question) -> Result<Builder, SurveyError> {
        ensure!(!question.key.is_empty(), EmptyQuestionKeySnafu {});
        ensure!(
            self._questions.iter().all(|q| q.key != question.key),
            DuplicateQuestionSnafu {
                key: question.key.clone()
            }
        );
        self._questions.push(question);
        Ok(self)
    }

    pub fn section(mut self, section: Section) -> Result<Builder, SurveyError> {
        ensure!(
            self._sections.iter().all(|s| s.name != section.name),
            DuplicateSectionSnafu {
                name: section.name.clone()
            }
        );
        ensure!(
            !section.questions.is_empty(),
            EmptySectionSnafu {
                name: section.name.clone()
            }
        );
        self._sections.push(section);
        Ok(self)
    }

    /// Checks that sections and questions agree with each other.
    pub fn build(self) -> Result<Survey, SurveyError> {
        let declared: HashSet<&str> = self._questions.iter().map(|q| q.key.as_str()).collect();
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for section in self._sections.iter() {
            for key in section.questions.iter() {
                ensure!(
                    declared.contains(key.as_str()),
                    UnknownQuestionSnafu {
                        section: section.name.clone(),
                        key: key.clone()
                    }
                );
                if let Some(first) = owners.insert(key.as_str(), section.name.as_str()) {
                    return QuestionInSeveralSectionsSnafu {
                        key: key.clone(),
                        first: first.to_string(),
                        second: section.name.clone(),
                    }
                    .fail();
                }
            }
            ensure!(
                section.questions.contains(&section.marker),
                MarkerOutsideSectionSnafu {
                    section: section.name.clone(),
                    marker: section.marker.clone()
                }
            );
        }
        for question in self._questions.iter() {
            ensure!(
                owners.contains_key(question.key.as_str()),
                UnsectionedQuestionSnafu {
                    key: question.key.clone()
                }
            );
        }
        debug!(
            "build: roster: {:?} questions: {:?} sections: {:?}",
            self._roster,
            self._questions.len(),
            self._sections.len()
        );
        Ok(Survey {
            roster: self._roster,
            questions: self._questions,
            sections: self._sections,
        })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    fn base() -> Builder {
        Builder::new()
            .roster(&roster())
            .unwrap()
            .question(Question::new("wealth", "Wealth"))
            .unwrap()
            .question(Question::new("difficulty", "Difficulty").with_direction(Direction::Inverted))
            .unwrap()
    }

    #[test]
    fn builds_a_valid_survey() {
        let survey = base()
            .section(Section::new("general", &["wealth"]))
            .unwrap()
            .section(Section::new("studies", &["difficulty"]).with_label("Studies"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(survey.roster(), roster().as_slice());
        assert_eq!(survey.section_of("difficulty").unwrap().label, "Studies");
        let general = survey.section("general").unwrap();
        assert_eq!(general.marker, "wealth");
        let keys: Vec<&str> = survey
            .section_questions(general)
            .iter()
            .map(|q| q.key.as_str())
            .collect();
        assert_eq!(keys, vec!["wealth"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let names = vec!["A".to_string(), "A".to_string()];
        assert_eq!(
            Builder::new().roster(&names).err(),
            Some(SurveyError::DuplicateParticipant {
                name: "A".to_string()
            })
        );
        assert_eq!(
            Builder::new().roster(&["".to_string()]).err(),
            Some(SurveyError::EmptyParticipantName {})
        );
    }

    #[test]
    fn rejects_duplicate_questions() {
        let res = base().question(Question::new("wealth", "Again"));
        assert_eq!(
            res.err(),
            Some(SurveyError::DuplicateQuestion {
                key: "wealth".to_string()
            })
        );
    }

    #[test]
    fn rejects_unknown_question_keys() {
        let res = base()
            .section(Section::new("general", &["wealth", "difficulty", "housing"]))
            .unwrap()
            .build();
        assert_eq!(
            res.err(),
            Some(SurveyError::UnknownQuestion {
                section: "general".to_string(),
                key: "housing".to_string()
            })
        );
    }

    #[test]
    fn rejects_a_marker_outside_the_section() {
        let res = base()
            .section(Section::new("general", &["wealth"]).with_marker("difficulty"))
            .unwrap()
            .section(Section::new("studies", &["difficulty"]))
            .unwrap()
            .build();
        assert_eq!(
            res.err(),
            Some(SurveyError::MarkerOutsideSection {
                section: "general".to_string(),
                marker: "difficulty".to_string()
            })
        );
    }

    #[test]
    fn every_question_belongs_to_exactly_one_section() {
        let orphan = base()
            .section(Section::new("general", &["wealth"]))
            .unwrap()
            .build();
        assert_eq!(
            orphan.err(),
            Some(SurveyError::UnsectionedQuestion {
                key: "difficulty".to_string()
            })
        );

        let shared = base()
            .section(Section::new("general", &["wealth", "difficulty"]))
            .unwrap()
            .section(Section::new("studies", &["difficulty"]))
            .unwrap()
            .build();
        assert_eq!(
            shared.err(),
            Some(SurveyError::QuestionInSeveralSections {
                key: "difficulty".to_string(),
                first: "general".to_string(),
                second: "studies".to_string()
            })
        );
    }

    #[test]
    fn rejects_empty_and_duplicate_sections() {
        assert_eq!(
            base().section(Section::new("general", &[])).err(),
            Some(SurveyError::EmptySection {
                name: "general".to_string()
            })
        );
        let res = base()
            .section(Section::new("general", &["wealth"]))
            .unwrap()
            .section(Section::new("general", &["difficulty"]));
        assert_eq!(
            res.err(),
            Some(SurveyError::DuplicateSection {
                name: "general".to_string()
            })
        );
    }
}
