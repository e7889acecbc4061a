use crate::tally::io_common::{FieldMap, DEFAULT_DELIMITER};
use crate::tally::store::PROVIDERS;
use crate::tally::*;

use std::collections::HashSet;
use std::path::Path;

use ranked_survey::builder::Builder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VOTER_FIELD: &str = "voter_name";
pub const DEFAULT_REFRESH_SECS: u64 = 5;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionConfig {
    pub key: String,
    pub label: Option<String>,
    pub direction: Option<String>,
    pub field: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    pub label: Option<String>,
    pub questions: Vec<String>,
    #[serde(rename = "markerQuestion")]
    pub marker_question: Option<String>,
    #[serde(rename = "completionRule")]
    pub completion_rule: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "rankingDelimiter")]
    pub ranking_delimiter: Option<String>,
}

impl VoteSource {
    pub fn ranking_delimiter(&self) -> &str {
        self.ranking_delimiter.as_deref().unwrap_or(DEFAULT_DELIMITER)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    pub roster: Vec<String>,
    pub questions: Vec<QuestionConfig>,
    pub sections: Vec<SectionConfig>,
    #[serde(rename = "voteSources")]
    pub vote_sources: Vec<VoteSource>,
    #[serde(rename = "voterField")]
    pub voter_field: Option<String>,
    #[serde(rename = "refreshIntervalSecs")]
    pub refresh_interval_secs: Option<u64>,
}

/// A validated configuration: the survey itself and where its votes live.
#[derive(Debug, Clone)]
pub struct LoadedSurvey {
    pub name: String,
    pub survey: Survey,
    pub fields: FieldMap,
    /// File paths are already resolved against the directory of the
    /// configuration file.
    pub sources: Vec<VoteSource>,
    pub refresh_interval: Duration,
}

pub fn read_config(path: &str) -> TallyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingConfigSnafu { path })?;
    Ok(config)
}

pub fn load_survey(config_path: &str) -> TallyResult<LoadedSurvey> {
    let config = read_config(config_path)?;
    debug!("config: {:?}", config);
    let root = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu { path: config_path })?;
    validate_config(&config, root)
}

pub fn validate_config(config: &SurveyConfig, root: &Path) -> TallyResult<LoadedSurvey> {
    let survey = build_survey(config)?;
    let fields = build_field_map(config)?;

    ensure!(!config.vote_sources.is_empty(), NoVoteSourceSnafu {});
    let sources = config
        .vote_sources
        .iter()
        .map(|source| resolve_source(source, root))
        .collect::<TallyResult<Vec<VoteSource>>>()?;

    let refresh_interval = match config.refresh_interval_secs {
        Some(0) => return InvalidIntervalSnafu {}.fail(),
        Some(secs) => Duration::from_secs(secs),
        None => Duration::from_secs(DEFAULT_REFRESH_SECS),
    };

    Ok(LoadedSurvey {
        name: config.survey_name.clone(),
        survey,
        fields,
        sources,
        refresh_interval,
    })
}

fn read_direction(question: &QuestionConfig) -> TallyResult<Direction> {
    match question.direction.as_deref() {
        None | Some("bestFirst") => Ok(Direction::BestFirst),
        Some("inverted") => Ok(Direction::Inverted),
        Some(x) => UnknownDirectionSnafu {
            key: &question.key,
            direction: x,
        }
        .fail(),
    }
}

fn read_completion_rule(section: &SectionConfig) -> TallyResult<CompletionRule> {
    match section.completion_rule.as_deref() {
        None | Some("markerQuestion") => Ok(CompletionRule::MarkerQuestion),
        Some("allQuestions") => Ok(CompletionRule::AllQuestions),
        Some(x) => UnknownCompletionRuleSnafu {
            section: &section.name,
            rule: x,
        }
        .fail(),
    }
}

fn build_survey(config: &SurveyConfig) -> TallyResult<Survey> {
    let mut builder = Builder::new()
        .roster(&config.roster)
        .context(InvalidSurveySnafu {})?;

    for qc in config.questions.iter() {
        let question = Question {
            key: qc.key.clone(),
            label: qc.label.clone().unwrap_or_else(|| qc.key.clone()),
            direction: read_direction(qc)?,
        };
        builder = builder.question(question).context(InvalidSurveySnafu {})?;
    }

    for sc in config.sections.iter() {
        let marker = sc
            .marker_question
            .clone()
            .or_else(|| sc.questions.first().cloned())
            .unwrap_or_default();
        let section = Section {
            name: sc.name.clone(),
            label: sc.label.clone().unwrap_or_else(|| sc.name.clone()),
            questions: sc.questions.clone(),
            marker,
            completion_rule: read_completion_rule(sc)?,
        };
        builder = builder.section(section).context(InvalidSurveySnafu {})?;
    }

    builder.build().context(InvalidSurveySnafu {})
}

fn build_field_map(config: &SurveyConfig) -> TallyResult<FieldMap> {
    let voter_field = config
        .voter_field
        .clone()
        .unwrap_or_else(|| DEFAULT_VOTER_FIELD.to_string());
    let mut seen: HashSet<String> = HashSet::from([voter_field.clone()]);
    let mut question_fields: Vec<(String, String)> = Vec::new();
    for qc in config.questions.iter() {
        let field = qc
            .field
            .clone()
            .unwrap_or_else(|| format!("{}_rank", qc.key));
        ensure!(seen.insert(field.clone()), DuplicateFieldSnafu { field });
        question_fields.push((qc.key.clone(), field));
    }
    Ok(FieldMap {
        voter_field,
        question_fields,
    })
}

fn resolve_source(source: &VoteSource, root: &Path) -> TallyResult<VoteSource> {
    ensure!(
        PROVIDERS.contains(&source.provider.as_str()),
        UnknownProviderSnafu {
            provider: &source.provider
        }
    );
    let file_path = root.join(&source.file_path).display().to_string();
    debug!("resolve_source: {} -> {}", source.file_path, file_path);
    Ok(VoteSource {
        file_path,
        ..source.clone()
    })
}
