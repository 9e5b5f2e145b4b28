// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The identifier of a criterion: a single lowercase ASCII letter.
///
/// Letters are the only accepted identifiers. This keeps the judgment
/// tokens unambiguous: the equal token is the digit `0`, which can never
/// collide with an identifier.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CriterionId(char);

impl CriterionId {
    pub fn new(c: char) -> Result<CriterionId, SurveyErrors> {
        if c.is_ascii_lowercase() {
            Ok(CriterionId(c))
        } else {
            Err(SurveyErrors::InvalidCriterionId { id: c })
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl Display for CriterionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One criterion of a stage. The ordered list of criteria of a stage
/// defines the comparison universe for that stage.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Criterion {
    pub id: CriterionId,
    pub label: String,
    pub description: Option<String>,
}

impl Criterion {
    pub fn new(id: char, label: &str) -> Result<Criterion, SurveyErrors> {
        Ok(Criterion {
            id: CriterionId::new(id)?,
            label: label.to_string(),
            description: None,
        })
    }

    pub fn with_description(self, description: &str) -> Criterion {
        Criterion {
            description: Some(description.to_string()),
            ..self
        }
    }
}

/// The ordinal preference scale of a stage.
///
/// Only the cardinality is significant for the encoding. The labels, when
/// provided, are presentation content for the prompt (one per level, in
/// increasing order of intensity).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IntensityScale {
    max_level: u8,
    labels: Option<Vec<String>>,
}

impl IntensityScale {
    pub fn new(max_level: u8) -> Result<IntensityScale, SurveyErrors> {
        // A single digit keeps the tokens at two characters.
        if !(2..=9).contains(&max_level) {
            return Err(SurveyErrors::InvalidScale { max_level });
        }
        Ok(IntensityScale {
            max_level,
            labels: None,
        })
    }

    pub fn with_labels(self, labels: &[String]) -> Result<IntensityScale, SurveyErrors> {
        if labels.len() != self.max_level as usize {
            return Err(SurveyErrors::ScaleLabelMismatch {
                expected: self.max_level as usize,
                actual: labels.len(),
            });
        }
        Ok(IntensityScale {
            max_level: self.max_level,
            labels: Some(labels.to_vec()),
        })
    }

    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    pub fn label_for(&self, level: u8) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|ls| ls.get((level as usize).checked_sub(1)?))
            .map(|s| s.as_str())
    }
}

/// One independently-scored set of criteria with its own scale.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Stage {
    id: String,
    name: String,
    scale: IntensityScale,
    criteria: Vec<Criterion>,
}

impl Stage {
    /// Creates a stage. The criteria keep their input order, which is also
    /// the enumeration order of the comparisons. Identifiers must be unique
    /// within the stage. An empty or single-criterion stage is accepted and
    /// is trivially complete.
    pub fn new(
        id: &str,
        name: &str,
        scale: IntensityScale,
        criteria: &[Criterion],
    ) -> Result<Stage, SurveyErrors> {
        for (idx, c) in criteria.iter().enumerate() {
            if criteria[..idx].iter().any(|o| o.id == c.id) {
                return Err(SurveyErrors::DuplicateCriterionId {
                    stage: id.to_string(),
                    id: c.id.as_char(),
                });
            }
        }
        Ok(Stage {
            id: id.to_string(),
            name: name.to_string(),
            scale,
            criteria: criteria.to_vec(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> &IntensityScale {
        &self.scale
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn criterion(&self, id: CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }
}

/// The identity of the person answering the survey.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Operator {
    pub name: String,
    pub organization: Option<String>,
}

/// The verdict on one pair of criteria.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Judgment {
    /// Both criteria matter equally.
    Equal,
    /// One criterion wins, with an intensity taken from the stage scale.
    Prefer { winner: CriterionId, intensity: u8 },
}

// ******** Output data structures *********

/// Progress of one stage: how many pairs have an answer against the
/// derived total for the stage.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StageReport {
    pub stage_id: String,
    pub name: String,
    pub answered: usize,
    pub pair_count: usize,
    pub complete: bool,
}

/// Errors that prevent an operation on a survey session from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyErrors {
    InvalidCriterionId { id: char },
    DuplicateCriterionId { stage: String, id: char },
    InvalidScale { max_level: u8 },
    ScaleLabelMismatch { expected: usize, actual: usize },
    MissingOperatorName,
    EmptySurvey,
    DuplicateStage { stage: String },
    UnknownStage { stage: String },
    UnknownPair { stage: String, key: String },
    IntensityOutOfScale { intensity: u8, max_level: u8 },
    ForeignWinner { key: String, winner: char },
    InvalidToken { token: String },
}

impl Error for SurveyErrors {}

impl Display for SurveyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyErrors::InvalidCriterionId { id } => {
                write!(f, "criterion id must be a lowercase letter: {:?}", id)
            }
            SurveyErrors::DuplicateCriterionId { stage, id } => {
                write!(f, "duplicate criterion id {:?} in stage {}", id, stage)
            }
            SurveyErrors::InvalidScale { max_level } => {
                write!(f, "scale must have between 2 and 9 levels: {}", max_level)
            }
            SurveyErrors::ScaleLabelMismatch { expected, actual } => {
                write!(f, "expected {} scale labels, got {}", expected, actual)
            }
            SurveyErrors::MissingOperatorName => write!(f, "the operator name is empty"),
            SurveyErrors::EmptySurvey => write!(f, "the survey has no stage"),
            SurveyErrors::DuplicateStage { stage } => write!(f, "duplicate stage id {}", stage),
            SurveyErrors::UnknownStage { stage } => write!(f, "unknown stage {}", stage),
            SurveyErrors::UnknownPair { stage, key } => {
                write!(f, "pair {} does not belong to stage {}", key, stage)
            }
            SurveyErrors::IntensityOutOfScale {
                intensity,
                max_level,
            } => write!(f, "intensity {} outside scale 1..={}", intensity, max_level),
            SurveyErrors::ForeignWinner { key, winner } => {
                write!(f, "criterion {:?} is not a member of pair {}", winner, key)
            }
            SurveyErrors::InvalidToken { token } => write!(f, "malformed token {:?}", token),
        }
    }
}
