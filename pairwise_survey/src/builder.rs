pub use crate::config::*;
use crate::SurveySession;

/// A builder for assembling a survey session.
///
/// The stages keep the order in which they are added, which is also the
/// order in which the operator walks through them.
///
/// ```
/// pub use pairwise_survey::builder::Builder;
/// pub use pairwise_survey::{Criterion, IntensityScale, Stage};
/// # use pairwise_survey::SurveyErrors;
///
/// let stage = Stage::new(
///     "themes",
///     "Theme priority",
///     IntensityScale::new(3)?,
///     &[
///         Criterion::new('a', "Cost")?,
///         Criterion::new('b', "Impact")?,
///     ],
/// )?;
///
/// let session = Builder::new("Ada Lovelace")?
///     .organization("Analytical Engines Ltd")
///     .stage(&stage)?
///     .build()?;
///
/// assert_eq!(session.pair_count("themes"), Ok(1));
/// # Ok::<(), SurveyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _operator: Operator,
    pub(crate) _stages: Vec<Stage>,
}

impl Builder {
    pub fn new(operator_name: &str) -> Result<Builder, SurveyErrors> {
        if operator_name.trim().is_empty() {
            return Err(SurveyErrors::MissingOperatorName);
        }
        Ok(Builder {
            _operator: Operator {
                name: operator_name.trim().to_string(),
                organization: None,
            },
            _stages: Vec::new(),
        })
    }

    pub fn organization(self, organization: &str) -> Builder {
        Builder {
            _operator: Operator {
                name: self._operator.name,
                organization: Some(organization.to_string()),
            },
            _stages: self._stages,
        }
    }

    /// Appends one stage. Stage ids must be unique; the duplicate check
    /// runs when the session is built.
    pub fn stage(mut self, stage: &Stage) -> Result<Builder, SurveyErrors> {
        self._stages.push(stage.clone());
        Ok(self)
    }

    pub fn build(self) -> Result<SurveySession, SurveyErrors> {
        SurveySession::assemble(self._operator, self._stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_operator_names() {
        assert!(matches!(
            Builder::new("   "),
            Err(SurveyErrors::MissingOperatorName)
        ));
    }

    #[test]
    fn rejects_surveys_without_stages() {
        let res = Builder::new("Ada Lovelace").unwrap().build();
        assert!(matches!(res, Err(SurveyErrors::EmptySurvey)));
    }

    #[test]
    fn rejects_duplicate_stage_ids() {
        let stage = Stage::new(
            "themes",
            "Theme priority",
            IntensityScale::new(3).unwrap(),
            &[
                Criterion::new('a', "Cost").unwrap(),
                Criterion::new('b', "Impact").unwrap(),
            ],
        )
        .unwrap();
        let res = Builder::new("Ada Lovelace")
            .unwrap()
            .stage(&stage)
            .unwrap()
            .stage(&stage)
            .unwrap()
            .build();
        assert!(matches!(res, Err(SurveyErrors::DuplicateStage { .. })));
    }

    #[test]
    fn rejects_duplicate_criterion_ids() {
        let res = Stage::new(
            "themes",
            "Theme priority",
            IntensityScale::new(3).unwrap(),
            &[
                Criterion::new('a', "Cost").unwrap(),
                Criterion::new('a', "Impact").unwrap(),
            ],
        );
        assert!(matches!(
            res,
            Err(SurveyErrors::DuplicateCriterionId { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_scales() {
        assert!(IntensityScale::new(1).is_err());
        assert!(IntensityScale::new(10).is_err());
        assert!(IntensityScale::new(5).is_ok());
    }

    #[test]
    fn rejects_mismatched_scale_labels() {
        let scale = IntensityScale::new(3).unwrap();
        let labels: Vec<String> = vec!["weak".to_string(), "strong".to_string()];
        assert!(matches!(
            scale.with_labels(&labels),
            Err(SurveyErrors::ScaleLabelMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
