use std::fs;
use std::path::Path;

use pairwise_survey::*;
use snafu::prelude::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use crate::survey::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "resultsTable")]
    pub results_table: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScaleConfig {
    #[serde(rename = "maxIntensity")]
    pub max_intensity: u8,
    #[serde(rename = "labels")]
    pub labels: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CriterionConfig {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaFileSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(rename = "stageId")]
    pub stage_id: String,
    pub name: String,
    pub scale: ScaleConfig,
    /// Inline criteria. Exactly one of `criteria` and `criteriaFile` must
    /// be present.
    pub criteria: Option<Vec<CriterionConfig>>,
    #[serde(rename = "criteriaFile")]
    pub criteria_file: Option<CriteriaFileSource>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub stages: Vec<StageConfig>,
}

pub fn read_survey_config(path: &str) -> RunnerResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_reference(path: &str) -> RunnerResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Converts the raw configuration into engine stages, pulling criteria
/// from a workbook where one is configured.
pub fn build_stages(config: &SurveyConfig, root: &Path) -> RunnerResult<Vec<Stage>> {
    let mut stages: Vec<Stage> = Vec::new();
    for sc in config.stages.iter() {
        let raw: Vec<CriterionConfig> = match (&sc.criteria, &sc.criteria_file) {
            (Some(list), None) => list.clone(),
            (None, Some(source)) => io_criteria_xlsx::read_criteria_workbook(root, source)?,
            (Some(_), Some(_)) => {
                whatever!(
                    "Stage {} declares both inline criteria and a criteria file",
                    sc.stage_id
                )
            }
            (None, None) => whatever!("Stage {} declares no criteria", sc.stage_id),
        };

        let mut scale = IntensityScale::new(sc.scale.max_intensity).context(EngineSnafu)?;
        if let Some(labels) = &sc.scale.labels {
            scale = scale.with_labels(labels).context(EngineSnafu)?;
        }

        let mut criteria: Vec<Criterion> = Vec::new();
        for cc in raw.iter() {
            let id = single_letter(&cc.id, &sc.stage_id)?;
            let mut criterion = Criterion::new(id, &cc.label).context(EngineSnafu)?;
            if let Some(d) = &cc.description {
                criterion = criterion.with_description(d);
            }
            criteria.push(criterion);
        }

        let stage = Stage::new(&sc.stage_id, &sc.name, scale, &criteria).context(EngineSnafu)?;
        stages.push(stage);
    }
    Ok(stages)
}

fn single_letter(id: &str, stage_id: &str) -> RunnerResult<char> {
    let mut chars = id.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => whatever!(
            "Criterion id {:?} in stage {} is not a single letter",
            id,
            stage_id
        ),
    }
}
