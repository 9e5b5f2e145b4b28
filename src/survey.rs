use log::{info, warn};

use pairwise_survey::builder::Builder;
use pairwise_survey::*;
use snafu::{prelude::*, Snafu};

use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::config_reader::*;

pub mod config_reader;
pub mod io_answers;
pub mod io_criteria_xlsx;
pub mod sink;

#[derive(Debug, Snafu)]
pub enum RunnerError {
    #[snafu(display("Error opening file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display(""))]
    EmptyExcel {},
    #[snafu(display("Cell on line {lineno} has an unexpected type: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening answers file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display(""))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} of the answers file is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display(""))]
    ReadingPrompt { source: std::io::Error },
    #[snafu(display("Error writing export {path}"))]
    WritingExport {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error appending row to {path}"))]
    AppendingRow { source: csv::Error, path: String },
    #[snafu(display("{source}"))]
    Engine { source: SurveyErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RunnerResult<T> = Result<T, RunnerError>;

/// One persisted survey record, ready for a sink.
#[derive(Debug, Clone)]
pub struct SurveyRecord {
    pub timestamp: String,
    pub file_stamp: String,
    pub name: String,
    pub organization: String,
    pub responses: JSValue,
}

impl SurveyRecord {
    pub fn assemble(session: &SurveySession) -> RunnerResult<SurveyRecord> {
        let now = chrono::Local::now();
        Ok(SurveyRecord {
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            file_stamp: now.format("%Y%m%d_%H%M%S").to_string(),
            name: session.operator().name.clone(),
            organization: session
                .operator()
                .organization
                .clone()
                .unwrap_or_default(),
            responses: responses_js(session)?,
        })
    }

    /// The tabular form: timestamp, name, organization, serialized map.
    pub fn row(&self) -> RunnerResult<Vec<String>> {
        let serialized = serde_json::to_string(&self.responses).context(ParsingJsonSnafu {})?;
        Ok(vec![
            self.timestamp.clone(),
            self.name.clone(),
            self.organization.clone(),
            serialized,
        ])
    }

    /// The standalone form written by the file sink.
    pub fn to_json(&self) -> JSValue {
        json!({
            "timestamp": self.timestamp,
            "name": self.name,
            "organization": self.organization,
            "responses": self.responses,
        })
    }
}

/// The nested `{stage: {pair: token}}` map of every recorded judgment.
fn responses_js(session: &SurveySession) -> RunnerResult<JSValue> {
    let mut stages_js: JSMap<String, JSValue> = JSMap::new();
    for stage in session.stages() {
        let responses = session.stage_responses(stage.id()).context(EngineSnafu)?;
        let mut m: JSMap<String, JSValue> = JSMap::new();
        for (key, token) in responses.iter() {
            m.insert(key.clone(), json!(token));
        }
        stages_js.insert(stage.id().to_string(), JSValue::Object(m));
    }
    Ok(JSValue::Object(stages_js))
}

fn print_welcome(config: &SurveyConfig, session: &SurveySession) {
    println!("{}", config.output_settings.survey_name);
    println!("Operator: {}", session.operator().name);
    let mut total = 0;
    for stage in session.stages() {
        let n = stage.criteria().len();
        let pairs = n * n.saturating_sub(1) / 2;
        println!("  {}: {} criteria, {} comparisons", stage.name(), n, pairs);
        total += pairs;
    }
    println!("{} comparisons in total.", total);
}

fn print_progress(session: &SurveySession) {
    for r in session.stage_reports() {
        let marker = if r.complete { " (complete)" } else { "" };
        println!(
            "  {}: {}/{} answered{}",
            r.name, r.answered, r.pair_count, marker
        );
    }
}

fn replay_answers(session: &mut SurveySession, path: &str) -> RunnerResult<()> {
    let answers = io_answers::read_answers_csv(path)?;
    info!("Replaying {} scripted answers from {}", answers.len(), path);
    for a in answers.iter() {
        session
            .record_token(&a.stage, &a.pair, &a.token)
            .context(EngineSnafu)?;
        // Keep the cursor in step when the script answers the pair under it.
        let under_cursor = session
            .current_pair(&a.stage)
            .context(EngineSnafu)?
            .map(|p| p.key());
        if under_cursor.as_deref() == Some(a.pair.as_str()) {
            session.advance(&a.stage).context(EngineSnafu)?;
        }
    }
    Ok(())
}

fn check_reference(session: &SurveySession, reference_path: &str) -> RunnerResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_recorded =
        serde_json::to_string_pretty(&responses_js(session)?).context(ParsingJsonSnafu {})?;
    let pretty_reference =
        serde_json::to_string_pretty(&reference["responses"]).context(ParsingJsonSnafu {})?;
    if pretty_reference != pretty_recorded {
        warn!("Found differences with the reference record");
        print_diff(pretty_reference.as_str(), pretty_recorded.as_ref(), "\n");
        whatever!("Difference detected between the recorded judgments and the reference")
    }
    Ok(())
}

pub fn run_survey(args: &Args) -> RunnerResult<()> {
    let config = read_survey_config(&args.config)?;
    info!("config: {:?}", config);
    let config_root: PathBuf = Path::new(&args.config)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let stages = build_stages(&config, &config_root)?;

    let name = match (&args.name, &args.answers) {
        (Some(n), _) => n.clone(),
        (None, Some(_)) => {
            whatever!("An operator name is required when running with --answers")
        }
        (None, None) => io_answers::prompt_operator_name()?,
    };

    let mut builder = Builder::new(&name).context(EngineSnafu)?;
    if let Some(org) = &args.organization {
        builder = builder.organization(org);
    }
    for stage in stages.iter() {
        builder = builder.stage(stage).context(EngineSnafu)?;
    }
    let mut session = builder.build().context(EngineSnafu)?;

    print_welcome(&config, &session);

    let finished = match &args.answers {
        Some(path) => {
            replay_answers(&mut session, path)?;
            true
        }
        None => io_answers::run_interactive(&mut session)?,
    };

    if !finished {
        warn!("Survey left unfinished, nothing exported");
        print_progress(&session);
        return Ok(());
    }

    let sinks = sink::sink_chain(&config.output_settings, &config_root, &args.out);

    if session.is_complete() {
        // Automatic export, exactly once per completion.
        if !session.exported() {
            let record = SurveyRecord::assemble(&session)?;
            let destination = sink::export(&record, &sinks)?;
            session.mark_exported();
            println!("Survey record written to {}", destination);
        }
    } else {
        print_progress(&session);
        whatever!("The answers file does not cover every pair of every stage")
    }

    if args.resave {
        let record = SurveyRecord::assemble(&session)?;
        let destination = sink::export(&record, &sinks)?;
        info!("Record exported again to {}", destination);
        println!("Survey record written to {}", destination);
    }

    if let Some(reference_path) = &args.reference {
        check_reference(&session, reference_path)?;
        info!("Recorded judgments match the reference record");
    }

    Ok(())
}
