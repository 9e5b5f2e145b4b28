// Destinations for completed survey records.
//
// The engine never touches a sink. The runner probes the chain in order
// at export time: the tabular sink when one is configured and reachable,
// then the standalone JSON file as the fallback.

use log::{info, warn};

use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use snafu::prelude::*;

use crate::survey::config_reader::OutputSettings;
use crate::survey::*;

pub trait JudgmentSink {
    fn describe(&self) -> String;

    /// Whether the sink is worth attempting at all.
    fn available(&self) -> bool;

    /// Durably stores one record, never rewriting a previous one.
    /// Returns the destination for reporting.
    fn append(&self, record: &SurveyRecord) -> RunnerResult<String>;
}

/// Appends one row per record to a CSV table: timestamp, name,
/// organization, serialized judgment map.
pub struct CsvTableSink {
    path: PathBuf,
}

impl CsvTableSink {
    pub fn new(path: PathBuf) -> CsvTableSink {
        CsvTableSink { path }
    }
}

impl JudgmentSink for CsvTableSink {
    fn describe(&self) -> String {
        format!("results table {}", self.path.display())
    }

    fn available(&self) -> bool {
        if self.path.exists() {
            return true;
        }
        match self.path.parent() {
            None => false,
            Some(p) if p.as_os_str().is_empty() => true,
            Some(p) => p.is_dir(),
        }
    }

    fn append(&self, record: &SurveyRecord) -> RunnerResult<String> {
        let path = self.path.display().to_string();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context(WritingExportSnafu { path: path.clone() })?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(&record.row()?)
            .context(AppendingRowSnafu { path: path.clone() })?;
        writer
            .flush()
            .context(WritingExportSnafu { path: path.clone() })?;
        Ok(path)
    }
}

/// Writes each record as a standalone pretty-printed JSON file named
/// after the operator and the completion time.
pub struct JsonFileSink {
    directory: PathBuf,
}

impl JsonFileSink {
    pub fn new(directory: PathBuf) -> JsonFileSink {
        JsonFileSink { directory }
    }
}

impl JudgmentSink for JsonFileSink {
    fn describe(&self) -> String {
        format!("export directory {}", self.directory.display())
    }

    fn available(&self) -> bool {
        true
    }

    fn append(&self, record: &SurveyRecord) -> RunnerResult<String> {
        let dir_s = self.directory.display().to_string();
        fs::create_dir_all(&self.directory).context(WritingExportSnafu { path: dir_s })?;
        let base = format!(
            "survey_{}_{}",
            sanitize_name(&record.name),
            record.file_stamp
        );
        let mut path = self.directory.join(format!("{}.json", base));
        let mut n = 1;
        while path.exists() {
            n += 1;
            path = self.directory.join(format!("{}_{}.json", base, n));
        }
        let contents =
            serde_json::to_string_pretty(&record.to_json()).context(ParsingJsonSnafu {})?;
        let path_s = path.display().to_string();
        fs::write(&path, contents).context(WritingExportSnafu {
            path: path_s.clone(),
        })?;
        Ok(path_s)
    }
}

/// Keeps the operator name path-safe in export file names.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Assembles the sink chain from the configuration. Relative paths are
/// resolved against the configuration file's directory; the --out flag
/// overrides the fallback directory.
pub fn sink_chain(
    output: &OutputSettings,
    config_root: &Path,
    out_override: &Option<String>,
) -> Vec<Box<dyn JudgmentSink>> {
    let mut sinks: Vec<Box<dyn JudgmentSink>> = Vec::new();
    if let Some(table) = &output.results_table {
        sinks.push(Box::new(CsvTableSink::new(config_root.join(table))));
    }
    let fallback_dir = match out_override {
        Some(dir) => PathBuf::from(dir),
        None => match &output.output_directory {
            Some(dir) => config_root.join(dir),
            None => config_root.to_path_buf(),
        },
    };
    sinks.push(Box::new(JsonFileSink::new(fallback_dir)));
    sinks
}

/// Tries the chain in order and returns the destination of the first
/// sink that stored the record. The record is kept in memory by the
/// caller, so a total failure can be retried later.
pub fn export(record: &SurveyRecord, sinks: &[Box<dyn JudgmentSink>]) -> RunnerResult<String> {
    let mut last_err: Option<RunnerError> = None;
    for sink in sinks.iter() {
        if !sink.available() {
            info!("Sink unavailable, falling back: {}", sink.describe());
            continue;
        }
        match sink.append(record) {
            Ok(destination) => {
                info!("Record stored via {}", sink.describe());
                return Ok(destination);
            }
            Err(e) => {
                warn!("Sink {} failed: {}", sink.describe(), e);
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => whatever!("No sink available for the survey record"),
    }
}
