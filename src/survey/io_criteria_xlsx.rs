// Reads stage criteria out of an Excel worksheet.

use log::{debug, info};

use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};
use snafu::prelude::*;

use crate::survey::config_reader::{CriteriaFileSource, CriterionConfig};
use crate::survey::*;

/// Reads one criterion per row: id, label, optional description. The
/// first row is treated as a header. Rows with an empty id cell are
/// skipped.
pub fn read_criteria_workbook(
    root: &Path,
    source: &CriteriaFileSource,
) -> RunnerResult<Vec<CriterionConfig>> {
    let p: PathBuf = [root.to_path_buf(), PathBuf::from(&source.file_path)]
        .iter()
        .collect();
    let path = p.as_path().display().to_string();
    info!("Attempting to read criteria workbook {:?}", path);

    let mut workbook: Xlsx<_> =
        open_workbook(&p).context(OpeningExcelSnafu { path: path.clone() })?;
    let wrange = match &source.worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path: path.clone() })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut iter = wrange.rows();
    // The first row holds the column names.
    iter.next();
    let mut res: Vec<CriterionConfig> = Vec::new();
    for (idx, row) in iter.enumerate() {
        debug!("read_criteria_workbook: {:?}", row);
        let id = read_cell(row.get(0), idx)?;
        if id.is_empty() {
            continue;
        }
        let label = read_cell(row.get(1), idx)?;
        let description = match read_cell(row.get(2), idx)? {
            d if d.is_empty() => None,
            d => Some(d),
        };
        res.push(CriterionConfig {
            id,
            label,
            description,
        });
    }
    Ok(res)
}

fn read_cell(cell: Option<&calamine::DataType>, idx: usize) -> RunnerResult<String> {
    match cell {
        Some(calamine::DataType::String(s)) => Ok(s.trim().to_string()),
        Some(calamine::DataType::Empty) | None => Ok("".to_string()),
        Some(other) => Err(RunnerError::ExcelWrongCellType {
            lineno: idx as u64 + 2,
            content: format!("{:?}", other),
        }),
    }
}
