// Answer sources: scripted CSV files and the interactive terminal loop.

use log::debug;

use std::io::{BufRead, Write};

use pairwise_survey::*;
use snafu::prelude::*;

use crate::survey::*;

/// One scripted answer: stage id, pair key, judgment token.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScriptedAnswer {
    pub stage: String,
    pub pair: String,
    pub token: String,
}

pub fn read_answers_csv(path: &str) -> RunnerResult<Vec<ScriptedAnswer>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<ScriptedAnswer> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_answers_csv: {:?} {:?}", lineno, line);
        let stage = line
            .get(0)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim()
            .to_string();
        let pair = line
            .get(1)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim()
            .to_string();
        let token = line
            .get(2)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim()
            .to_string();
        res.push(ScriptedAnswer { stage, pair, token });
    }
    Ok(res)
}

/// What the operator typed in reply to one prompt.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PromptReply {
    Judged(Judgment),
    Back,
    Quit,
}

pub fn prompt_operator_name() -> RunnerResult<String> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    loop {
        print!("Your name: ");
        std::io::stdout().flush().context(ReadingPromptSnafu {})?;
        let mut line = String::new();
        let n = input.read_line(&mut line).context(ReadingPromptSnafu {})?;
        if n == 0 {
            whatever!("No operator name provided")
        }
        let name = line.trim();
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }
}

/// Walks the operator through every stage in order.
///
/// Returns false when the operator quit before the end; the session is
/// left as-is so the caller can report the progress.
pub fn run_interactive(session: &mut SurveySession) -> RunnerResult<bool> {
    let stage_ids: Vec<String> = session.stages().map(|s| s.id().to_string()).collect();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    for stage_id in stage_ids.iter() {
        let stage = session.stage(stage_id).context(EngineSnafu)?;
        let total = session.pair_count(stage_id).context(EngineSnafu)?;
        println!();
        println!("=== {} ({} comparisons) ===", stage.name(), total);

        loop {
            let pair = match session.current_pair(stage_id).context(EngineSnafu)? {
                Some(p) => *p,
                None => break,
            };
            let position = session.cursor(stage_id).context(EngineSnafu)? + 1;
            print_pair(
                session.stage(stage_id).context(EngineSnafu)?,
                &pair,
                position,
                total,
            );
            match read_reply(&mut input)? {
                None | Some(PromptReply::Quit) => return Ok(false),
                Some(PromptReply::Back) => session.retreat(stage_id).context(EngineSnafu)?,
                Some(PromptReply::Judged(judgment)) => {
                    match session.record_judgment(stage_id, &pair.key(), &judgment) {
                        Ok(()) => session.advance(stage_id).context(EngineSnafu)?,
                        // Stay on the same pair; the verdict did not fit it.
                        Err(e) => println!("Rejected: {}", e),
                    }
                }
            }
        }
        println!("Stage complete.");
    }
    Ok(true)
}

fn print_pair(stage: &Stage, pair: &Pair, position: usize, total: usize) {
    println!();
    println!("[{}/{}] Which criterion is more important?", position, total);
    for id in [pair.first, pair.second] {
        match stage.criterion(id) {
            Some(c) => match &c.description {
                Some(d) => println!("  ({}) {} - {}", id, c.label, d),
                None => println!("  ({}) {}", id, c.label),
            },
            None => println!("  ({})", id),
        }
    }
    let scale = stage.scale();
    let levels: Vec<String> = (1..=scale.max_level())
        .map(|level| match scale.label_for(level) {
            Some(label) => format!("{}={}", level, label),
            None => level.to_string(),
        })
        .collect();
    println!(
        "Reply with 0 for equal, or <intensity><id> with intensity in {{{}}} (e.g. 1{}).",
        levels.join(", "),
        pair.second
    );
    println!("Other replies: 'back' to revisit the previous pair, 'quit' to leave.");
}

/// Reads one reply; `None` means the input is exhausted.
fn read_reply(input: &mut impl BufRead) -> RunnerResult<Option<PromptReply>> {
    loop {
        print!("> ");
        std::io::stdout().flush().context(ReadingPromptSnafu {})?;
        let mut line = String::new();
        let n = input.read_line(&mut line).context(ReadingPromptSnafu {})?;
        if n == 0 {
            return Ok(None);
        }
        let reply = match line.trim() {
            "" => continue,
            "back" | "b" => PromptReply::Back,
            "quit" | "q" => PromptReply::Quit,
            token => match Judgment::decode(token) {
                Ok(judgment) => PromptReply::Judged(judgment),
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
        };
        return Ok(Some(reply));
    }
}
