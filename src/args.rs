use clap::Parser;

/// This is a pairwise-comparison survey program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the survey: output settings and the
    /// ordered stages with their criteria and intensity scales.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path or empty) A CSV file with pre-recorded answers, one line per pair:
    /// stage id, pair key, judgment token. When provided, the survey runs without
    /// prompting. Without it, the questionnaire is interactive on the terminal.
    #[clap(short, long, value_parser)]
    pub answers: Option<String>,

    /// The name of the operator answering the survey. Required together with
    /// --answers; prompted for otherwise.
    #[clap(short, long, value_parser)]
    pub name: Option<String>,

    /// The organization of the operator.
    #[clap(long, value_parser)]
    pub organization: Option<String>,

    /// (file path or empty) A reference export in JSON format. If provided, the
    /// recorded judgments are checked against the reference record.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (directory path or empty) Overrides the directory where standalone JSON
    /// exports are written. Setting this option overrides the path that may be
    /// specified in the configuration file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, exports the record one more time after the
    /// automatic export. A fresh row or file is produced; prior records are
    /// never rewritten.
    #[clap(long, takes_value = false)]
    pub resave: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
