use clap::{Parser, Subcommand};

/// This is a tally program for ranked group surveys. Results of a section are
/// only shown once everyone on the roster answered it.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file describing the survey: the roster, the questions, the sections and
    /// where the votes are stored. See the manual of the ranked_survey crate for the format.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Reads the votes once and prints the results.
    Tally {
        /// (file path or 'stdout') If specified, the summary of the survey will be written in
        /// JSON format to the given location.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// (file path) A reference file containing the summary of a survey in JSON format. If
        /// provided, rsurvey will check that the computed summary matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Reads the votes periodically and prints the results whenever they change.
    Watch {
        /// (seconds) Overrides the refreshIntervalSecs option of the configuration.
        #[clap(short, long, value_parser)]
        interval: Option<u64>,

        /// Stops once every section is unlocked.
        #[clap(long, takes_value = false)]
        until_unlocked: bool,
    },
    /// Records the rankings of one voter.
    Submit {
        /// The name of the voter, as written in the roster.
        #[clap(long, value_parser)]
        voter: String,

        /// (key=name;name;...) The ranking for one question, best first. Can be repeated.
        #[clap(long = "answer", value_parser)]
        answers: Vec<String>,
    },
}
