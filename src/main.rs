use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{debug, LevelFilter};

mod args;
mod tally;

use crate::args::{Args, Command};
use crate::tally::TallyResult;

async fn run(args: Args) -> TallyResult<()> {
    match args.command {
        Command::Tally { out, reference } => tally::run_tally(&args.config, out, reference).await,
        Command::Watch {
            interval,
            until_unlocked,
        } => tally::run_watch(&args.config, interval, until_unlocked).await,
        Command::Submit { voter, answers } => {
            tally::run_submit(&args.config, &voter, &answers).await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
