use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;

use kanpscript::kanp::common::keywords::KeywordTable;
use kanpscript::kanp::interpreted::prompt::run_prompt;
use kanpscript::kanp::interpreted::runfile::run_file;

/// Runs KanpScript programs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Keyword table to use instead of the bundled one.
    #[arg(short, long)]
    keywords: Option<PathBuf>,

    /// Script to run. Without one, an interactive prompt is started.
    script: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let keywords = match &args.keywords {
        Some(path) => KeywordTable::from_path(path),
        None => KeywordTable::standard(),
    }.unwrap_or_else(|e| {
        eprintln!("{}", e);
        process::exit(2);
    });

    match &args.script {
        Some(script) => match run_file(script, &keywords, &mut io::stdout()) {
            Ok(true) => (),
            Ok(false) => process::exit(1),
            Err(e) => {
                error!("Cannot write to stdout: {}", e);
                process::exit(1);
            }
        },
        None => run_prompt(&keywords),
    }
}
