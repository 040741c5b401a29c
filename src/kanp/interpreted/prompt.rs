use std::io;
use std::io::{BufRead, Write};

use log::{error, warn};
use option_ext::OptionExt;

use crate::kanp::common::error::{FaultReport, KanpResult, SUCCESS_MARKER};
use crate::kanp::common::keywords::KeywordTable;
use crate::kanp::common::lexer::tokenize;
use crate::kanp::interpreted::interpreter::interpret;
use crate::kanp::interpreted::parser::parse;

/// What a hosting collaborator gets back from one program run.
#[derive(Debug, PartialEq, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    /// Everything the program printed, up to the fault if there was one.
    pub output: String,
    pub fault: Option<FaultReport>,
}

impl ExecutionResult {
    pub fn status_line(&self, crash_headline: &str) -> String {
        self.fault.as_ref().map_or2(|f| f.render(crash_headline), SUCCESS_MARKER.to_owned())
    }
}

/// Runs the whole pipeline once, writing program output to `writer` as it is produced.
pub fn run_to<W: Write>(source: &str, keywords: &KeywordTable, writer: W) -> KanpResult<()> {
    let tokens = tokenize(source, keywords)?;
    let program = parse(&tokens)?;
    interpret(&program, writer)
}

pub fn run(source: &str, keywords: &KeywordTable) -> ExecutionResult {
    let mut buffer = Vec::new();
    let result = run_to(source, keywords, &mut buffer);
    let output = String::from_utf8_lossy(&buffer).into_owned();
    match result {
        Ok(()) => ExecutionResult { success: true, output, fault: None },
        Err(e) => {
            warn!("Program failed: {:?}", e);
            ExecutionResult { success: false, output, fault: Some(FaultReport::from_error(e.as_ref())) }
        }
    }
}

pub fn run_prompt(keywords: &KeywordTable) {
    let stdin = io::stdin();
    let mut line_read = String::new();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        match stdin.lock().read_line(&mut line_read) {
            Ok(0) => break,
            Ok(_) => {
                let result = run(&line_read, keywords);
                print!("{}", result.output);
                if let Some(fault) = result.fault {
                    println!("{}", fault);
                }
            }
            Err(e) => {
                error!("Failed to read line from input: {}", e);
                break;
            }
        }
        line_read.clear();
    }
}
