use log::warn;
use serde::{Deserialize, Serialize};

use crate::kanp::common::keywords::KeywordTable;
use crate::kanp::interpreted::prompt::run;

const CRASH_HEADLINE: &str = "System fat gaya.";

#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    pub success: bool,
    /// Program output followed by the status or fault report.
    pub output: String,
}

/// Every request gets its own tokenizer, parser and interpreter.
pub fn handle(request: &RunRequest, keywords: &KeywordTable) -> RunResponse {
    let result = run(&request.code, keywords);
    let mut output = result.output.clone();
    output.push_str(&result.status_line(CRASH_HEADLINE));
    output.push('\n');
    RunResponse { success: result.success, output }
}

pub fn handle_json(body: &str, keywords: &KeywordTable) -> serde_json::Result<String> {
    let response = match serde_json::from_str::<RunRequest>(body) {
        Ok(request) => handle(&request, keywords),
        Err(e) => {
            warn!("Rejecting malformed request: {}", e);
            RunResponse { success: false, output: format!("❌ BaklolError: {}\n{}\n", CRASH_HEADLINE, e) }
        }
    };
    serde_json::to_string(&response)
}
