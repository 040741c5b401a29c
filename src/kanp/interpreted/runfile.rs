use std::fs::read_to_string;
use std::io;
use std::io::Write;
use std::path::Path;

use log::{debug, warn};

use crate::kanp::common::error::{FaultKind, FaultReport, SUCCESS_MARKER};
use crate::kanp::common::keywords::KeywordTable;
use crate::kanp::interpreted::prompt::run_to;

/// Runs a script, streaming its output to `out` followed by a status line. Returns whether the
/// program completed; `Err` only when `out` itself can't be written.
pub fn run_file<W: Write>(path: &Path, keywords: &KeywordTable, out: &mut W) -> io::Result<bool> {
    let source = match read_to_string(path) {
        Ok(source) => source,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            writeln!(out, "❌ Error: File '{}' nahi mili bhai.", path.display())?;
            return Ok(false);
        }
        Err(e) => {
            let report = FaultReport { kind: FaultKind::Internal, message: e.to_string(), line: 0 };
            writeln!(out, "{}", report)?;
            return Ok(false);
        }
    };
    debug!("Running {} ({} bytes)", path.display(), source.len());
    match run_to(&source, keywords, &mut *out) {
        Ok(()) => {
            writeln!(out, "{}", SUCCESS_MARKER)?;
            Ok(true)
        }
        Err(e) => {
            warn!("{} failed: {:?}", path.display(), e);
            writeln!(out, "{}", FaultReport::from_error(e.as_ref()))?;
            Ok(false)
        }
    }
}
