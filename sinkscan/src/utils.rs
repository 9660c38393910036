//! Source-line retrieval and tainted-code record generation.

use crate::ssa::{FuncId, Module, Position};
use crate::taint::types::TaintedCode;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Retrieves line `line` (1-based) of `filename`, or an empty string when
/// the file or line is unavailable.
#[must_use]
pub fn grab_source_code(filename: &str, line: u32) -> String {
    if line == 0 {
        return String::new();
    }
    let Ok(file) = File::open(filename) else {
        return String::new();
    };
    BufReader::new(file)
        .lines()
        .nth(line as usize - 1)
        .and_then(Result::ok)
        .unwrap_or_default()
}

/// Builds the report record for a position: the source text of the line,
/// the filename/line pair, and the enclosing function rendered as
/// `name signature`.
#[must_use]
pub fn tainted_code(module: &Module, parent: Option<FuncId>, pos: &Position) -> TaintedCode {
    let parent_function = match parent {
        Some(fid) => {
            let f = module.func(fid);
            format!("{} {}", f.name, f.signature)
        }
        None => "<no parent>".to_owned(),
    };
    TaintedCode {
        source_code: grab_source_code(&pos.file, pos.line),
        source_filename: pos.file.clone(),
        source_line: pos.line,
        parent_function,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn grabs_the_requested_line() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "first").unwrap();
        writeln!(tmp, "second").unwrap();
        let path = tmp.path().to_string_lossy().into_owned();
        assert_eq!(grab_source_code(&path, 2), "second");
        assert_eq!(grab_source_code(&path, 9), "");
        assert_eq!(grab_source_code(&path, 0), "");
        assert_eq!(grab_source_code("/definitely/not/there.go", 1), "");
    }
}
