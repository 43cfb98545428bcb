//! LCOV Report Formatter
//!
//! Generates LCOV tracefiles for CI integration.
//!
//! ## LCOV Format
//!
//! ```text
//! TN:
//! SF:<source file>
//! FN:<line>,<function name>
//! FNDA:<execution count>,<function name>
//! FNF:<functions found>
//! FNH:<functions hit>
//! BRDA:<line>,<block>,<branch>,<taken>
//! BRF:<branches found>
//! BRH:<branches hit>
//! DA:<line>,<execution count>
//! LF:<lines found>
//! LH:<lines hit>
//! end_of_record
//! ```

use crate::coverage::model::FileCoverage;
use std::collections::BTreeMap;
use std::fmt::Write;

/// LCOV format report generator
#[derive(Debug)]
pub struct LcovFormatter<'a> {
    files: &'a BTreeMap<String, FileCoverage>,
}

impl<'a> LcovFormatter<'a> {
    /// Create a new LCOV formatter over merged per-file records
    #[must_use]
    pub fn new(files: &'a BTreeMap<String, FileCoverage>) -> Self {
        Self { files }
    }

    /// Generate LCOV format report as a string
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        for (path, file) in self.files {
            output.push_str("TN:\n");
            let _ = writeln!(output, "SF:{path}");
            Self::write_functions(&mut output, file);
            Self::write_branches(&mut output, file);
            Self::write_lines(&mut output, file);
            output.push_str("end_of_record\n");
        }

        output
    }

    fn write_functions(output: &mut String, file: &FileCoverage) {
        let mut hit = 0;
        for meta in file.fn_map.values() {
            let _ = writeln!(output, "FN:{},{}", meta.decl_line(), meta.name);
        }
        for (id, meta) in &file.fn_map {
            let count = file.f.get(id).copied().unwrap_or(0);
            if count > 0 {
                hit += 1;
            }
            let _ = writeln!(output, "FNDA:{count},{}", meta.name);
        }
        let _ = writeln!(output, "FNF:{}", file.fn_map.len());
        let _ = writeln!(output, "FNH:{hit}");
    }

    fn write_branches(output: &mut String, file: &FileCoverage) {
        let mut found = 0;
        let mut hit = 0;
        for (id, arms) in &file.b {
            let line = file.branch_map.get(id).map_or(0, |meta| meta.line);
            for (arm, count) in arms.iter().enumerate() {
                found += 1;
                if *count > 0 {
                    hit += 1;
                }
                let _ = writeln!(output, "BRDA:{line},{id},{arm},{count}");
            }
        }
        let _ = writeln!(output, "BRF:{found}");
        let _ = writeln!(output, "BRH:{hit}");
    }

    fn write_lines(output: &mut String, file: &FileCoverage) {
        let lines = file.line_hits();
        let mut hit = 0;
        for (line, count) in &lines {
            let _ = writeln!(output, "DA:{line},{count}");
            if *count > 0 {
                hit += 1;
            }
        }
        let _ = writeln!(output, "LF:{}", lines.len());
        let _ = writeln!(output, "LH:{hit}");
    }
}
