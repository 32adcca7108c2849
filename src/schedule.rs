//! The ladder of restraint force constants applied to one state.

use crate::error::{CcrError, Result};
use std::fs;
use std::path::Path;

/// Force constants, one per simulation step, in the order the steps were run.
#[derive(Debug, Clone, PartialEq)]
pub struct RestraintSchedule {
    force_constants: Vec<f64>,
}

impl RestraintSchedule {
    pub fn new(force_constants: Vec<f64>) -> Result<Self> {
        Self::checked(force_constants, Path::new("<in-memory>"))
    }

    /// Read a schedule file: `header_lines` lines are skipped, then one force constant per
    /// line. Blank lines and `#` comments after the header are ignored.
    pub fn from_file(path: impl AsRef<Path>, header_lines: usize) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CcrError::io(path, source))?;
        Self::parse(&text, header_lines, path)
    }

    pub fn parse(text: &str, header_lines: usize, path: &Path) -> Result<Self> {
        let mut values = Vec::new();
        for (line_idx, line) in text.lines().enumerate().skip(header_lines) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = || CcrError::MalformedSchedule {
                path: path.to_path_buf(),
                line: Some(line_idx + 1),
                reason: format!("expected a single number, found `{line}`"),
            };
            if line.split_whitespace().count() != 1 {
                return Err(malformed());
            }
            let value: f64 = whiteread::parse_string(line).map_err(|_| malformed())?;
            values.push(value);
        }
        Self::checked(values, path)
    }

    fn checked(force_constants: Vec<f64>, path: &Path) -> Result<Self> {
        let malformed = |reason: String| CcrError::MalformedSchedule {
            path: path.to_path_buf(),
            line: None,
            reason,
        };
        if force_constants.len() < 2 {
            return Err(malformed(format!(
                "need at least 2 force constants, found {}",
                force_constants.len()
            )));
        }
        for (i, &k) in force_constants.iter().enumerate() {
            if !(k.is_finite() && k > 0.0) {
                return Err(malformed(format!("force constant {i} is {k}, must be positive")));
            }
        }
        if let Some(i) = force_constants.windows(2).position(|w| w[0] == w[1]) {
            return Err(malformed(format!(
                "steps {i} and {} share the force constant {}",
                i + 1,
                force_constants[i]
            )));
        }
        Ok(Self { force_constants })
    }

    pub fn force_constants(&self) -> &[f64] {
        &self.force_constants
    }

    pub fn len(&self) -> usize {
        self.force_constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.force_constants.is_empty()
    }

    /// Index of the last, least-restrained step.
    pub fn final_step(&self) -> usize {
        self.force_constants.len() - 1
    }
}
