use std::path::PathBuf;

use super::Mode;
use crate::inference::Category;
use crate::model::OutputRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedEntry {
    pub record: OutputRecord,
    pub category: Category,
    /// `<output_root>/<name>.json`, whether or not it was written.
    pub target: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub identifier: String,
    pub reason: String,
}

/// Outcome of one batch run. Entries and failures are sorted by identifier.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub mode: Mode,
    pub discovered: usize,
    pub records: Vec<ConvertedEntry>,
    pub failures: Vec<ConversionFailure>,
    /// Targets that already existed before this run.
    pub conflicts: Vec<PathBuf>,
    pub written: usize,
    pub index_path: Option<PathBuf>,
}

impl ConversionReport {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            discovered: 0,
            records: Vec::new(),
            failures: Vec::new(),
            conflicts: Vec::new(),
            written: 0,
            index_path: None,
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        let verb = match self.mode {
            Mode::Preview => "would convert",
            Mode::Commit => "converted",
        };
        format!(
            "{verb} {} of {} agents ({} failed, {} written, {} existing targets)",
            self.records.len(),
            self.discovered,
            self.failures.len(),
            self.written,
            self.conflicts.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reflects_mode() {
        let mut r = ConversionReport::new(Mode::Preview);
        r.discovered = 3;
        r.failures.push(ConversionFailure {
            identifier: "bad".into(),
            reason: "malformed".into(),
        });
        assert!(r.has_failures());
        assert_eq!(
            r.summary(),
            "would convert 0 of 3 agents (1 failed, 0 written, 0 existing targets)"
        );
    }
}
