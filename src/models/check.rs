//! Check verdicts and the per-run result log

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    /// Degraded or optional state; never affects the exit code
    Warning,
}

impl Verdict {
    /// Glyph used by the console report
    pub fn glyph(&self) -> &'static str {
        match self {
            Verdict::Pass => "✓",
            Verdict::Fail => "✗",
            Verdict::Warning => "⚠",
        }
    }
}

/// One atomic, immutable check outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub verdict: Verdict,
    pub message: String,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict,
            message: message.into(),
        }
    }

    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Verdict::Pass, message)
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Verdict::Fail, message)
    }

    pub fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, Verdict::Warning, message)
    }

    /// Human-readable line without the glyph
    pub fn line(&self) -> String {
        if self.message.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.name, self.message)
        }
    }
}

/// Verdict counts derived from a result log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl RunSummary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.count(result.verdict);
            summary
        })
    }

    fn count(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail => self.failed += 1,
            Verdict::Warning => self.warnings += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.warnings
    }

    /// 1 when any check failed, 0 otherwise. Warnings never count.
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Append-only log of the results of one run, with running tallies.
#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    results: Vec<CheckResult>,
    summary: RunSummary,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: CheckResult) {
        self.summary.count(result.verdict);
        self.results.push(result);
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<CheckResult> {
        self.results
    }
}
