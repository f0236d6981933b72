//! Report rendering
//!
//! The console reporter streams one line per check as it is recorded; the
//! JSON reporter emits a single document once the run is over.

use std::io::Write;

use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use serde::Serialize;

use crate::models::{CheckResult, RunSummary, Verdict};

const RULE_WIDTH: usize = 64;

pub trait Reporter {
    fn banner(&mut self) {}

    fn group(&mut self, _title: &str) {}

    fn section(&mut self, _title: &str) {}

    /// Called once per check, in order, as soon as the verdict is known
    fn record(&mut self, result: &CheckResult);

    fn summary(&mut self, results: &[CheckResult], summary: &RunSummary);
}

/// Human-readable, optionally colored output
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(std::io::stdout(), color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn verdict_color(verdict: Verdict) -> Color {
        match verdict {
            Verdict::Pass => Color::Green,
            Verdict::Fail => Color::Red,
            Verdict::Warning => Color::Yellow,
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn banner(&mut self) {
        let lines = [
            "╔═══════════════════════════════════════════════════════════════╗",
            "║         DRUID SMOKE TEST - Infrastructure Validation          ║",
            "╚═══════════════════════════════════════════════════════════════╝",
        ];
        for line in lines {
            let line = self.paint(line, Color::Cyan);
            let _ = writeln!(self.out, "{line}");
        }
        let _ = writeln!(self.out);
    }

    fn group(&mut self, title: &str) {
        let rule = self.paint(&"━".repeat(RULE_WIDTH), Color::Blue);
        let title = self.paint(&format!("  {title}"), Color::Blue);
        let _ = writeln!(self.out, "\n{rule}\n{title}\n{rule}");
    }

    fn section(&mut self, title: &str) {
        let title = self.paint(&format!("▶ {title}"), Color::Yellow);
        let _ = writeln!(self.out, "\n{title}");
    }

    fn record(&mut self, result: &CheckResult) {
        let glyph = self.paint(result.verdict.glyph(), Self::verdict_color(result.verdict));
        let _ = writeln!(self.out, "  {glyph} {}", result.line());
    }

    fn summary(&mut self, _results: &[CheckResult], summary: &RunSummary) {
        self.group("TEST SUMMARY");

        let passed = self.paint("✓ Passed:", Color::Green);
        let failed = self.paint("✗ Failed:", Color::Red);
        let warnings = self.paint("⚠ Warnings:", Color::Yellow);
        let _ = writeln!(self.out, "\n  {passed}   {}", summary.passed);
        let _ = writeln!(self.out, "  {failed}   {}", summary.failed);
        let _ = writeln!(self.out, "  {warnings} {}", summary.warnings);
        let _ = writeln!(self.out, "  ─────────────────");
        let _ = writeln!(self.out, "  Total:     {}", summary.total());

        let closing = if summary.failed == 0 {
            self.paint("✓ All critical checks passed!", Color::Green)
        } else {
            self.paint("✗ Some checks failed. Review output above.", Color::Red)
        };
        let _ = writeln!(self.out, "\n{closing}\n");
        let _ = self.out.flush();
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    results: &'a [CheckResult],
    summary: &'a RunSummary,
}

/// Machine-readable output written once at the end of the run
pub struct JsonReporter<W: Write> {
    out: W,
}

impl JsonReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn record(&mut self, result: &CheckResult) {
        tracing::debug!(check = %result.name, verdict = %result.verdict, "Recorded");
    }

    fn summary(&mut self, results: &[CheckResult], summary: &RunSummary) {
        let report = JsonReport {
            generated_at: Utc::now(),
            results,
            summary,
        };
        if let Err(e) = serde_json::to_writer_pretty(&mut self.out, &report) {
            tracing::error!(error = %e, "Failed to write JSON report");
            return;
        }
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}
