//! End-of-run summary

use crate::app::models::{DiagnosticKind, DiagnosticLog};
use chrono::NaiveDate;
use colored::*;
use std::time::Duration;

/// Outcome of a series run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days_requested: usize,
    pub days_written: usize,
    pub days_omitted: Vec<NaiveDate>,
    pub diagnostics: DiagnosticLog,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.days_omitted.is_empty()
    }

    /// Print the summary to standard error
    pub fn print_report(&self) {
        eprintln!("\n{}", "Rainfall Indicator Summary".bright_green().bold());
        eprintln!(
            "  {} {} to {}",
            "Range:".bright_cyan(),
            self.start.to_string().bright_white(),
            self.end.to_string().bright_white()
        );
        eprintln!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            self.elapsed.as_millis().to_string().bright_white()
        );
        eprintln!(
            "  {} {}/{}",
            "Days written:".bright_cyan(),
            self.days_written.to_string().bright_white().bold(),
            self.days_requested
        );

        if !self.days_omitted.is_empty() {
            let omitted: Vec<String> = self.days_omitted.iter().map(|d| d.to_string()).collect();
            eprintln!(
                "  {} {}",
                "Days omitted:".bright_red(),
                omitted.join(", ").bright_red().bold()
            );
        }

        let counts = self.diagnostics.counts_by_kind();
        for kind in [
            DiagnosticKind::InputMissing,
            DiagnosticKind::InputUnreadable,
            DiagnosticKind::MalformedRegion,
            DiagnosticKind::EmptyReduction,
            DiagnosticKind::SourceDiscontinuity,
        ] {
            if let Some(count) = counts.get(&kind) {
                eprintln!(
                    "  {} {}",
                    format!("{}:", kind).bright_yellow(),
                    count.to_string().bright_white()
                );
            }
        }
    }
}
