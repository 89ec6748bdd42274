//! Diagnostics for recoverable conditions
//!
//! Missing inputs, skipped regions and source discontinuities never stop a
//! run. Each occurrence is recorded here and logged, so that silently
//! dropped regions and days can be audited afterwards.

use super::{HourStamp, RegionSkip};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Category of a recovered condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// No tile exists for an hour under any source
    InputMissing,
    /// A tile exists but could not be read
    InputUnreadable,
    /// Region without geometry or with an unusable pixel window
    MalformedRegion,
    /// Region whose pixels were all masked out
    EmptyReduction,
    /// Products differ across a year boundary
    SourceDiscontinuity,
    /// A day produced no output row
    DayOmitted,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::InputMissing => "input-missing",
            DiagnosticKind::InputUnreadable => "input-unreadable",
            DiagnosticKind::MalformedRegion => "malformed-region",
            DiagnosticKind::EmptyReduction => "empty-reduction",
            DiagnosticKind::SourceDiscontinuity => "source-discontinuity",
            DiagnosticKind::DayOmitted => "day-omitted",
        };
        f.write_str(label)
    }
}

/// One recovered condition
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub date: NaiveDate,
    pub stamp: Option<HourStamp>,
    pub region: Option<String>,
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.date)?;
        if let Some(stamp) = &self.stamp {
            write!(f, " @ {}", stamp)?;
        }
        if let Some(region) = &self.region {
            write!(f, " region {}", region)?;
        }
        write!(f, ": {}", self.detail)
    }
}

/// Collected diagnostics of a run
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a warning event
    pub fn record(&mut self, diagnostic: Diagnostic) {
        let stamp = diagnostic.stamp.map(|s| s.to_string());
        warn!(
            kind = %diagnostic.kind,
            date = %diagnostic.date,
            stamp = stamp.as_deref(),
            region = diagnostic.region.as_deref(),
            "{}",
            diagnostic.detail
        );
        self.entries.push(diagnostic);
    }

    pub fn input_missing(&mut self, date: NaiveDate, stamp: HourStamp) {
        self.record(Diagnostic {
            kind: DiagnosticKind::InputMissing,
            date,
            stamp: Some(stamp),
            region: None,
            detail: "no tile under any source".to_string(),
        });
    }

    pub fn input_unreadable(&mut self, date: NaiveDate, stamp: HourStamp, detail: String) {
        self.record(Diagnostic {
            kind: DiagnosticKind::InputUnreadable,
            date,
            stamp: Some(stamp),
            region: None,
            detail,
        });
    }

    /// Record every region skipped while reducing one hour
    pub fn region_skips(&mut self, date: NaiveDate, stamp: HourStamp, skips: &[RegionSkip]) {
        for skip in skips {
            let kind = if skip.reason.is_malformed() {
                DiagnosticKind::MalformedRegion
            } else {
                DiagnosticKind::EmptyReduction
            };
            self.record(Diagnostic {
                kind,
                date,
                stamp: Some(stamp),
                region: Some(skip.code.clone()),
                detail: skip.reason.to_string(),
            });
        }
    }

    pub fn source_discontinuity(&mut self, date: NaiveDate, detail: String) {
        self.record(Diagnostic {
            kind: DiagnosticKind::SourceDiscontinuity,
            date,
            stamp: None,
            region: None,
            detail,
        });
    }

    pub fn day_omitted(&mut self, date: NaiveDate, detail: impl Into<String>) {
        self.record(Diagnostic {
            kind: DiagnosticKind::DayOmitted,
            date,
            stamp: None,
            region: None,
            detail: detail.into(),
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Counts per kind, for run summaries
    pub fn counts_by_kind(&self) -> HashMap<DiagnosticKind, usize> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Diagnostics attached to one region code
    pub fn for_region<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries
            .iter()
            .filter(move |d| d.region.as_deref() == Some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::RegionSkipReason;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, 4).unwrap()
    }

    #[test]
    fn test_region_skips_are_classified() {
        let mut log = DiagnosticLog::new();
        let stamp = HourStamp::day_start(date());
        let skips = vec![
            RegionSkip {
                code: "01".to_string(),
                reason: RegionSkipReason::MissingGeometry,
            },
            RegionSkip {
                code: "2A".to_string(),
                reason: RegionSkipReason::EmptyReduction,
            },
        ];

        log.region_skips(date(), stamp, &skips);

        assert_eq!(log.len(), 2);
        assert_eq!(log.count(DiagnosticKind::MalformedRegion), 1);
        assert_eq!(log.count(DiagnosticKind::EmptyReduction), 1);
        assert_eq!(log.for_region("2A").count(), 1);
    }

    #[test]
    fn test_display_includes_region_and_stamp() {
        let mut log = DiagnosticLog::new();
        let stamp = HourStamp::day_start(date());
        log.region_skips(
            date(),
            stamp,
            &[RegionSkip {
                code: "75".to_string(),
                reason: RegionSkipReason::EmptyReduction,
            }],
        );

        let rendered = log.entries()[0].to_string();
        assert!(rendered.contains("empty-reduction"));
        assert!(rendered.contains("region 75"));
        assert!(rendered.contains("2021-05-04 06:00Z"));
    }

    #[test]
    fn test_counts_by_kind() {
        let mut log = DiagnosticLog::new();
        log.day_omitted(date(), "missing start");
        log.day_omitted(date(), "missing end");
        log.input_missing(date(), HourStamp::day_end(date()));

        let counts = log.counts_by_kind();
        assert_eq!(counts.get(&DiagnosticKind::DayOmitted), Some(&2));
        assert_eq!(counts.get(&DiagnosticKind::InputMissing), Some(&1));
    }
}
