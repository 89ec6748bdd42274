//! Tile inventory for a date range
//!
//! Scans the tiles tree and reports, for each day, which data sources hold
//! the snapshots the day needs. Lets operators see ahead of a run which days
//! will be omitted and which will fall back to the secondary product.

use crate::app::models::{DataSource, HourStamp, is_year_boundary_day};
use crate::constants::TILE_VERSION_SUFFIX;
use crate::error::{IndicatorError, Result};
use chrono::{Datelike, NaiveDate};
use colored::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Sources available for each hour found in the tiles tree
#[derive(Debug, Clone, Default)]
pub struct TileInventory {
    hours: BTreeMap<HourStamp, BTreeSet<DataSource>>,
    files_scanned: usize,
}

/// Snapshot availability of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    /// Sources holding the 06:00 tile of the day
    pub start: Vec<DataSource>,
    /// Sources holding the 06:00 tile of the next day
    pub end: Vec<DataSource>,
    /// Sources holding the January 1 00:00 tile, December 31 only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_boundary: Option<Vec<DataSource>>,
}

impl DayAvailability {
    /// Whether every snapshot the day needs exists under some source
    pub fn is_computable(&self) -> bool {
        !self.start.is_empty()
            && !self.end.is_empty()
            && self.year_boundary.as_ref().is_none_or(|b| !b.is_empty())
    }
}

fn tile_pattern() -> Result<Regex> {
    let pattern = format!(
        r"(\d{{4}})/(\d{{2}})/(\d{{2}})/([a-z_]+)_(\d{{2}})_{}\.tif$",
        TILE_VERSION_SUFFIX
    );
    Regex::new(&pattern).map_err(|e| IndicatorError::configuration(e.to_string()))
}

fn source_for_stem(stem: &str) -> Option<DataSource> {
    DataSource::FALLBACK_ORDER
        .into_iter()
        .find(|source| source.tile_stem() == stem)
}

impl TileInventory {
    /// Scan the year directories a date range can touch
    pub fn scan(tiles_dir: &Path, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let pattern = tile_pattern()?;
        let mut inventory = Self::default();

        // The last day needs the 06:00 tile of the following day
        for year in start.year()..=end.year() + 1 {
            let year_dir = tiles_dir.join(format!("{:04}", year));
            if !year_dir.is_dir() {
                debug!("No tiles for {} under {}", year, tiles_dir.display());
                continue;
            }

            for entry in WalkDir::new(&year_dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                inventory.files_scanned += 1;
                let relative = entry
                    .path()
                    .strip_prefix(tiles_dir)
                    .unwrap_or(entry.path())
                    .to_string_lossy()
                    .replace('\\', "/");
                inventory.record(&pattern, &relative);
            }
        }

        info!(
            "Scanned {} files, {} hours with tiles",
            inventory.files_scanned,
            inventory.hours.len()
        );
        Ok(inventory)
    }

    fn record(&mut self, pattern: &Regex, relative: &str) {
        let Some(caps) = pattern.captures(relative) else {
            return;
        };
        let Some(source) = source_for_stem(&caps[4]) else {
            return;
        };

        let parse = |i: usize| caps[i].parse::<u32>().ok();
        let (Some(month), Some(day), Some(hour)) = (parse(2), parse(3), parse(5)) else {
            return;
        };
        let Ok(year) = caps[1].parse::<i32>() else {
            return;
        };

        if let Some(stamp) =
            NaiveDate::from_ymd_opt(year, month, day).and_then(|date| HourStamp::new(date, hour))
        {
            self.hours.entry(stamp).or_default().insert(source);
        }
    }

    /// Sources holding the tile of an hour, in fallback order
    pub fn sources_at(&self, stamp: HourStamp) -> Vec<DataSource> {
        let Some(sources) = self.hours.get(&stamp) else {
            return Vec::new();
        };
        DataSource::FALLBACK_ORDER
            .into_iter()
            .filter(|source| sources.contains(source))
            .collect()
    }

    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }

    /// Availability of one day
    pub fn day(&self, date: NaiveDate) -> DayAvailability {
        DayAvailability {
            date,
            start: self.sources_at(HourStamp::day_start(date)),
            end: self.sources_at(HourStamp::day_end(date)),
            year_boundary: is_year_boundary_day(date)
                .then(|| self.sources_at(HourStamp::year_boundary(date))),
        }
    }

    /// Availability of every day of an inclusive range
    pub fn days(&self, start: NaiveDate, end: NaiveDate) -> Vec<DayAvailability> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| self.day(d))
            .collect()
    }
}

fn sources_label(sources: &[DataSource]) -> String {
    if sources.is_empty() {
        "-".to_string()
    } else {
        sources
            .iter()
            .map(DataSource::tag)
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// Plain-text report, one line per day
pub fn render_text(days: &[DayAvailability]) -> String {
    let mut out = String::new();
    for day in days {
        let status = if day.is_computable() {
            "ok".green()
        } else {
            "missing".red().bold()
        };
        out.push_str(&format!(
            "{}  start {:<18} end {:<18}",
            day.date,
            sources_label(&day.start),
            sources_label(&day.end)
        ));
        if let Some(boundary) = &day.year_boundary {
            out.push_str(&format!(" new-year {:<18}", sources_label(boundary)));
        }
        out.push_str(&format!(" {}\n", status));
    }

    let computable = days.iter().filter(|d| d.is_computable()).count();
    out.push_str(&format!(
        "\n{} {}/{}\n",
        "Computable days:".bright_cyan(),
        computable.to_string().bright_white().bold(),
        days.len()
    ));
    out
}

/// JSON report
pub fn render_json(days: &[DayAvailability]) -> Result<String> {
    Ok(serde_json::to_string_pretty(days)?)
}
