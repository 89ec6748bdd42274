//! Pure accumulation rules turning yearly cumulative snapshots into 24-hour totals

use crate::app::models::{BoundaryPolicy, RegionStats};
use std::collections::HashMap;

/// Round half to even, as integer millimeters
pub fn round_value(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// `round(end - start)` for every region present in both snapshots
///
/// Differences are not clamped: a negative delta is reported as such.
pub fn accumulate_standard(start: &RegionStats, end: &RegionStats) -> HashMap<String, i64> {
    start
        .values
        .iter()
        .filter_map(|(code, &start_value)| {
            end.get(code)
                .map(|end_value| (code.clone(), round_value(end_value - start_value)))
        })
        .collect()
}

/// Policy applying to a year-boundary day, from the sources of the day start
/// and of the new-year snapshot
pub fn boundary_policy(start: &RegionStats, boundary: &RegionStats) -> BoundaryPolicy {
    if boundary.source != start.source {
        BoundaryPolicy::SourceDiscontinuitySubstitution
    } else {
        BoundaryPolicy::Reconstructed
    }
}

/// 24-hour totals of December 31
///
/// The yearly counter resets at the new year, so a plain difference is
/// wrong. With one product on both sides the total is
/// `boundary - start + end`; across a product switch the partial new-year
/// accumulation `end` is used as-is. Regions must be present in all three
/// snapshots.
pub fn accumulate_year_boundary(
    start: &RegionStats,
    boundary: &RegionStats,
    end: &RegionStats,
) -> (HashMap<String, i64>, BoundaryPolicy) {
    let policy = boundary_policy(start, boundary);

    let values = start
        .values
        .iter()
        .filter_map(|(code, &start_value)| {
            let boundary_value = boundary.get(code)?;
            let end_value = end.get(code)?;
            let total = match policy {
                BoundaryPolicy::Reconstructed => boundary_value - start_value + end_value,
                BoundaryPolicy::SourceDiscontinuitySubstitution => end_value,
            };
            Some((code.clone(), round_value(total)))
        })
        .collect();

    (values, policy)
}

/// Arithmetic mean of the regions present, `None` when there are none
pub fn national_mean(values: &HashMap<String, i64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.values().sum();
    Some(sum as f64 / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{DataSource, HourStamp};
    use chrono::NaiveDate;

    fn stats(source: DataSource, values: &[(&str, f64)]) -> RegionStats {
        let stamp = HourStamp::day_start(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
        RegionStats::from_values(source, stamp, values.iter().map(|&(k, v)| (k, v)))
    }

    #[test]
    fn test_standard_day_is_rounded_difference() {
        let start = stats(DataSource::Comephore, &[("01", 100.2), ("02", 40.0)]);
        let end = stats(DataSource::Comephore, &[("01", 112.9), ("02", 43.4)]);

        let values = accumulate_standard(&start, &end);

        assert_eq!(values["01"], 13);
        assert_eq!(values["02"], 3);
    }

    #[test]
    fn test_standard_day_keeps_negative_difference() {
        let start = stats(DataSource::Comephore, &[("01", 50.0)]);
        let end = stats(DataSource::Comephore, &[("01", 46.6)]);

        let values = accumulate_standard(&start, &end);

        assert_eq!(values["01"], -3);
    }

    #[test]
    fn test_standard_day_requires_both_snapshots() {
        let start = stats(DataSource::Comephore, &[("01", 1.0), ("02", 1.0)]);
        let end = stats(DataSource::Comephore, &[("02", 4.0), ("03", 9.0)]);

        let values = accumulate_standard(&start, &end);

        assert_eq!(values.len(), 1);
        assert_eq!(values["02"], 3);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        assert_eq!(round_value(0.5), 0);
        assert_eq!(round_value(1.5), 2);
        assert_eq!(round_value(2.5), 2);
        assert_eq!(round_value(-2.5), -2);
        assert_eq!(round_value(2.51), 3);
    }

    #[test]
    fn test_year_boundary_same_source_reconstructs() {
        let start = stats(DataSource::Comephore, &[("01", 10.0)]);
        let boundary = stats(DataSource::Comephore, &[("01", 10.0)]);
        let end = stats(DataSource::Comephore, &[("01", 7.0)]);

        let (values, policy) = accumulate_year_boundary(&start, &boundary, &end);

        assert_eq!(policy, BoundaryPolicy::Reconstructed);
        assert_eq!(values["01"], 7);
    }

    #[test]
    fn test_year_boundary_counter_reset() {
        // 1190 mm at 06h Dec 31, 1203 mm at midnight, 4 mm into the new year at 06h
        let start = stats(DataSource::Comephore, &[("01", 1190.0)]);
        let boundary = stats(DataSource::Comephore, &[("01", 1203.0)]);
        let end = stats(DataSource::Comephore, &[("01", 4.0)]);

        let (values, _) = accumulate_year_boundary(&start, &boundary, &end);

        assert_eq!(values["01"], 17);
    }

    #[test]
    fn test_year_boundary_source_switch_uses_end() {
        let start = stats(DataSource::Radaric, &[("01", 10.0), ("02", 800.0)]);
        let boundary = stats(DataSource::Comephore, &[("01", 3.0), ("02", 1.0)]);
        let end = stats(DataSource::Comephore, &[("01", 12.0), ("02", 5.4)]);

        let (values, policy) = accumulate_year_boundary(&start, &boundary, &end);

        assert_eq!(policy, BoundaryPolicy::SourceDiscontinuitySubstitution);
        assert_eq!(values["01"], 12);
        assert_eq!(values["02"], 5);
    }

    #[test]
    fn test_year_boundary_requires_all_three_snapshots() {
        let start = stats(DataSource::Comephore, &[("01", 1.0), ("02", 1.0), ("03", 1.0)]);
        let boundary = stats(DataSource::Comephore, &[("01", 2.0), ("03", 2.0)]);
        let end = stats(DataSource::Comephore, &[("01", 1.0), ("02", 1.0)]);

        let (values, _) = accumulate_year_boundary(&start, &boundary, &end);

        assert_eq!(values.len(), 1);
        assert_eq!(values["01"], 2);
    }

    #[test]
    fn test_national_mean_over_present_regions() {
        let values: HashMap<String, i64> = [("01", 3), ("02", 4)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        assert_eq!(national_mean(&values), Some(3.5));
        assert_eq!(national_mean(&HashMap::new()), None);
    }
}
