//! Derived, read-only views over the collections: windowed statistics, named
//! range filters and the series the chart layer draws. Nothing here touches
//! storage; every view is recomputed from a freshly loaded collection.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, Local, NaiveDate};
use log::info;
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::normalize::round1;
use crate::{Dated, ExerciseEntry, Settings, WeightEntry};

/// Window of the dashboard's trend overlays, in days.
pub const TREND_WINDOW: usize = 7;

/// Labels offered by the range selector, in display order.
pub const RANGE_LABELS: [&str; 6] = ["1週間", "1ヶ月", "3ヶ月", "半年", "1年", "全期間"];

/// Day counts for the named display ranges. `全期間` (all time) is absent on
/// purpose: it is the identity filter, as is any unrecognized label. The
/// plain day-count labels are kept for selections saved by older builds.
static RANGE_DAYS: phf::Map<&'static str, i64> = phf_map! {
    "1週間" => 7,
    "1ヶ月" => 30,
    "3ヶ月" => 90,
    "半年" => 180,
    "1年" => 365,
    "30日" => 30,
    "90日" => 90,
    "180日" => 180,
};

/// Summary of the weight trend over a recent window of days.
///
/// Every field is `None` when no entry falls inside the window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Mean weight, one fractional digit.
    pub avg: Option<f64>,
    /// Last entry minus first entry inside the window, in date order. A
    /// single-entry window therefore reports a delta of 0.
    pub delta: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Statistics over the trailing `days`-day window ending today.
pub fn compute_stats(entries: &[WeightEntry], days: i64) -> StatsSummary {
    stats_since(entries, window_start(Local::now().date_naive(), days))
}

fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days - 1)
}

fn stats_since(entries: &[WeightEntry], start: NaiveDate) -> StatsSummary {
    let mut windowed: Vec<&WeightEntry> = entries.iter().filter(|e| e.date >= start).collect();
    if windowed.is_empty() {
        return StatsSummary::default();
    }
    windowed.sort_by_key(|e| e.date);
    info!("Computing statistics over {} entries", windowed.len());

    let sum: f64 = windowed.iter().map(|e| e.weight).sum();
    let first = windowed[0].weight;
    let last = windowed[windowed.len() - 1].weight;
    let min = windowed
        .iter()
        .map(|e| e.weight)
        .fold(f64::INFINITY, f64::min);
    let max = windowed
        .iter()
        .map(|e| e.weight)
        .fold(f64::NEG_INFINITY, f64::max);
    StatsSummary {
        avg: Some(round1(sum / windowed.len() as f64)),
        delta: Some(round1(last - first)),
        min: Some(round1(min)),
        max: Some(round1(max)),
    }
}

/// Restrict `entries` to a named display range ending today.
///
/// `全期間` and any unrecognized label leave the collection as-is.
pub fn filter_range<T: Dated + Clone>(entries: &[T], label: &str) -> Vec<T> {
    filter_range_from(entries, label, Local::now().date_naive())
}

fn filter_range_from<T: Dated + Clone>(entries: &[T], label: &str, today: NaiveDate) -> Vec<T> {
    let Some(days) = RANGE_DAYS.get(label) else {
        return entries.to_vec();
    };
    let start = window_start(today, *days);
    entries
        .iter()
        .filter(|e| e.date() >= start)
        .cloned()
        .collect()
}

/// Trailing mean with a window of up to `window` points, shorter at the start
/// of the series.
fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        let count = window.min(i + 1) as f64;
        out.push(sum / count);
    }
    out
}

/// Weight chart overlay: per-date trailing average, one fractional digit.
pub fn weight_moving_average(entries: &[WeightEntry], window: usize) -> Vec<(NaiveDate, f64)> {
    let mut sorted: Vec<&WeightEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);
    let values: Vec<f64> = sorted.iter().map(|e| e.weight).collect();
    sorted
        .iter()
        .zip(moving_average(&values, window))
        .map(|(e, ma)| (e.date, round1(ma)))
        .collect()
}

/// Exercise chart overlay over the daily totals, whole minutes.
pub fn duration_moving_average(daily: &[(NaiveDate, u32)], window: usize) -> Vec<(NaiveDate, u32)> {
    let values: Vec<f64> = daily.iter().map(|&(_, v)| f64::from(v)).collect();
    daily
        .iter()
        .zip(moving_average(&values, window))
        .map(|(&(date, _), ma)| (date, ma.round() as u32))
        .collect()
}

/// Sum session durations per calendar day, across activities, ascending by
/// date.
pub fn daily_exercise_totals(entries: &[ExerciseEntry]) -> Vec<(NaiveDate, u32)> {
    let mut map: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for e in entries {
        *map.entry(e.date).or_insert(0) += e.duration_min;
    }
    map.into_iter().collect()
}

/// Dense per-activity duration series for stacked charting.
///
/// `dates` covers every calendar day between the earliest and latest entry;
/// each series holds one value per date, 0 where the activity was not logged,
/// so the chart layer receives a gap-free grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivityGrid {
    pub dates: Vec<NaiveDate>,
    pub series: Vec<(String, Vec<u32>)>,
}

pub fn activity_grid(entries: &[ExerciseEntry]) -> ActivityGrid {
    let Some(first) = entries.iter().map(|e| e.date).min() else {
        return ActivityGrid::default();
    };
    let last = entries.iter().map(|e| e.date).max().unwrap_or(first);

    let mut by_key: BTreeMap<(&str, NaiveDate), u32> = BTreeMap::new();
    let mut activities: BTreeSet<&str> = BTreeSet::new();
    for e in entries {
        activities.insert(e.activity.as_str());
        *by_key.entry((e.activity.as_str(), e.date)).or_insert(0) += e.duration_min;
    }

    let mut dates = Vec::new();
    let mut day = first;
    while day <= last {
        dates.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    let series = activities
        .into_iter()
        .map(|activity| {
            let values = dates
                .iter()
                .map(|d| by_key.get(&(activity, *d)).copied().unwrap_or(0))
                .collect();
            (activity.to_string(), values)
        })
        .collect();
    ActivityGrid { dates, series }
}

/// Most recent recorded weight, by date.
pub fn latest_weight(entries: &[WeightEntry]) -> Option<f64> {
    entries.iter().max_by_key(|e| e.date).map(|e| e.weight)
}

/// Total minutes exercised in the trailing `days`-day window ending today.
pub fn recent_duration_total(entries: &[ExerciseEntry], days: i64) -> u32 {
    let start = window_start(Local::now().date_naive(), days);
    entries
        .iter()
        .filter(|e| e.date >= start)
        .map(|e| e.duration_min)
        .sum()
}

/// Latest weight minus the configured goal, one fractional digit; positive
/// while above goal. `None` until both a sample and a goal exist.
pub fn goal_gap(entries: &[WeightEntry], settings: &Settings) -> Option<f64> {
    let latest = latest_weight(entries)?;
    let goal = settings.goal_weight?;
    Some(round1(latest - goal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn w(date: NaiveDate, weight: f64) -> WeightEntry {
        WeightEntry { date, weight }
    }

    fn ex(date: &str, activity: &str, duration_min: u32) -> ExerciseEntry {
        ExerciseEntry {
            date: d(date),
            activity: activity.into(),
            duration_min,
        }
    }

    #[test]
    fn stats_over_a_week_window() {
        let today = Local::now().date_naive();
        let entries = vec![
            w(today - Duration::days(6), 70.0),
            w(today - Duration::days(3), 71.0),
            w(today, 72.0),
        ];
        let stats = compute_stats(&entries, 7);
        assert_eq!(
            stats,
            StatsSummary {
                avg: Some(71.0),
                delta: Some(2.0),
                min: Some(70.0),
                max: Some(72.0),
            }
        );
    }

    #[test]
    fn stats_on_empty_collection() {
        assert_eq!(compute_stats(&[], 7), StatsSummary::default());
    }

    #[test]
    fn stats_when_everything_is_older_than_the_window() {
        let today = Local::now().date_naive();
        let entries = vec![w(today - Duration::days(30), 70.0)];
        assert_eq!(compute_stats(&entries, 7), StatsSummary::default());
    }

    #[test]
    fn stats_delta_is_first_versus_last_not_max_minus_min() {
        let today = Local::now().date_naive();
        let entries = vec![
            w(today - Duration::days(2), 71.0),
            w(today - Duration::days(1), 69.0),
            w(today, 70.5),
        ];
        let stats = compute_stats(&entries, 7);
        assert_eq!(stats.delta, Some(-0.5));
        assert_eq!(stats.min, Some(69.0));
        assert_eq!(stats.max, Some(71.0));
    }

    #[test]
    fn stats_window_excludes_older_entries() {
        let entries = vec![
            w(d("2024-01-20"), 80.0),
            w(d("2024-02-01"), 70.0),
            w(d("2024-02-03"), 71.0),
        ];
        let stats = stats_since(&entries, d("2024-02-01"));
        assert_eq!(stats.avg, Some(70.5));
        assert_eq!(stats.delta, Some(1.0));
    }

    #[test]
    fn all_time_label_is_the_identity_filter() {
        let entries = vec![w(d("2000-01-01"), 70.0), w(d("2024-01-01"), 71.0)];
        assert_eq!(filter_range(&entries, "全期間"), entries);
    }

    #[test]
    fn unknown_label_falls_back_to_no_filtering() {
        let entries = vec![w(d("2000-01-01"), 70.0)];
        assert_eq!(filter_range(&entries, "bogus"), entries);
    }

    #[test]
    fn week_label_keeps_only_recent_entries() {
        let today = d("2024-03-10");
        let entries = vec![
            w(d("2024-03-01"), 70.0),
            w(d("2024-03-04"), 70.5),
            w(d("2024-03-10"), 71.0),
        ];
        let filtered = filter_range_from(&entries, "1週間", today);
        assert_eq!(
            filtered,
            vec![w(d("2024-03-04"), 70.5), w(d("2024-03-10"), 71.0)]
        );
    }

    #[test]
    fn day_count_labels_still_work() {
        let today = d("2024-03-31");
        let entries = vec![w(d("2024-02-20"), 70.0), w(d("2024-03-20"), 71.0)];
        let filtered = filter_range_from(&entries, "30日", today);
        assert_eq!(filtered, vec![w(d("2024-03-20"), 71.0)]);
    }

    #[test]
    fn range_filter_works_for_exercises_too() {
        let today = d("2024-03-10");
        let entries = vec![ex("2024-01-01", "Walk", 30), ex("2024-03-09", "Run", 20)];
        let filtered = filter_range_from(&entries, "1週間", today);
        assert_eq!(filtered, vec![ex("2024-03-09", "Run", 20)]);
    }

    #[test]
    fn moving_average_shrinks_at_the_series_start() {
        let values = vec![1.0, 3.0, 5.0, 7.0];
        assert_eq!(moving_average(&values, 2), vec![1.0, 2.0, 4.0, 6.0]);
        assert!(moving_average(&values, 0).is_empty());
    }

    #[test]
    fn weight_moving_average_is_rounded_and_date_sorted() {
        let entries = vec![
            w(d("2024-01-03"), 72.0),
            w(d("2024-01-01"), 70.0),
            w(d("2024-01-02"), 70.5),
        ];
        let ma = weight_moving_average(&entries, TREND_WINDOW);
        assert_eq!(
            ma,
            vec![
                (d("2024-01-01"), 70.0),
                (d("2024-01-02"), 70.3),
                (d("2024-01-03"), 70.8),
            ]
        );
    }

    #[test]
    fn duration_moving_average_rounds_to_whole_minutes() {
        let daily = vec![(d("2024-01-01"), 30), (d("2024-01-02"), 45)];
        let ma = duration_moving_average(&daily, TREND_WINDOW);
        // (30 + 45) / 2 = 37.5 -> 38
        assert_eq!(ma, vec![(d("2024-01-01"), 30), (d("2024-01-02"), 38)]);
    }

    #[test]
    fn daily_totals_sum_across_activities() {
        let entries = vec![
            ex("2024-01-01", "Walk", 30),
            ex("2024-01-01", "Run", 45),
            ex("2024-01-02", "Walk", 10),
        ];
        let totals = daily_exercise_totals(&entries);
        assert_eq!(totals, vec![(d("2024-01-01"), 75), (d("2024-01-02"), 10)]);
    }

    #[test]
    fn activity_grid_fills_gaps_with_zero() {
        let entries = vec![
            ex("2024-01-01", "Walk", 30),
            ex("2024-01-01", "Run", 45),
            ex("2024-01-03", "Walk", 20),
        ];
        let grid = activity_grid(&entries);
        assert_eq!(
            grid.dates,
            vec![d("2024-01-01"), d("2024-01-02"), d("2024-01-03")]
        );
        assert_eq!(
            grid.series,
            vec![
                ("Run".to_string(), vec![45, 0, 0]),
                ("Walk".to_string(), vec![30, 0, 20]),
            ]
        );
    }

    #[test]
    fn activity_grid_on_empty_input() {
        assert_eq!(activity_grid(&[]), ActivityGrid::default());
    }

    #[test]
    fn latest_weight_is_by_date_not_position() {
        let entries = vec![w(d("2024-01-05"), 71.0), w(d("2024-01-01"), 70.0)];
        assert_eq!(latest_weight(&entries), Some(71.0));
        assert_eq!(latest_weight(&[]), None);
    }

    #[test]
    fn recent_duration_total_windows_by_date() {
        let today = Local::now().date_naive();
        let entries = vec![
            ExerciseEntry {
                date: today,
                activity: "Walk".into(),
                duration_min: 30,
            },
            ExerciseEntry {
                date: today - Duration::days(6),
                activity: "Run".into(),
                duration_min: 20,
            },
            ExerciseEntry {
                date: today - Duration::days(10),
                activity: "Bike".into(),
                duration_min: 60,
            },
        ];
        assert_eq!(recent_duration_total(&entries, 7), 50);
    }

    #[test]
    fn goal_gap_needs_both_a_sample_and_a_goal() {
        let entries = vec![w(d("2024-01-01"), 70.4)];
        let goal = Settings {
            goal_weight: Some(68.0),
        };
        assert_eq!(goal_gap(&entries, &goal), Some(2.4));
        assert_eq!(goal_gap(&[], &goal), None);
        assert_eq!(goal_gap(&entries, &Settings::default()), None);
    }
}
