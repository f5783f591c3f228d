//! Cleaning rules shared by the record store and the upload merge.
//!
//! Raw tables are coerced row by row; rows that cannot be coerced are dropped
//! without surfacing an error. Entry-level normalization deduplicates by the
//! natural key (last occurrence wins) and sorts ascending, so applying it
//! twice is the same as applying it once.

use std::collections::BTreeMap;
use std::io;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{ExerciseEntry, WeightEntry};

/// Longest accepted session: one full day in minutes.
pub const MAX_DURATION_MIN: u32 = 1440;

/// Round to one fractional digit.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// A weight row as it appears in a CSV source, before validation. Columns
/// beyond `date` and `weight` are ignored.
#[derive(Debug, Deserialize)]
struct RawWeightRow {
    date: String,
    weight: f64,
}

impl RawWeightRow {
    fn validate(self) -> Option<WeightEntry> {
        let date = parse_date(&self.date)?;
        if !self.weight.is_finite() {
            return None;
        }
        Some(WeightEntry {
            date,
            weight: round1(self.weight),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawExerciseRow {
    date: String,
    activity: String,
    duration_min: f64,
}

impl RawExerciseRow {
    fn validate(self) -> Option<ExerciseEntry> {
        let date = parse_date(&self.date)?;
        let activity = self.activity.trim();
        if activity.is_empty() || !self.duration_min.is_finite() {
            return None;
        }
        let minutes = self.duration_min.round();
        if !(0.0..=f64::from(MAX_DURATION_MIN)).contains(&minutes) {
            return None;
        }
        Some(ExerciseEntry {
            date,
            activity: activity.to_string(),
            duration_min: minutes as u32,
        })
    }
}

/// Collect every usable weight row from an open CSV reader. Rows that fail to
/// deserialize or validate are skipped.
pub(crate) fn collect_weights<R: io::Read>(rdr: &mut csv::Reader<R>) -> Vec<WeightEntry> {
    let entries = rdr
        .deserialize::<RawWeightRow>()
        .filter_map(Result::ok)
        .filter_map(RawWeightRow::validate)
        .collect();
    normalize_weights(entries)
}

pub(crate) fn collect_exercises<R: io::Read>(rdr: &mut csv::Reader<R>) -> Vec<ExerciseEntry> {
    let entries = rdr
        .deserialize::<RawExerciseRow>()
        .filter_map(Result::ok)
        .filter_map(RawExerciseRow::validate)
        .collect();
    normalize_exercises(entries)
}

/// Apply the collection rules to in-memory weight entries: one-decimal
/// rounding, keep-last dedup per date, ascending date order. Non-finite
/// weights are dropped.
pub fn normalize_weights(entries: Vec<WeightEntry>) -> Vec<WeightEntry> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for e in entries {
        if e.weight.is_finite() {
            by_date.insert(e.date, round1(e.weight));
        }
    }
    by_date
        .into_iter()
        .map(|(date, weight)| WeightEntry { date, weight })
        .collect()
}

/// Apply the collection rules to in-memory exercise entries: trimmed
/// non-empty activity, duration within `0..=1440`, keep-last dedup per
/// `(date, activity)`, ascending key order.
pub fn normalize_exercises(entries: Vec<ExerciseEntry>) -> Vec<ExerciseEntry> {
    let mut by_key: BTreeMap<(NaiveDate, String), u32> = BTreeMap::new();
    for e in entries {
        let activity = e.activity.trim();
        if activity.is_empty() || e.duration_min > MAX_DURATION_MIN {
            continue;
        }
        by_key.insert((e.date, activity.to_string()), e.duration_min);
    }
    by_key
        .into_iter()
        .map(|((date, activity), duration_min)| ExerciseEntry {
            date,
            activity,
            duration_min,
        })
        .collect()
}
