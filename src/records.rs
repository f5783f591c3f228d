//! Single-record and batch mutations over the in-memory collections.
//!
//! "Insert" and "update" are the same operation: every mutation keys on the
//! entity's natural key (`date` for weights, `(date, activity)` for
//! exercises) and the collection stays unique per key and ascending
//! afterwards. Range validation of direct entries is the input widget's
//! contract; values arriving here are stored as given, rounded only.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::normalize::round1;
use crate::{ExerciseEntry, WeightEntry};

/// Insert `entry`, replacing any existing sample on the same date.
pub fn upsert_weight(entries: &mut Vec<WeightEntry>, entry: WeightEntry) {
    entries.retain(|e| e.date != entry.date);
    entries.push(WeightEntry {
        date: entry.date,
        weight: round1(entry.weight),
    });
    entries.sort_by_key(|e| e.date);
}

/// Remove the sample recorded on `date`. Returns whether anything was
/// removed.
pub fn delete_weight(entries: &mut Vec<WeightEntry>, date: NaiveDate) -> bool {
    let before = entries.len();
    entries.retain(|e| e.date != date);
    entries.len() != before
}

/// Remove every sample whose date appears in `dates` (table selection
/// delete). Returns the number of removed samples.
pub fn delete_weights(entries: &mut Vec<WeightEntry>, dates: &[NaiveDate]) -> usize {
    let targets: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let before = entries.len();
    entries.retain(|e| !targets.contains(&e.date));
    before - entries.len()
}

/// Insert `entry`, replacing any existing session with the same
/// `(date, activity)`. The activity label is trimmed so it matches the key
/// produced by a later load.
pub fn upsert_exercise(entries: &mut Vec<ExerciseEntry>, entry: ExerciseEntry) {
    let activity = entry.activity.trim().to_string();
    entries.retain(|e| !(e.date == entry.date && e.activity == activity));
    entries.push(ExerciseEntry {
        date: entry.date,
        activity,
        duration_min: entry.duration_min,
    });
    entries.sort_by(|a, b| (a.date, a.activity.as_str()).cmp(&(b.date, b.activity.as_str())));
}

/// Remove the session for `date` and `activity`. Returns whether anything was
/// removed.
pub fn delete_exercise(entries: &mut Vec<ExerciseEntry>, date: NaiveDate, activity: &str) -> bool {
    let before = entries.len();
    entries.retain(|e| !(e.date == date && e.activity == activity));
    entries.len() != before
}

/// Remove every session whose `(date, activity)` appears in `keys`. Returns
/// the number of removed sessions.
pub fn delete_exercises(
    entries: &mut Vec<ExerciseEntry>,
    keys: &[(NaiveDate, String)],
) -> usize {
    let targets: BTreeSet<(NaiveDate, &str)> =
        keys.iter().map(|(d, a)| (*d, a.as_str())).collect();
    let before = entries.len();
    entries.retain(|e| !targets.contains(&(e.date, e.activity.as_str())));
    before - entries.len()
}

/// Sorted unique activity labels, for the entry form's suggestion list.
pub fn past_activities(entries: &[ExerciseEntry]) -> Vec<String> {
    let set: BTreeSet<&str> = entries.iter().map(|e| e.activity.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}
