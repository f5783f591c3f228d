//! Core data layer for a personal daily weight and exercise dashboard.
//!
//! Collections are loaded wholesale from flat files in one data directory,
//! mutated in memory and written back wholesale; chart series and summary
//! statistics are recomputed from a fresh load on every render. The
//! interactive UI and the chart renderer live elsewhere and consume this API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod export;
pub mod merge;
pub mod normalize;
pub mod records;
pub mod store;

pub use analysis::{
    ActivityGrid, RANGE_LABELS, StatsSummary, TREND_WINDOW, activity_grid, compute_stats,
    daily_exercise_totals, duration_moving_average, filter_range, goal_gap, latest_weight,
    recent_duration_total, weight_moving_average,
};
pub use export::{exercises_csv_bytes, save_stats_json, weights_csv_bytes};
pub use merge::{UploadError, merge_uploaded_csv};
pub use normalize::{normalize_exercises, normalize_weights};
pub use records::{
    delete_exercise, delete_exercises, delete_weight, delete_weights, past_activities,
    upsert_exercise, upsert_weight,
};
pub use store::Storage;

/// One body-weight sample. At most one sample exists per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: NaiveDate,
    /// Kilograms, kept at one fractional digit.
    pub weight: f64,
}

/// One exercise session, keyed by `(date, activity)`: logging the same
/// activity twice on a day overwrites, distinct activities coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub date: NaiveDate,
    pub activity: String,
    /// Whole minutes, `0..=1440`.
    pub duration_min: u32,
}

/// Persistent user preferences. Last write wins, no history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Target body weight in kilograms, one fractional digit.
    #[serde(default)]
    pub goal_weight: Option<f64>,
}

/// The calendar date of a record, used by the date-window filters.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for WeightEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for ExerciseEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}
