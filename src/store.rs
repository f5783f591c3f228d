//! Flat-file persistence for the two collections and the settings object.
//!
//! Each load reads the whole file and each save rewrites it, so the files are
//! the single source of truth between actions. Reads never fail: a missing,
//! unreadable or malformed file degrades to an empty collection (or default
//! settings). Writes go to a sibling temp file first and are renamed into
//! place, so a crashed save never leaves a half-written file behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dirs_next as dirs;
use log::{info, warn};

use crate::normalize::{self, normalize_exercises, normalize_weights, round1};
use crate::{ExerciseEntry, Settings, WeightEntry};

const WEIGHTS_FILE: &str = "weights.csv";
const EXERCISES_FILE: &str = "exercises.csv";
const SETTINGS_FILE: &str = "settings.json";

const WEIGHTS_HEADER: [&str; 2] = ["date", "weight"];
const EXERCISES_HEADER: [&str; 3] = ["date", "activity", "duration_min"];

/// Handle to the data directory holding `weights.csv`, `exercises.csv` and
/// `settings.json`.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    const DIR_NAME: &'static str = "daily_weight_dashboard";

    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Storage rooted in the platform data directory, if one is known.
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|p| Self::new(p.join(Self::DIR_NAME)))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn weights_path(&self) -> PathBuf {
        self.data_dir.join(WEIGHTS_FILE)
    }

    fn exercises_path(&self) -> PathBuf {
        self.data_dir.join(EXERCISES_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Create the data directory and seed every missing file with an empty,
    /// correctly-headered collection or the default settings. Safe to call on
    /// every startup; existing files are left untouched.
    pub fn ensure_storage(&self) -> io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let weights = self.weights_path();
        if !weights.exists() {
            write_atomic(&weights, b"date,weight\n")?;
        }
        let exercises = self.exercises_path();
        if !exercises.exists() {
            write_atomic(&exercises, b"date,activity,duration_min\n")?;
        }
        let settings = self.settings_path();
        if !settings.exists() {
            self.save_settings(&Settings::default())?;
        }
        Ok(())
    }

    /// Load the weight collection. Read errors, malformed content and missing
    /// columns all degrade to an empty collection.
    pub fn load_weights(&self) -> Vec<WeightEntry> {
        let path = self.weights_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                return Vec::new();
            }
        };
        let mut rdr = csv::Reader::from_reader(data.as_slice());
        let entries = normalize::collect_weights(&mut rdr);
        info!("Loaded {} weight entries from {}", entries.len(), path.display());
        entries
    }

    /// Replace the weight file with the normalized collection: ISO dates,
    /// one-decimal weights, ascending by date.
    pub fn save_weights(&self, entries: &[WeightEntry]) -> io::Result<()> {
        let data = encode_weights(entries)?;
        write_atomic(&self.weights_path(), &data)
    }

    pub fn load_exercises(&self) -> Vec<ExerciseEntry> {
        let path = self.exercises_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                return Vec::new();
            }
        };
        let mut rdr = csv::Reader::from_reader(data.as_slice());
        let entries = normalize::collect_exercises(&mut rdr);
        info!(
            "Loaded {} exercise entries from {}",
            entries.len(),
            path.display()
        );
        entries
    }

    /// Replace the exercise file with the normalized collection, ascending by
    /// `(date, activity)` with whole-minute durations.
    pub fn save_exercises(&self, entries: &[ExerciseEntry]) -> io::Result<()> {
        let data = encode_exercises(entries)?;
        write_atomic(&self.exercises_path(), &data)
    }

    /// Load the settings object. A missing or malformed file, or a
    /// non-numeric goal, yields the defaults; a present goal is normalized to
    /// one fractional digit.
    pub fn load_settings(&self) -> Settings {
        let path = self.settings_path();
        let mut settings = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str::<Settings>(&data).unwrap_or_else(|e| {
                warn!("Malformed settings in {}: {e}", path.display());
                Settings::default()
            }),
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                Settings::default()
            }
        };
        settings.goal_weight = settings.goal_weight.filter(|g| g.is_finite()).map(round1);
        settings
    }

    pub fn save_settings(&self, settings: &Settings) -> io::Result<()> {
        let mut out = settings.clone();
        out.goal_weight = out.goal_weight.filter(|g| g.is_finite()).map(round1);
        let data = serde_json::to_string_pretty(&out).map_err(into_io)?;
        write_atomic(&self.settings_path(), data.as_bytes())
    }
}

/// Encode the normalized weight collection in the persisted file shape.
pub(crate) fn encode_weights(entries: &[WeightEntry]) -> io::Result<Vec<u8>> {
    let entries = normalize_weights(entries.to_vec());
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(WEIGHTS_HEADER).map_err(into_io)?;
    for e in &entries {
        wtr.write_record(&[
            e.date.format("%Y-%m-%d").to_string(),
            format!("{:.1}", e.weight),
        ])
        .map_err(into_io)?;
    }
    wtr.into_inner()
        .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))
}

/// Encode the normalized exercise collection in the persisted file shape.
pub(crate) fn encode_exercises(entries: &[ExerciseEntry]) -> io::Result<Vec<u8>> {
    let entries = normalize_exercises(entries.to_vec());
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(EXERCISES_HEADER).map_err(into_io)?;
    for e in &entries {
        wtr.write_record(&[
            e.date.format("%Y-%m-%d").to_string(),
            e.activity.clone(),
            e.duration_min.to_string(),
        ])
        .map_err(into_io)?;
    }
    wtr.into_inner()
        .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))
}

fn into_io<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

/// Write to a sibling temp file and rename it into place, so readers never
/// observe a partially written file.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}
