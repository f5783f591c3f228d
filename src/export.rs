//! Download payloads and file exports, shaped like the persisted files.

use std::io;
use std::path::Path;

use serde::Serialize;

use crate::store;
use crate::{ExerciseEntry, WeightEntry};

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// CSV payload for the weight download button, identical in shape to the
/// stored collection file.
pub fn weights_csv_bytes(entries: &[WeightEntry]) -> io::Result<Vec<u8>> {
    store::encode_weights(entries)
}

/// CSV payload for the exercise download button.
pub fn exercises_csv_bytes(entries: &[ExerciseEntry]) -> io::Result<Vec<u8>> {
    store::encode_exercises(entries)
}

/// Write a stats summary as pretty JSON.
pub fn save_stats_json<P: AsRef<Path>>(
    path: P,
    stats: &crate::analysis::StatsSummary,
) -> io::Result<()> {
    write_json(stats, path)
}
