//! Reconciliation of an uploaded weight CSV with the stored collection.

use std::collections::BTreeMap;
use std::str;

use chrono::NaiveDate;
use log::info;

use crate::WeightEntry;
use crate::normalize;

/// Plausible body-weight bounds applied to uploaded rows, in kilograms.
pub const UPLOAD_WEIGHT_MIN: f64 = 20.0;
pub const UPLOAD_WEIGHT_MAX: f64 = 300.0;

/// Rejection of an uploaded batch.
///
/// This is the only failure the core surfaces to the user: it is caused by
/// the file chosen at the moment of upload, not by stored-state drift, and no
/// partial merge is produced.
#[derive(Debug)]
pub enum UploadError {
    /// The upload lacks a `date` or `weight` column.
    MissingColumns,
    /// The upload is not UTF-8 text.
    InvalidUtf8,
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::MissingColumns => {
                write!(f, "uploaded CSV is missing a required column (date, weight)")
            }
            UploadError::InvalidUtf8 => write!(f, "uploaded file is not UTF-8 encoded text"),
        }
    }
}

impl std::error::Error for UploadError {}

/// Merge an uploaded weight CSV into `existing`.
///
/// For every date in the upload the uploaded value overwrites the stored one;
/// stored dates absent from the upload are untouched and new dates are
/// inserted. Uploaded rows are normalized like any other raw table and rows
/// outside `20..=300` kg are dropped without error. Columns beyond `date` and
/// `weight` are ignored. The result is ascending and unique by date; nothing
/// is persisted here — the caller writes it back through the store.
pub fn merge_uploaded_csv(
    existing: &[WeightEntry],
    bytes: &[u8],
) -> Result<Vec<WeightEntry>, UploadError> {
    let text = str::from_utf8(bytes).map_err(|_| UploadError::InvalidUtf8)?;
    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    let headers = rdr.headers().map_err(|_| UploadError::MissingColumns)?;
    let has = |name: &str| headers.iter().any(|h| h.trim() == name);
    if !has("date") || !has("weight") {
        return Err(UploadError::MissingColumns);
    }

    let uploaded: Vec<WeightEntry> = normalize::collect_weights(&mut rdr)
        .into_iter()
        .filter(|e| (UPLOAD_WEIGHT_MIN..=UPLOAD_WEIGHT_MAX).contains(&e.weight))
        .collect();

    let mut merged: BTreeMap<NaiveDate, f64> =
        existing.iter().map(|e| (e.date, e.weight)).collect();
    for e in &uploaded {
        merged.insert(e.date, e.weight);
    }
    info!(
        "Merged {} uploaded entries into {} stored ones",
        uploaded.len(),
        existing.len()
    );
    Ok(merged
        .into_iter()
        .map(|(date, weight)| WeightEntry { date, weight })
        .collect())
}
