//! Noise-file ingest.
//!
//! Each requested instrument has one noise file listing, per data segment, its
//! GPS start time and the noise power in the search band. The file for an
//! instrument is found by the instrument code appearing in its file name.
//!
//! Behaviour:
//! - **Missing/unreadable file** is fatal (`DataAccess`)
//! - **Bad rows** are skipped and reported, the rest of the file is used
//! - **Out-of-span segments** are silently dropped
//! - **Deterministic output**: segments are merged and stably sorted by time

use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{DataSegment, Instrument, ObservationSpan};
use crate::error::AppError;

/// Column holding the integer GPS start time.
pub const START_TIME_COLUMN: usize = 0;
/// Column holding the in-band noise power.
pub const NOISE_COLUMN: usize = 2;

/// A row that could not be turned into a segment.
#[derive(Debug, Clone)]
pub struct RowError {
    pub instrument: Instrument,
    pub line: u64,
    pub message: String,
}

/// Segments for every requested instrument, merged in time order.
#[derive(Debug, Clone)]
pub struct SegmentSet {
    pub segments: Vec<DataSegment>,
    /// `(instrument, segments kept)` in request order.
    pub per_instrument: Vec<(Instrument, usize)>,
    pub row_errors: Vec<RowError>,
}

/// First file whose name contains the instrument code.
pub fn file_for_instrument(instrument: Instrument, files: &[PathBuf]) -> Option<&Path> {
    files
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(instrument.code()))
        })
        .map(PathBuf::as_path)
}

/// Find the noise file whose name mentions `instrument`.
pub fn noise_file_for(instrument: Instrument, files: &[PathBuf]) -> Result<&Path, AppError> {
    file_for_instrument(instrument, files).ok_or_else(|| {
        AppError::data(format!(
            "No noise file for {instrument}; add {instrument} somewhere to the file name."
        ))
    })
}

/// Load, filter and merge segments for `instruments`.
pub fn load_segments(
    files: &[PathBuf],
    instruments: &[Instrument],
    span: ObservationSpan,
) -> Result<SegmentSet, AppError> {
    let mut segments = Vec::new();
    let mut per_instrument = Vec::with_capacity(instruments.len());
    let mut row_errors = Vec::new();

    for &instrument in instruments {
        let path = noise_file_for(instrument, files)?;
        let (kept, errors) = read_noise_file(path, instrument, span)?;

        for e in &errors {
            warn!(%instrument, line = e.line, "skipping noise row: {}", e.message);
        }
        if kept.is_empty() {
            return Err(AppError::insufficient(format!(
                "No {instrument} segments inside [{}, {}] in '{}'.",
                span.start,
                span.end,
                path.display()
            )));
        }

        info!(%instrument, file = %path.display(), segments = kept.len(), "loaded noise file");
        per_instrument.push((instrument, kept.len()));
        segments.extend(kept);
        row_errors.extend(errors);
    }

    segments.sort_by_key(|s| s.start_time);

    Ok(SegmentSet {
        segments,
        per_instrument,
        row_errors,
    })
}

/// Read one whitespace-separated noise file.
///
/// Returns the in-span segments and the rows that were skipped.
pub fn read_noise_file(
    path: &Path,
    instrument: Instrument,
    span: ObservationSpan,
) -> Result<(Vec<DataSegment>, Vec<RowError>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'%'))
        .from_path(path)
        .map_err(|e| AppError::data(format!("Unable to open '{}': {e}", path.display())))?;

    let mut kept = Vec::new();
    let mut errors = Vec::new();
    let mut dropped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                // I/O failures mid-file mean the source is unreadable, not just
                // one bad row.
                if e.is_io_error() {
                    return Err(AppError::data(format!(
                        "Failed reading '{}': {e}",
                        path.display()
                    )));
                }
                errors.push(RowError {
                    instrument,
                    line: e.position().map(|p| p.line()).unwrap_or(0),
                    message: format!("parse error: {e}"),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let fields = columns(&record);
        if fields.is_empty() {
            continue;
        }

        match parse_segment(&fields, instrument) {
            Ok(segment) if span.admits(segment.start_time) => kept.push(segment),
            Ok(_) => dropped += 1,
            Err(message) => errors.push(RowError {
                instrument,
                line,
                message,
            }),
        }
    }

    debug!(%instrument, kept = kept.len(), dropped, skipped = errors.len(), "noise file scanned");
    Ok((kept, errors))
}

/// Non-empty fields; runs of spaces produce empty fields with a single-byte
/// delimiter.
fn columns(record: &StringRecord) -> Vec<&str> {
    record.iter().filter(|f| !f.is_empty()).collect()
}

fn parse_segment(fields: &[&str], instrument: Instrument) -> Result<DataSegment, String> {
    let start = fields
        .get(START_TIME_COLUMN)
        .ok_or_else(|| "missing start time".to_string())?;
    let noise = fields
        .get(NOISE_COLUMN)
        .ok_or_else(|| format!("expected at least {} columns, found {}", NOISE_COLUMN + 1, fields.len()))?;

    let start_time: u64 = start
        .parse()
        .map_err(|_| format!("invalid start time '{start}'"))?;
    let noise_weight: f64 = noise
        .parse()
        .map_err(|_| format!("invalid noise value '{noise}'"))?;
    if !(noise_weight.is_finite() && noise_weight > 0.0) {
        return Err(format!("noise value must be finite and > 0, got {noise_weight}"));
    }

    Ok(DataSegment {
        instrument,
        start_time,
        noise_weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;

    const SPAN: ObservationSpan = ObservationSpan {
        start: 1_000,
        end: 100_000,
    };

    #[test]
    fn noise_file_matched_by_instrument_code() {
        let files = vec![PathBuf::from("/d/psd_L1.txt"), PathBuf::from("/d/psd_H1.txt")];
        assert_eq!(
            noise_file_for(Instrument::H1, &files).unwrap(),
            Path::new("/d/psd_H1.txt")
        );
        let err = noise_file_for(Instrument::V1, &files).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataAccess);
    }

    #[test]
    fn reads_rows_skips_bad_ones_and_filters_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Full_psd_H1.txt");
        fs::write(
            &path,
            "% start  bin  psd\n\
             2000 0 4.0\n\
             3800  0   2.0\n\
             oops 0 1.0\n\
             5600 0 -1.0\n\
             500 0 1.0\n\
             99000 0 1.0\n\
             7400 0\n",
        )
        .unwrap();

        let (kept, errors) = read_noise_file(&path, Instrument::H1, SPAN).unwrap();
        let times: Vec<u64> = kept.iter().map(|s| s.start_time).collect();
        assert_eq!(times, vec![2000, 3800]);
        assert!((kept[1].noise_weight - 2.0).abs() < 1e-12);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.line > 0));
    }

    #[test]
    fn start_time_at_u64_max_is_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("H1.txt");
        fs::write(&path, "18446744073709551615 0 1.0\n2000 0 1.0\n").unwrap();
        let wide = ObservationSpan { start: 0, end: u64::MAX };

        let (kept, errors) = read_noise_file(&path, Instrument::H1, wide).unwrap();
        let times: Vec<u64> = kept.iter().map(|s| s.start_time).collect();
        assert_eq!(times, vec![2000]);
        assert!(errors.is_empty());
    }

    #[test]
    fn load_merges_instruments_in_time_order() {
        let dir = tempfile::tempdir().unwrap();
        let h1 = dir.path().join("H1.txt");
        let l1 = dir.path().join("L1.txt");
        fs::write(&h1, "2000 0 1.0\n9000 0 1.0\n").unwrap();
        fs::write(&l1, "5000 0 2.0\n").unwrap();

        let set = load_segments(&[h1, l1], &[Instrument::H1, Instrument::L1], SPAN).unwrap();
        let order: Vec<(u64, Instrument)> =
            set.segments.iter().map(|s| (s.start_time, s.instrument)).collect();
        assert_eq!(
            order,
            vec![
                (2000, Instrument::H1),
                (5000, Instrument::L1),
                (9000, Instrument::H1)
            ]
        );
        assert_eq!(set.per_instrument, vec![(Instrument::H1, 2), (Instrument::L1, 1)]);
    }

    #[test]
    fn instrument_without_usable_segments_is_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        let h1 = dir.path().join("H1.txt");
        fs::write(&h1, "10 0 1.0\n").unwrap();
        let err = load_segments(&[h1], &[Instrument::H1], SPAN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn missing_file_is_data_access_error() {
        let err = load_segments(
            &[PathBuf::from("/nonexistent/H1.txt")],
            &[Instrument::H1],
            SPAN,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataAccess);
    }
}
