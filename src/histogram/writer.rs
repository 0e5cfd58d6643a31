//! Writes histogram buckets as a delimited text file.
//!
//! The file is first written next to its destination and then moved over it,
//! so an existing file at `path` is always replaced and a failed write never
//! leaves a half-written histogram behind.

use crate::histogram::builder::HistogramBucket;
use crate::histogram::error::HistogramError;
use log::info;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const HEADER: [&str; 3] = ["bucketMin", "bucketMax", "count"];

/// Renders the header and one row per bucket, in the order given.
pub fn render(buckets: &[HistogramBucket], delimiter: char) -> String {
    let separator = delimiter.to_string();
    let mut out = HEADER.join(&separator);
    out.push('\n');
    for bucket in buckets {
        out.push_str(&format!(
            "{:.2}{d}{:.2}{d}{}\n",
            bucket.lower,
            bucket.upper,
            bucket.count,
            d = delimiter
        ));
    }
    out
}

/// Writes the histogram to `path`, overwriting any existing file.
pub fn write_histogram(
    path: &Path,
    buckets: &[HistogramBucket],
    delimiter: char,
) -> Result<(), HistogramError> {
    let to_error = |e: std::io::Error| HistogramError::OutputWrite(path.to_path_buf(), e);

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp_file = NamedTempFile::new_in(directory).map_err(to_error)?;

    let mut writer = BufWriter::new(temp_file);
    writer
        .write_all(render(buckets, delimiter).as_bytes())
        .map_err(to_error)?;
    let temp_file = writer.into_inner().map_err(|e| to_error(e.into_error()))?;

    temp_file.persist(path).map_err(|e| to_error(e.error))?;
    info!("Wrote {} histogram buckets to {}", buckets.len(), path.display());
    Ok(())
}
