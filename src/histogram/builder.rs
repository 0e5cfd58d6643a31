//! Equal-width binning of forecast highs.

use crate::histogram::error::HistogramError;
use ordered_float::OrderedFloat;
use std::fmt;

/// One histogram bin. `lower` is inclusive; `upper` is exclusive except for
/// the last bin, which also holds the maximum value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl fmt::Display for HistogramBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}): {}", self.lower, self.upper, self.count)
    }
}

/// Splits `[min, max]` of `values` into `bucket_count` equal-width bins and
/// counts the values falling in each.
///
/// When every value is the same the range is widened by half a unit on each
/// side, so the bins still have a width.
///
/// # Errors
///
/// [`HistogramError::InvalidBucketCount`] for zero buckets,
/// [`HistogramError::EmptyInput`] when there is nothing to bin, and
/// [`HistogramError::NonFiniteValue`] for NaN or infinite values.
///
/// # Examples
///
/// ```
/// use weather_histogram::build_histogram;
///
/// let buckets = build_histogram(&[10.0, 20.0, 30.0, 40.0], 2).unwrap();
/// assert_eq!(buckets[0].upper, 25.0);
/// assert_eq!(buckets[1].count, 2);
/// ```
pub fn build(values: &[f64], bucket_count: usize) -> Result<Vec<HistogramBucket>, HistogramError> {
    if bucket_count == 0 {
        return Err(HistogramError::InvalidBucketCount(bucket_count));
    }
    if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(HistogramError::NonFiniteValue(bad));
    }

    let ordered = values.iter().copied().map(OrderedFloat);
    let (Some(OrderedFloat(min)), Some(OrderedFloat(max))) = (ordered.clone().min(), ordered.max())
    else {
        return Err(HistogramError::EmptyInput);
    };

    let (low, high) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (high - low) / bucket_count as f64;

    let mut edges: Vec<f64> = (0..bucket_count).map(|i| low + i as f64 * width).collect();
    edges.push(high);

    let mut counts = vec![0usize; bucket_count];
    for &value in values {
        let index = edges
            .partition_point(|edge| *edge <= value)
            .saturating_sub(1)
            .min(bucket_count - 1);
        counts[index] += 1;
    }

    Ok(edges
        .windows(2)
        .zip(counts)
        .map(|(bounds, count)| HistogramBucket {
            lower: bounds[0],
            upper: bounds[1],
            count,
        })
        .collect())
}
