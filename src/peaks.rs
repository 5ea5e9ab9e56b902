//! Local-maximum detection with a minimum height.
//!
//! A sample is a peak when it rises above its left neighbour and falls to its
//! right neighbour. A flat top (equal consecutive samples) counts once, at its
//! middle index (rounded down). The first and last samples are never peaks.
//! A peak is kept when its value is at least the configured height.

use crate::data::model::{Peak, PeakSet, Series};

/// Minimum peak height used when nothing else is configured.
pub const DEFAULT_HEIGHT: f64 = 1.0;

/// Indices of local maxima, ascending.
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut found = Vec::new();
    if values.len() < 3 {
        return found;
    }
    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                found.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    found
}

/// Indices of local maxima whose value is at least `height`.
pub fn find_peaks(values: &[f64], height: f64) -> Vec<usize> {
    local_maxima(values)
        .into_iter()
        .filter(|&i| values[i] >= height)
        .collect()
}

/// Peak detector with a fixed minimum height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDetector {
    pub height: f64,
}

impl Default for PeakDetector {
    fn default() -> Self {
        PeakDetector {
            height: DEFAULT_HEIGHT,
        }
    }
}

impl PeakDetector {
    pub fn new(height: f64) -> Self {
        PeakDetector { height }
    }

    /// Peaks of a normalized series.
    pub fn detect(&self, series: &Series) -> PeakSet {
        PeakSet {
            peaks: find_peaks(&series.y, self.height)
                .into_iter()
                .map(|index| Peak {
                    index,
                    value: series.y[index],
                    x: series.x[index],
                })
                .collect(),
        }
    }

    /// Peaks of a column with unset cells.
    ///
    /// Unset cells are dropped first, so neighbours are the nearest set
    /// values. `index` refers to the row in `axis`.
    pub fn detect_column(&self, axis: &[f64], values: &[Option<f64>]) -> PeakSet {
        let (rows, present): (Vec<usize>, Vec<f64>) = values
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.map(|v| (row, v)))
            .unzip();

        PeakSet {
            peaks: find_peaks(&present, self.height)
                .into_iter()
                .filter_map(|i| {
                    let row = rows[i];
                    Some(Peak {
                        index: row,
                        value: present[i],
                        x: *axis.get(row)?,
                    })
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_clear_peaks() {
        let values = [0.0, 1.0, 3.0, 1.0, 0.0, 2.0, 5.0, 2.0, 0.0];
        assert_eq!(find_peaks(&values, 1.0), vec![2, 6]);
    }

    #[test]
    fn test_height_threshold() {
        let values = [0.0, 0.5, 0.0, 1.0, 0.0, 3.0, 0.0];
        assert_eq!(local_maxima(&values), vec![1, 3, 5]);
        assert_eq!(find_peaks(&values, 1.0), vec![3, 5]);
    }

    #[test]
    fn test_boundaries_never_peaks() {
        assert!(find_peaks(&[5.0, 1.0, 0.0, 1.0, 5.0], 1.0).is_empty());
        assert!(find_peaks(&[2.0, 1.0], 0.0).is_empty());
        assert!(find_peaks(&[], 0.0).is_empty());
    }

    #[test]
    fn test_plateau_reports_middle() {
        assert_eq!(find_peaks(&[0.0, 2.0, 2.0, 2.0, 0.0], 1.0), vec![2]);
        assert_eq!(find_peaks(&[0.0, 2.0, 2.0, 0.0], 1.0), vec![1]);
        // Plateau running into the end is not a peak.
        assert!(find_peaks(&[0.0, 2.0, 2.0, 2.0], 1.0).is_empty());
        // Shoulder that keeps rising is not a peak.
        assert_eq!(find_peaks(&[0.0, 2.0, 2.0, 3.0, 0.0], 1.0), vec![3]);
    }

    #[test]
    fn test_detect_series_keeps_rank_order() {
        let series = Series {
            name: "s".into(),
            x: (1..=9).map(f64::from).collect(),
            y: vec![0.0, 1.0, 9.0, 1.0, 0.0, 2.0, 5.0, 2.0, 0.0],
        };
        let set = PeakDetector::default().detect(&series);
        assert_eq!(set.len(), 2);
        assert_eq!(set.rank(0).unwrap().value, 9.0);
        assert_eq!(set.rank(0).unwrap().x, 3.0);
        assert_eq!(set.rank(1).unwrap().value, 5.0);
        assert!(set.rank(2).is_none());
    }

    #[test]
    fn test_detect_column_skips_unset() {
        let axis = [0.0, 0.1, 0.2, 0.3, 0.4];
        let values = [Some(0.0), None, Some(4.0), None, Some(0.0)];
        let set = PeakDetector::default().detect_column(&axis, &values);
        assert_eq!(set.peaks.len(), 1);
        assert_eq!(set.peaks[0].index, 2);
        assert_eq!(set.peaks[0].x, 0.2);
    }
}
