//! Splits a date range into fixed-size, non-overlapping windows.
//!
//! Upstream list endpoints become unreliable when asked for too many days at once,
//! so a long range is fetched as a sequence of small [`DateWindow`]s.

use crate::types::error::InvalidRangeError;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::fmt::{Display, Formatter};

/// An inclusive date range `[start, end]`.
///
/// Windows produced by [`plan_windows`] never overlap and together cover the
/// planned range without gaps.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days covered, counting both ends.
    pub fn len_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }
}

impl Display for DateWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.start, self.end)
    }
}

/// Lazy sequence of [`DateWindow`]s covering a range.
///
/// The iterator is `Clone`, so a plan can be walked again from the start
/// (for example once to count windows and once to dispatch them).
#[derive(Debug, Clone)]
pub struct Windows {
    cursor: Option<NaiveDate>,
    end: NaiveDate,
    segment_days: u32,
}

impl Iterator for Windows {
    type Item = DateWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.cursor?;
        if start > self.end {
            self.cursor = None;
            return None;
        }
        let window_end = start
            .checked_add_days(Days::new(u64::from(self.segment_days) - 1))
            .map_or(self.end, |d| d.min(self.end));
        // `None` once the end of the calendar is reached.
        self.cursor = window_end.succ_opt().filter(|_| window_end < self.end);
        Some(DateWindow::new(start, window_end))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.cursor {
            Some(start) if start <= self.end => {
                let days = (self.end - start).num_days() as usize + 1;
                let n = days.div_ceil(self.segment_days as usize);
                (n, Some(n))
            }
            _ => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for Windows {}

/// Plans the windows covering `[start, end]`, each at most `segment_days` long.
///
/// The final window may be shorter than `segment_days`.
///
/// # Errors
///
/// Returns [`InvalidRangeError::StartAfterEnd`] if `start > end` and
/// [`InvalidRangeError::SegmentTooShort`] if `segment_days < 1`.
///
/// # Examples
///
/// ```
/// use agrifetch::plan_windows;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
/// let windows: Vec<_> = plan_windows(start, end, 10).unwrap().collect();
/// assert_eq!(windows.len(), 3);
/// assert_eq!(windows[2].start, NaiveDate::from_ymd_opt(2024, 1, 21).unwrap());
/// assert_eq!(windows[2].end, end);
/// ```
pub fn plan_windows(
    start: NaiveDate,
    end: NaiveDate,
    segment_days: u32,
) -> Result<Windows, InvalidRangeError> {
    if segment_days < 1 {
        return Err(InvalidRangeError::SegmentTooShort(segment_days));
    }
    if start > end {
        return Err(InvalidRangeError::StartAfterEnd { start, end });
    }
    Ok(Windows {
        cursor: Some(start),
        end,
        segment_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_covers(windows: &[DateWindow], start: NaiveDate, end: NaiveDate, segment: u32) {
        assert_eq!(windows.first().map(|w| w.start), Some(start));
        assert_eq!(windows.last().map(|w| w.end), Some(end));
        for w in windows {
            assert!(w.start <= w.end, "window {w} is inverted");
            assert!(w.len_days() <= u64::from(segment), "window {w} too long");
        }
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end.succ_opt(), Some(pair[1].start), "gap or overlap");
        }
    }

    #[test]
    fn test_short_range_is_single_window() {
        let windows: Vec<_> = plan_windows(date(2024, 3, 1), date(2024, 3, 3), 10)
            .unwrap()
            .collect();
        assert_eq!(windows, vec![DateWindow::new(date(2024, 3, 1), date(2024, 3, 3))]);
    }

    #[test]
    fn test_single_day_range() {
        let windows: Vec<_> = plan_windows(date(2024, 3, 1), date(2024, 3, 1), 1)
            .unwrap()
            .collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].len_days(), 1);
    }

    #[test]
    fn test_exact_multiple_has_no_short_tail() {
        let windows: Vec<_> = plan_windows(date(2024, 1, 1), date(2024, 1, 30), 10)
            .unwrap()
            .collect();
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.len_days() == 10));
    }

    #[test]
    fn test_multi_year_range_covers_contiguously() {
        for segment in [1, 3, 7, 10, 31, 400] {
            let start = date(2020, 1, 1);
            let end = date(2025, 12, 31);
            let plan = plan_windows(start, end, segment).unwrap();
            let expected = plan.len();
            let windows: Vec<_> = plan.collect();
            assert_eq!(windows.len(), expected);
            assert_covers(&windows, start, end, segment);
        }
    }

    #[test]
    fn test_plan_is_restartable() {
        let plan = plan_windows(date(2023, 2, 20), date(2023, 3, 10), 4).unwrap();
        let first: Vec<_> = plan.clone().collect();
        let second: Vec<_> = plan.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_range_ending_at_calendar_max() {
        let end = NaiveDate::MAX;
        let start = end - Days::new(5);
        let windows: Vec<_> = plan_windows(start, end, 4).unwrap().collect();
        assert_covers(&windows, start, end, 4);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            plan_windows(date(2024, 1, 2), date(2024, 1, 1), 10).unwrap_err(),
            InvalidRangeError::StartAfterEnd {
                start: date(2024, 1, 2),
                end: date(2024, 1, 1)
            }
        );
        assert_eq!(
            plan_windows(date(2024, 1, 1), date(2024, 1, 2), 0).unwrap_err(),
            InvalidRangeError::SegmentTooShort(0)
        );
    }
}
