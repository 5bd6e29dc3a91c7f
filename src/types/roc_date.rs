//! Conversion between the Gregorian calendar and the ROC (Minguo) calendar used by
//! Taiwanese government APIs, where the year is the Gregorian year minus 1911.

use chrono::{Datelike, NaiveDate};

/// Gregorian year of ROC year 0.
pub const ROC_EPOCH_OFFSET: i32 = 1911;

/// Formats a date in the ROC calendar as `YYY.MM.DD` (year zero-padded to three digits).
///
/// ```
/// use agrifetch::to_roc;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// assert_eq!(to_roc(date), "113.01.05");
/// ```
pub fn to_roc(date: NaiveDate) -> String {
    format!(
        "{:03}.{:02}.{:02}",
        date.year() - ROC_EPOCH_OFFSET,
        date.month(),
        date.day()
    )
}

/// Formats a date in the Gregorian calendar as `YYYY.MM.DD`.
pub fn to_western(date: NaiveDate) -> String {
    format!("{:04}.{:02}.{:02}", date.year(), date.month(), date.day())
}

/// Rewrites an ROC `Y.M.D` date string as a Gregorian `YYYY.MM.DD` string.
///
/// Never fails: empty input stays empty, and anything that is not three
/// dot-separated unsigned numbers is returned unchanged so the record it came
/// from is kept. A four-digit year of 1912 or later is taken as already
/// Gregorian and also returned unchanged, so ROC dates round-trip through
/// [`to_roc`] for Gregorian years 1912 to 3822. Use [`parse_roc`] beyond that.
///
/// ```
/// use agrifetch::roc_to_western;
///
/// assert_eq!(roc_to_western("113.1.5"), "2024.01.05");
/// assert_eq!(roc_to_western("2024.01.05"), "2024.01.05");
/// assert_eq!(roc_to_western("113/01/05"), "113/01/05");
/// ```
pub fn roc_to_western(date: &str) -> String {
    if is_western_year(date) {
        return date.to_string();
    }
    parse_parts(date)
        .and_then(|(year, month, day)| {
            let year = year.checked_add(ROC_EPOCH_OFFSET as u32)?;
            Some(format!("{year:04}.{month:02}.{day:02}"))
        })
        .unwrap_or_else(|| date.to_string())
}

/// Parses an ROC `Y.M.D` string into a calendar date, if it denotes a real one.
pub fn parse_roc(date: &str) -> Option<NaiveDate> {
    let (year, month, day) = parse_parts(date)?;
    let year = i32::try_from(year).ok()?.checked_add(ROC_EPOCH_OFFSET)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_parts(date: &str) -> Option<(u32, u32, u32)> {
    let mut parts = date.split('.');
    let year = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    let day = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((year, month, day))
}

fn is_western_year(date: &str) -> bool {
    let year = date.split('.').next().unwrap_or_default().trim();
    year.len() == 4 && year.parse::<i32>().is_ok_and(|y| y > ROC_EPOCH_OFFSET)
}
