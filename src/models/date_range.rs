//! Inclusive date range model.
//!
//! This module contains the [`DateRange`] type that defines the window of a
//! single allocation run, and the single accepted date format.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The only date format accepted from collaborators.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date string.
///
/// Any other format (e.g. `01/31/2025` or `01-31-2025`) is rejected with
/// [`EngineError::InvalidDate`] rather than guessed at.
///
/// # Example
///
/// ```
/// use allocation_engine::models::parse_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(
///     parse_date("2025-01-31").unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
/// );
/// assert!(parse_date("01/31/2025").is_err());
/// ```
pub fn parse_date(value: &str) -> EngineResult<NaiveDate> {
    let invalid = |message: String| EngineError::InvalidDate {
        value: value.to_string(),
        message,
    };
    let trimmed = value.trim();
    let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|e| invalid(format!("expected YYYY-MM-DD ({})", e)))?;
    // chrono accepts unpadded fields such as 2025-3-3
    if date.format(DATE_FORMAT).to_string() != trimmed {
        return Err(invalid(
            "expected YYYY-MM-DD with zero-padded month and day".to_string(),
        ));
    }
    Ok(date)
}

/// Serde adapter holding a `NaiveDate` field to [`DATE_FORMAT`].
///
/// Use with `#[serde(with = "iso_date")]`.
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{DATE_FORMAT, parse_date};

    /// Writes the date as `YYYY-MM-DD`.
    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    /// Reads a date through [`parse_date`].
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_date(&value).map_err(D::Error::custom)
    }
}

/// Serde adapter for optional dates, see [`iso_date`].
pub mod iso_date_opt {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{DATE_FORMAT, parse_date};

    /// Writes the date as `YYYY-MM-DD`, or nothing.
    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Reads an optional date through [`parse_date`].
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|value| parse_date(&value))
            .transpose()
            .map_err(D::Error::custom)
    }
}

/// Serde adapter for maps keyed by day, see [`iso_date`].
pub mod iso_date_keys {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

    use super::{DATE_FORMAT, parse_date};

    /// Writes every key as `YYYY-MM-DD`.
    pub fn serialize<S, T>(map: &BTreeMap<NaiveDate, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_map(
            map.iter()
                .map(|(date, value)| (date.format(DATE_FORMAT).to_string(), value)),
        )
    }

    /// Reads every key through [`parse_date`].
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<NaiveDate, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        BTreeMap::<String, T>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| parse_date(&key).map(|date| (date, value)))
            .collect::<Result<_, _>>()
            .map_err(D::Error::custom)
    }
}

/// An inclusive range of days.
///
/// # Example
///
/// ```
/// use allocation_engine::models::DateRange;
/// use chrono::NaiveDate;
///
/// let range = DateRange::parse("2025-01-30", "2025-02-02").unwrap();
/// assert_eq!(range.num_days(), 4);
/// assert!(range.contains(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// The first day of the range (inclusive).
    #[serde(with = "iso_date")]
    pub start_date: NaiveDate,
    /// The last day of the range (inclusive).
    #[serde(with = "iso_date")]
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Creates a range, failing with [`EngineError::InvalidRange`] when
    /// `start_date` is after `end_date`.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> EngineResult<Self> {
        let range = Self {
            start_date,
            end_date,
        };
        range.validate()?;
        Ok(range)
    }

    /// Parses both bounds with [`parse_date`] and builds the range.
    pub fn parse(start_date: &str, end_date: &str) -> EngineResult<Self> {
        Self::new(parse_date(start_date)?, parse_date(end_date)?)
    }

    /// Checks `start_date <= end_date`.
    ///
    /// Ranges built through serde skip [`DateRange::new`], so the assembler
    /// calls this again before use.
    pub fn validate(&self) -> EngineResult<()> {
        if self.start_date > self.end_date {
            return Err(EngineError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Checks if a given date falls within this range (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Number of days in the range, counting both ends.
    pub fn num_days(&self) -> usize {
        let span = (self.end_date - self.start_date).num_days();
        if span < 0 { 0 } else { span as usize + 1 }
    }

    /// Iterates every day of the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = self.start_date;
        (0..self.num_days() as u64).filter_map(move |offset| start.checked_add_days(Days::new(offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// DR-001: a single-day range
    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(date(2025, 1, 1), date(2025, 1, 1)).unwrap();
        assert_eq!(range.num_days(), 1);
        assert_eq!(range.days().collect::<Vec<_>>(), vec![date(2025, 1, 1)]);
    }

    /// DR-002: start after end is rejected
    #[test]
    fn test_start_after_end_is_invalid_range() {
        let result = DateRange::new(date(2025, 1, 2), date(2025, 1, 1));
        match result {
            Err(EngineError::InvalidRange { start, end }) => {
                assert_eq!(start, date(2025, 1, 2));
                assert_eq!(end, date(2025, 1, 1));
            }
            _ => panic!("Expected InvalidRange error"),
        }
    }

    /// DR-003: days cross a month boundary in order
    #[test]
    fn test_days_cross_month_boundary() {
        let range = DateRange::new(date(2025, 1, 30), date(2025, 2, 2)).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(
            days,
            vec![
                date(2025, 1, 30),
                date(2025, 1, 31),
                date(2025, 2, 1),
                date(2025, 2, 2)
            ]
        );
    }

    #[test]
    fn test_leap_day_is_included() {
        let range = DateRange::parse("2024-02-28", "2024-03-01").unwrap();
        assert_eq!(range.num_days(), 3);
        assert!(range.contains(date(2024, 2, 29)));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = DateRange::new(date(2025, 1, 13), date(2025, 1, 26)).unwrap();
        assert!(range.contains(date(2025, 1, 13)));
        assert!(range.contains(date(2025, 1, 26)));
        assert!(!range.contains(date(2025, 1, 12)));
        assert!(!range.contains(date(2025, 1, 27)));
    }

    #[test]
    fn test_parse_date_rejects_us_format() {
        let result = parse_date("01/31/2025");
        match result {
            Err(EngineError::InvalidDate { value, .. }) => assert_eq!(value, "01/31/2025"),
            _ => panic!("Expected InvalidDate error"),
        }
    }

    #[test]
    fn test_parse_date_rejects_month_first_dashes() {
        assert!(parse_date("01-31-2025").is_err());
    }

    #[test]
    fn test_parse_date_rejects_unpadded_fields() {
        for value in ["2025-3-3", "2025-03-3", "2025-3-03"] {
            match parse_date(value) {
                Err(EngineError::InvalidDate { value: rejected, .. }) => assert_eq!(rejected, value),
                other => panic!("Expected InvalidDate error for {}, got {:?}", value, other),
            }
        }
        assert_eq!(parse_date(" 2025-03-03 ").unwrap(), date(2025, 3, 3));
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Logged {
        #[serde(with = "iso_date_keys")]
        days: std::collections::BTreeMap<NaiveDate, f64>,
        #[serde(default, with = "iso_date_opt", skip_serializing_if = "Option::is_none")]
        until: Option<NaiveDate>,
    }

    #[test]
    fn test_day_keys_use_the_date_format() {
        let logged: Logged =
            serde_json::from_str(r#"{"days": {"2025-03-03": 8.0}, "until": "2025-03-31"}"#).unwrap();
        assert_eq!(logged.days[&date(2025, 3, 3)], 8.0);
        assert_eq!(logged.until, Some(date(2025, 3, 31)));
        assert_eq!(
            serde_json::to_string(&logged).unwrap(),
            r#"{"days":{"2025-03-03":8.0},"until":"2025-03-31"}"#
        );

        let error = serde_json::from_str::<Logged>(r#"{"days": {"2025-3-3": 8.0}}"#).unwrap_err();
        assert!(error.to_string().contains("Invalid date '2025-3-3'"));
        assert!(serde_json::from_str::<Logged>(r#"{"days": {}, "until": "2025-3-31"}"#).is_err());
    }

    #[test]
    fn test_range_deserialization_rejects_unpadded_dates() {
        let json = r#"{"start_date": "2025-3-1", "end_date": "2025-03-31"}"#;
        assert!(serde_json::from_str::<DateRange>(json).is_err());
    }

    #[test]
    fn test_parse_range_propagates_invalid_date() {
        assert!(matches!(
            DateRange::parse("2025-01-01", "tomorrow"),
            Err(EngineError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_deserialized_inverted_range_fails_validation() {
        let json = r#"{"start_date": "2025-02-01", "end_date": "2025-01-01"}"#;
        let range: DateRange = serde_json::from_str(json).unwrap();
        assert!(matches!(
            range.validate(),
            Err(EngineError::InvalidRange { .. })
        ));
    }
}
