//! Quarterly period labels.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of quarterly periods in a year.
pub const QUARTERS_PER_YEAR: usize = 4;

const ROMAN_QUARTERS: [&str; 4] = ["I", "II", "III", "IV"];

/// A calendar quarter, ordered by year and then quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    quarter: u8,
}

impl Period {
    /// Create a period. `quarter` must be in `1..=4`.
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(ForecastError::InvalidParameter(format!(
                "quarter must be in 1..=4, got {quarter}"
            )));
        }
        Ok(Self { year, quarter })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Parse labels such as `"2020 I"`, `"2021 iv"`, `"2020 II,"`, `"2020 3"`,
    /// `"2020Q1"` or `"2020-Q1"`.
    pub fn parse_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        let fail = || ForecastError::PeriodParse(label.to_string());

        let mut parts = trimmed.split_whitespace();
        let (year_token, quarter_token) = match (parts.next(), parts.next()) {
            (Some(year), Some(quarter)) => (year, quarter),
            (Some(compact), None) => return Self::parse_compact(compact).ok_or_else(fail),
            _ => return Err(fail()),
        };

        let year: i32 = year_token.parse().map_err(|_| fail())?;
        let quarter = quarter_from_token(quarter_token)
            .or_else(|| {
                let cleaned: String = quarter_token
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect();
                quarter_from_token(&cleaned)
            })
            .ok_or_else(fail)?;

        Self::new(year, quarter)
    }

    fn parse_compact(token: &str) -> Option<Self> {
        let upper = token.to_ascii_uppercase();
        let (year, quarter) = upper.split_once('Q')?;
        let year = year.trim_end_matches('-');
        let year: i32 = year.parse().ok()?;
        let quarter: u8 = quarter.parse().ok()?;
        Self::new(year, quarter).ok()
    }

    /// The period `steps` quarters after this one.
    pub fn advance(&self, steps: usize) -> Self {
        let zero_based = self.year as i64 * 4 + (self.quarter as i64 - 1) + steps as i64;
        Self {
            year: zero_based.div_euclid(4) as i32,
            quarter: (zero_based.rem_euclid(4) + 1) as u8,
        }
    }

    /// The immediately following quarter.
    pub fn next(&self) -> Self {
        self.advance(1)
    }

    /// First calendar day of the quarter.
    pub fn start_date(&self) -> Option<NaiveDate> {
        let month = (self.quarter as u32 - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1)
    }

    /// Label in the input format, e.g. `"2025 III"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.year, ROMAN_QUARTERS[self.quarter as usize - 1])
    }
}

fn quarter_from_token(token: &str) -> Option<u8> {
    match token.to_ascii_uppercase().as_str() {
        "I" | "1" => Some(1),
        "II" | "2" => Some(2),
        "III" | "3" => Some(3),
        "IV" | "4" => Some(4),
        _ => None,
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_label(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roman_quarters() {
        for (token, expected) in [("I", 1), ("II", 2), ("III", 3), ("IV", 4)] {
            let p = Period::parse_label(&format!("2020 {token}")).unwrap();
            assert_eq!(p.year(), 2020);
            assert_eq!(p.quarter(), expected);
        }
    }

    #[test]
    fn parses_loose_variants() {
        assert_eq!(Period::parse_label("  2021 iv ").unwrap(), Period::new(2021, 4).unwrap());
        assert_eq!(Period::parse_label("2020 II,").unwrap(), Period::new(2020, 2).unwrap());
        assert_eq!(Period::parse_label("2019 3").unwrap(), Period::new(2019, 3).unwrap());
        assert_eq!(Period::parse_label("2018Q1").unwrap(), Period::new(2018, 1).unwrap());
        assert_eq!(Period::parse_label("2018-q2").unwrap(), Period::new(2018, 2).unwrap());
    }

    #[test]
    fn rejects_invalid_labels() {
        for label in ["", "2020", "2020 V", "20x0 I", "2020 Q5", "I 2020", "2020Q0"] {
            assert!(
                matches!(Period::parse_label(label), Err(ForecastError::PeriodParse(_))),
                "label {label:?} should be rejected"
            );
        }
    }

    #[test]
    fn advance_wraps_year() {
        let p = Period::new(2024, 3).unwrap();
        assert_eq!(p.advance(1), Period::new(2024, 4).unwrap());
        assert_eq!(p.advance(2), Period::new(2025, 1).unwrap());
        assert_eq!(p.advance(6), Period::new(2025, 1).unwrap().advance(4));
        assert_eq!(p.advance(0), p);
    }

    #[test]
    fn ordering_is_chronological() {
        let a = Period::new(2020, 4).unwrap();
        let b = Period::new(2021, 1).unwrap();
        assert!(a < b);
        assert!(Period::new(2021, 2).unwrap() > b);
    }

    #[test]
    fn label_and_start_date() {
        let p = Period::new(2025, 3).unwrap();
        assert_eq!(p.label(), "2025 III");
        assert_eq!(p.to_string(), "2025Q3");
        assert_eq!(p.start_date(), NaiveDate::from_ymd_opt(2025, 7, 1));
        assert_eq!(Period::parse_label(&p.label()).unwrap(), p);
    }

    #[test]
    fn new_rejects_out_of_range_quarter() {
        assert!(Period::new(2020, 0).is_err());
        assert!(Period::new(2020, 5).is_err());
    }
}
