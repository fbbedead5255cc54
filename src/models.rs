// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, LedgerResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

/// One spending record. `cost` is never negative, always carries two
/// fractional digits and fits in an `i64` count of cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingItem {
    pub id: Option<i64>,
    pub date: NaiveDate,
    cost: Decimal,
    pub category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub comment: String,
}

impl SpendingItem {
    pub fn new(
        date: NaiveDate,
        cost: Decimal,
        category_id: i64,
        comment: impl Into<String>,
    ) -> LedgerResult<Self> {
        Ok(Self {
            id: None,
            date,
            cost: normalize_cost(cost)?,
            category_id,
            category_name: None,
            comment: comment.into(),
        })
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Rebuilds an item read back from the database, where the cost was
    /// already validated on the way in.
    pub(crate) fn from_stored(
        id: i64,
        date: NaiveDate,
        cost: Decimal,
        category_id: i64,
        category_name: Option<String>,
        comment: String,
    ) -> Self {
        Self {
            id: Some(id),
            date,
            cost,
            category_id,
            category_name,
            comment,
        }
    }

    pub fn cost(&self) -> Decimal {
        self.cost
    }

    pub(crate) fn cost_cents(&self) -> LedgerResult<i64> {
        to_cents(self.cost)
    }

    /// Replaces the cost. A negative cost is rejected and the old value kept.
    pub fn set_cost(&mut self, cost: Decimal) -> LedgerResult<()> {
        self.cost = normalize_cost(cost)?;
        Ok(())
    }
}

/// Rounds to cents, half away from zero (`0.125` becomes `0.13`).
pub(crate) fn normalize_cost(cost: Decimal) -> LedgerResult<Decimal> {
    if cost.is_zero() {
        return Ok(Decimal::new(0, 2));
    }
    if cost.is_sign_negative() {
        return Err(LedgerError::validation(format!(
            "cost must not be negative (got {})",
            cost
        )));
    }
    let rounded = cost.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Ok(from_cents(to_cents(rounded)?))
}

/// Exact number of cents in an amount that has at most two fractional digits.
pub(crate) fn to_cents(amount: Decimal) -> LedgerResult<i64> {
    let mut scaled = amount;
    scaled.rescale(2);
    if scaled.scale() != 2 || scaled != amount {
        return Err(LedgerError::validation(format!(
            "{} cannot be stored as whole cents",
            amount
        )));
    }
    i64::try_from(scaled.mantissa())
        .map_err(|_| LedgerError::validation(format!("cost {} is too large", amount)))
}

pub(crate) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// A calendar month, displayed and parsed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> LedgerResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::validation(format!(
                "invalid month number {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Three-letter month name, e.g. `Jan`.
    pub fn label(&self) -> String {
        self.first_day().format("%b").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || LedgerError::validation(format!("invalid month '{}', expected YYYY-MM", s));
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: YearMonth,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMonthlyTotal {
    pub category_id: i64,
    pub category_name: String,
    pub total: Decimal,
}
