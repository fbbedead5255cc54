// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Optional constraints on a spending-item query. Absent fields do not
/// constrain; present ones are AND-ed. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub cost_min: Option<Decimal>,
    pub cost_max: Option<Decimal>,
    pub category_id: Option<i64>,
    pub comment: Option<String>,
}

impl FilterPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates(mut self, min: Option<NaiveDate>, max: Option<NaiveDate>) -> Self {
        self.date_min = min;
        self.date_max = max;
        self
    }

    pub fn with_costs(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.cost_min = min;
        self.cost_max = max;
        self
    }

    pub fn with_category(mut self, category_id: Option<i64>) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.where_clause().0.is_empty()
    }

    /// SQL conditions (without a leading `WHERE`/`AND`) over the `s`
    /// (spending_items) and `c` (categories) aliases, plus the values to bind
    /// in order. User text never reaches the SQL string.
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(min) = self.date_min {
            clauses.push("s.date >= ?");
            values.push(Value::Text(min.to_string()));
        }
        if let Some(max) = self.date_max {
            clauses.push("s.date <= ?");
            values.push(Value::Text(max.to_string()));
        }
        if let Some(min) = self.cost_min {
            match CentsBound::lower(min) {
                CentsBound::At(cents) => {
                    clauses.push("s.cost_cents >= ?");
                    values.push(Value::Integer(cents));
                }
                CentsBound::Unbounded => {}
                CentsBound::Unreachable => clauses.push("0"),
            }
        }
        if let Some(max) = self.cost_max {
            match CentsBound::upper(max) {
                CentsBound::At(cents) => {
                    clauses.push("s.cost_cents <= ?");
                    values.push(Value::Integer(cents));
                }
                CentsBound::Unbounded => {}
                CentsBound::Unreachable => clauses.push("0"),
            }
        }
        if let Some(cat) = self.category_id {
            clauses.push("c.id = ?");
            values.push(Value::Integer(cat));
        }
        if let Some(text) = self.comment.as_deref().filter(|t| !t.is_empty()) {
            clauses.push("s.comment LIKE ? ESCAPE '\\'");
            values.push(Value::Text(format!("%{}%", escape_like(text))));
        }

        (clauses.join(" AND "), values)
    }
}

/// A cost bound translated to the stored cent counts.
#[derive(Debug, PartialEq, Eq)]
enum CentsBound {
    At(i64),
    /// Every storable cost satisfies the bound.
    Unbounded,
    /// No storable cost satisfies the bound.
    Unreachable,
}

impl CentsBound {
    /// `cost >= min` holds exactly when `cents >= ceil(min * 100)`.
    fn lower(min: Decimal) -> Self {
        match min.checked_mul(Decimal::ONE_HUNDRED).map(|c| c.ceil()) {
            Some(c) if c <= Decimal::ZERO => CentsBound::Unbounded,
            Some(c) => c.to_i64().map_or(CentsBound::Unreachable, CentsBound::At),
            None if min.is_sign_negative() => CentsBound::Unbounded,
            None => CentsBound::Unreachable,
        }
    }

    /// `cost <= max` holds exactly when `cents <= floor(max * 100)`.
    fn upper(max: Decimal) -> Self {
        match max.checked_mul(Decimal::ONE_HUNDRED).map(|c| c.floor()) {
            Some(c) if c < Decimal::ZERO => CentsBound::Unreachable,
            Some(c) => c.to_i64().map_or(CentsBound::Unbounded, CentsBound::At),
            None if max.is_sign_negative() => CentsBound::Unreachable,
            None => CentsBound::Unbounded,
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_predicate_has_no_clauses() {
        let (sql, values) = FilterPredicate::new().where_clause();
        assert!(sql.is_empty());
        assert!(values.is_empty());
        assert!(FilterPredicate::new().with_comment(Some(String::new())).is_empty());
    }

    #[test]
    fn comment_is_bound_not_interpolated() {
        let p = FilterPredicate::new().with_comment(Some("50%' OR 1=1 --".into()));
        let (sql, values) = p.where_clause();
        assert_eq!(sql, "s.comment LIKE ? ESCAPE '\\'");
        assert_eq!(values, vec![Value::Text("%50\\%' OR 1=1 --%".into())]);
    }

    #[test]
    fn clauses_follow_field_order() {
        let p = FilterPredicate::new()
            .with_costs(Some(Decimal::new(5, 0)), None)
            .with_category(Some(3));
        let (sql, values) = p.where_clause();
        assert_eq!(sql, "s.cost_cents >= ? AND c.id = ?");
        assert_eq!(values, vec![Value::Integer(500), Value::Integer(3)]);
    }

    #[test]
    fn cost_bounds_round_inward_to_cents() {
        let dec = |s: &str| s.parse::<Decimal>().unwrap();
        assert_eq!(CentsBound::lower(dec("5.001")), CentsBound::At(501));
        assert_eq!(CentsBound::upper(dec("9.999")), CentsBound::At(999));
        assert_eq!(
            CentsBound::lower(dec("1234567890123456.80")),
            CentsBound::At(123456789012345680)
        );
        assert_eq!(CentsBound::lower(dec("-3")), CentsBound::Unbounded);
        assert_eq!(CentsBound::upper(dec("-0.01")), CentsBound::Unreachable);
        assert_eq!(CentsBound::lower(dec("100000000000000000000")), CentsBound::Unreachable);
        assert_eq!(CentsBound::upper(dec("100000000000000000000")), CentsBound::Unbounded);
    }

    #[test]
    fn unreachable_bound_matches_nothing() {
        let p = FilterPredicate::new().with_costs(None, Some(Decimal::new(-1, 0)));
        let (sql, values) = p.where_clause();
        assert_eq!(sql, "0");
        assert!(values.is_empty());
        assert!(!p.is_empty());
    }
}
