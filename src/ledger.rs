// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The ledger store: authoritative CRUD over spending items and categories,
//! filtered retrieval, monthly aggregates and change notifications.
//!
//! The store does no locking of its own. Only one writer may use it at a
//! time; an import worker takes ownership of the store while it runs.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db;
use crate::errors::{LedgerError, LedgerResult};
use crate::filter::FilterPredicate;
use crate::models::{
    Category, CategoryMonthlyTotal, MonthlyTotal, SpendingItem, YearMonth, from_cents,
};

/// How many months the monthly bar chart shows by default.
pub const DEFAULT_MONTH_LIMIT: usize = 15;

const ITEM_COLUMNS: &str = "s.id, s.date, s.cost_cents, s.category_id, c.name, s.comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LedgerEvent {
    /// Items or categories were added, changed or removed, or a ledger was opened.
    DataChanged,
    /// The active filter predicate was replaced or one of its fields changed.
    FiltersChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listeners get a shared borrow of the store: they may re-query it but can
/// not start another mutation while a notification is being delivered.
pub type Listener = Box<dyn Fn(LedgerEvent, &LedgerStore) + Send>;

struct Subscription {
    id: SubscriptionId,
    event: LedgerEvent,
    listener: Listener,
}

pub struct LedgerStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
    filter: FilterPredicate,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore {
    /// A store with no database attached. Every data operation fails with
    /// `NotConnected` until `open` succeeds.
    pub fn new() -> Self {
        Self {
            conn: None,
            path: None,
            filter: FilterPredicate::default(),
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> LedgerResult<()> {
        let path = path.as_ref();
        self.close()?;
        let conn = db::open(path)?;
        info!(path = %path.display(), "opened ledger");
        self.conn = Some(conn);
        self.path = Some(path.to_path_buf());
        self.emit(LedgerEvent::DataChanged);
        Ok(())
    }

    pub fn open_in_memory(&mut self) -> LedgerResult<()> {
        self.close()?;
        self.conn = Some(db::open_in_memory()?);
        self.emit(LedgerEvent::DataChanged);
        Ok(())
    }

    pub fn close(&mut self) -> LedgerResult<()> {
        self.path = None;
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| LedgerError::Query(e))?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// File backing the ledger; `None` when closed or in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> LedgerResult<&Connection> {
        self.conn.as_ref().ok_or(LedgerError::NotConnected)
    }

    // --- events -----------------------------------------------------------

    pub fn subscribe<F>(&mut self, event: LedgerEvent, listener: F) -> SubscriptionId
    where
        F: Fn(LedgerEvent, &LedgerStore) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            event,
            listener: Box::new(listener),
        });
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    fn emit(&self, event: LedgerEvent) {
        debug!(?event, "ledger event");
        for sub in self.subscriptions.iter().filter(|s| s.event == event) {
            (sub.listener)(event, self);
        }
    }

    /// Fires the `DataChanged` notification held back by the `*_silently`
    /// operations during a bulk load.
    pub fn notify_data_changed(&self) {
        self.emit(LedgerEvent::DataChanged);
    }

    // --- mutation ---------------------------------------------------------

    /// Inserts an item and returns its id (the caller's id if it set one).
    pub fn add_item(&mut self, item: &SpendingItem) -> LedgerResult<i64> {
        let id = self.insert_item(item)?;
        self.emit(LedgerEvent::DataChanged);
        Ok(id)
    }

    /// Same as `add_item` without the change notification.
    pub fn add_item_silently(&mut self, item: &SpendingItem) -> LedgerResult<i64> {
        self.insert_item(item)
    }

    fn insert_item(&self, item: &SpendingItem) -> LedgerResult<i64> {
        let conn = self.conn()?;
        let cost = item.cost_cents()?;
        let id = match item.id {
            Some(id) => {
                conn.execute(
                    "INSERT INTO spending_items(id, date, cost_cents, category_id, comment)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![id, item.date, cost, item.category_id, item.comment],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO spending_items(date, cost_cents, category_id, comment)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![item.date, cost, item.category_id, item.comment],
                )?;
                conn.last_insert_rowid()
            }
        };
        debug!(id, date = %item.date, cost = %item.cost(), "inserted spending item");
        Ok(id)
    }

    pub fn update_item(&mut self, item: &SpendingItem) -> LedgerResult<()> {
        let conn = self.conn()?;
        let id = item
            .id
            .ok_or_else(|| LedgerError::validation("cannot update a spending item without an id"))?;
        let cost = item.cost_cents()?;
        let changed = conn.execute(
            "UPDATE spending_items SET date=?1, cost_cents=?2, category_id=?3, comment=?4 WHERE id=?5",
            params![
                item.date,
                cost,
                item.category_id,
                item.comment,
                id
            ],
        )?;
        if changed == 0 {
            return Err(LedgerError::validation(format!(
                "no spending item with id {}",
                id
            )));
        }
        debug!(id, "updated spending item");
        self.emit(LedgerEvent::DataChanged);
        Ok(())
    }

    /// Removes every item whose id is listed, in one statement, and returns
    /// how many rows went away. One notification covers the whole batch.
    pub fn delete_items(&mut self, ids: &[i64]) -> LedgerResult<usize> {
        let conn = self.conn()?;
        if ids.is_empty() {
            return Err(LedgerError::validation("no spending item ids given to delete"));
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!("DELETE FROM spending_items WHERE id IN ({})", placeholders);
        let removed = conn.execute(&sql, params_from_iter(ids.iter()))?;
        debug!(requested = ids.len(), removed, "deleted spending items");
        self.emit(LedgerEvent::DataChanged);
        Ok(removed)
    }

    pub fn delete_item(&mut self, id: i64) -> LedgerResult<usize> {
        self.delete_items(&[id])
    }

    pub fn add_category(&mut self, category: &Category) -> LedgerResult<i64> {
        let id = self.insert_category(category)?;
        self.emit(LedgerEvent::DataChanged);
        Ok(id)
    }

    pub fn add_category_silently(&mut self, category: &Category) -> LedgerResult<i64> {
        self.insert_category(category)
    }

    fn insert_category(&self, category: &Category) -> LedgerResult<i64> {
        let conn = self.conn()?;
        let name = category.name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("category name must not be empty"));
        }
        let id = match category.id {
            Some(id) => {
                conn.execute(
                    "INSERT INTO categories(id, name) VALUES (?1, ?2)",
                    params![id, name],
                )?;
                id
            }
            None => {
                conn.execute("INSERT INTO categories(name) VALUES (?1)", params![name])?;
                conn.last_insert_rowid()
            }
        };
        debug!(id, name, "inserted category");
        Ok(id)
    }

    /// Runs `f` inside one SQLite transaction. Any error rolls back every
    /// write `f` made. Batches do not nest.
    pub fn batch<T, F>(&mut self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut LedgerStore) -> LedgerResult<T>,
    {
        self.conn()?.execute_batch("BEGIN")?;
        match f(self) {
            Ok(value) => {
                self.conn()?.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "rolling back ledger batch");
                if let Ok(conn) = self.conn() {
                    if let Err(rb) = conn.execute_batch("ROLLBACK") {
                        warn!(error = %rb, "rollback failed");
                    }
                }
                Err(err)
            }
        }
    }

    // --- filters ----------------------------------------------------------

    pub fn filter(&self) -> &FilterPredicate {
        &self.filter
    }

    pub fn set_filter(&mut self, predicate: FilterPredicate) {
        self.filter = predicate;
        self.emit(LedgerEvent::FiltersChanged);
    }

    pub fn set_date_filter(&mut self, min: Option<NaiveDate>, max: Option<NaiveDate>) {
        self.filter.date_min = min;
        self.filter.date_max = max;
        self.emit(LedgerEvent::FiltersChanged);
    }

    pub fn set_cost_filter(&mut self, min: Option<Decimal>, max: Option<Decimal>) {
        self.filter.cost_min = min;
        self.filter.cost_max = max;
        self.emit(LedgerEvent::FiltersChanged);
    }

    pub fn set_category_filter(&mut self, category_id: Option<i64>) {
        self.filter.category_id = category_id;
        self.emit(LedgerEvent::FiltersChanged);
    }

    pub fn set_comment_filter(&mut self, comment: Option<String>) {
        self.filter.comment = comment;
        self.emit(LedgerEvent::FiltersChanged);
    }

    // --- queries ----------------------------------------------------------

    /// Items matching the active filter, newest first.
    pub fn items(&self) -> LedgerResult<Vec<SpendingItem>> {
        self.query_items(&self.filter)
    }

    /// Items joined with their category, restricted by `predicate`, newest
    /// first (ties broken by id, newest first).
    pub fn query_items(&self, predicate: &FilterPredicate) -> LedgerResult<Vec<SpendingItem>> {
        let conn = self.conn()?;
        let (clause, values) = predicate.where_clause();
        let mut sql = format!(
            "SELECT {} FROM spending_items s JOIN categories c ON c.id = s.category_id",
            ITEM_COLUMNS
        );
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        sql.push_str(" ORDER BY s.date DESC, s.id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), item_from_row)?;
        let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn item(&self, id: i64) -> LedgerResult<Option<SpendingItem>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM spending_items s LEFT JOIN categories c ON c.id = s.category_id WHERE s.id = ?1",
            ITEM_COLUMNS
        );
        let item = conn.query_row(&sql, params![id], item_from_row).optional()?;
        Ok(item)
    }

    pub fn query_categories(&self) -> LedgerResult<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], |r| {
            Ok(Category::with_id(r.get(0)?, r.get::<_, String>(1)?))
        })?;
        let categories = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    pub fn category(&self, id: i64) -> LedgerResult<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name FROM categories WHERE id=?1",
                params![id],
                |r| Ok(Category::with_id(r.get(0)?, r.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(category)
    }

    pub fn category_by_name(&self, name: &str) -> LedgerResult<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name FROM categories WHERE name=?1 ORDER BY id LIMIT 1",
                params![name.trim()],
                |r| Ok(Category::with_id(r.get(0)?, r.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(category)
    }

    // --- aggregates -------------------------------------------------------

    /// Spending per calendar month over the whole ledger (the active filter
    /// does not apply), newest month first, at most `limit` months.
    pub fn monthly_totals(&self, limit: usize) -> LedgerResult<Vec<MonthlyTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT substr(date,1,7) AS month, SUM(cost_cents) AS total
             FROM spending_items
             GROUP BY month
             ORDER BY month DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |r| {
            let month: String = r.get(0)?;
            Ok(MonthlyTotal {
                month: month.parse::<YearMonth>().map_err(|e| conversion_failure(0, e))?,
                total: from_cents(r.get(1)?),
            })
        })?;
        let totals = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(totals)
    }

    /// Spending per category within one month, unfiltered. Categories with
    /// nothing spent that month are absent.
    pub fn category_totals_for_month(
        &self,
        month: YearMonth,
    ) -> LedgerResult<Vec<CategoryMonthlyTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, SUM(s.cost_cents) AS total
             FROM spending_items s JOIN categories c ON c.id = s.category_id
             WHERE substr(s.date,1,7) = ?1
             GROUP BY c.id, c.name
             ORDER BY c.id",
        )?;
        let rows = stmt.query_map(params![month.to_string()], |r| {
            Ok(CategoryMonthlyTotal {
                category_id: r.get(0)?,
                category_name: r.get(1)?,
                total: from_cents(r.get(2)?),
            })
        })?;
        let totals = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(totals)
    }
}

fn item_from_row(r: &Row<'_>) -> rusqlite::Result<SpendingItem> {
    Ok(SpendingItem::from_stored(
        r.get(0)?,
        r.get(1)?,
        from_cents(r.get(2)?),
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
    ))
}

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}
