// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{LedgerError, LedgerResult};
use crate::ingest::{ImportOutcome, ImportTask, ItemSource, SourceRow};
use crate::ledger::LedgerStore;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

pub fn handle(store: LedgerStore, m: &clap::ArgMatches) -> Result<LedgerStore> {
    let items = m.get_one::<String>("items").unwrap().trim();
    let categories = m
        .get_one::<String>("categories")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    let source = CsvSource::open(Path::new(items), categories.map(Path::new))
        .with_context(|| format!("Open CSV {}", items))?;
    let total = source.row_count_hint().unwrap_or(0);
    let task = ImportTask::new(source).with_progress(move |n| {
        eprint!("\rprocessed {}/{} rows", n, total);
        let _ = std::io::stderr().flush();
    });

    let handle = task.spawn(store);
    if m.get_flag("interactive") {
        eprintln!("press Enter to stop the import");
        let token = handle.cancel_token();
        // The reader stays blocked on stdin if the import finishes first;
        // it goes away with the process.
        thread::spawn(move || {
            let mut line = String::new();
            if matches!(std::io::stdin().read_line(&mut line), Ok(n) if n > 0) {
                token.cancel();
            }
        });
    }
    let (store, result) = match m.get_one::<u64>("timeout") {
        Some(secs) => handle.join_timeout(Duration::from_secs(*secs)),
        None => handle.join(),
    };
    if total > 0 {
        eprintln!();
    }
    let outcome = result.with_context(|| format!("Import from {}", items))?;
    let s = outcome.summary();
    let verb = match outcome {
        ImportOutcome::Completed(_) => "Imported",
        ImportOutcome::Cancelled(_) => "Partially imported",
    };
    println!(
        "{} {} item(s) and {} categor{} from {} ({} row(s) skipped)",
        verb,
        s.items,
        s.categories,
        if s.categories == 1 { "y" } else { "ies" },
        items,
        s.skipped
    );
    Ok(store)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Category,
    Item,
}

/// Reads categories (`id,name`) and then items
/// (`date,cost,category_id,category,comment`) from CSV, each with a header
/// row.
pub struct CsvSource {
    rows: std::vec::IntoIter<(RowKind, StringRecord)>,
    total: usize,
}

impl CsvSource {
    pub fn open(items: &Path, categories: Option<&Path>) -> LedgerResult<Self> {
        let items = File::open(items).map_err(|e| {
            LedgerError::Source(format!("cannot open {}: {}", items.display(), e))
        })?;
        let categories = categories
            .map(|p| {
                File::open(p)
                    .map_err(|e| LedgerError::Source(format!("cannot open {}: {}", p.display(), e)))
            })
            .transpose()?;
        Self::from_readers(items, categories)
    }

    pub fn from_readers<R: Read>(items: R, categories: Option<R>) -> LedgerResult<Self> {
        let mut rows = Vec::new();
        if let Some(cats) = categories {
            for rec in reader(cats).records() {
                rows.push((RowKind::Category, rec?));
            }
        }
        for rec in reader(items).records() {
            rows.push((RowKind::Item, rec?));
        }
        let total = rows.len();
        Ok(Self {
            rows: rows.into_iter(),
            total,
        })
    }
}

fn reader<R: Read>(r: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(r)
}

impl ItemSource for CsvSource {
    fn row_count_hint(&self) -> Option<usize> {
        Some(self.total)
    }

    fn next_row(&mut self) -> LedgerResult<Option<SourceRow>> {
        match self.rows.next() {
            Some((RowKind::Category, rec)) => parse_category(&rec).map(Some),
            Some((RowKind::Item, rec)) => parse_item(&rec).map(Some),
            None => Ok(None),
        }
    }
}

fn line_of(rec: &StringRecord) -> u64 {
    rec.position().map(|p| p.line()).unwrap_or(0)
}

fn field<'r>(rec: &'r StringRecord, idx: usize) -> &'r str {
    rec.get(idx).unwrap_or("")
}

/// Spreadsheet exports write ids as `3` or `3.0`.
fn parse_id(rec: &StringRecord, idx: usize) -> LedgerResult<i64> {
    let raw = field(rec, idx);
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<Decimal>().ok().and_then(|d| d.trunc().to_i64()))
        .ok_or_else(|| {
            LedgerError::Source(format!("line {}: invalid id '{}'", line_of(rec), raw))
        })
}

fn parse_category(rec: &StringRecord) -> LedgerResult<SourceRow> {
    if field(rec, 0).is_empty() {
        return Ok(SourceRow::Blank);
    }
    Ok(SourceRow::Category {
        id: parse_id(rec, 0)?,
        name: field(rec, 1).to_string(),
    })
}

fn parse_item(rec: &StringRecord) -> LedgerResult<SourceRow> {
    let date_raw = field(rec, 0);
    let cost_raw = field(rec, 1);
    if date_raw.is_empty() || cost_raw.is_empty() {
        return Ok(SourceRow::Blank);
    }
    let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d").map_err(|_| {
        LedgerError::Source(format!(
            "line {}: invalid date '{}', expected YYYY-MM-DD",
            line_of(rec),
            date_raw
        ))
    })?;
    let cost = cost_raw.parse::<Decimal>().map_err(|_| {
        LedgerError::Source(format!("line {}: invalid cost '{}'", line_of(rec), cost_raw))
    })?;
    Ok(SourceRow::Item {
        date,
        cost,
        category_id: parse_id(rec, 2)?,
        category_label: field(rec, 3).to_string(),
        comment: field(rec, 4).to_string(),
    })
}
