// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bulk loading of categories and spending items from an external tabular
//! source, off the interactive thread.
//!
//! The whole load runs in one ledger batch and fires a single
//! `DataChanged` at the end. Cancellation is cooperative: it is checked
//! between rows, so a row that has started is always finished.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::LedgerResult;
use crate::ledger::LedgerStore;
use crate::models::{Category, SpendingItem};

#[derive(Debug, Clone, PartialEq)]
pub enum SourceRow {
    Category {
        id: i64,
        name: String,
    },
    Item {
        date: NaiveDate,
        cost: Decimal,
        category_id: i64,
        category_label: String,
        comment: String,
    },
    /// A row with nothing to import (missing date or cost). Still counts as
    /// processed.
    Blank,
}

/// Something that yields rows to import. Categories come before the items
/// that reference them.
pub trait ItemSource: Send {
    /// Number of rows the source expects to yield, if known up front.
    fn row_count_hint(&self) -> Option<usize> {
        None
    }

    fn next_row(&mut self) -> LedgerResult<Option<SourceRow>>;
}

impl ItemSource for std::vec::IntoIter<SourceRow> {
    fn row_count_hint(&self) -> Option<usize> {
        Some(self.len())
    }

    fn next_row(&mut self) -> LedgerResult<Option<SourceRow>> {
        Ok(self.next())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Rows processed, the same number the progress callback last saw.
    pub rows: u64,
    pub categories: usize,
    pub items: usize,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn written(&self) -> usize {
        self.categories + self.items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Completed(ImportSummary),
    /// Stopped early; the rows processed before the stop are kept.
    Cancelled(ImportSummary),
}

impl ImportOutcome {
    pub fn summary(&self) -> &ImportSummary {
        match self {
            ImportOutcome::Completed(s) | ImportOutcome::Cancelled(s) => s,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImportOutcome::Cancelled(_))
    }
}

type Progress = Box<dyn FnMut(u64) + Send>;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct ImportTask<S> {
    source: S,
    cancel: CancelToken,
    progress: Option<Progress>,
}

impl<S: ItemSource> ImportTask<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Called once per processed row with the running row count.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn row_count_hint(&self) -> Option<usize> {
        self.source.row_count_hint()
    }

    /// Imports on the calling thread. On error nothing is kept and no
    /// notification fires.
    pub fn run(&mut self, store: &mut LedgerStore) -> LedgerResult<ImportOutcome> {
        let source = &mut self.source;
        let cancel = &self.cancel;
        let progress = &mut self.progress;

        let outcome = store.batch(|store| {
            let mut summary = ImportSummary::default();
            loop {
                if cancel.is_cancelled() {
                    return Ok(ImportOutcome::Cancelled(summary));
                }
                let Some(row) = source.next_row()? else {
                    break;
                };
                import_row(store, row, &mut summary).inspect_err(|e| {
                    warn!(row = summary.rows + 1, error = %e, "import failed");
                })?;
                summary.rows += 1;
                if let Some(report) = progress.as_mut() {
                    report(summary.rows);
                }
            }
            Ok(ImportOutcome::Completed(summary))
        })?;

        let summary = outcome.summary();
        if summary.written() > 0 {
            store.notify_data_changed();
        }
        info!(
            rows = summary.rows,
            categories = summary.categories,
            items = summary.items,
            skipped = summary.skipped,
            cancelled = outcome.is_cancelled(),
            "import finished"
        );
        Ok(outcome)
    }
}

impl<S: ItemSource + 'static> ImportTask<S> {
    /// Moves the store to a worker thread for the duration of the import.
    /// The store comes back through [`ImportHandle::join`].
    pub fn spawn(mut self, mut store: LedgerStore) -> ImportHandle {
        let cancel = self.cancel.clone();
        let handle = thread::spawn(move || {
            let result = self.run(&mut store);
            (store, result)
        });
        ImportHandle { cancel, handle }
    }
}

fn import_row(
    store: &mut LedgerStore,
    row: SourceRow,
    summary: &mut ImportSummary,
) -> LedgerResult<()> {
    match row {
        SourceRow::Category { id, name } => {
            if name.trim().is_empty() || store.category(id)?.is_some() {
                debug!(id, "skipping category row");
                summary.skipped += 1;
            } else {
                store.add_category_silently(&Category::with_id(id, name))?;
                summary.categories += 1;
            }
        }
        SourceRow::Item {
            date,
            cost,
            category_id,
            category_label,
            comment,
        } => {
            // items may name a category the category rows never declared
            if !category_label.trim().is_empty() && store.category(category_id)?.is_none() {
                store.add_category_silently(&Category::with_id(category_id, category_label))?;
                summary.categories += 1;
            }
            let item = SpendingItem::new(date, cost, category_id, comment)?;
            store.add_item_silently(&item)?;
            summary.items += 1;
        }
        SourceRow::Blank => summary.skipped += 1,
    }
    Ok(())
}

pub struct ImportHandle {
    cancel: CancelToken,
    handle: JoinHandle<(LedgerStore, LedgerResult<ImportOutcome>)>,
}

impl ImportHandle {
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits up to `timeout` for the worker, cancels it if it is still
    /// running by then, and hands the store back. Rows processed before the
    /// cancellation are kept.
    pub fn join_timeout(self, timeout: Duration) -> (LedgerStore, LedgerResult<ImportOutcome>) {
        let deadline = Instant::now() + timeout;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                warn!(?timeout, "import timed out, cancelling");
                self.cancel();
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
        self.join()
    }

    /// Waits for the worker and hands the store back.
    pub fn join(self) -> (LedgerStore, LedgerResult<ImportOutcome>) {
        match self.handle.join() {
            Ok(done) => done,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
