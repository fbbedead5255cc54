// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use spendbook::charts::FULL_CIRCLE;
use spendbook::commands::{categories, importer, items, reports};
use spendbook::ledger::LedgerStore;
use spendbook::models::{Category, SpendingItem, YearMonth};
use std::io::Write;
use tempfile::NamedTempFile;

fn seeded_store() -> LedgerStore {
    let mut store = LedgerStore::new();
    store.open_in_memory().unwrap();
    store.add_category(&Category::new("Food")).unwrap();
    store.add_category(&Category::new("Rent")).unwrap();
    let rows = [
        ("2024-02-10", "12.00", 1, "lunch"),
        ("2024-02-28", "600", 2, "february rent"),
        ("2024-03-02", "7.50", 1, "coffee beans"),
        ("2024-03-15", "45.25", 1, "groceries"),
        ("2024-03-31", "650", 2, "march rent"),
    ];
    for (date, cost, cat, comment) in rows {
        let item = SpendingItem::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            cost.parse().unwrap(),
            cat,
            comment,
        )
        .unwrap();
        store.add_item(&item).unwrap();
    }
    store
}

fn sub_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["spendbook"];
    argv.extend_from_slice(args);
    spendbook::cli::build_cli().get_matches_from(argv)
}

fn leaf<'a>(m: &'a clap::ArgMatches, path: &[&str]) -> &'a clap::ArgMatches {
    path.iter().fold(m, |m, name| match m.subcommand() {
        Some((n, sub)) if n == *name => sub,
        _ => panic!("missing subcommand {}", name),
    })
}

#[test]
fn list_arguments_become_a_filter() {
    let mut store = seeded_store();
    let m = sub_matches(&["item", "list", "--min", "7.50", "--max", " 45.25 ", "--search", "e"]);
    let rows = items::query_rows(&mut store, leaf(&m, &["item", "list"])).unwrap();
    let comments: Vec<&str> = rows.iter().map(|r| r.comment.as_str()).collect();
    assert_eq!(comments, vec!["groceries", "coffee beans"]);
    assert_eq!(store.filter().cost_min, Some(Decimal::new(750, 2)));

    let m = sub_matches(&["item", "list", "--category", "Rent", "--limit", "1"]);
    let rows = items::query_rows(&mut store, leaf(&m, &["item", "list"])).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].comment, "march rent");
    assert_eq!(rows[0].category_name.as_deref(), Some("Rent"));

    let m = sub_matches(&["item", "list", "--from", "2024-03-01", "--to", "2024-03-15"]);
    let rows = items::query_rows(&mut store, leaf(&m, &["item", "list"])).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn unknown_category_filter_is_an_error() {
    let mut store = seeded_store();
    let m = sub_matches(&["item", "list", "--category", "Travel"]);
    assert!(items::query_rows(&mut store, leaf(&m, &["item", "list"])).is_err());
}

#[test]
fn item_commands_edit_and_remove() {
    let mut store = seeded_store();

    let m = sub_matches(&["item", "edit", "--id", "1", "--cost", "13.456", "--category", "2"]);
    items::handle(&mut store, leaf(&m, &["item"])).unwrap();
    let edited = store.item(1).unwrap().unwrap();
    assert_eq!(edited.cost().to_string(), "13.46");
    assert_eq!(edited.category_id, 2);
    assert_eq!(edited.comment, "lunch");

    let m = sub_matches(&["item", "rm", "--id", "1,2", "--id", "99"]);
    items::handle(&mut store, leaf(&m, &["item"])).unwrap();
    assert_eq!(store.items().unwrap().len(), 3);
    assert!(store.item(2).unwrap().is_none());

    let m = sub_matches(&["item", "add", "--date", "2024-04-01", "--cost", "3", "--category", "Food"]);
    items::handle(&mut store, leaf(&m, &["item"])).unwrap();
    assert_eq!(store.items().unwrap()[0].cost().to_string(), "3.00");
}

#[test]
fn category_add_accepts_explicit_ids() {
    let mut store = seeded_store();
    let m = sub_matches(&["category", "add", "--name", " Travel ", "--id", "40"]);
    categories::handle(&mut store, leaf(&m, &["category"])).unwrap();
    assert_eq!(store.category(40).unwrap().unwrap().name, "Travel");

    let m = sub_matches(&["category", "add", "--name", "Gifts"]);
    categories::handle(&mut store, leaf(&m, &["category"])).unwrap();
    assert_eq!(store.category_by_name("Gifts").unwrap().unwrap().id, Some(41));
}

#[test]
fn monthly_report_charts_oldest_month_first() {
    let store = seeded_store();
    let report = reports::monthly_report(&store, 15).unwrap();
    assert_eq!(report.totals.len(), 2);
    assert_eq!(report.totals[0].month, YearMonth::new(2024, 3).unwrap());
    assert_eq!(report.totals[0].total.to_string(), "702.75");
    assert_eq!(report.totals[1].total.to_string(), "612.00");

    assert_eq!(report.chart.max_magnitude, 703.0);
    assert_eq!(report.chart.bars.len(), 2);
    assert_eq!(report.chart.bars[0].label, "Feb");
    assert_eq!(report.chart.bars[1].label, "Mar");
    assert!(report.chart.bars[0].height < report.chart.bars[1].height);
}

#[test]
fn category_report_slices_the_month() {
    let store = seeded_store();
    let report = reports::category_report(&store, YearMonth::new(2024, 3).unwrap()).unwrap();
    let names: Vec<&str> = report
        .totals
        .iter()
        .map(|t| t.category_name.as_str())
        .collect();
    assert_eq!(names, vec!["Food", "Rent"]);
    let chart = report.chart.unwrap();
    assert_eq!(chart.slices.len(), 2);
    assert_eq!(chart.slices[1].end_angle(), FULL_CIRCLE);

    let empty = reports::category_report(&store, YearMonth::new(2023, 12).unwrap()).unwrap();
    assert!(empty.totals.is_empty());
    assert!(empty.chart.is_none());
}

#[test]
fn dashboard_covers_current_and_previous_month() {
    let store = seeded_store();
    let report = reports::dashboard_report(&store, 1, YearMonth::new(2024, 3).unwrap()).unwrap();
    assert_eq!(report.monthly.totals.len(), 1);
    assert_eq!(report.current_month.month, YearMonth::new(2024, 3).unwrap());
    assert_eq!(report.previous_month.month, YearMonth::new(2024, 2).unwrap());
    assert_eq!(report.previous_month.totals.len(), 2);
}

#[test]
fn import_command_reads_csv_files() {
    let mut store = LedgerStore::new();
    store.open_in_memory().unwrap();

    let mut cats = NamedTempFile::new().unwrap();
    writeln!(cats, "id,name\n5,Books\n6,Music").unwrap();
    cats.flush().unwrap();
    let mut items_file = NamedTempFile::new().unwrap();
    writeln!(
        items_file,
        "date,cost,category_id,category,comment\n\
         2024-05-01,19.99,5,Books,novel\n\
         2024-05-02,9.5,6,Music,\n\
         2024-05-03,4,7,Snacks,crisps"
    )
    .unwrap();
    items_file.flush().unwrap();

    let items_path = format!("  {}  ", items_file.path().to_str().unwrap());
    let cats_path = cats.path().to_str().unwrap().to_string();
    let m = sub_matches(&["import", "--items", &items_path, "--categories", &cats_path]);
    let store = importer::handle(store, leaf(&m, &["import"])).unwrap();

    assert_eq!(store.query_categories().unwrap().len(), 3);
    assert_eq!(store.category(7).unwrap().unwrap().name, "Snacks");
    let loaded = store.items().unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[2].cost().to_string(), "19.99");
}

#[test]
fn import_command_accepts_a_timeout() {
    let mut store = LedgerStore::new();
    store.open_in_memory().unwrap();
    let mut items_file = NamedTempFile::new().unwrap();
    writeln!(
        items_file,
        "date,cost,category_id,category,comment\n2024-05-01,0.125,1,Misc,"
    )
    .unwrap();
    items_file.flush().unwrap();

    let path = items_file.path().to_str().unwrap().to_string();
    let m = sub_matches(&["import", "--items", &path, "--timeout", "30"]);
    let store = importer::handle(store, leaf(&m, &["import"])).unwrap();
    let loaded = store.items().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].cost().to_string(), "0.13");
}

#[test]
fn import_command_reports_missing_files() {
    let mut store = LedgerStore::new();
    store.open_in_memory().unwrap();
    let m = sub_matches(&["import", "--items", "/nonexistent/items.csv"]);
    assert!(importer::handle(store, leaf(&m, &["import"])).is_err());
}
