// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::charts::{
    BarChart, BarLayout, HorizontalAnchor, PieChart, PieLayout, VerticalAnchor, category_series,
    monthly_series,
};
use crate::ledger::{DEFAULT_MONTH_LIMIT, LedgerStore};
use crate::models::{CategoryMonthlyTotal, MonthlyTotal, YearMonth};
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use serde::Serialize;

pub fn handle(store: &LedgerStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("monthly", sub)) => monthly(store, sub)?,
        Some(("categories", sub)) => categories(store, sub)?,
        Some(("dashboard", sub)) => dashboard(store, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub totals: Vec<MonthlyTotal>,
    pub chart: BarChart,
}

#[derive(Debug, Serialize)]
pub struct CategoryReport {
    pub month: YearMonth,
    pub totals: Vec<CategoryMonthlyTotal>,
    /// Absent when nothing was spent that month.
    pub chart: Option<PieChart>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub monthly: MonthlyReport,
    pub current_month: CategoryReport,
    pub previous_month: CategoryReport,
}

pub fn monthly_report(store: &LedgerStore, months: usize) -> Result<MonthlyReport> {
    let totals = store.monthly_totals(months)?;
    let chart = BarLayout::default().layout(&monthly_series(&totals))?;
    Ok(MonthlyReport { totals, chart })
}

pub fn category_report(store: &LedgerStore, month: YearMonth) -> Result<CategoryReport> {
    let totals = store.category_totals_for_month(month)?;
    let series = category_series(&totals);
    let chart = if series.iter().any(|(v, _)| *v > 0.0) {
        Some(PieLayout::default().layout(&series)?)
    } else {
        None
    };
    Ok(CategoryReport {
        month,
        totals,
        chart,
    })
}

pub fn dashboard_report(store: &LedgerStore, months: usize, today: YearMonth) -> Result<Dashboard> {
    Ok(Dashboard {
        monthly: monthly_report(store, months)?,
        current_month: category_report(store, today)?,
        previous_month: category_report(store, today.previous())?,
    })
}

fn this_month() -> YearMonth {
    YearMonth::from_date(chrono::Local::now().date_naive())
}

fn months_arg(sub: &clap::ArgMatches) -> usize {
    sub.get_one::<usize>("months")
        .copied()
        .unwrap_or(DEFAULT_MONTH_LIMIT)
}

fn monthly(store: &LedgerStore, sub: &clap::ArgMatches) -> Result<()> {
    let report = monthly_report(store, months_arg(sub))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        print_monthly(&report);
    }
    Ok(())
}

fn categories(store: &LedgerStore, sub: &clap::ArgMatches) -> Result<()> {
    let month = match sub.get_one::<String>("month") {
        Some(raw) => parse_month(raw)?,
        None => this_month(),
    };
    let report = category_report(store, month)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        print_categories(&report);
    }
    Ok(())
}

fn dashboard(store: &LedgerStore, sub: &clap::ArgMatches) -> Result<()> {
    let report = dashboard_report(store, months_arg(sub), this_month())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        print_monthly(&report.monthly);
        print_categories(&report.current_month);
        print_categories(&report.previous_month);
    }
    Ok(())
}

fn print_monthly(report: &MonthlyReport) {
    // bars are listed oldest first, totals newest first
    let data: Vec<Vec<String>> = report
        .totals
        .iter()
        .rev()
        .zip(&report.chart.bars)
        .map(|(t, bar)| {
            vec![
                t.month.to_string(),
                fmt_money(&t.total),
                format!("{:.1}", bar.height),
                "█".repeat((bar.height / 10.0).round() as usize),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Total", "Bar height", ""], data)
    );
}

fn print_categories(report: &CategoryReport) {
    let Some(chart) = &report.chart else {
        println!("No spending recorded in {}", report.month);
        return;
    };
    let data: Vec<Vec<String>> = report
        .totals
        .iter()
        .zip(&chart.slices)
        .map(|(t, slice)| {
            let anchor = slice
                .label_anchor
                .map(|a| {
                    let h = match a.horizontal {
                        HorizontalAnchor::Left => "left",
                        HorizontalAnchor::Right => "right",
                    };
                    let v = match a.vertical {
                        VerticalAnchor::Top => "top",
                        VerticalAnchor::Bottom => "bottom",
                    };
                    format!("({:.0}, {:.0}) {}/{}", a.x, a.y, v, h)
                })
                .unwrap_or_default();
            vec![
                t.category_name.clone(),
                fmt_money(&t.total),
                format!("{:.1}°", slice.span_angle as f64 / 16.0),
                slice.color.hex(),
                anchor,
            ]
        })
        .collect();
    println!("{}", report.month);
    println!(
        "{}",
        pretty_table(&["Category", "Total", "Share", "Color", "Label"], data)
    );
}
