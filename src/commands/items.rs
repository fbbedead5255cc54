// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::filter::FilterPredicate;
use crate::ledger::LedgerStore;
use crate::models::SpendingItem;
use crate::utils::{
    fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table, resolve_category,
};
use anyhow::{Result, anyhow};

pub fn handle(store: &mut LedgerStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        Some(("rm", sub)) => remove(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(store: &mut LedgerStore, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let cost = parse_decimal(sub.get_one::<String>("cost").unwrap())?;
    let category_id = resolve_category(store, sub.get_one::<String>("category").unwrap())?;
    let comment = sub
        .get_one::<String>("comment")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let item = SpendingItem::new(date, cost, category_id, comment)?;
    let id = store.add_item(&item)?;
    println!("Recorded {} on {} (id {})", fmt_money(&item.cost()), date, id);
    Ok(())
}

fn edit(store: &mut LedgerStore, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut item = store
        .item(id)?
        .ok_or_else(|| anyhow!("Spending item {} not found", id))?;

    if let Some(raw) = sub.get_one::<String>("date") {
        item.date = parse_date(raw)?;
    }
    if let Some(raw) = sub.get_one::<String>("cost") {
        item.set_cost(parse_decimal(raw)?)?;
    }
    if let Some(raw) = sub.get_one::<String>("category") {
        item.category_id = resolve_category(store, raw)?;
    }
    if let Some(raw) = sub.get_one::<String>("comment") {
        item.comment = raw.trim().to_string();
    }
    store.update_item(&item)?;
    println!("Updated item {}", id);
    Ok(())
}

fn remove(store: &mut LedgerStore, sub: &clap::ArgMatches) -> Result<()> {
    let ids: Vec<i64> = sub
        .get_many::<i64>("id")
        .map(|v| v.copied().collect())
        .unwrap_or_default();
    let removed = store.delete_items(&ids)?;
    println!("Removed {} of {} item(s)", removed, ids.len());
    Ok(())
}

/// Turns `item list` arguments into a filter predicate. Blank values leave
/// the field unconstrained.
pub fn predicate_from_args(store: &LedgerStore, sub: &clap::ArgMatches) -> Result<FilterPredicate> {
    let arg = |name: &str| {
        sub.get_one::<String>(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    };
    let date_min = arg("from").map(parse_date).transpose()?;
    let date_max = arg("to").map(parse_date).transpose()?;
    let cost_min = arg("min").map(parse_decimal).transpose()?;
    let cost_max = arg("max").map(parse_decimal).transpose()?;
    let category_id = arg("category")
        .map(|c| resolve_category(store, c))
        .transpose()?;
    let comment = arg("search").map(str::to_string);

    Ok(FilterPredicate::new()
        .with_dates(date_min, date_max)
        .with_costs(cost_min, cost_max)
        .with_category(category_id)
        .with_comment(comment))
}

pub fn query_rows(store: &mut LedgerStore, sub: &clap::ArgMatches) -> Result<Vec<SpendingItem>> {
    let predicate = predicate_from_args(store, sub)?;
    store.set_filter(predicate);
    let mut items = store.items()?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        items.truncate(*limit);
    }
    Ok(items)
}

fn list(store: &mut LedgerStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(store, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.map(|id| id.to_string()).unwrap_or_default(),
                    r.date.to_string(),
                    fmt_money(&r.cost()),
                    r.category_name.clone().unwrap_or_default(),
                    r.comment.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Cost", "Category", "Comment"], rows)
        );
    }
    Ok(())
}
