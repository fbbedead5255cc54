// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::LedgerStore;
use crate::models::Category;
use crate::utils::pretty_table;
use anyhow::Result;

pub fn handle(store: &mut LedgerStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let category = match sub.get_one::<i64>("id") {
                Some(id) => Category::with_id(*id, name),
                None => Category::new(name),
            };
            let id = store.add_category(&category)?;
            println!("Added category '{}' (id {})", name, id);
        }
        Some(("list", _)) => {
            let data: Vec<Vec<String>> = store
                .query_categories()?
                .into_iter()
                .map(|c| {
                    vec![
                        c.id.map(|id| id.to_string()).unwrap_or_default(),
                        c.name,
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["ID", "Category"], data));
        }
        _ => {}
    }
    Ok(())
}
