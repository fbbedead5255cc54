// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use spendbook::ledger::{LedgerEvent, LedgerStore};
use spendbook::{cli, commands, db, utils};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    utils::init_tracing(matches.get_flag("verbose"));

    let path = db::db_path(matches.get_one::<String>("db").map(String::as_str))?;
    let mut store = LedgerStore::new();
    store.subscribe(LedgerEvent::DataChanged, |event, store| {
        tracing::debug!(?event, path = ?store.path(), "ledger data changed");
    });
    store
        .open(&path)
        .with_context(|| format!("Open ledger at {}", path.display()))?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Ledger initialized at {}", path.display());
        }
        Some(("category", sub)) => commands::categories::handle(&mut store, sub)?,
        Some(("item", sub)) => commands::items::handle(&mut store, sub)?,
        Some(("import", sub)) => store = commands::importer::handle(store, sub)?,
        Some(("report", sub)) => commands::reports::handle(&store, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    store.close()?;
    Ok(())
}
