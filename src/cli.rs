// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn months_arg() -> Arg {
    Arg::new("months")
        .long("months")
        .value_parser(value_parser!(usize))
        .help("Number of most recent months (default 15)")
}

pub fn build_cli() -> Command {
    Command::new("spendbook")
        .about("Personal expense ledger: items, categories, filters and monthly charts")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Ledger database file (overrides SPENDBOOK_DB)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log ledger activity to stderr"),
        )
        .subcommand(Command::new("init").about("Create the ledger database"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .value_parser(value_parser!(i64))
                                .help("Explicit category id"),
                        ),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("item")
                .about("Add, edit, remove and list spending items")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("cost").long("cost").required(true))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .required(true)
                                .help("Category name or id"),
                        )
                        .arg(Arg::new("comment").long("comment")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("cost").long("cost"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("comment").long("comment")),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .action(ArgAction::Append)
                            .value_delimiter(',')
                            .value_parser(value_parser!(i64))
                            .help("Item id; repeat or comma-separate for several"),
                    ),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(Arg::new("from").long("from").help("Earliest date, inclusive"))
                        .arg(Arg::new("to").long("to").help("Latest date, inclusive"))
                        .arg(Arg::new("min").long("min").help("Smallest cost, inclusive"))
                        .arg(Arg::new("max").long("max").help("Largest cost, inclusive"))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("Category name or id"),
                        )
                        .arg(
                            Arg::new("search")
                                .long("search")
                                .help("Substring of the comment"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("import")
                .about("Bulk-load categories and items from CSV files")
                .arg(
                    Arg::new("items")
                        .long("items")
                        .required(true)
                        .help("CSV with date,cost,category_id,category,comment"),
                )
                .arg(
                    Arg::new("categories")
                        .long("categories")
                        .help("CSV with id,name"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_parser(value_parser!(u64))
                        .help("Stop after this many seconds, keeping the rows loaded so far"),
                )
                .arg(
                    Arg::new("interactive")
                        .long("interactive")
                        .action(ArgAction::SetTrue)
                        .help("Stop the import when Enter is pressed"),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Monthly and per-category spending charts")
                .subcommand(json_args(
                    Command::new("monthly").arg(months_arg()),
                ))
                .subcommand(json_args(
                    Command::new("categories")
                        .arg(Arg::new("month").long("month").help("YYYY-MM, default current month")),
                ))
                .subcommand(json_args(
                    Command::new("dashboard").arg(months_arg()),
                )),
        )
}
