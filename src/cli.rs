// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::AccountKind;
use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn account_id_arg() -> Arg {
    Arg::new("account-id")
        .long("account-id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn range_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("from").long("from").help("Start of range (inclusive)"))
        .arg(Arg::new("to").long("to").help("End of range (inclusive), defaults to today"))
        .arg(
            Arg::new("unix-time")
                .long("unix-time")
                .action(ArgAction::SetTrue)
                .help("Read --from/--to as unix timestamps instead of YYYY-MM-DD"),
        )
}

fn budget_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(Arg::new("name").long("name").required(required))
        .arg(Arg::new("description").long("description"))
        .arg(Arg::new("amount").long("amount").required(required))
        .arg(
            Arg::new("user-id")
                .long("user-id")
                .required(required)
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("category-id")
                .long("category-id")
                .required(required)
                .value_parser(value_parser!(i64)),
        )
        .arg(Arg::new("start").long("start").required(required).help("YYYY-MM-DD"))
        .arg(Arg::new("end").long("end").required(required).help("YYYY-MM-DD"))
}

/// Build the command tree. `schemas` lists the importable institutions.
pub fn build_cli(schemas: &[String]) -> Command {
    let kinds: Vec<&'static str> = AccountKind::ALL.iter().map(|k| k.as_str()).collect();

    Command::new("haven")
        .about("Personal finance ledger: accounts, statement imports, reports and budgets")
        .version(clap::crate_version!())
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database if missing"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .default_value("bank")
                                .value_parser(kinds),
                        )
                        .arg(Arg::new("type").long("type").default_value(""))
                        .arg(Arg::new("currency").long("currency").required(true))
                        .arg(
                            Arg::new("user-id")
                                .long("user-id")
                                .default_value("0")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("balance").long("balance").default_value("0")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("by-kind")
                            .long("by-kind")
                            .action(ArgAction::SetTrue)
                            .help("Group accounts by kind"),
                    ),
                ))
                .subcommand(json_flags(
                    Command::new("show").arg(
                        Arg::new("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )),
        )
        .subcommand(
            Command::new("category")
                .about("Manage transaction categories and types")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("description").long("description").default_value(""))
                        .arg(
                            Arg::new("context-type")
                                .long("context-type")
                                .default_value("transaction_categories"),
                        )
                        .arg(Arg::new("context").long("context").default_value("accounts")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("context-type").long("context-type"))
                        .arg(Arg::new("context").long("context").default_value("accounts")),
                )),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and read transactions")
                .subcommand(json_flags(
                    Command::new("add")
                        .arg(account_id_arg())
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").default_value("").help("YYYY-MM-DD"))
                        .arg(Arg::new("description").long("description").default_value(""))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("type").long("type"))
                        .arg(Arg::new("payee").long("payee").default_value(""))
                        .arg(Arg::new("reference").long("reference").default_value(""))
                        .arg(Arg::new("status").long("status").default_value("")),
                ))
                .subcommand(json_flags(
                    Command::new("batch")
                        .about("Create every record in a JSON array file, or none")
                        .arg(Arg::new("path").long("path").required(true)),
                ))
                .subcommand(json_flags(
                    Command::new("show").arg(
                        Arg::new("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ))
                .subcommand(json_flags(
                    Command::new("recent").arg(account_id_arg()).arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(u32)),
                    ),
                ))
                .subcommand(json_flags(range_args(
                    Command::new("list")
                        .arg(account_id_arg())
                        .arg(Arg::new("page").long("page").value_parser(value_parser!(i64)))
                        .arg(Arg::new("limit").long("limit").value_parser(value_parser!(i64)))
                        .arg(
                            Arg::new("desc")
                                .long("desc")
                                .action(ArgAction::SetTrue)
                                .help("Newest first"),
                        ),
                )))
                .subcommand(
                    Command::new("tag")
                        .about("Attach tags to a transaction")
                        .subcommand(
                            Command::new("add")
                                .arg(
                                    Arg::new("id")
                                        .required(true)
                                        .value_parser(value_parser!(i64)),
                                )
                                .arg(Arg::new("name").required(true)),
                        )
                        .subcommand(json_flags(
                            Command::new("list").arg(
                                Arg::new("id")
                                    .required(true)
                                    .value_parser(value_parser!(i64)),
                            ),
                        )),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import bank statements")
                .subcommand(json_flags(
                    Command::new("transactions")
                        .arg(account_id_arg())
                        .arg(
                            Arg::new("schema")
                                .long("schema")
                                .required(true)
                                .help(format!("Institution schema: {}", schemas.join(", "))),
                        )
                        .arg(Arg::new("path").long("path").required(true)),
                ))
                .subcommand(Command::new("schemas").about("Print the import schema catalog as JSON")),
        )
        .subcommand(
            Command::new("report")
                .about("Account statistics")
                .subcommand(json_flags(range_args(
                    Command::new("percentage")
                        .arg(account_id_arg())
                        .arg(Arg::new("limit").long("limit").value_parser(value_parser!(u32)))
                        .arg(Arg::new("filter").long("filter").default_value("category")),
                )))
                .subcommand(json_flags(Command::new("week").arg(account_id_arg())))
                .subcommand(json_flags(
                    Command::new("histogram")
                        .arg(account_id_arg())
                        .arg(Arg::new("year").long("year").value_parser(value_parser!(i32))),
                ))
                .subcommand(json_flags(range_args(
                    Command::new("summary")
                        .arg(account_id_arg())
                        .arg(
                            Arg::new("filter")
                                .long("filter")
                                .default_value("transaction_category"),
                        ),
                ))),
        )
        .subcommand(
            Command::new("budget")
                .about("Manage budgets")
                .subcommand(json_flags(budget_fields(Command::new("create"), true)))
                .subcommand(json_flags(budget_fields(
                    Command::new("update").arg(
                        Arg::new("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                    false,
                )))
                .subcommand(json_flags(
                    Command::new("show").arg(
                        Arg::new("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ))
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("user-id")
                            .long("user-id")
                            .value_parser(value_parser!(i64)),
                    ),
                )),
        )
}
