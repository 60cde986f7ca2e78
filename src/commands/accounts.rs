// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Account, AccountKind};
use crate::store::{self, NewAccount};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use std::collections::BTreeMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind = sub
        .get_one::<String>("kind")
        .map(|k| k.parse::<AccountKind>())
        .transpose()
        .map_err(|e| anyhow!(e))?
        .unwrap_or(AccountKind::Bank);
    let new = NewAccount {
        name: sub.get_one::<String>("name").cloned().unwrap_or_default(),
        account_type: sub.get_one::<String>("type").cloned().unwrap_or_default(),
        kind,
        currency: sub.get_one::<String>("currency").cloned().unwrap_or_default(),
        user_id: sub.get_one::<i64>("user-id").copied().unwrap_or_default(),
        balance: parse_decimal(sub.get_one::<String>("balance").map_or("0", |s| s.as_str()))?,
    };
    let account = store::insert_account(conn, &new)?;
    println!(
        "Added account #{} '{}' ({}, {})",
        account.id,
        account.name,
        account.kind(),
        account.currency
    );
    Ok(())
}

fn row(a: &Account) -> Vec<String> {
    vec![
        a.id.to_string(),
        a.name.clone(),
        a.kind().to_string(),
        a.account_type.clone(),
        a.currency.clone(),
        fmt_money(&a.balance, &a.currency),
    ]
}

const HEADERS: [&str; 6] = ["ID", "Name", "Kind", "Type", "CCY", "Balance"];

/// Accounts keyed by kind name; kinds without accounts are omitted.
pub fn group_by_kind(accounts: Vec<Account>) -> BTreeMap<&'static str, Vec<Account>> {
    let mut grouped: BTreeMap<&'static str, Vec<Account>> = BTreeMap::new();
    for a in accounts {
        grouped.entry(a.kind().as_str()).or_default().push(a);
    }
    grouped
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let accounts = store::list_accounts(conn)?;
    if sub.get_flag("by-kind") {
        let grouped = group_by_kind(accounts);
        if !maybe_print_json(json_flag, jsonl_flag, &grouped)? {
            for (kind, members) in grouped {
                println!("{}", kind);
                println!("{}", pretty_table(&HEADERS, members.iter().map(row).collect()));
            }
        }
        return Ok(());
    }
    if !maybe_print_json(json_flag, jsonl_flag, &accounts)? {
        println!("{}", pretty_table(&HEADERS, accounts.iter().map(row).collect()));
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub
        .get_one::<i64>("id")
        .ok_or_else(|| anyhow!("account id is required"))?;
    let account = store::get_account(conn, id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &account)? {
        println!("{}", pretty_table(&HEADERS, vec![row(&account)]));
    }
    Ok(())
}
