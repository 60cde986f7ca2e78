// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::models::{Transaction, TransactionResponse};
use crate::pagination::{PageRequest, SortOrder, paginate};
use crate::store::{self, AccountHistory, TransactionInput};
use crate::utils::{maybe_print_json, parse_decimal, parse_range, pretty_table};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use std::fs;

pub fn handle(conn: &mut Connection, settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("batch", sub)) => batch(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("recent", sub)) => recent(conn, settings, sub)?,
        Some(("list", sub)) => list(conn, settings, sub)?,
        Some(("tag", sub)) => tag(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn text(sub: &clap::ArgMatches, id: &str) -> String {
    sub.get_one::<String>(id).cloned().unwrap_or_default()
}

fn required_id(sub: &clap::ArgMatches, id: &str) -> Result<i64> {
    sub.get_one::<i64>(id)
        .copied()
        .ok_or_else(|| anyhow!("--{} is required", id))
}

pub fn print_transactions(sub: &clap::ArgMatches, items: &[Transaction]) -> Result<()> {
    let body: Vec<TransactionResponse> = items.iter().map(TransactionResponse::from).collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &body)? {
        let rows = items
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    t.description.clone(),
                    format!("{:.2}", t.amount),
                    t.currency.clone(),
                    t.category.clone(),
                    t.transaction_type.clone(),
                    t.reference.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Description", "Amount", "CCY", "Category", "Type", "Reference"],
                rows,
            )
        );
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let input = TransactionInput {
        account_id: required_id(sub, "account-id")?,
        amount: parse_decimal(&text(sub, "amount"))?,
        currency: sub.get_one::<String>("currency").cloned(),
        date: text(sub, "date"),
        description: text(sub, "description"),
        category: sub.get_one::<String>("category").cloned(),
        transaction_type: sub.get_one::<String>("type").cloned(),
        payee: text(sub, "payee"),
        reference: text(sub, "reference"),
        status: text(sub, "status"),
    };
    let created = store::create_transactions(conn, std::slice::from_ref(&input))?;
    print_transactions(sub, &created)
}

fn batch(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = text(sub, "path");
    let raw = fs::read_to_string(path.trim()).with_context(|| format!("Read {}", path))?;
    let inputs: Vec<TransactionInput> =
        serde_json::from_str(&raw).with_context(|| format!("Parse transaction records in {}", path))?;
    let created = store::create_transactions(conn, &inputs)?;
    tracing::info!(created = created.len(), "created transactions from batch file");
    print_transactions(sub, &created)
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let t = store::get_transaction(conn, required_id(sub, "id")?)?;
    print_transactions(sub, &[t])
}

fn recent(conn: &Connection, settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let limit = sub
        .get_one::<u32>("limit")
        .copied()
        .unwrap_or(settings.recent_limit);
    let items = store::recent_transactions(conn, required_id(sub, "account-id")?, limit)?;
    print_transactions(sub, &items)
}

fn list(conn: &Connection, settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = required_id(sub, "account-id")?;
    // surfaces a missing account instead of an empty page
    store::get_account(conn, account_id)?;

    let mut history = AccountHistory::new(account_id);
    if let Some((from, to)) = parse_range(
        sub.get_one::<String>("from"),
        sub.get_one::<String>("to"),
        sub.get_flag("unix-time"),
    )? {
        history = history.between(from, to);
    }
    if sub.get_flag("desc") {
        history.order = SortOrder::Desc;
    }
    let req = PageRequest::new(
        sub.get_one::<i64>("page").copied(),
        sub.get_one::<i64>("limit").copied(),
        settings.page_limit,
    );
    let page = paginate(conn, &history, req)?;

    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    if json_flag || jsonl_flag {
        maybe_print_json(json_flag, jsonl_flag, &page.map(|t| TransactionResponse::from(t)))?;
        return Ok(());
    }
    print_transactions(sub, &page.results)?;
    let m = page.meta;
    println!(
        "Page {} of {} ({} transactions) prev: {} next: {}",
        m.page, m.last_page, m.total_count, m.prev_page, m.next_page
    );
    Ok(())
}

fn tag(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let id = required_id(sub, "id")?;
            let tag = store::tag_transaction(conn, id, &text(sub, "name"))?;
            println!("Tagged transaction #{} with '{}'", id, tag.name);
        }
        Some(("list", sub)) => {
            let tags = store::transaction_tags(conn, required_id(sub, "id")?)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &tags)? {
                let rows = tags
                    .into_iter()
                    .map(|t| vec![t.id.to_string(), t.name])
                    .collect();
                println!("{}", pretty_table(&["ID", "Tag"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
