// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{self, SummaryFilter};
use crate::config::Settings;
use crate::store;
use crate::utils::{maybe_print_json, parse_range, pretty_table};
use anyhow::{Result, anyhow};
use chrono::Datelike;
use rusqlite::Connection;

pub fn handle(conn: &Connection, settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("percentage", sub)) => percentage(conn, settings, sub)?,
        Some(("week", sub)) => week(conn, sub)?,
        Some(("histogram", sub)) => histogram(conn, sub)?,
        Some(("summary", sub)) => summary(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Account id from the arguments, checked against the store.
fn account_id(conn: &Connection, sub: &clap::ArgMatches) -> Result<i64> {
    let id = *sub
        .get_one::<i64>("account-id")
        .ok_or_else(|| anyhow!("--account-id is required"))?;
    store::get_account(conn, id)?;
    Ok(id)
}

fn filter(sub: &clap::ArgMatches) -> Result<SummaryFilter> {
    let raw = sub.get_one::<String>("filter").map_or("category", |s| s.as_str());
    Ok(raw.parse::<SummaryFilter>()?)
}

fn range(sub: &clap::ArgMatches) -> Result<Option<(chrono::NaiveDate, chrono::NaiveDate)>> {
    parse_range(
        sub.get_one::<String>("from"),
        sub.get_one::<String>("to"),
        sub.get_flag("unix-time"),
    )
}

fn percentage(conn: &Connection, settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let id = account_id(conn, sub)?;
    let SummaryFilter::Category = filter(sub)?;
    let limit = sub
        .get_one::<u32>("limit")
        .copied()
        .filter(|l| *l > 0)
        .unwrap_or(settings.percentage_limit);
    let shares = aggregate::percentage_by_category(conn, id, limit as usize, range(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &shares)? {
        let rows = shares
            .into_iter()
            .map(|s| vec![s.name, format!("{:.2}", s.amount), format!("{:.2}%", s.percentage)])
            .collect();
        println!("{}", pretty_table(&["Category", "Total", "Share"], rows));
    }
    Ok(())
}

fn week(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = account_id(conn, sub)?;
    let today = chrono::Local::now().date_naive();
    let stats = aggregate::account_statistics(conn, id, today)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &stats)? {
        let w = stats.transactions.this_week_vs_last_week;
        println!(
            "{}",
            pretty_table(
                &["This week", "Last week", "Change", "Change %"],
                vec![vec![
                    format!("{:.2}", w.this_week),
                    format!("{:.2}", w.last_week),
                    format!("{:.2}", w.change),
                    format!("{:.2}%", w.percentage_change),
                ]],
            )
        );
    }
    Ok(())
}

fn histogram(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = account_id(conn, sub)?;
    let year = sub
        .get_one::<i32>("year")
        .copied()
        .unwrap_or_else(|| chrono::Local::now().year());
    let h = aggregate::histogram(conn, id, year)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &h)? {
        let mut headers = vec!["Month"];
        headers.extend(h.meta.transaction_types.iter().map(String::as_str));
        let rows = h
            .data
            .iter()
            .map(|bucket| {
                let mut row = vec![bucket.month.clone()];
                row.extend(h.meta.transaction_types.iter().map(|ty| {
                    bucket
                        .amounts
                        .get(ty)
                        .map(|a| format!("{:.2}", a))
                        .unwrap_or_default()
                }));
                row
            })
            .collect();
        println!("{}", pretty_table(&headers, rows));
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = account_id(conn, sub)?;
    let SummaryFilter::Category = filter(sub)?;
    let totals = aggregate::category_totals(conn, id, range(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &totals)? {
        let rows = totals
            .into_iter()
            .map(|t| vec![t.name, format!("{:.2}", t.amount)])
            .collect();
        println!("{}", pretty_table(&["Category", "Total"], rows));
    }
    Ok(())
}
