// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Budget, BudgetMetrics};
use crate::store::{self, BudgetInput};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => {
            let b = store::insert_budget(conn, &input(sub)?)?;
            print_budgets(conn, sub, vec![b])?;
        }
        Some(("update", sub)) => {
            let id = *sub
                .get_one::<i64>("id")
                .ok_or_else(|| anyhow!("budget id is required"))?;
            let b = store::update_budget(conn, id, &input(sub)?)?;
            print_budgets(conn, sub, vec![b])?;
        }
        Some(("show", sub)) => {
            let id = *sub
                .get_one::<i64>("id")
                .ok_or_else(|| anyhow!("budget id is required"))?;
            let b = store::get_budget(conn, id)?;
            print_budgets(conn, sub, vec![b])?;
        }
        Some(("list", sub)) => {
            let budgets = store::list_budgets(conn, sub.get_one::<i64>("user-id").copied())?;
            print_budgets(conn, sub, budgets)?;
        }
        _ => {}
    }
    Ok(())
}

/// Only the flags that were given; `update` leaves the rest untouched.
fn input(sub: &clap::ArgMatches) -> Result<BudgetInput> {
    Ok(BudgetInput {
        name: sub.get_one::<String>("name").cloned(),
        description: sub.get_one::<String>("description").cloned(),
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        user_id: sub.get_one::<i64>("user-id").copied(),
        category_id: sub.get_one::<i64>("category-id").copied(),
        start_date: sub
            .get_one::<String>("start")
            .map(|s| parse_date(s))
            .transpose()?,
        end_date: sub
            .get_one::<String>("end")
            .map(|s| parse_date(s))
            .transpose()?,
    })
}

#[derive(Serialize)]
pub struct BudgetReport {
    #[serde(flatten)]
    pub budget: Budget,
    #[serde(flatten)]
    pub metrics: BudgetMetrics,
}

pub fn report(conn: &Connection, budget: Budget) -> Result<BudgetReport> {
    let spent = store::budget_spent(conn, &budget)?;
    let metrics = budget.metrics(spent, chrono::Local::now().date_naive());
    Ok(BudgetReport { budget, metrics })
}

fn print_budgets(conn: &Connection, sub: &clap::ArgMatches, budgets: Vec<Budget>) -> Result<()> {
    let reports = budgets
        .into_iter()
        .map(|b| report(conn, b))
        .collect::<Result<Vec<_>>>()?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &reports)? {
        let rows = reports
            .iter()
            .map(|r| {
                vec![
                    r.budget.id.to_string(),
                    r.budget.name.clone(),
                    format!("{} .. {}", r.budget.start_date, r.budget.end_date),
                    format!("{:.2}", r.budget.amount),
                    format!("{:.2}", r.metrics.spent),
                    format!("{:.2}", r.metrics.remaining),
                    format!("{:.2}%", r.metrics.progress_percentage),
                    if r.metrics.over_budget { "over".into() } else { String::new() },
                    r.metrics.days_remaining.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Window", "Budget", "Spent", "Remaining", "Progress", "", "Days left"],
                rows,
            )
        );
    }
    Ok(())
}
