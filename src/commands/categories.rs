// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::taxonomy::{self, Namespace};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").map_or("", |s| s.as_str());
            let description = sub.get_one::<String>("description").map_or("", |s| s.as_str());
            let ns = Namespace::new(
                sub.get_one::<String>("context").map_or("accounts", |s| s.as_str()),
                sub.get_one::<String>("context-type")
                    .map_or("transaction_categories", |s| s.as_str()),
            );
            let c = taxonomy::create(conn, name, description, ns)?;
            println!(
                "Added '{}' (#{}) to {}/{}",
                c.name, c.id, c.context, c.context_type
            );
        }
        Some(("list", sub)) => {
            let items = taxonomy::list(
                conn,
                sub.get_one::<String>("context").map(|s| s.as_str()),
                sub.get_one::<String>("context-type").map(|s| s.as_str()),
            )?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let data = items
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name, c.context_type, c.description])
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Context Type", "Description"], data)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
