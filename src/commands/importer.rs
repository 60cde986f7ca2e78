// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::transactions::print_transactions;
use crate::ingest::{self, schemas::SchemaRegistry};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use std::fs::File;
use std::io::BufReader;

pub fn handle(conn: &mut Connection, registry: &SchemaRegistry, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(conn, registry, sub),
        Some(("schemas", _)) => {
            println!("{}", serde_json::to_string_pretty(&registry.descriptors())?);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn import_transactions(
    conn: &mut Connection,
    registry: &SchemaRegistry,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let account_id = *sub
        .get_one::<i64>("account-id")
        .ok_or_else(|| anyhow!("--account-id is required"))?;
    let schema = sub.get_one::<String>("schema").map_or("", |s| s.as_str());
    let path = sub.get_one::<String>("path").map_or("", |s| s.trim());
    let file = File::open(path).with_context(|| format!("Open CSV {}", path))?;

    let created = ingest::ingest(conn, registry, BufReader::new(file), schema, account_id)
        .with_context(|| format!("Import {} as {}", path, schema))?;
    if !sub.get_flag("json") && !sub.get_flag("jsonl") {
        println!("Imported {} transactions from {}", created.len(), path);
    }
    print_transactions(sub, &created)
}
