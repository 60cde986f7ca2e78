// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// A range bound given either as `YYYY-MM-DD` or, with `unix`, as seconds since the epoch (UTC).
pub fn parse_date_bound(s: &str, unix: bool) -> Result<NaiveDate> {
    if !unix {
        return parse_date(s);
    }
    let secs: i64 = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid unix timestamp '{}'", s))?;
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| anyhow!("Unix timestamp {} out of range", secs))
}

/// Both bounds or neither; a missing `to` means today.
pub fn parse_range(
    from: Option<&String>,
    to: Option<&String>,
    unix: bool,
) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let Some(from) = from else {
        if to.is_some() {
            return Err(anyhow!("--to requires --from"));
        }
        return Ok(None);
    };
    let from = parse_date_bound(from, unix)?;
    let to = match to {
        Some(t) => parse_date_bound(t, unix)?,
        None => chrono::Utc::now().date_naive(),
    };
    if to < from {
        return Err(anyhow!("Range ends ({}) before it starts ({})", to, from));
    }
    Ok(Some((from, to)))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
