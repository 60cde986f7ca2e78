// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only summaries over one account's transactions.
//!
//! SQL only selects and filters; sums are done with `Decimal` so totals stay
//! exact. Weeks run Sunday through Saturday.

use crate::error::{LedgerError, Result, StorageContext};
use crate::store::{accumulate, decimal_col};
use chrono::{Datelike, Days, Month, NaiveDate};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub name: String,
    pub amount: Decimal,
    pub percentage: Decimal,
}

/// `part / whole * 100` to two places; zero when `whole` is zero or the
/// share does not fit in a `Decimal`.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    match part
        .checked_div(whole)
        .and_then(|q| q.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(p) => p.round_dp(2),
        None => {
            tracing::warn!(%part, %whole, "percentage out of range, using zero");
            Decimal::ZERO
        }
    }
}

/// Grouping selector accepted by the category reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFilter {
    Category,
}

impl FromStr for SummaryFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" | "transaction_category" => Ok(SummaryFilter::Category),
            other => Err(LedgerError::Validation(format!(
                "unsupported filter '{}', expected 'category'",
                other
            ))),
        }
    }
}

/// Per-category sums for one account, optionally bounded to an inclusive date range.
pub fn category_totals(
    conn: &Connection,
    account_id: i64,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<CategoryTotal>> {
    let (from, to) = range.unzip();
    let mut stmt = conn
        .prepare(
            "SELECT c.name, t.amount FROM transactions t
             JOIN categories c ON t.category_id=c.id
             WHERE t.account_id=?1 AND (?2 IS NULL OR t.date BETWEEN ?2 AND ?3)",
        )
        .during("group transactions by category")?;
    let mut rows = stmt
        .query(params![account_id, from, to])
        .during("group transactions by category")?;
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    while let Some(r) = rows.next().during("group transactions by category")? {
        let name: String = r.get(0).during("group transactions by category")?;
        let amount = decimal_col(r, 1).during("group transactions by category")?;
        accumulate(totals.entry(name).or_insert(Decimal::ZERO), amount)?;
    }
    tracing::debug!(account_id, categories = totals.len(), "grouped transactions by category");
    Ok(totals
        .into_iter()
        .map(|(name, amount)| CategoryTotal { name, amount })
        .collect())
}

/// Top `limit` categories by total, each as a share of the grand total of all of them.
pub fn top_shares(totals: &[CategoryTotal], limit: usize) -> Result<Vec<CategoryShare>> {
    let mut grand_total = Decimal::ZERO;
    for t in totals {
        accumulate(&mut grand_total, t.amount)?;
    }
    let mut ranked: Vec<&CategoryTotal> = totals.iter().collect();
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    Ok(ranked
        .into_iter()
        .take(limit)
        .map(|t| CategoryShare {
            name: t.name.clone(),
            amount: t.amount,
            percentage: percentage_of(t.amount, grand_total),
        })
        .collect())
}

pub fn percentage_by_category(
    conn: &Connection,
    account_id: i64,
    limit: usize,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<CategoryShare>> {
    let totals = category_totals(conn, account_id, range)?;
    top_shares(&totals, limit)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekComparison {
    pub this_week: Decimal,
    pub last_week: Decimal,
    pub change: Decimal,
    pub percentage_change: Decimal,
}

impl WeekComparison {
    pub fn from_totals(this_week: Decimal, last_week: Decimal) -> Result<Self> {
        let this_week = this_week.round_dp(2);
        let last_week = last_week.round_dp(2);
        let change = this_week
            .checked_sub(last_week)
            .ok_or_else(|| LedgerError::Validation("weekly change is out of range".into()))?;
        Ok(WeekComparison {
            this_week,
            last_week,
            change,
            // relative to the size of last week so the sign follows `change`
            percentage_change: percentage_of(change, last_week.abs()),
        })
    }
}

/// Sunday and Saturday of the week containing `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let back = day.weekday().num_days_from_sunday() as u64;
    let start = day - Days::new(back);
    (start, start + Days::new(6))
}

pub fn week_comparison(conn: &Connection, account_id: i64, today: NaiveDate) -> Result<WeekComparison> {
    let (this_start, this_end) = week_bounds(today);
    let last_start = this_start - Days::new(7);
    let mut stmt = conn
        .prepare(
            "SELECT date, amount FROM transactions
             WHERE account_id=?1 AND date BETWEEN ?2 AND ?3",
        )
        .during("compare weekly totals")?;
    let mut rows = stmt
        .query(params![account_id, last_start, this_end])
        .during("compare weekly totals")?;
    let (mut this_week, mut last_week) = (Decimal::ZERO, Decimal::ZERO);
    while let Some(r) = rows.next().during("compare weekly totals")? {
        let date: NaiveDate = r.get(0).during("compare weekly totals")?;
        let amount = decimal_col(r, 1).during("compare weekly totals")?;
        if date >= this_start {
            accumulate(&mut this_week, amount)?;
        } else {
            accumulate(&mut last_week, amount)?;
        }
    }
    WeekComparison::from_totals(this_week, last_week)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionStatistics {
    pub this_week_vs_last_week: WeekComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatistics {
    pub transactions: TransactionStatistics,
}

pub fn account_statistics(conn: &Connection, account_id: i64, today: NaiveDate) -> Result<AccountStatistics> {
    Ok(AccountStatistics {
        transactions: TransactionStatistics {
            this_week_vs_last_week: week_comparison(conn, account_id, today)?,
        },
    })
}

/// Sum of one transaction type within one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTypeTotal {
    pub year: i32,
    pub month: u32,
    pub transaction_type: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub month: String,
    #[serde(rename = "monthNumber")]
    pub month_number: u32,
    /// One entry per transaction type seen in the month.
    #[serde(flatten)]
    pub amounts: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramMeta {
    pub transaction_types: Vec<String>,
    pub colors: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub data: Vec<MonthBucket>,
    pub meta: HistogramMeta,
}

pub fn transaction_type_colors() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("debit", "#FDA403"),
        ("credit", "#898121"),
        ("deposit", "#E5C287"),
        ("withdraw", "#E8751A"),
    ])
}

pub fn monthly_type_totals(conn: &Connection, account_id: i64, year: i32) -> Result<Vec<MonthlyTypeTotal>> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let last = NaiveDate::from_ymd_opt(year, 12, 31);
    let (Some(first), Some(last)) = (first, last) else {
        return Ok(Vec::new());
    };
    let mut stmt = conn
        .prepare(
            "SELECT t.date, ty.name, t.amount FROM transactions t
             JOIN categories ty ON t.transaction_type_id=ty.id
             WHERE t.account_id=?1 AND t.date BETWEEN ?2 AND ?3",
        )
        .during("group transactions by month")?;
    let mut rows = stmt
        .query(params![account_id, first, last])
        .during("group transactions by month")?;
    let mut sums: BTreeMap<(u32, String), Decimal> = BTreeMap::new();
    while let Some(r) = rows.next().during("group transactions by month")? {
        let date: NaiveDate = r.get(0).during("group transactions by month")?;
        let ty: String = r.get(1).during("group transactions by month")?;
        let amount = decimal_col(r, 2).during("group transactions by month")?;
        accumulate(sums.entry((date.month(), ty)).or_insert(Decimal::ZERO), amount)?;
    }
    Ok(sums
        .into_iter()
        .map(|((month, transaction_type), amount)| MonthlyTypeTotal {
            year,
            month,
            transaction_type,
            amount,
        })
        .collect())
}

/// Keys a serialized `MonthBucket` already uses for itself.
const BUCKET_KEYS: [&str; 2] = ["month", "monthNumber"];

/// Histogram key for a transaction type; names clashing with `BUCKET_KEYS` get a `type_` prefix.
fn bucket_key(transaction_type: &str) -> String {
    if BUCKET_KEYS.contains(&transaction_type) {
        format!("type_{}", transaction_type)
    } else {
        transaction_type.to_string()
    }
}

/// One bucket per month of `year`, ascending, each holding its per-type sums.
pub fn reshape_histogram(rows: &[MonthlyTypeTotal], year: i32) -> Histogram {
    let mut months: BTreeMap<u32, BTreeMap<String, Decimal>> = BTreeMap::new();
    let mut types = BTreeSet::new();
    for r in rows.iter().filter(|r| r.year == year) {
        let key = bucket_key(&r.transaction_type);
        types.insert(key.clone());
        months.entry(r.month).or_default().insert(key, r.amount);
    }
    let data = months
        .into_iter()
        .map(|(month_number, amounts)| MonthBucket {
            month: u8::try_from(month_number)
                .ok()
                .and_then(|m| Month::try_from(m).ok())
                .map(|m| m.name().to_string())
                .unwrap_or_default(),
            month_number,
            amounts,
        })
        .collect();
    Histogram {
        data,
        meta: HistogramMeta {
            transaction_types: types.into_iter().collect(),
            colors: transaction_type_colors(),
        },
    }
}

pub fn histogram(conn: &Connection, account_id: i64, year: i32) -> Result<Histogram> {
    let rows = monthly_type_totals(conn, account_id, year)?;
    Ok(reshape_histogram(&rows, year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn total(name: &str, amount: Decimal) -> CategoryTotal {
        CategoryTotal {
            name: name.into(),
            amount,
        }
    }

    #[test]
    fn shares_use_grand_total_of_all_categories() {
        let totals = vec![
            total("Rent", dec!(500)),
            total("Food", dec!(300)),
            total("Fuel", dec!(200)),
        ];
        let top = top_shares(&totals, 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Rent");
        assert_eq!(top[0].percentage, dec!(50));
        assert_eq!(top[1].percentage, dec!(30));

        let all: Decimal = top_shares(&totals, 10).unwrap().iter().map(|s| s.percentage).sum();
        assert_eq!(all, dec!(100));
    }

    #[test]
    fn thirds_sum_to_one_hundred_within_rounding() {
        let totals = vec![total("A", dec!(1)), total("B", dec!(1)), total("C", dec!(1))];
        let sum: Decimal = top_shares(&totals, 3).unwrap().iter().map(|s| s.percentage).sum();
        assert!((sum - dec!(100)).abs() <= dec!(0.02));
    }

    #[test]
    fn zero_grand_total_gives_zero_percentages() {
        let totals = vec![total("In", dec!(50)), total("Out", dec!(-50))];
        for s in top_shares(&totals, 5).unwrap() {
            assert_eq!(s.percentage, Decimal::ZERO);
        }
    }

    #[test]
    fn oversized_shares_fall_back_to_zero() {
        let totals = vec![
            total("Salary", dec!(70000000000000000000000000000)),
            total("Rent", dec!(-69999999999999999999999999999)),
        ];
        let top = top_shares(&totals, 5).unwrap();
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|s| s.percentage.is_zero()));
        assert_eq!(percentage_of(dec!(1), dec!(0.0000000000000000000000000001)), Decimal::ZERO);
    }

    #[test]
    fn grand_total_out_of_range_is_rejected() {
        let totals = vec![total("A", Decimal::MAX), total("B", Decimal::MAX)];
        assert!(matches!(top_shares(&totals, 5), Err(LedgerError::Validation(_))));
        assert!(matches!(
            WeekComparison::from_totals(Decimal::MAX, Decimal::MIN),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn week_change_against_last_week() {
        let w = WeekComparison::from_totals(dec!(120.00), dec!(100.00)).unwrap();
        assert_eq!(w.change, dec!(20.00));
        assert_eq!(w.percentage_change, dec!(20.00));
    }

    #[test]
    fn quiet_last_week_gives_zero_percentage() {
        let w = WeekComparison::from_totals(dec!(80), Decimal::ZERO).unwrap();
        assert_eq!(w.change, dec!(80));
        assert_eq!(w.percentage_change, Decimal::ZERO);
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2024-03-13 is a Wednesday
        let (start, end) = week_bounds(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(week_bounds(sunday).0, sunday);
    }

    #[test]
    fn only_category_filters_are_supported() {
        assert_eq!("category".parse::<SummaryFilter>().unwrap(), SummaryFilter::Category);
        assert_eq!(
            " Transaction_Category ".parse::<SummaryFilter>().unwrap(),
            SummaryFilter::Category
        );
        assert!(matches!(
            "payee".parse::<SummaryFilter>(),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn histogram_reshapes_by_month() {
        let rows = vec![
            MonthlyTypeTotal { year: 2024, month: 3, transaction_type: "debit".into(), amount: dec!(50) },
            MonthlyTypeTotal { year: 2024, month: 3, transaction_type: "credit".into(), amount: dec!(30) },
            MonthlyTypeTotal { year: 2024, month: 5, transaction_type: "debit".into(), amount: dec!(10) },
        ];
        let h = reshape_histogram(&rows, 2024);
        assert_eq!(h.data.len(), 2);
        assert_eq!(h.data[0].month_number, 3);
        assert_eq!(h.data[0].month, "March");
        assert_eq!(h.data[0].amounts["debit"], dec!(50));
        assert_eq!(h.data[0].amounts["credit"], dec!(30));
        assert_eq!(h.data[1].month_number, 5);
        assert_eq!(h.data[1].amounts.len(), 1);
        assert_eq!(h.meta.transaction_types, vec!["credit", "debit"]);

        let json = serde_json::to_value(&h.data[1]).unwrap();
        assert_eq!(json["monthNumber"], 5);
        assert_eq!(json["month"], "May");
        assert!(json.get("debit").is_some());
    }

    #[test]
    fn type_names_never_shadow_month_fields() {
        let rows = vec![
            MonthlyTypeTotal { year: 2024, month: 2, transaction_type: "month".into(), amount: dec!(7) },
            MonthlyTypeTotal { year: 2024, month: 2, transaction_type: "monthNumber".into(), amount: dec!(9) },
        ];
        let h = reshape_histogram(&rows, 2024);
        assert_eq!(h.meta.transaction_types, vec!["type_month", "type_monthNumber"]);

        let json = serde_json::to_value(&h.data[0]).unwrap();
        assert_eq!(json["month"], "February");
        assert_eq!(json["monthNumber"], 2);
        assert_eq!(json["type_month"], "7");
        assert_eq!(json["type_monthNumber"], "9");
    }
}
