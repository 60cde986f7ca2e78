// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use haven::error::LedgerError;
use haven::models::AccountKind;
use haven::{aggregate, db};
use haven::store::{self, NewAccount, TransactionInput};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn setup() -> (Connection, i64, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let mut ids = Vec::new();
    for name in ["Main", "Other"] {
        let a = store::insert_account(
            &mut conn,
            &NewAccount {
                name: name.into(),
                account_type: String::new(),
                kind: AccountKind::Bank,
                currency: "USD".into(),
                user_id: 1,
                balance: Decimal::ZERO,
            },
        )
        .unwrap();
        ids.push(a.id);
    }
    (conn, ids[0], ids[1])
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn add(
    conn: &mut Connection,
    account_id: i64,
    amount: Decimal,
    on: NaiveDate,
    category: &str,
    ty: &str,
) {
    store::create_transactions(
        conn,
        &[TransactionInput {
            account_id,
            amount,
            date: on.to_string(),
            category: Some(category.into()),
            transaction_type: Some(ty.into()),
            ..Default::default()
        }],
    )
    .unwrap();
}

#[test]
fn week_over_week_for_one_account() {
    let (mut conn, main, other) = setup();
    // Wednesday; this week is Sun 10th to Sat 16th
    let today = date(2024, 3, 13);
    add(&mut conn, main, dec!(100.00), date(2024, 3, 10), "Food", "debit");
    add(&mut conn, main, dec!(20.00), date(2024, 3, 16), "Food", "debit");
    add(&mut conn, main, dec!(60.00), date(2024, 3, 3), "Food", "debit");
    add(&mut conn, main, dec!(40.00), date(2024, 3, 9), "Fuel", "debit");
    add(&mut conn, main, dec!(999), date(2024, 3, 2), "Food", "debit");
    add(&mut conn, other, dec!(999), date(2024, 3, 12), "Food", "debit");

    let stats = aggregate::account_statistics(&conn, main, today).unwrap();
    let w = stats.transactions.this_week_vs_last_week;
    assert_eq!(w.this_week, dec!(120.00));
    assert_eq!(w.last_week, dec!(100.00));
    assert_eq!(w.change, dec!(20.00));
    assert_eq!(w.percentage_change, dec!(20.00));
}

#[test]
fn empty_account_has_neutral_week_comparison() {
    let (conn, main, _) = setup();
    let w = aggregate::week_comparison(&conn, main, date(2024, 3, 13)).unwrap();
    assert_eq!(w.change, Decimal::ZERO);
    assert_eq!(w.percentage_change, Decimal::ZERO);
}

#[test]
fn category_percentages_cover_all_categories() {
    let (mut conn, main, other) = setup();
    let on = date(2024, 5, 1);
    add(&mut conn, main, dec!(300), on, "Rent", "debit");
    add(&mut conn, main, dec!(100), on, "Food", "debit");
    add(&mut conn, main, dec!(50), on, "Food", "debit");
    add(&mut conn, main, dec!(50), on, "Fuel", "debit");
    add(&mut conn, other, dec!(1000), on, "Rent", "debit");

    let top = aggregate::percentage_by_category(&conn, main, 2, None).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!((top[0].name.as_str(), top[0].percentage), ("Rent", dec!(60)));
    assert_eq!((top[1].name.as_str(), top[1].amount), ("Food", dec!(150)));
    assert_eq!(top[1].percentage, dec!(30));

    let mut totals = aggregate::category_totals(&conn, main, None).unwrap();
    totals.sort_by(|a, b| a.name.cmp(&b.name));
    let names: Vec<&str> = totals.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Food", "Fuel", "Rent"]);
}

#[test]
fn near_cancelling_totals_do_not_break_percentages() {
    let (mut conn, main, _) = setup();
    let on = date(2024, 5, 1);
    add(&mut conn, main, dec!(70000000000000000000000000000), on, "Salary", "credit");
    add(&mut conn, main, dec!(-69999999999999999999999999999), on, "Rent", "debit");

    let shares = aggregate::percentage_by_category(&conn, main, 5, None).unwrap();
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].name, "Salary");
    assert!(shares.iter().all(|s| s.percentage.is_zero()));
}

#[test]
fn category_total_out_of_range_is_an_error() {
    let (mut conn, main, _) = setup();
    let on = date(2024, 5, 1);
    add(&mut conn, main, Decimal::MAX, on, "Salary", "credit");
    add(&mut conn, main, Decimal::MAX, on, "Salary", "credit");

    assert!(matches!(
        aggregate::category_totals(&conn, main, None),
        Err(LedgerError::Validation(_))
    ));
    assert!(aggregate::histogram(&conn, main, 2024).is_err());
}

#[test]
fn category_reports_respect_date_range() {
    let (mut conn, main, _) = setup();
    add(&mut conn, main, dec!(10), date(2024, 1, 5), "Food", "debit");
    add(&mut conn, main, dec!(30), date(2024, 2, 5), "Rent", "debit");

    let feb = Some((date(2024, 2, 1), date(2024, 2, 29)));
    let shares = aggregate::percentage_by_category(&conn, main, 5, feb).unwrap();
    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0].name, "Rent");
    assert_eq!(shares[0].percentage, dec!(100));
}

#[test]
fn histogram_groups_by_month_and_type() {
    let (mut conn, main, _) = setup();
    add(&mut conn, main, dec!(20), date(2024, 3, 2), "Food", "debit");
    add(&mut conn, main, dec!(30), date(2024, 3, 20), "Food", "debit");
    add(&mut conn, main, dec!(30), date(2024, 3, 21), "Salary", "credit");
    add(&mut conn, main, dec!(10), date(2024, 5, 9), "Food", "debit");
    add(&mut conn, main, dec!(77), date(2023, 3, 9), "Food", "debit");

    let h = aggregate::histogram(&conn, main, 2024).unwrap();
    let months: Vec<u32> = h.data.iter().map(|b| b.month_number).collect();
    assert_eq!(months, [3, 5]);
    assert_eq!(h.data[0].amounts["debit"], dec!(50));
    assert_eq!(h.data[0].amounts["credit"], dec!(30));
    assert_eq!(h.data[1].amounts["debit"], dec!(10));
    assert!(!h.data[1].amounts.contains_key("credit"));
    assert_eq!(h.meta.transaction_types, ["credit", "debit"]);
    assert_eq!(h.meta.colors["debit"], "#FDA403");
}
