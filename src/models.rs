// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Bank,
    CreditCard,
    RealEstate,
    Loan,
    Investment,
    Asset,
    Income,
    Liability,
    Expenses,
}

impl AccountKind {
    pub const ALL: [AccountKind; 9] = [
        AccountKind::Bank,
        AccountKind::CreditCard,
        AccountKind::RealEstate,
        AccountKind::Loan,
        AccountKind::Investment,
        AccountKind::Asset,
        AccountKind::Income,
        AccountKind::Liability,
        AccountKind::Expenses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Bank => "bank",
            AccountKind::CreditCard => "credit_card",
            AccountKind::RealEstate => "real_estate",
            AccountKind::Loan => "loan",
            AccountKind::Investment => "investment",
            AccountKind::Asset => "asset",
            AccountKind::Income => "income",
            AccountKind::Liability => "liability",
            AccountKind::Expenses => "expenses",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        AccountKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| format!("invalid account type '{}'", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankDetails {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditCardDetails {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealEstateDetails {}

/// Shared payload for the ledger-style kinds that carry nothing extra.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDetails {}

/// Type-specific extension of an account, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum AccountDetails {
    Bank(BankDetails),
    CreditCard(CreditCardDetails),
    RealEstate(RealEstateDetails),
    Loan(LedgerDetails),
    Investment(LedgerDetails),
    Asset(LedgerDetails),
    Income(LedgerDetails),
    Liability(LedgerDetails),
    Expenses(LedgerDetails),
}

impl AccountDetails {
    pub fn empty_for(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Bank => AccountDetails::Bank(BankDetails::default()),
            AccountKind::CreditCard => AccountDetails::CreditCard(CreditCardDetails::default()),
            AccountKind::RealEstate => AccountDetails::RealEstate(RealEstateDetails::default()),
            AccountKind::Loan => AccountDetails::Loan(LedgerDetails::default()),
            AccountKind::Investment => AccountDetails::Investment(LedgerDetails::default()),
            AccountKind::Asset => AccountDetails::Asset(LedgerDetails::default()),
            AccountKind::Income => AccountDetails::Income(LedgerDetails::default()),
            AccountKind::Liability => AccountDetails::Liability(LedgerDetails::default()),
            AccountKind::Expenses => AccountDetails::Expenses(LedgerDetails::default()),
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            AccountDetails::Bank(_) => AccountKind::Bank,
            AccountDetails::CreditCard(_) => AccountKind::CreditCard,
            AccountDetails::RealEstate(_) => AccountKind::RealEstate,
            AccountDetails::Loan(_) => AccountKind::Loan,
            AccountDetails::Investment(_) => AccountKind::Investment,
            AccountDetails::Asset(_) => AccountKind::Asset,
            AccountDetails::Income(_) => AccountKind::Income,
            AccountDetails::Liability(_) => AccountKind::Liability,
            AccountDetails::Expenses(_) => AccountKind::Expenses,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub user_id: i64,
    // not recomputed from transactions
    pub balance: Decimal,
    pub details: AccountDetails,
}

impl Account {
    pub fn kind(&self) -> AccountKind {
        self.details.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub context: String,
    pub context_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A transaction ready to be written; taxonomy references are already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub currency: String,
    pub date: NaiveDate,
    pub description: String,
    pub account_id: i64,
    pub category: Category,
    pub transaction_type: Category,
    pub payee: String,
    pub reference: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub date: NaiveDate,
    pub description: String,
    pub account_id: i64,
    pub category_id: i64,
    pub category: String,
    pub transaction_type_id: i64,
    pub transaction_type: String,
    pub payee: String,
    pub reference: String,
    pub status: String,
}

/// Canonical outward shape of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub amount: Decimal,
    pub currency: String,
    /// Unix epoch seconds at midnight UTC.
    pub date: i64,
    pub description: String,
    pub account_id: i64,
    pub transaction_type: String,
    pub category: String,
    pub transaction_status: String,
    pub reference: String,
    pub payee: String,
}

impl From<&Transaction> for TransactionResponse {
    fn from(tx: &Transaction) -> Self {
        TransactionResponse {
            id: tx.id,
            amount: tx.amount,
            currency: tx.currency.clone(),
            date: tx.date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp(),
            description: tx.description.clone(),
            account_id: tx.account_id,
            transaction_type: tx.transaction_type.clone(),
            category: tx.category.clone(),
            transaction_status: tx.status.clone(),
            reference: tx.reference.clone(),
            payee: tx.payee.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub amount: Decimal,
    pub user_id: i64,
    pub category_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetMetrics {
    pub spent: Decimal,
    pub remaining: Decimal,
    pub progress_percentage: Decimal,
    pub over_budget: bool,
    pub overdue: bool,
    pub days_remaining: i64,
    pub daily_target: Decimal,
}

impl Budget {
    pub fn metrics(&self, spent: Decimal, today: NaiveDate) -> BudgetMetrics {
        let progress_percentage = crate::aggregate::percentage_of(spent, self.amount);
        let window_days = (self.end_date - self.start_date).num_days();
        let daily_target = if window_days <= 0 {
            self.amount
        } else {
            (self.amount / Decimal::from(window_days)).round_dp(2)
        };
        BudgetMetrics {
            spent,
            remaining: self.amount.saturating_sub(spent),
            progress_percentage,
            over_budget: spent > self.amount,
            overdue: self.end_date < today,
            days_remaining: (self.end_date - today).num_days(),
            daily_target,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl From<&anyhow::Error> for ErrorResponse {
    fn from(err: &anyhow::Error) -> Self {
        ErrorResponse {
            message: format!("{:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn budget(amount: Decimal, start: (i32, u32, u32), end: (i32, u32, u32)) -> Budget {
        Budget {
            id: 1,
            name: "Food".into(),
            description: String::new(),
            amount,
            user_id: 1,
            category_id: 1,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    #[test]
    fn account_kind_parses_snake_case_names() {
        assert_eq!("credit_card".parse::<AccountKind>().unwrap(), AccountKind::CreditCard);
        assert_eq!(" Bank ".parse::<AccountKind>().unwrap(), AccountKind::Bank);
        assert!("savings".parse::<AccountKind>().is_err());
    }

    #[test]
    fn details_round_trip_through_kind() {
        for kind in AccountKind::ALL {
            assert_eq!(AccountDetails::empty_for(kind).kind(), kind);
        }
    }

    #[test]
    fn budget_metrics_over_a_thirty_day_window() {
        let b = budget(dec!(300), (2025, 6, 1), (2025, 7, 1));
        let today = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        let m = b.metrics(dec!(330), today);
        assert_eq!(m.remaining, dec!(-30));
        assert_eq!(m.progress_percentage, dec!(110));
        assert!(m.over_budget);
        assert!(!m.overdue);
        assert_eq!(m.days_remaining, 10);
        assert_eq!(m.daily_target, dec!(10));
    }

    #[test]
    fn zero_budget_has_zero_progress() {
        let b = budget(Decimal::ZERO, (2025, 6, 1), (2025, 6, 1));
        let m = b.metrics(dec!(5), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(m.progress_percentage, Decimal::ZERO);
        assert_eq!(m.daily_target, Decimal::ZERO);
        assert!(m.overdue);
    }

    #[test]
    fn response_date_is_unix_midnight() {
        let tx = Transaction {
            id: 3,
            amount: dec!(-12.50),
            currency: "UGX".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            description: "Airtime".into(),
            account_id: 7,
            category_id: 1,
            category: "General".into(),
            transaction_type_id: 2,
            transaction_type: "Debit".into(),
            payee: String::new(),
            reference: String::new(),
            status: String::new(),
        };
        let r = TransactionResponse::from(&tx);
        assert_eq!(r.date, 1_709_251_200);
        assert_eq!(r.transaction_type, "Debit");
    }
}
