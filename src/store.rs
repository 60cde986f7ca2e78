// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result, StorageContext};
use crate::models::{
    Account, AccountDetails, AccountKind, Budget, NewTransaction, Tag, Transaction,
};
use crate::pagination::{PageSource, SortOrder};
use crate::taxonomy::{self, TRANSACTION_CATEGORIES};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Deserialize;

pub(crate) fn decimal_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Adds `amount` to a running total, refusing sums `Decimal` cannot hold.
pub(crate) fn accumulate(total: &mut Decimal, amount: Decimal) -> Result<()> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| LedgerError::Validation("amount total is out of range".into()))?;
    Ok(())
}

// ---- accounts ----

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_type: String,
    pub kind: AccountKind,
    pub currency: String,
    pub user_id: i64,
    pub balance: Decimal,
}

const ACCOUNT_SELECT: &str = "SELECT a.id, a.name, a.account_type, a.kind, a.currency, a.user_id, a.balance, e.payload
     FROM accounts a LEFT JOIN account_extensions e ON e.account_id=a.id";

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    let kind_s: String = r.get(3)?;
    let kind = kind_s.parse::<AccountKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into())
    })?;
    let payload: Option<String> = r.get(7)?;
    // a missing or unreadable extension row degrades to the empty payload of the kind
    let details = payload
        .and_then(|p| serde_json::from_str::<AccountDetails>(&p).ok())
        .filter(|d| d.kind() == kind)
        .unwrap_or_else(|| AccountDetails::empty_for(kind));
    Ok(Account {
        id: r.get(0)?,
        name: r.get(1)?,
        account_type: r.get(2)?,
        currency: r.get(4)?,
        user_id: r.get(5)?,
        balance: decimal_col(r, 6)?,
        details,
    })
}

pub fn insert_account(conn: &mut Connection, new: &NewAccount) -> Result<Account> {
    if new.name.trim().is_empty() {
        return Err(LedgerError::Validation("account name must not be empty".into()));
    }
    let currency = new.currency.trim().to_uppercase();
    if currency.is_empty() {
        return Err(LedgerError::Validation("account currency must not be empty".into()));
    }
    let payload = serde_json::to_string(&AccountDetails::empty_for(new.kind))
        .map_err(|e| LedgerError::Validation(format!("account details: {}", e)))?;

    let tx = conn.transaction().during("begin account create")?;
    tx.execute(
        "INSERT INTO accounts(name, account_type, kind, currency, user_id, balance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new.name.trim(),
            new.account_type,
            new.kind.as_str(),
            currency,
            new.user_id,
            new.balance.to_string()
        ],
    )
    .during("create account")?;
    let id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO account_extensions(account_id, kind, payload) VALUES (?1, ?2, ?3)",
        params![id, new.kind.as_str(), payload],
    )
    .during("create account extension")?;
    tx.commit().during("commit account create")?;
    get_account(conn, id)
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Account> {
    conn.query_row(
        &format!("{} WHERE a.id=?1", ACCOUNT_SELECT),
        params![id],
        account_from_row,
    )
    .optional()
    .during("load account")?
    .ok_or(LedgerError::AccountNotFound(id))
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn
        .prepare(&format!("{} ORDER BY a.id", ACCOUNT_SELECT))
        .during("list accounts")?;
    let rows = stmt.query_map([], account_from_row).during("list accounts")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .during("list accounts")
}

// ---- transactions ----

const TRANSACTION_SELECT: &str = "SELECT t.id, t.amount, t.currency, t.date, t.description, t.account_id,
            t.category_id, c.name, t.transaction_type_id, ty.name, t.payee, t.reference, t.status
     FROM transactions t
     JOIN categories c ON t.category_id=c.id
     JOIN categories ty ON t.transaction_type_id=ty.id";

fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        amount: decimal_col(r, 1)?,
        currency: r.get(2)?,
        date: r.get(3)?,
        description: r.get(4)?,
        account_id: r.get(5)?,
        category_id: r.get(6)?,
        category: r.get(7)?,
        transaction_type_id: r.get(8)?,
        transaction_type: r.get(9)?,
        payee: r.get(10)?,
        reference: r.get(11)?,
        status: r.get(12)?,
    })
}

/// Write a batch in order and return the stored rows.
pub fn insert_transactions(conn: &Connection, batch: &[NewTransaction]) -> Result<Vec<Transaction>> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO transactions(amount, currency, date, description, account_id,
                category_id, transaction_type_id, payee, reference, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .during("prepare transaction insert")?;
    let mut out = Vec::with_capacity(batch.len());
    for t in batch {
        stmt.execute(params![
            t.amount.to_string(),
            t.currency,
            t.date,
            t.description,
            t.account_id,
            t.category.id,
            t.transaction_type.id,
            t.payee,
            t.reference,
            t.status
        ])
        .during("create transaction")?;
        out.push(Transaction {
            id: conn.last_insert_rowid(),
            amount: t.amount,
            currency: t.currency.clone(),
            date: t.date,
            description: t.description.clone(),
            account_id: t.account_id,
            category_id: t.category.id,
            category: t.category.name.clone(),
            transaction_type_id: t.transaction_type.id,
            transaction_type: t.transaction_type.name.clone(),
            payee: t.payee.clone(),
            reference: t.reference.clone(),
            status: t.status.clone(),
        });
    }
    Ok(out)
}

/// Loosely typed transaction record as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionInput {
    pub account_id: i64,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub date: String,
    pub description: String,
    pub category: Option<String>,
    pub transaction_type: Option<String>,
    pub payee: String,
    pub reference: String,
    pub status: String,
}

/// Resolve taxonomy and defaults for one client record.
pub fn prepare_transaction(conn: &Connection, input: &TransactionInput) -> Result<NewTransaction> {
    let account = get_account(conn, input.account_id)?;
    let date = NaiveDate::parse_from_str(input.date.trim(), "%Y-%m-%d").unwrap_or_else(|_| {
        tracing::warn!(date = %input.date, "unparsable transaction date, using today");
        chrono::Utc::now().date_naive()
    });
    let currency = input
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase)
        .unwrap_or(account.currency);
    Ok(NewTransaction {
        amount: input.amount,
        currency,
        date,
        description: input.description.clone(),
        account_id: account.id,
        category: taxonomy::resolve_category(conn, input.category.as_deref())?,
        transaction_type: taxonomy::resolve_transaction_type(
            conn,
            input.transaction_type.as_deref(),
        )?,
        payee: input.payee.clone(),
        reference: input.reference.clone(),
        status: input.status.clone(),
    })
}

/// Create every record or none.
pub fn create_transactions(conn: &mut Connection, inputs: &[TransactionInput]) -> Result<Vec<Transaction>> {
    let tx = conn.transaction().during("begin batch create")?;
    let mut batch = Vec::with_capacity(inputs.len());
    for input in inputs {
        batch.push(prepare_transaction(&tx, input)?);
    }
    let created = insert_transactions(&tx, &batch)?;
    tx.commit().during("commit batch create")?;
    Ok(created)
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    conn.query_row(
        &format!("{} WHERE t.id=?1", TRANSACTION_SELECT),
        params![id],
        transaction_from_row,
    )
    .optional()
    .during("load transaction")?
    .ok_or(LedgerError::TransactionNotFound(id))
}

pub fn recent_transactions(conn: &Connection, account_id: i64, limit: u32) -> Result<Vec<Transaction>> {
    let mut stmt = conn
        .prepare(&format!(
            "{} WHERE t.account_id=?1 ORDER BY t.date DESC, t.id DESC LIMIT ?2",
            TRANSACTION_SELECT
        ))
        .during("list recent transactions")?;
    let rows = stmt
        .query_map(params![account_id, limit], transaction_from_row)
        .during("list recent transactions")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .during("list recent transactions")
}

/// An account's transactions, optionally bounded to an inclusive date range.
#[derive(Debug, Clone)]
pub struct AccountHistory {
    pub account_id: i64,
    pub range: Option<(NaiveDate, NaiveDate)>,
    pub order: SortOrder,
}

impl AccountHistory {
    pub fn new(account_id: i64) -> Self {
        AccountHistory {
            account_id,
            range: None,
            order: SortOrder::Asc,
        }
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.range = Some((from, to));
        self
    }

    fn bounds(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self.range {
            Some((from, to)) => (Some(from), Some(to)),
            None => (None, None),
        }
    }
}

impl PageSource for AccountHistory {
    type Item = Transaction;

    fn count(&self, conn: &Connection) -> Result<u64> {
        let (from, to) = self.bounds();
        let n: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM transactions
                 WHERE account_id=?1 AND (?2 IS NULL OR date BETWEEN ?2 AND ?3)",
                params![self.account_id, from, to],
                |r| r.get(0),
            )
            .during("count account transactions")?;
        Ok(n.max(0) as u64)
    }

    fn window(&self, conn: &Connection, limit: u32, offset: u64) -> Result<Vec<Transaction>> {
        let (from, to) = self.bounds();
        let sql = format!(
            "{} WHERE t.account_id=?1 AND (?2 IS NULL OR t.date BETWEEN ?2 AND ?3)
             ORDER BY t.id {} LIMIT ?4 OFFSET ?5",
            TRANSACTION_SELECT,
            self.order.as_sql()
        );
        let mut stmt = conn.prepare(&sql).during("page account transactions")?;
        let rows = stmt
            .query_map(
                params![self.account_id, from, to, limit, offset as i64],
                transaction_from_row,
            )
            .during("page account transactions")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .during("page account transactions")
    }
}

// ---- tags ----

pub fn tag_transaction(conn: &Connection, transaction_id: i64, name: &str) -> Result<Tag> {
    get_transaction(conn, transaction_id)?;
    let tag = taxonomy::resolve_tag(conn, name)?;
    conn.execute(
        "INSERT OR IGNORE INTO transaction_tags(transaction_id, tag_id) VALUES (?1, ?2)",
        params![transaction_id, tag.id],
    )
    .during("tag transaction")?;
    Ok(tag)
}

pub fn transaction_tags(conn: &Connection, transaction_id: i64) -> Result<Vec<Tag>> {
    get_transaction(conn, transaction_id)?;
    let mut stmt = conn
        .prepare(
            "SELECT g.id, g.name FROM tags g
             JOIN transaction_tags tt ON tt.tag_id=g.id
             WHERE tt.transaction_id=?1 ORDER BY g.name",
        )
        .during("list transaction tags")?;
    let rows = stmt
        .query_map(params![transaction_id], |r| {
            Ok(Tag {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })
        .during("list transaction tags")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .during("list transaction tags")
}

// ---- budgets ----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BudgetInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub user_id: Option<i64>,
    pub category_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
        amount: decimal_col(r, 3)?,
        user_id: r.get(4)?,
        category_id: r.get(5)?,
        start_date: r.get(6)?,
        end_date: r.get(7)?,
    })
}

const BUDGET_SELECT: &str = "SELECT id, name, description, amount, user_id, category_id, start_date, end_date FROM budgets";

fn check_budget(conn: &Connection, b: &Budget) -> Result<()> {
    if b.name.trim().is_empty() {
        return Err(LedgerError::Validation("budget name must not be empty".into()));
    }
    if b.end_date < b.start_date {
        return Err(LedgerError::Validation(format!(
            "budget ends ({}) before it starts ({})",
            b.end_date, b.start_date
        )));
    }
    let category = taxonomy::get(conn, b.category_id)?;
    if category.context != TRANSACTION_CATEGORIES.context
        || category.context_type != TRANSACTION_CATEGORIES.context_type
    {
        return Err(LedgerError::Validation(format!(
            "category {} is not a transaction category",
            b.category_id
        )));
    }
    Ok(())
}

fn required<T>(v: Option<T>, field: &str) -> Result<T> {
    v.ok_or_else(|| LedgerError::Validation(format!("budget {} is required", field)))
}

pub fn insert_budget(conn: &Connection, input: &BudgetInput) -> Result<Budget> {
    let budget = Budget {
        id: 0,
        name: required(input.name.clone(), "name")?,
        description: input.description.clone().unwrap_or_default(),
        amount: required(input.amount, "amount")?,
        user_id: required(input.user_id, "user_id")?,
        category_id: required(input.category_id, "category_id")?,
        start_date: required(input.start_date, "start_date")?,
        end_date: required(input.end_date, "end_date")?,
    };
    check_budget(conn, &budget)?;
    conn.execute(
        "INSERT INTO budgets(name, description, amount, user_id, category_id, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            budget.name.trim(),
            budget.description,
            budget.amount.to_string(),
            budget.user_id,
            budget.category_id,
            budget.start_date,
            budget.end_date
        ],
    )
    .during("create budget")?;
    get_budget(conn, conn.last_insert_rowid())
}

/// Apply the fields present in `input` to an existing budget.
pub fn update_budget(conn: &Connection, id: i64, input: &BudgetInput) -> Result<Budget> {
    let mut b = get_budget(conn, id)?;
    if let Some(name) = &input.name {
        b.name = name.clone();
    }
    if let Some(desc) = &input.description {
        b.description = desc.clone();
    }
    if let Some(amount) = input.amount {
        b.amount = amount;
    }
    if let Some(user_id) = input.user_id {
        b.user_id = user_id;
    }
    if let Some(category_id) = input.category_id {
        b.category_id = category_id;
    }
    if let Some(start) = input.start_date {
        b.start_date = start;
    }
    if let Some(end) = input.end_date {
        b.end_date = end;
    }
    check_budget(conn, &b)?;
    conn.execute(
        "UPDATE budgets SET name=?1, description=?2, amount=?3, user_id=?4, category_id=?5,
             start_date=?6, end_date=?7 WHERE id=?8",
        params![
            b.name.trim(),
            b.description,
            b.amount.to_string(),
            b.user_id,
            b.category_id,
            b.start_date,
            b.end_date,
            id
        ],
    )
    .during("update budget")?;
    get_budget(conn, id)
}

pub fn get_budget(conn: &Connection, id: i64) -> Result<Budget> {
    conn.query_row(
        &format!("{} WHERE id=?1", BUDGET_SELECT),
        params![id],
        budget_from_row,
    )
    .optional()
    .during("load budget")?
    .ok_or(LedgerError::BudgetNotFound(id))
}

pub fn list_budgets(conn: &Connection, user_id: Option<i64>) -> Result<Vec<Budget>> {
    let mut stmt = conn
        .prepare(&format!(
            "{} WHERE (?1 IS NULL OR user_id=?1) ORDER BY start_date, id",
            BUDGET_SELECT
        ))
        .during("list budgets")?;
    let rows = stmt
        .query_map(params![user_id], budget_from_row)
        .during("list budgets")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .during("list budgets")
}

/// Absolute spend in the budget's category over its window, across the owning user's accounts.
pub fn budget_spent(conn: &Connection, budget: &Budget) -> Result<Decimal> {
    let mut stmt = conn
        .prepare(
            "SELECT t.amount FROM transactions t
             JOIN accounts a ON a.id=t.account_id
             WHERE t.category_id=?1 AND t.date BETWEEN ?2 AND ?3 AND a.user_id=?4",
        )
        .during("sum budget spend")?;
    let mut rows = stmt
        .query(params![
            budget.category_id,
            budget.start_date,
            budget.end_date,
            budget.user_id
        ])
        .during("sum budget spend")?;
    let mut spent = Decimal::ZERO;
    while let Some(r) = rows.next().during("sum budget spend")? {
        accumulate(&mut spent, decimal_col(r, 0).during("sum budget spend")?.abs())?;
    }
    Ok(spent)
}
