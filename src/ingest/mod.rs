// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bank statement ingestion: decode, map, resolve taxonomy, persist.

pub mod decoder;
pub mod schemas;

use crate::error::{LedgerError, Result, StorageContext};
use crate::models::{NewTransaction, Transaction};
use crate::{store, taxonomy};
use rusqlite::Connection;
use schemas::SchemaRegistry;
use std::io::Read;

/// Import one statement file into `account_id` using the `institution` schema.
///
/// The account and schema are checked before the file is read. Every row is
/// decoded before anything is written, and the row mapping, taxonomy
/// creation and batch insert share a single SQLite transaction, so a failure
/// leaves no transactions and no new taxonomy rows behind.
pub fn ingest<R: Read>(
    conn: &mut Connection,
    registry: &SchemaRegistry,
    input: R,
    institution: &str,
    account_id: i64,
) -> Result<Vec<Transaction>> {
    let account = store::get_account(conn, account_id)?;
    if account.name.trim().is_empty() {
        return Err(LedgerError::UnnamedAccount(account_id));
    }
    let mapper = registry.mapper_for(institution, &account)?;

    let rows = decoder::decode(input)?;
    tracing::debug!(account_id, institution, rows = rows.len(), "decoded statement");

    let tx = conn.transaction().during("begin import")?;
    let mut batch = Vec::with_capacity(rows.len());
    for row in &rows {
        let mapped = mapper.map_row(row);
        let category = taxonomy::resolve_category(&tx, Some(&mapped.category))?;
        let transaction_type =
            taxonomy::resolve_transaction_type(&tx, mapped.transaction_type.as_deref())?;
        batch.push(NewTransaction {
            amount: mapped.amount,
            currency: mapped.currency,
            date: mapped.date,
            description: mapped.description,
            account_id: mapped.account_id,
            category,
            transaction_type,
            payee: mapped.payee,
            reference: mapped.reference,
            status: String::new(),
        });
    }
    let created = store::insert_transactions(&tx, &batch)?;
    tx.commit().during("commit import")?;

    tracing::info!(account_id, institution, imported = created.len(), "imported statement");
    Ok(created)
}
