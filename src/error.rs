// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account {0} not found")]
    AccountNotFound(i64),

    #[error("Account {0} has no name")]
    UnnamedAccount(i64),

    #[error("Transaction schema '{0}' not found")]
    UnknownSchema(String),

    #[error("Transaction {0} not found")]
    TransactionNotFound(i64),

    #[error("Budget {0} not found")]
    BudgetNotFound(i64),

    #[error("Category {0} not found")]
    CategoryNotFound(i64),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Malformed CSV: {0}")]
    Decode(#[from] csv::Error),

    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error while trying to {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl LedgerError {
    /// Errors the caller caused, as opposed to store or I/O failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::AccountNotFound(_)
                | LedgerError::UnnamedAccount(_)
                | LedgerError::UnknownSchema(_)
                | LedgerError::TransactionNotFound(_)
                | LedgerError::BudgetNotFound(_)
                | LedgerError::CategoryNotFound(_)
                | LedgerError::Validation(_)
                | LedgerError::Decode(_)
        )
    }
}

/// Attach the name of the storage operation to a rusqlite failure.
pub trait StorageContext<T> {
    fn during(self, op: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, rusqlite::Error> {
    fn during(self, op: &'static str) -> Result<T> {
        self.map_err(|source| LedgerError::Storage { op, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_name_the_operation() {
        let res: std::result::Result<(), rusqlite::Error> =
            Err(rusqlite::Error::QueryReturnedNoRows);
        let err = res.during("resolve taxonomy entry").unwrap_err();
        assert!(err.to_string().starts_with("Storage error while trying to resolve taxonomy entry"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn validation_is_a_client_error() {
        assert!(LedgerError::UnknownSchema("Acme".into()).is_client_error());
        assert!(LedgerError::Validation("limit must be positive".into()).is_client_error());
    }
}
