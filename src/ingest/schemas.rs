// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-institution statement schemas.
//!
//! Each institution gets a [`RowMapper`] built for the target account, plus a
//! declarative [`SchemaDescriptor`] that clients can list. The descriptor is
//! metadata only; the mapping logic lives in the mapper.

use super::decoder::RawRow;
use crate::error::{LedgerError, Result};
use crate::models::Account;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized fields of one statement row, before taxonomy resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub account_id: i64,
    pub currency: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    /// `None` when the row carries no usable credit or debit.
    pub transaction_type: Option<String>,
    pub category: String,
    pub payee: String,
    pub reference: String,
}

pub trait RowMapper {
    fn map_row(&self, fields: &RawRow) -> MappedRow;
}

pub type MapperFactory = fn(&Account) -> Box<dyn RowMapper>;

static AMOUNT_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]").unwrap());

/// Parse a statement amount, falling back to zero.
pub fn lenient_amount(raw: Option<&String>) -> Decimal {
    let Some(raw) = raw else {
        return Decimal::ZERO;
    };
    let cleaned = AMOUNT_NOISE.replace_all(raw, "");
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    match cleaned.parse::<Decimal>() {
        Ok(d) => d,
        Err(_) => {
            tracing::warn!(raw = %raw, "unparsable amount, using zero");
            Decimal::ZERO
        }
    }
}

/// Parse a statement date, falling back to today.
pub fn lenient_date(raw: Option<&String>, format: &str) -> NaiveDate {
    raw.and_then(|s| NaiveDate::parse_from_str(s, format).ok())
        .unwrap_or_else(|| {
            tracing::warn!(raw = ?raw, format, "unparsable date, using today");
            chrono::Utc::now().date_naive()
        })
}

pub struct StanbicMapper {
    account_id: i64,
    currency: String,
}

impl StanbicMapper {
    pub const NAME: &'static str = "Stanbic";
    pub const DATE_FORMAT: &'static str = "%d/%m/%Y";

    pub fn for_account(account: &Account) -> Box<dyn RowMapper> {
        Box::new(StanbicMapper {
            account_id: account.id,
            currency: account.currency.clone(),
        })
    }
}

impl RowMapper for StanbicMapper {
    fn map_row(&self, fields: &RawRow) -> MappedRow {
        let credit = lenient_amount(fields.get("Credit"));
        let debit = lenient_amount(fields.get("Debit"));
        let transaction_type = if credit > Decimal::ZERO {
            Some("Credit".to_string())
        } else if debit > Decimal::ZERO {
            Some("Debit".to_string())
        } else {
            None
        };
        let amount = credit.checked_add(debit).unwrap_or_else(|| {
            tracing::warn!(%credit, %debit, "credit and debit overflow, using zero");
            Decimal::ZERO
        });
        MappedRow {
            account_id: self.account_id,
            currency: self.currency.clone(),
            amount,
            date: lenient_date(fields.get("Date"), Self::DATE_FORMAT),
            description: fields.get("Description").cloned().unwrap_or_default(),
            transaction_type,
            category: crate::taxonomy::DEFAULT_CATEGORY.to_string(),
            payee: String::new(),
            reference: fields.get("Reference").cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub column: String,
    #[serde(default)]
    pub default: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Computation {
    pub name: String,
    pub formula: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub name: String,
    pub date_format: String,
    pub mapping: Vec<FieldMapping>,
    #[serde(default)]
    pub computations: Vec<Computation>,
}

const CATALOG: &str = r#"[
  {
    "name": "Stanbic",
    "date_format": "%d/%m/%Y",
    "mapping": [
      {"name": "date", "type": "date", "column": "Date", "default": null},
      {"name": "description", "type": "string", "column": "Description", "default": ""},
      {"name": "credit", "type": "decimal", "column": "Credit", "default": 0},
      {"name": "debit", "type": "decimal", "column": "Debit", "default": 0},
      {"name": "reference", "type": "string", "column": "Reference", "default": ""}
    ],
    "computations": [
      {"name": "amount", "formula": "credit + debit"},
      {"name": "transaction_type", "formula": "credit > 0 ? 'Credit' : debit > 0 ? 'Debit' : ''"}
    ]
  }
]"#;

struct Entry {
    descriptor: SchemaDescriptor,
    factory: MapperFactory,
}

/// Institution name to mapper lookup; keys are case-insensitive.
pub struct SchemaRegistry {
    entries: BTreeMap<String, Entry>,
}

impl SchemaRegistry {
    /// Registry of every built-in institution, checked against the catalog.
    pub fn builtin() -> Result<Self> {
        let descriptors: Vec<SchemaDescriptor> = serde_json::from_str(CATALOG)
            .map_err(|e| LedgerError::Validation(format!("schema catalog: {}", e)))?;
        let mut registry = SchemaRegistry {
            entries: BTreeMap::new(),
        };
        let factories: [(&str, MapperFactory); 1] =
            [(StanbicMapper::NAME, StanbicMapper::for_account)];
        for (name, factory) in factories {
            let descriptor = descriptors
                .iter()
                .find(|d| d.name == name)
                .cloned()
                .ok_or_else(|| {
                    LedgerError::Validation(format!("no catalog entry for schema '{}'", name))
                })?;
            registry.register(descriptor, factory);
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: SchemaDescriptor, factory: MapperFactory) {
        self.entries.insert(
            descriptor.name.to_ascii_lowercase(),
            Entry {
                descriptor,
                factory,
            },
        );
    }

    pub fn mapper_for(&self, institution: &str, account: &Account) -> Result<Box<dyn RowMapper>> {
        self.entries
            .get(&institution.trim().to_ascii_lowercase())
            .map(|e| (e.factory)(account))
            .ok_or_else(|| LedgerError::UnknownSchema(institution.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .values()
            .map(|e| e.descriptor.name.clone())
            .collect()
    }

    pub fn descriptors(&self) -> Vec<SchemaDescriptor> {
        self.entries
            .values()
            .map(|e| e.descriptor.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountDetails, AccountKind};
    use rust_decimal_macros::dec;

    fn account() -> Account {
        Account {
            id: 7,
            name: "Stanbic Current".into(),
            account_type: "current".into(),
            currency: "UGX".into(),
            user_id: 1,
            balance: Decimal::ZERO,
            details: AccountDetails::empty_for(AccountKind::Bank),
        }
    }

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn stanbic() -> Box<dyn RowMapper> {
        SchemaRegistry::builtin()
            .unwrap()
            .mapper_for("Stanbic", &account())
            .unwrap()
    }

    #[test]
    fn credit_row_maps_to_credit_type() {
        let m = stanbic().map_row(&row(&[
            ("Date", "15/03/2024"),
            ("Description", "Salary"),
            ("Credit", "1,500.00"),
            ("Debit", ""),
        ]));
        assert_eq!(m.amount, dec!(1500.00));
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(m.transaction_type.as_deref(), Some("Credit"));
        assert_eq!(m.category, "General");
        assert_eq!(m.currency, "UGX");
        assert_eq!(m.account_id, 7);
    }

    #[test]
    fn debit_row_maps_to_debit_type() {
        let m = stanbic().map_row(&row(&[
            ("Date", "01/02/2024"),
            ("Description", "Rent"),
            ("Credit", "0"),
            ("Debit", "200"),
        ]));
        assert_eq!(m.transaction_type.as_deref(), Some("Debit"));
        assert_eq!(m.amount, dec!(200));
    }

    #[test]
    fn junk_amounts_become_zero_and_leave_type_unset() {
        let m = stanbic().map_row(&row(&[
            ("Date", "01/02/2024"),
            ("Description", "?"),
            ("Credit", "n/a"),
            ("Debit", "abc"),
        ]));
        assert_eq!(m.amount, Decimal::ZERO);
        assert_eq!(m.transaction_type, None);
    }

    #[test]
    fn oversized_credit_and_debit_become_zero() {
        let m = stanbic().map_row(&row(&[
            ("Date", "01/03/2024"),
            ("Description", "x"),
            ("Credit", "79228162514264337593543950335"),
            ("Debit", "79228162514264337593543950335"),
        ]));
        assert_eq!(m.amount, Decimal::ZERO);
        assert_eq!(m.transaction_type.as_deref(), Some("Credit"));
        assert_eq!(m.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn bad_date_falls_back_to_today() {
        let m = stanbic().map_row(&row(&[("Date", "2024-02-31"), ("Credit", "1")]));
        assert_eq!(m.date, chrono::Utc::now().date_naive());
        assert_eq!(m.description, "");
    }

    #[test]
    fn lookup_ignores_case_and_rejects_unknown() {
        let reg = SchemaRegistry::builtin().unwrap();
        assert!(reg.mapper_for(" STANBIC ", &account()).is_ok());
        let err = reg.mapper_for("Acme Bank", &account()).err().unwrap();
        assert!(matches!(err, LedgerError::UnknownSchema(name) if name == "Acme Bank"));
        assert_eq!(reg.names(), vec!["Stanbic".to_string()]);
    }

    #[test]
    fn catalog_lists_mapping_columns() {
        let d = &SchemaRegistry::builtin().unwrap().descriptors()[0];
        assert_eq!(d.date_format, StanbicMapper::DATE_FORMAT);
        let cols: Vec<&str> = d.mapping.iter().map(|m| m.column.as_str()).collect();
        assert_eq!(cols, ["Date", "Description", "Credit", "Debit", "Reference"]);
        assert_eq!(d.computations.len(), 2);
    }
}
