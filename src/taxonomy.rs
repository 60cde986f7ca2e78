// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Shared classification rows for categories and transaction types.
//!
//! Both live in the `categories` table and are told apart by a
//! `(context, context_type)` namespace. Lookups are get-or-create: the
//! unique index on `(context, context_type, name)` plus insert-or-ignore
//! makes concurrent first use of a name converge on a single row.

use crate::error::{LedgerError, Result, StorageContext};
use crate::models::{Category, Tag};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_TRANSACTION_TYPE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace<'a> {
    pub context: &'a str,
    pub context_type: &'a str,
}

impl<'a> Namespace<'a> {
    pub const fn new(context: &'a str, context_type: &'a str) -> Self {
        Namespace {
            context,
            context_type,
        }
    }
}

pub const TRANSACTION_CATEGORIES: Namespace<'static> =
    Namespace::new("accounts", "transaction_categories");
pub const TRANSACTION_TYPES: Namespace<'static> = Namespace::new("accounts", "transaction_types");

fn category_from_row(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
        context: r.get(3)?,
        context_type: r.get(4)?,
    })
}

fn find(conn: &Connection, name: &str, ns: Namespace<'_>) -> Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name, description, context, context_type FROM categories
         WHERE context=?1 AND context_type=?2 AND name=?3",
        params![ns.context, ns.context_type, name],
        category_from_row,
    )
    .optional()
    .during("look up taxonomy entry")
}

/// Return the entry named `name` in `ns`, creating it on first use.
pub fn resolve_or_create(conn: &Connection, name: &str, ns: Namespace<'_>) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation(format!(
            "{} name must not be empty",
            ns.context_type
        )));
    }
    if let Some(existing) = find(conn, name, ns)? {
        return Ok(existing);
    }
    let created = conn
        .execute(
            "INSERT INTO categories(name, context, context_type) VALUES (?1, ?2, ?3)
             ON CONFLICT(context, context_type, name) DO NOTHING",
            params![name, ns.context, ns.context_type],
        )
        .during("create taxonomy entry")?;
    if created > 0 {
        tracing::debug!(name, context = ns.context, context_type = ns.context_type, "created taxonomy entry");
    }
    // a concurrent writer may have won the insert; reselect either way
    find(conn, name, ns)?.ok_or_else(|| LedgerError::Storage {
        op: "reselect taxonomy entry",
        source: rusqlite::Error::QueryReturnedNoRows,
    })
}

pub fn resolve_category(conn: &Connection, name: Option<&str>) -> Result<Category> {
    let name = name.map(str::trim).filter(|s| !s.is_empty());
    resolve_or_create(conn, name.unwrap_or(DEFAULT_CATEGORY), TRANSACTION_CATEGORIES)
}

pub fn resolve_transaction_type(conn: &Connection, name: Option<&str>) -> Result<Category> {
    let name = name.map(str::trim).filter(|s| !s.is_empty());
    resolve_or_create(conn, name.unwrap_or(DEFAULT_TRANSACTION_TYPE), TRANSACTION_TYPES)
}

/// Explicit create; fails with a validation error when the name is taken.
pub fn create(conn: &Connection, name: &str, description: &str, ns: Namespace<'_>) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation("category name must not be empty".into()));
    }
    if find(conn, name, ns)?.is_some() {
        return Err(LedgerError::Validation(format!(
            "'{}' already exists in {}/{}",
            name, ns.context, ns.context_type
        )));
    }
    conn.execute(
        "INSERT INTO categories(name, description, context, context_type) VALUES (?1, ?2, ?3, ?4)",
        params![name, description, ns.context, ns.context_type],
    )
    .during("create category")?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Category> {
    conn.query_row(
        "SELECT id, name, description, context, context_type FROM categories WHERE id=?1",
        params![id],
        category_from_row,
    )
    .optional()
    .during("load category")?
    .ok_or(LedgerError::CategoryNotFound(id))
}

/// Entries in `context`, narrowed to `context_type` when given; `None` matches everything.
pub fn list(
    conn: &Connection,
    context: Option<&str>,
    context_type: Option<&str>,
) -> Result<Vec<Category>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, description, context, context_type FROM categories
             WHERE (?1 IS NULL OR context=?1) AND (?2 IS NULL OR context_type=?2)
             ORDER BY id",
        )
        .during("list categories")?;
    let rows = stmt
        .query_map(params![context, context_type], category_from_row)
        .during("list categories")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .during("list categories")
}

pub fn resolve_tag(conn: &Connection, name: &str) -> Result<Tag> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation("tag name must not be empty".into()));
    }
    conn.execute(
        "INSERT INTO tags(name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        params![name],
    )
    .during("create tag")?;
    conn.query_row(
        "SELECT id, name FROM tags WHERE name=?1",
        params![name],
        |r| Ok(Tag { id: r.get(0)?, name: r.get(1)? }),
    )
    .during("load tag")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn conn() -> Connection {
        let c = Connection::open_in_memory().unwrap();
        init_schema(&c).unwrap();
        c
    }

    fn count(c: &Connection) -> i64 {
        c.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn resolving_twice_yields_one_row() {
        let c = conn();
        let a = resolve_or_create(&c, "Groceries", TRANSACTION_CATEGORIES).unwrap();
        let b = resolve_or_create(&c, "Groceries", TRANSACTION_CATEGORIES).unwrap();
        assert_eq!(a, b);
        assert_eq!(count(&c), 1);
    }

    #[test]
    fn namespaces_are_independent() {
        let c = conn();
        let cat = resolve_or_create(&c, "Credit", TRANSACTION_CATEGORIES).unwrap();
        let ty = resolve_or_create(&c, "Credit", TRANSACTION_TYPES).unwrap();
        assert_ne!(cat.id, ty.id);
        assert_eq!(ty.context_type, "transaction_types");
        assert_eq!(count(&c), 2);
    }

    #[test]
    fn blank_names_fall_back_to_defaults() {
        let c = conn();
        assert_eq!(resolve_category(&c, Some("  ")).unwrap().name, "General");
        assert_eq!(resolve_transaction_type(&c, None).unwrap().name, "Unknown");
    }

    #[test]
    fn empty_name_is_rejected() {
        let c = conn();
        let err = resolve_or_create(&c, "", TRANSACTION_TYPES).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(count(&c), 0);
    }

    #[test]
    fn explicit_create_refuses_duplicates() {
        let c = conn();
        create(&c, "Rent", "monthly rent", TRANSACTION_CATEGORIES).unwrap();
        assert!(create(&c, "Rent", "", TRANSACTION_CATEGORIES).is_err());
        let listed = list(&c, Some("accounts"), Some("transaction_categories")).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].description, "monthly rent");
        assert!(list(&c, Some("accounts"), Some("transaction_types")).unwrap().is_empty());
    }

    #[test]
    fn listing_by_context_alone_skips_other_contexts() {
        let c = conn();
        resolve_or_create(&c, "Rent", TRANSACTION_CATEGORIES).unwrap();
        resolve_or_create(&c, "Debit", TRANSACTION_TYPES).unwrap();
        create(&c, "Quarterly", "", Namespace::new("budgets", "periods")).unwrap();

        let names: Vec<String> = list(&c, Some("accounts"), None)
            .unwrap()
            .into_iter()
            .map(|cat| cat.name)
            .collect();
        assert_eq!(names, ["Rent", "Debit"]);
        assert_eq!(list(&c, None, None).unwrap().len(), 3);
    }

    #[test]
    fn tags_are_get_or_create() {
        let c = conn();
        let a = resolve_tag(&c, "travel").unwrap();
        let b = resolve_tag(&c, "travel ").unwrap();
        assert_eq!(a, b);
    }
}
