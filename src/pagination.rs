// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::DEFAULT_PAGE_LIMIT;
use crate::error::Result;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A filtered, ordered result set that can be counted and windowed.
pub trait PageSource {
    type Item;

    /// Rows matching the source's filters, ignoring any window.
    fn count(&self, conn: &Connection) -> Result<u64>;

    fn window(&self, conn: &Connection, limit: u32, offset: u64) -> Result<Vec<Self::Item>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Missing or non-positive values fall back to page 1 and `default_limit`.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u32) -> Self {
        let page = page
            .filter(|p| *p > 0)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .and_then(|l| u32::try_from(l).ok())
            .unwrap_or(default_limit.max(1));
        PageRequest { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total_count: u64,
    pub page: u32,
    pub limit: u32,
    pub prev_page: u64,
    pub next_page: u64,
    pub last_page: u64,
}

impl PageMeta {
    pub fn compute(total_count: u64, req: PageRequest) -> Self {
        let page = req.page as u64;
        let limit = req.limit.max(1) as u64;
        let prev_page = if page > 1 { page - 1 } else { 1 };
        // on the last page this is total/limit rather than a "no next page" marker
        let next_page = if total_count > page * limit {
            page + 1
        } else {
            total_count / limit
        };
        PageMeta {
            total_count,
            page: req.page,
            limit: req.limit,
            prev_page,
            next_page,
            last_page: total_count.div_ceil(limit),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(&T) -> U>(self, f: F) -> Page<U> {
        Page {
            meta: self.meta,
            results: self.results.iter().map(f).collect(),
        }
    }
}

pub fn paginate<S: PageSource>(conn: &Connection, source: &S, req: PageRequest) -> Result<Page<S::Item>> {
    let total_count = source.count(conn)?;
    let results = source.window(conn, req.limit, req.offset())?;
    Ok(Page {
        meta: PageMeta::compute(total_count, req),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(total: u64, page: u32, limit: u32) -> PageMeta {
        PageMeta::compute(total, PageRequest { page, limit })
    }

    #[test]
    fn first_page_of_forty_five() {
        let m = meta(45, 1, 20);
        assert_eq!(m.next_page, 2);
        assert_eq!(m.prev_page, 1);
        assert_eq!(m.last_page, 3);
    }

    #[test]
    fn last_page_reports_floor_of_total_over_limit() {
        let m = meta(45, 3, 20);
        assert_eq!(m.next_page, 2);
        assert_eq!(m.prev_page, 2);
        assert_eq!(m.last_page, 3);
    }

    #[test]
    fn empty_source() {
        let m = meta(0, 1, 20);
        assert_eq!(m.next_page, 0);
        assert_eq!(m.last_page, 0);
        assert_eq!(m.prev_page, 1);
    }

    #[test]
    fn bad_request_values_use_defaults() {
        assert_eq!(PageRequest::new(None, None, 20), PageRequest { page: 1, limit: 20 });
        assert_eq!(PageRequest::new(Some(0), Some(-5), 20), PageRequest { page: 1, limit: 20 });
        assert_eq!(PageRequest::new(Some(3), Some(10), 20).offset(), 20);
    }

    struct Numbers(Vec<i64>);

    impl PageSource for Numbers {
        type Item = i64;

        fn count(&self, _conn: &Connection) -> Result<u64> {
            Ok(self.0.len() as u64)
        }

        fn window(&self, _conn: &Connection, limit: u32, offset: u64) -> Result<Vec<i64>> {
            Ok(self
                .0
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .copied()
                .collect())
        }
    }

    #[test]
    fn paginate_windows_and_counts() {
        let conn = Connection::open_in_memory().unwrap();
        let src = Numbers((1..=45).collect());
        let page = paginate(&conn, &src, PageRequest { page: 3, limit: 20 }).unwrap();
        assert_eq!(page.results, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.meta.total_count, 45);
        let json = serde_json::to_value(&page.map(|n| n * 2)).unwrap();
        assert_eq!(json["last_page"], 3);
        assert_eq!(json["results"][0], 82);
    }
}
