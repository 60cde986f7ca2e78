// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result;
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use std::io::Read;

/// One statement row keyed by header name.
pub type RawRow = HashMap<String, String>;

/// Read a whole CSV table into header-keyed rows, preserving file order.
///
/// The first record is the header. A record whose length differs from the
/// header fails the whole decode.
pub fn decode<R: Read>(input: R) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(input);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let row: RawRow = headers
            .iter()
            .cloned()
            .zip(rec.iter().map(|v| v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;

    #[test]
    fn rows_follow_file_order() {
        let data = "Date,Description,Credit,Debit\n01/03/2024,Salary,500,\n02/03/2024,Rent,,-200\n";
        let rows = decode(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Description"], "Salary");
        assert_eq!(rows[1]["Debit"], "-200");
        assert_eq!(rows[1]["Credit"], "");
    }

    #[test]
    fn header_only_file_has_no_rows() {
        assert!(decode("Date,Description\n".as_bytes()).unwrap().is_empty());
        assert!(decode("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn short_record_is_fatal() {
        let data = "Date,Description,Credit\n01/03/2024,Salary,500\n02/03/2024,Rent\n";
        let err = decode(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LedgerError::Decode(_)));
    }

    #[test]
    fn fields_are_trimmed() {
        let rows = decode("A , B\n  x ,y  \n".as_bytes()).unwrap();
        assert_eq!(rows[0]["A"], "x");
        assert_eq!(rows[0]["B"], "y");
    }
}
