use crate::domain::model::RawTable;
use crate::utils::error::{EtlError, Result};
use std::io::Read;

/// `" Pickup Latitude "` -> `"pickup_latitude"`
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

impl RawTable {
    /// Reads a headed CSV. Rows the reader rejects are counted, not fatal;
    /// short rows are padded so every row has one cell per header.
    pub fn from_reader<R: Read>(provider: &str, reader: R, normalize_headers: bool) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| {
                // BOM 會黏在第一個欄位名稱上
                let h = h.trim_start_matches('\u{feff}');
                if normalize_headers {
                    normalize_column_name(h)
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut rows = Vec::new();
        let mut unreadable_rows = 0;
        for record in csv_reader.records() {
            match record {
                Ok(record) => {
                    let mut row: Vec<String> = record.iter().map(str::to_string).collect();
                    row.resize(headers.len(), String::new());
                    rows.push(row);
                }
                Err(e) => {
                    tracing::debug!("{}: skipping unreadable CSV record: {}", provider, e);
                    unreadable_rows += 1;
                }
            }
        }

        tracing::debug!(
            "{}: read {} rows, {} columns ({} unreadable)",
            provider,
            rows.len(),
            headers.len(),
            unreadable_rows
        );

        Ok(Self {
            provider: provider.to_string(),
            headers,
            rows,
            unreadable_rows,
        })
    }

    pub fn from_bytes(provider: &str, data: &[u8], normalize_headers: bool) -> Result<Self> {
        Self::from_reader(provider, data, normalize_headers)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| EtlError::MissingColumnError {
                provider: self.provider.clone(),
                column: name.to_string(),
                available: self.headers.join(", "),
            })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name(" Fare Amount "), "fare_amount");
        assert_eq!(normalize_column_name("Pickup Latitude"), "pickup_latitude");
        assert_eq!(normalize_column_name("distance"), "distance");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in ["  Booking ID", "Ride Distance KM", "fare_amount", "A  B"] {
            let once = normalize_column_name(name);
            assert_eq!(normalize_column_name(&once), once);
        }
    }

    #[test]
    fn test_from_reader_normalizes_and_pads() {
        let data = "\u{feff}Booking ID, Fare ,Distance\n1,\"₹1,200\",12\n2,300\n";
        let table = RawTable::from_bytes("Ola", data.as_bytes(), true).unwrap();

        assert_eq!(table.headers, vec!["booking_id", "fare", "distance"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], "₹1,200");
        assert_eq!(table.rows[1], vec!["2", "300", ""]);
    }

    #[test]
    fn test_headers_kept_verbatim_without_normalization() {
        let data = "Fare Amount,pickup_latitude\n5,40.7\n";
        let table = RawTable::from_bytes("cab", data.as_bytes(), false).unwrap();
        assert_eq!(table.headers[0], "Fare Amount");
        assert!(table.column_index("fare_amount").is_err());
    }

    #[test]
    fn test_missing_column_lists_available() {
        let data = "key,fare_amount\n1,5\n";
        let table = RawTable::from_bytes("Uber", data.as_bytes(), true).unwrap();
        assert_eq!(table.column_index("fare_amount").unwrap(), 1);

        let err = table.column_index("pickup_latitude").unwrap_err();
        match err {
            EtlError::MissingColumnError {
                provider,
                column,
                available,
            } => {
                assert_eq!(provider, "Uber");
                assert_eq!(column, "pickup_latitude");
                assert_eq!(available, "key, fare_amount");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
