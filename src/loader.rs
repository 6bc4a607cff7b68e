use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::slice;
use std::str::FromStr;

use csv::StringRecord;
use thiserror::Error;

use crate::tick::Tick;

pub const TIMESTAMP_COLUMN: &str = "timestamp_ms";
pub const SYMBOL_COLUMN: &str = "symbol";
pub const PRICE_COLUMN: &str = "price";
pub const VOLUME_COLUMN: &str = "volume";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("tick file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("tick file is missing required column `{column}`")]
    MissingField { column: &'static str },
    #[error("row {row}: column `{column}` has malformed value {value:?}")]
    MalformedValue {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("failed to read tick file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse tick file")]
    Csv(#[from] csv::Error),
}

/// Ordered, read-only ticks in file row order. This is the publication order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSeries {
    ticks: Vec<Tick>,
}

impl TickSeries {
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tick> {
        self.ticks.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Tick> {
        self.ticks.iter()
    }

    pub fn as_slice(&self) -> &[Tick] {
        &self.ticks
    }
}

impl From<Vec<Tick>> for TickSeries {
    fn from(ticks: Vec<Tick>) -> Self {
        Self { ticks }
    }
}

impl<'a> IntoIterator for &'a TickSeries {
    type Item = &'a Tick;
    type IntoIter = slice::Iter<'a, Tick>;

    fn into_iter(self) -> Self::IntoIter {
        self.ticks.iter()
    }
}

struct ColumnIndex {
    timestamp: usize,
    symbol: usize,
    price: usize,
    volume: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|header| header == column)
                .ok_or(LoadError::MissingField { column })
        };

        Ok(Self {
            timestamp: find(TIMESTAMP_COLUMN)?,
            symbol: find(SYMBOL_COLUMN)?,
            price: find(PRICE_COLUMN)?,
            volume: find(VOLUME_COLUMN)?,
        })
    }
}

/// Reads every data row of a header-driven CSV file into a [`TickSeries`].
///
/// Loading is all or nothing: the first row that fails conversion aborts the
/// whole load and no ticks are returned.
pub fn load_ticks(path: impl AsRef<Path>) -> Result<TickSeries, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut ticks = Vec::new();
    for (offset, record) in reader.records().enumerate() {
        let record = record?;
        ticks.push(parse_row(&record, &columns, offset + 1)?);
    }

    Ok(TickSeries::from(ticks))
}

fn parse_row(record: &StringRecord, columns: &ColumnIndex, row: usize) -> Result<Tick, LoadError> {
    let symbol = field(record, columns.symbol, SYMBOL_COLUMN, row)?;
    if symbol.is_empty() {
        return Err(LoadError::MalformedValue {
            row,
            column: SYMBOL_COLUMN,
            value: String::new(),
        });
    }

    Ok(Tick {
        timestamp_ms: parse_number(record, columns.timestamp, TIMESTAMP_COLUMN, row)?,
        symbol: symbol.to_string(),
        price: parse_finite(record, columns.price, PRICE_COLUMN, row)?,
        volume: parse_finite(record, columns.volume, VOLUME_COLUMN, row)?,
    })
}

fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    column: &'static str,
    row: usize,
) -> Result<&'r str, LoadError> {
    record.get(index).ok_or_else(|| LoadError::MalformedValue {
        row,
        column,
        value: String::new(),
    })
}

fn parse_number<T: FromStr>(
    record: &StringRecord,
    index: usize,
    column: &'static str,
    row: usize,
) -> Result<T, LoadError> {
    let raw = field(record, index, column, row)?;
    raw.trim().parse().map_err(|_| LoadError::MalformedValue {
        row,
        column,
        value: raw.to_string(),
    })
}

// JSON has no encoding for NaN or infinities, so they never leave the loader.
fn parse_finite(
    record: &StringRecord,
    index: usize,
    column: &'static str,
    row: usize,
) -> Result<f64, LoadError> {
    let value: f64 = parse_number(record, index, column, row)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LoadError::MalformedValue {
            row,
            column,
            value: field(record, index, column, row)?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp csv");
        file.write_all(contents.as_bytes()).expect("write temp csv");
        file
    }

    #[test]
    fn loads_rows_with_semantic_types() {
        let file = csv_file("timestamp_ms,symbol,price,volume\n1000,AAPL,100.5,10\n1010,AAPL,100.7,5\n");
        let ticks = load_ticks(file.path()).expect("load ticks");

        assert_eq!(ticks.len(), 2);
        assert_eq!(
            ticks.as_slice(),
            &[
                Tick {
                    timestamp_ms: 1000,
                    symbol: "AAPL".into(),
                    price: 100.5,
                    volume: 10.0,
                },
                Tick {
                    timestamp_ms: 1010,
                    symbol: "AAPL".into(),
                    price: 100.7,
                    volume: 5.0,
                },
            ]
        );
    }

    #[test]
    fn column_order_is_irrelevant_and_extra_columns_ignored() {
        let file = csv_file("volume,exchange,symbol,price,timestamp_ms\n7.5,XNAS,MSFT,410.25,42\n");
        let ticks = load_ticks(file.path()).expect("load ticks");

        let tick = ticks.get(0).expect("one tick");
        assert_eq!(tick.timestamp_ms, 42);
        assert_eq!(tick.symbol, "MSFT");
        assert_eq!(tick.price, 410.25);
        assert_eq!(tick.volume, 7.5);
    }

    #[test]
    fn row_order_is_kept_even_when_timestamps_go_backwards() {
        let file = csv_file(
            "timestamp_ms,symbol,price,volume\n3000,C,1,1\n1000,A,1,1\n1000,A,2,1\n2000,B,1,1\n",
        );
        let ticks = load_ticks(file.path()).expect("load ticks");

        let timestamps: Vec<i64> = ticks.iter().map(|tick| tick.timestamp_ms).collect();
        assert_eq!(timestamps, vec![3000, 1000, 1000, 2000]);
    }

    #[test]
    fn header_only_file_yields_empty_series() {
        let file = csv_file("timestamp_ms,symbol,price,volume\n");
        let ticks = load_ticks(file.path()).expect("load ticks");
        assert!(ticks.is_empty());
    }

    #[test]
    fn missing_volume_column_is_a_schema_error() {
        let file = csv_file("timestamp_ms,symbol,price\n1000,AAPL,100.5\n");
        let err = load_ticks(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingField { column: "volume" }));
    }

    #[test]
    fn empty_file_reports_first_missing_column() {
        let file = csv_file("");
        let err = load_ticks(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingField { column: "timestamp_ms" }));
    }

    #[test]
    fn malformed_price_fails_the_whole_load() {
        let file = csv_file(
            "timestamp_ms,symbol,price,volume\n1000,AAPL,100.5,10\n1010,AAPL,N/A,5\n1020,AAPL,100.9,1\n",
        );
        let err = load_ticks(file.path()).unwrap_err();
        match err {
            LoadError::MalformedValue { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "price");
                assert_eq!(value, "N/A");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fractional_timestamp_is_malformed() {
        let file = csv_file("timestamp_ms,symbol,price,volume\n1000.5,AAPL,1,1\n");
        let err = load_ticks(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MalformedValue {
                column: "timestamp_ms",
                ..
            }
        ));
    }

    #[test]
    fn non_finite_numbers_are_malformed() {
        let file = csv_file("timestamp_ms,symbol,price,volume\n1000,AAPL,NaN,1\n");
        assert!(matches!(
            load_ticks(file.path()).unwrap_err(),
            LoadError::MalformedValue { column: "price", .. }
        ));

        let file = csv_file("timestamp_ms,symbol,price,volume\n1000,AAPL,1,inf\n");
        assert!(matches!(
            load_ticks(file.path()).unwrap_err(),
            LoadError::MalformedValue { column: "volume", .. }
        ));
    }

    #[test]
    fn empty_symbol_is_malformed() {
        let file = csv_file("timestamp_ms,symbol,price,volume\n1000,,1,1\n");
        assert!(matches!(
            load_ticks(file.path()).unwrap_err(),
            LoadError::MalformedValue { column: "symbol", row: 1, .. }
        ));
    }

    #[test]
    fn numeric_fields_tolerate_surrounding_whitespace() {
        let file = csv_file("timestamp_ms,symbol,price,volume\n 1000 ,AAPL, 1.25 ,3 \n");
        let ticks = load_ticks(file.path()).expect("load ticks");
        assert_eq!(ticks.get(0).map(|tick| tick.price), Some(1.25));
    }

    #[test]
    fn short_row_is_malformed() {
        let file = csv_file("timestamp_ms,symbol,price,volume\n1000,AAPL,1,1\n1010,AAPL,1\n");
        assert!(matches!(
            load_ticks(file.path()).unwrap_err(),
            LoadError::MalformedValue {
                row: 2,
                column: "volume",
                ..
            }
        ));
    }

    #[test]
    fn extra_trailing_fields_are_ignored() {
        let file = csv_file("timestamp_ms,symbol,price,volume\n1000,AAPL,1.5,2,XNAS,late\n");
        let ticks = load_ticks(file.path()).expect("load ticks");
        assert_eq!(
            ticks.get(0),
            Some(&Tick {
                timestamp_ms: 1000,
                symbol: "AAPL".into(),
                price: 1.5,
                volume: 2.0,
            })
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_ticks(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }
}
