//! CSV bank statement parser

use super::entity::{Transaction, TransactionStatus, TransactionType};
use csv::{ByteRecord, ReaderBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Message recorded for a line the CSV reader itself rejected
pub const INVALID_CONTENT: &str = "the content is invalid";

/// Why a single field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// `timestamp` is not an integer
    #[error("invalid 'timestamp', expected to be integer")]
    InvalidTimestamp,

    /// `name` is empty
    #[error("the 'name' is required")]
    MissingName,

    /// `type` is neither DEBIT nor CREDIT
    #[error("the posible value for 'type' is DEBIT, CREDIT")]
    InvalidType,

    /// `amount` is not a number
    #[error("invalid 'amount', expected to be number")]
    InvalidAmount,

    /// `status` is not one of the known states
    #[error("the posible value for 'status' is SUCCESS, PENDING, FAILED")]
    InvalidStatus,

    /// `description` is empty
    #[error("the 'description' is required")]
    MissingDescription,
}

/// Outcome of parsing one statement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatementReport {
    /// Every row that passed validation, in file order
    pub transactions: Vec<Transaction>,
    /// Messages per rejected line, keyed `line[<n>]` with the header as line 1
    pub errors: BTreeMap<String, Vec<String>>,
}

impl StatementReport {
    /// True when no line was rejected
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

const COLUMN_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Timestamp,
    Name,
    Type,
    Amount,
    Status,
    Description,
}

impl Column {
    const ALL: [Column; COLUMN_COUNT] = [
        Column::Timestamp,
        Column::Name,
        Column::Type,
        Column::Amount,
        Column::Status,
        Column::Description,
    ];

    fn header(self) -> &'static str {
        match self {
            Column::Timestamp => "timestamp",
            Column::Name => "name",
            Column::Type => "type",
            Column::Amount => "amount",
            Column::Status => "status",
            Column::Description => "description",
        }
    }
}

/// Position of every required column within a record
#[derive(Debug, Clone, Copy)]
struct ColumnIndex([usize; COLUMN_COUNT]);

impl ColumnIndex {
    /// Map header names to positions. On failure returns how many of the
    /// required columns were found.
    fn from_header(record: &ByteRecord) -> std::result::Result<Self, usize> {
        let mut found = [None; COLUMN_COUNT];
        for (position, header) in record.iter().enumerate() {
            for (slot, column) in Column::ALL.iter().enumerate() {
                if header == column.header().as_bytes() {
                    found[slot] = Some(position);
                }
            }
        }

        let mapped = found.iter().flatten().count();
        if mapped != COLUMN_COUNT {
            return Err(mapped);
        }

        let mut positions = [0; COLUMN_COUNT];
        for (position, slot) in positions.iter_mut().zip(found) {
            *position = slot.unwrap_or_default();
        }
        Ok(Self(positions))
    }

    /// Field bytes are taken as they are; invalid UTF-8 is replaced, not rejected
    fn field(&self, record: &ByteRecord, column: Column) -> String {
        let slot = column as usize;
        let raw = record.get(self.0[slot]).unwrap_or_default();
        String::from_utf8_lossy(raw).trim().to_string()
    }
}

fn line_key(line: usize) -> String {
    format!("line[{}]", line)
}

fn non_empty(raw: &str, error: FieldError) -> std::result::Result<String, FieldError> {
    if raw.is_empty() {
        Err(error)
    } else {
        Ok(raw.to_string())
    }
}

fn take<T>(field: std::result::Result<T, FieldError>, errors: &mut Vec<String>) -> Option<T> {
    match field {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    ClosingQuote,
}

/// True when the raw record text holds a quote the reader should have refused:
/// a `"` inside an unquoted field, text after a closing quote, or a quoted
/// field that never closes.
fn has_stray_quote(raw: &[u8]) -> bool {
    let mut state = QuoteState::FieldStart;
    for &byte in raw {
        state = match (state, byte) {
            (QuoteState::Quoted, b'"') => QuoteState::ClosingQuote,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::ClosingQuote, b'"') => QuoteState::Quoted,
            (_, b',' | b'\r' | b'\n') => QuoteState::FieldStart,
            (QuoteState::FieldStart, b'"') => QuoteState::Quoted,
            (QuoteState::Unquoted, b'"') | (QuoteState::ClosingQuote, _) => return true,
            (QuoteState::FieldStart | QuoteState::Unquoted, _) => QuoteState::Unquoted,
        };
    }
    state == QuoteState::Quoted
}

/// Validate one data row, collecting every failing column in column order
fn parse_row(
    record: &ByteRecord,
    columns: &ColumnIndex,
) -> std::result::Result<Transaction, Vec<String>> {
    let mut errors = Vec::new();
    let timestamp = take(
        columns
            .field(record, Column::Timestamp)
            .parse::<i64>()
            .map_err(|_| FieldError::InvalidTimestamp),
        &mut errors,
    );
    let name = take(
        non_empty(&columns.field(record, Column::Name), FieldError::MissingName),
        &mut errors,
    );
    let transaction_type = take(
        columns
            .field(record, Column::Type)
            .parse::<TransactionType>()
            .map_err(|_| FieldError::InvalidType),
        &mut errors,
    );
    let amount = take(
        columns
            .field(record, Column::Amount)
            .parse::<f64>()
            .map_err(|_| FieldError::InvalidAmount),
        &mut errors,
    );
    let status = take(
        columns
            .field(record, Column::Status)
            .parse::<TransactionStatus>()
            .map_err(|_| FieldError::InvalidStatus),
        &mut errors,
    );
    let description = take(
        non_empty(
            &columns.field(record, Column::Description),
            FieldError::MissingDescription,
        ),
        &mut errors,
    );

    match (timestamp, name, transaction_type, amount, status, description) {
        (
            Some(timestamp),
            Some(name),
            Some(transaction_type),
            Some(amount),
            Some(status),
            Some(description),
        ) => Ok(Transaction {
            timestamp,
            name,
            transaction_type,
            amount,
            status,
            description,
        }),
        _ => Err(errors),
    }
}

/// Parse a bank statement.
///
/// The first readable record is the header; the six required columns may
/// come in any order. A header missing any of them stops parsing. Data rows
/// with invalid fields are reported under their line and left out of the
/// transactions. A record the CSV reader refuses, such as a ragged row or a
/// stray quote, is recorded as [`INVALID_CONTENT`] and parsing continues.
///
/// # Example
///
/// ```
/// use csv_worker_pool::bankstatement::parse_csv;
///
/// let text = "timestamp,name,type,amount,status,description\n\
///             1624507883,JOHN DOE,DEBIT,250000,SUCCESS,restaurant\n\
///             WIB,E-COMMERCE A,DEBIT,150000,FAILED,clothes\n";
///
/// let report = parse_csv(text.as_bytes());
/// assert_eq!(report.transactions.len(), 1);
/// assert_eq!(
///     report.errors["line[3]"],
///     vec!["invalid 'timestamp', expected to be integer".to_string()]
/// );
/// ```
pub fn parse_csv<R: Read>(mut reader: R) -> StatementReport {
    let mut report = StatementReport::default();

    // Bytes read before a failure are still parsed
    let mut input = Vec::new();
    let read_error = reader.read_to_end(&mut input).err();

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(input.as_slice());
    let mut header: Option<ColumnIndex> = None;
    let mut record = ByteRecord::new();
    let mut line = 0;

    loop {
        let start = reader.position().byte() as usize;
        let read = reader.read_byte_record(&mut record);
        let end = reader.position().byte() as usize;
        line += 1;

        let raw = input.get(start..end).unwrap_or_default();
        match read {
            Ok(false) => break,
            Ok(true) if !has_stray_quote(raw) => {}
            Ok(true) => {
                log::debug!("{}: stray quote in record", line_key(line));
                report
                    .errors
                    .insert(line_key(line), vec![INVALID_CONTENT.to_string()]);
                continue;
            }
            Err(e) => {
                log::debug!("{}: {}", line_key(line), e);
                report
                    .errors
                    .insert(line_key(line), vec![INVALID_CONTENT.to_string()]);
                continue;
            }
        }

        match header {
            None => match ColumnIndex::from_header(&record) {
                Ok(columns) => header = Some(columns),
                Err(mapped) => {
                    report.errors.insert(
                        line_key(line),
                        vec![format!(
                            "expected {} required columns, got {}",
                            COLUMN_COUNT,
                            mapped
                        )],
                    );
                    return report;
                }
            },
            Some(columns) => match parse_row(&record, &columns) {
                Ok(transaction) => report.transactions.push(transaction),
                Err(errors) => {
                    report.errors.insert(line_key(line), errors);
                }
            },
        }
    }

    if let Some(e) = read_error {
        log::debug!("{}: {}", line_key(line), e);
        report
            .errors
            .insert(line_key(line), vec![INVALID_CONTENT.to_string()]);
    }

    report
}

/// Open `path` and parse it as a bank statement
pub fn parse_file<P: AsRef<Path>>(path: P) -> io::Result<StatementReport> {
    let file = File::open(path)?;
    Ok(parse_csv(io::BufReader::new(file)))
}
