//! Bank statement CSV processing.
//!
//! The job payload the `csv-processing` binary runs on the pool: each job
//! parses one statement file into a [`StatementReport`].

pub mod entity;
pub mod parser;

pub use entity::{Transaction, TransactionStatus, TransactionType};
pub use parser::{parse_csv, parse_file, FieldError, StatementReport, INVALID_CONTENT};
