//! Bank statement records

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money out
    Debit,
    /// Money in
    Credit,
}

impl TransactionType {
    /// Label as it appears in a statement
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "DEBIT",
            TransactionType::Credit => "CREDIT",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DEBIT" => Ok(TransactionType::Debit),
            "CREDIT" => Ok(TransactionType::Credit),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Settled
    Success,
    /// Not yet settled
    Pending,
    /// Rejected
    Failed,
}

impl TransactionStatus {
    /// Label as it appears in a statement
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(TransactionStatus::Success),
            "PENDING" => Ok(TransactionStatus::Pending),
            "FAILED" => Ok(TransactionStatus::Failed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One valid statement row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Unix timestamp (seconds)
    pub timestamp: i64,
    /// Counterparty
    pub name: String,
    /// Debit or credit
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Amount in the statement's currency
    pub amount: f64,
    /// Settlement state
    pub status: TransactionStatus,
    /// Free-form description
    pub description: String,
}
