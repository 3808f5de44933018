//! Transaction domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::validate_account_id;
use crate::{Error, Result};

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    Authorized,
    Booked,
    Pending,
    Rejected,
}

/// Closed set of transaction types reported by the native store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    Adjustment,
    Atm,
    BillPayment,
    Check,
    Deposit,
    DirectDebit,
    DirectDeposit,
    Dividend,
    Fee,
    Interest,
    Loan,
    PointOfSale,
    Refund,
    StandingOrder,
    Transfer,
    Withdrawal,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreditDebitIndicator {
    Credit,
    Debit,
}

/// One financial transaction.
///
/// Records are immutable once observed. An updated transaction arrives as a
/// whole replacement keyed by `id`, never as a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub account_id: String,
    /// Signed amount in the account currency
    pub amount: Decimal,
    /// ISO 4217 currency code
    pub currency_code: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub transaction_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_category_code: Option<u16>,
    pub status: TransactionStatus,
    pub transaction_type: TransactionType,
    pub credit_debit_indicator: CreditDebitIndicator,
}

/// Options accepted by `getTransactions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,
}

impl TransactionQuery {
    pub fn for_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Rejects malformed options before anything reaches the native layer.
    pub fn validate(&self) -> Result<()> {
        if let Some(account_id) = &self.account_id {
            validate_account_id(account_id)?;
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(Error::InvalidDateRange(format!(
                    "start date {} is after end date {}",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )));
            }
        }
        Ok(())
    }

    /// Whether a record falls inside this query.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if let Some(account_id) = &self.account_id {
            if &record.account_id != account_id {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if record.transaction_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.transaction_date > end {
                return false;
            }
        }
        true
    }
}
