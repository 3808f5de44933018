//! Account and balance domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Whether the account holds money or owes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AccountKind {
    #[default]
    Asset,
    Liability,
}

/// A financial account as reported by the native store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub display_name: String,
    pub institution_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_description: Option<String>,
    /// ISO 4217 currency code
    pub currency_code: String,
    pub kind: AccountKind,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub opening_date: Option<DateTime<Utc>>,
}

/// Which figure a balance reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BalanceKind {
    Available,
    Booked,
    AvailableAndBooked,
}

/// Point-in-time balance of one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub id: String,
    pub account_id: String,
    pub amount: Decimal,
    pub currency_code: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub as_of_date: DateTime<Utc>,
    pub kind: BalanceKind,
}

/// Checks that an account id is UUID-shaped.
///
/// Native account identifiers are UUIDs; anything else is rejected before a
/// native call is attempted.
pub fn validate_account_id(account_id: &str) -> Result<()> {
    let trimmed = account_id.trim();
    if trimmed.is_empty() || Uuid::parse_str(trimmed).is_err() {
        return Err(Error::InvalidAccountId(account_id.to_string()));
    }
    Ok(())
}
