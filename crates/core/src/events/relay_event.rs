//! Relay event types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::authorization::AuthorizationStatus;
use crate::changes::ChangeBatch;
use crate::constants::{
    EVENT_AUTHORIZATION_STATUS_CHANGED, EVENT_FINANCE_DATA_CHANGED, EVENT_TRANSACTIONS_CHANGED,
    SOURCE_BACKGROUND, SOURCE_EXTENSION,
};
use crate::errors::Error;
use crate::utils::now_millis;

/// The fixed set of events JS can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    #[serde(rename = "onAuthorizationStatusChanged")]
    AuthorizationStatusChanged,
    #[serde(rename = "onTransactionsChanged")]
    TransactionsChanged,
    #[serde(rename = "onFinanceDataChanged")]
    FinanceDataChanged,
}

impl EventName {
    pub const ALL: [EventName; 3] = [
        EventName::AuthorizationStatusChanged,
        EventName::TransactionsChanged,
        EventName::FinanceDataChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::AuthorizationStatusChanged => EVENT_AUTHORIZATION_STATUS_CHANGED,
            EventName::TransactionsChanged => EVENT_TRANSACTIONS_CHANGED,
            EventName::FinanceDataChanged => EVENT_FINANCE_DATA_CHANGED,
        }
    }
}

impl FromStr for EventName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::unknown(format!("Unsupported event name '{}'", s)))
    }
}

/// Where an onFinanceDataChanged notification originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataChangeSource {
    /// The extension process posted the cross-process signal
    Extension,
    /// A background task persisted new batches
    Background,
}

impl DataChangeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataChangeSource::Extension => SOURCE_EXTENSION,
            DataChangeSource::Background => SOURCE_BACKGROUND,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationStatusChangedPayload {
    pub status: AuthorizationStatus,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceDataChangedPayload {
    pub timestamp: i64,
    pub source: DataChangeSource,
}

/// Events forwarded to the JS layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    AuthorizationStatusChanged(AuthorizationStatusChangedPayload),
    TransactionsChanged(ChangeBatch),
    FinanceDataChanged(FinanceDataChangedPayload),
}

impl RelayEvent {
    pub fn authorization_status_changed(status: AuthorizationStatus) -> Self {
        Self::AuthorizationStatusChanged(AuthorizationStatusChangedPayload {
            status,
            timestamp: now_millis(),
        })
    }

    pub fn transactions_changed(batch: ChangeBatch) -> Self {
        Self::TransactionsChanged(batch)
    }

    pub fn finance_data_changed(source: DataChangeSource) -> Self {
        Self::FinanceDataChanged(FinanceDataChangedPayload {
            timestamp: now_millis(),
            source,
        })
    }

    pub fn name(&self) -> EventName {
        match self {
            RelayEvent::AuthorizationStatusChanged(_) => EventName::AuthorizationStatusChanged,
            RelayEvent::TransactionsChanged(_) => EventName::TransactionsChanged,
            RelayEvent::FinanceDataChanged(_) => EventName::FinanceDataChanged,
        }
    }

    /// The JSON body handed to JS listeners.
    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            RelayEvent::AuthorizationStatusChanged(p) => serde_json::to_value(p),
            RelayEvent::TransactionsChanged(batch) => serde_json::to_value(batch),
            RelayEvent::FinanceDataChanged(p) => serde_json::to_value(p),
        }
    }

    /// Account the event belongs to, if any.
    pub fn account_id(&self) -> Option<&str> {
        match self {
            RelayEvent::TransactionsChanged(batch) => Some(batch.account_id.as_str()),
            _ => None,
        }
    }
}
