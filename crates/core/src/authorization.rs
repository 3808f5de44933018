//! Authorization status model.

use serde::{Deserialize, Serialize};

/// FinanceKit authorization state as seen by JS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    #[default]
    NotDetermined,
    Denied,
    Authorized,
    /// The platform or OS version cannot provide FinanceKit
    Unavailable,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationStatus::Authorized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::NotDetermined => "notDetermined",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::Authorized => "authorized",
            AuthorizationStatus::Unavailable => "unavailable",
        }
    }
}
