//! Tests for account and balance models.

use super::*;
use crate::errors::ErrorCode;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

#[test]
fn test_validate_account_id_accepts_uuid() {
    assert!(validate_account_id("6F9619FF-8B86-D011-B42D-00C04FC964FF").is_ok());
    assert!(validate_account_id("1b4e28ba-2fa1-11d2-883f-0016d3cca427").is_ok());
}

#[test]
fn test_validate_account_id_rejects_garbage() {
    for bad in ["", "   ", "A1", "not-a-uuid-at-all"] {
        let err = validate_account_id(bad).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAccountId, "input: {:?}", bad);
    }
}

#[test]
fn test_account_serializes_camel_case() {
    let account = Account {
        id: "1b4e28ba-2fa1-11d2-883f-0016d3cca427".to_string(),
        display_name: "Everyday Card".to_string(),
        institution_name: "Apple".to_string(),
        account_description: None,
        currency_code: "USD".to_string(),
        kind: AccountKind::Liability,
        opening_date: None,
    };

    let value = serde_json::to_value(&account).unwrap();
    assert_eq!(value["displayName"], "Everyday Card");
    assert_eq!(value["kind"], "liability");
    assert!(value.get("accountDescription").is_none());
    assert!(value.get("openingDate").is_none());
}

#[test]
fn test_balance_amount_and_date_are_numbers() {
    let balance = AccountBalance {
        id: "b1".to_string(),
        account_id: "1b4e28ba-2fa1-11d2-883f-0016d3cca427".to_string(),
        amount: dec!(-42.50),
        currency_code: "EUR".to_string(),
        as_of_date: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        kind: BalanceKind::AvailableAndBooked,
    };

    let value = serde_json::to_value(&balance).unwrap();
    assert_eq!(value["amount"].as_f64(), Some(-42.5));
    assert_eq!(value["asOfDate"].as_i64(), Some(1_700_000_000_000));
    assert_eq!(value["kind"], "availableAndBooked");
}
