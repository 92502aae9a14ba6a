//! Domain Models
//!
//! Invoice data as exchanged with the invoice API.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InvoiceError;

/// Days until a new invoice falls due when no date is given
pub const DEFAULT_PAYMENT_TERM_DAYS: i64 = 30;

/// Invoice lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Unpaid,
    Overdue,
}

impl InvoiceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Unpaid => "Unpaid",
            Self::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "unpaid" => Ok(Self::Unpaid),
            "overdue" => Ok(Self::Overdue),
            _ => Err(InvoiceError::InvalidRequest(format!("unknown invoice status: {s}"))),
        }
    }
}

impl Serialize for InvoiceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InvoiceStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single invoice
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Server-assigned identifier (0 before creation)
    pub id: i64,

    /// Free-text description, also used for lookup
    pub description: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Issue date
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,

    pub status: InvoiceStatus,

    #[serde(with = "timestamp")]
    pub due: DateTime<Utc>,
}

impl Invoice {
    /// Build the draft sent to the API for a new invoice
    pub fn draft(request: &CreateInvoiceRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            description: request.description.trim().to_string(),
            amount: request.amount,
            date: now,
            status: InvoiceStatus::Pending,
            due: request
                .due
                .unwrap_or_else(|| now + Duration::days(DEFAULT_PAYMENT_TERM_DAYS)),
        }
    }
}

/// Request to create an invoice
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub description: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "optional_timestamp")]
    pub due: Option<DateTime<Utc>>,
}

impl CreateInvoiceRequest {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
            due: None,
        }
    }

    pub const fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.due = Some(due);
        self
    }

    /// Reject requests the API would refuse anyway
    pub fn validate(&self) -> Result<(), InvoiceError> {
        if self.description.trim().is_empty() {
            return Err(InvoiceError::InvalidRequest("description must not be empty".into()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(InvoiceError::InvalidRequest(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

/// Status update body for `POST {base}/{id}/status`
#[derive(Clone, Debug, Serialize)]
pub struct StatusUpdate {
    pub status: InvoiceStatus,
}

/// Parse a timestamp as RFC 3339, an offset-less date-time (read as UTC), or
/// a bare date (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

mod optional_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => super::timestamp::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_status_is_case_insensitive() {
        assert_eq!("paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert_eq!("OVERDUE".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Overdue);
        assert!("cancelled".parse::<InvoiceStatus>().is_err());

        let status: InvoiceStatus = serde_json::from_value(json!("unpaid")).unwrap();
        assert_eq!(status, InvoiceStatus::Unpaid);
        assert_eq!(serde_json::to_value(InvoiceStatus::Pending).unwrap(), json!("Pending"));
    }

    #[test]
    fn test_invoice_from_api_json() {
        // Shape returned by the invoice API: offset-less timestamps, numeric amount
        let raw = json!({
            "id": 7,
            "description": "Acme consulting",
            "amount": 1250.50,
            "date": "2025-03-01T09:30:00",
            "status": "Unpaid",
            "due": "2025-03-31T00:00:00Z"
        });

        let invoice: Invoice = serde_json::from_value(raw).unwrap();
        assert_eq!(invoice.id, 7);
        assert_eq!(invoice.amount, dec!(1250.50));
        assert_eq!(invoice.date, Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap());
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);

        let out = serde_json::to_value(&invoice).unwrap();
        assert_eq!(out["amount"], json!(1250.5));
        assert_eq!(out["due"], json!("2025-03-31T00:00:00Z"));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let midnight = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-04-30"), Some(midnight));
        assert_eq!(parse_timestamp("2025-04-30T00:00:00.000"), Some(midnight));
        assert_eq!(parse_timestamp("2025-04-30T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_timestamp("next tuesday"), None);
    }

    #[test]
    fn test_draft_defaults_due_date() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        let draft = Invoice::draft(&CreateInvoiceRequest::new("  Globex support ", dec!(99)), now);

        assert_eq!(draft.id, 0);
        assert_eq!(draft.description, "Globex support");
        assert_eq!(draft.status, InvoiceStatus::Pending);
        assert_eq!(draft.date, now);
        assert_eq!(draft.due, now + Duration::days(30));

        let due = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let draft = Invoice::draft(&CreateInvoiceRequest::new("x", dec!(1)).with_due(due), now);
        assert_eq!(draft.due, due);
    }

    #[test]
    fn test_validate_request() {
        assert!(CreateInvoiceRequest::new("Hosting", dec!(10)).validate().is_ok());
        assert!(CreateInvoiceRequest::new("  ", dec!(10)).validate().is_err());
        assert!(CreateInvoiceRequest::new("Hosting", dec!(0)).validate().is_err());
    }
}
