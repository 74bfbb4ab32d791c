//! Domain Models
//!
//! Typed views over the payment API's JSON objects. All identifiers are
//! opaque strings minted by the remote service; every object here is an
//! immutable snapshot refreshed by re-fetching, never mutated locally.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment intent.
///
/// `Succeeded`, `Failed` and `Canceled` are terminal; everything else is an
/// intermediate state the confirmation poller waits out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Succeeded,
    Canceled,
    Failed,
    /// Catch-all for statuses this harness does not model
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentStatus::RequiresConfirmation => "requires_confirmation",
            PaymentStatus::RequiresAction => "requires_action",
            PaymentStatus::Processing => "processing",
            PaymentStatus::RequiresCapture => "requires_capture",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Unknown => "unknown",
        }
    }

    /// No further transitions happen from these states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Succeeded | PaymentStatus::Canceled | PaymentStatus::Failed
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field that the API returns either as a bare id or, when requested via
/// `expand[]`, as the full object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T> Expandable<T> {
    /// The expanded object, if this field was fetched with expansion.
    pub fn object(&self) -> Option<&T> {
        match self {
            Expandable::Id(_) => None,
            Expandable::Object(obj) => Some(obj),
        }
    }
}

/// A payment intent snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Opaque identifier (`pi_...`)
    pub id: String,

    /// Amount in integer minor units
    pub amount: i64,

    /// Lowercase ISO currency code
    pub currency: String,

    /// Current lifecycle status
    pub status: PaymentStatus,

    /// The most recent charge; expanded only when explicitly requested
    #[serde(default)]
    pub latest_charge: Option<Expandable<Charge>>,

    /// Creation timestamp (unix seconds)
    #[serde(default)]
    pub created: i64,
}

impl PaymentIntent {
    /// The settled balance transaction, when the expanded view carries one.
    pub fn settlement(&self) -> Option<&BalanceTransaction> {
        self.latest_charge
            .as_ref()?
            .object()?
            .balance_transaction
            .as_ref()?
            .object()
    }

    /// Identifier of the latest charge, expanded or not.
    pub fn charge_id(&self) -> Option<&str> {
        match self.latest_charge.as_ref()? {
            Expandable::Id(id) => Some(id),
            Expandable::Object(charge) => Some(&charge.id),
        }
    }
}

/// A charge attached to a payment intent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,

    /// Creation timestamp (unix seconds)
    #[serde(default)]
    pub created: i64,

    /// Settlement record; expanded only via `latest_charge.balance_transaction`
    #[serde(default)]
    pub balance_transaction: Option<Expandable<BalanceTransaction>>,
}

/// The financial record produced once a charge's funds are processed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceTransaction {
    /// Gross amount in minor units
    pub amount: i64,

    /// Processing fee in minor units
    #[serde(default)]
    pub fee: i64,

    /// Net amount in minor units
    #[serde(default)]
    pub net: i64,

    pub currency: String,

    /// When the funds become available (unix seconds)
    #[serde(default)]
    pub available_on: i64,

    #[serde(default)]
    pub status: String,

    /// Itemized fee breakdown, in API order
    #[serde(default)]
    pub fee_details: Vec<FeeDetail>,
}

/// One line of a balance transaction's fee breakdown.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeeDetail {
    #[serde(rename = "type")]
    pub fee_type: String,

    pub amount: i64,

    pub currency: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Funds in one currency, pending or available.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceFunds {
    pub currency: String,

    /// Amount in minor units
    pub amount: i64,
}

/// Account balance: pending and available funds per currency.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub pending: Vec<BalanceFunds>,

    #[serde(default)]
    pub available: Vec<BalanceFunds>,
}

/// A customer record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// A refund against a charge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,

    /// Refunded amount in minor units
    pub amount: i64,

    pub currency: String,

    #[serde(default)]
    pub status: String,
}

/// A stored payment method.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,

    #[serde(rename = "type")]
    pub method_type: String,

    #[serde(default)]
    pub card: Option<CardDetails>,
}

/// Card details on a payment method.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardDetails {
    pub brand: String,
    pub last4: String,
}

/// Paginated list envelope used by the API's list endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(PaymentStatus::Succeeded.is_terminal());
        assert!(PaymentStatus::Canceled.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(!PaymentStatus::Processing.is_terminal());
        assert!(!PaymentStatus::RequiresAction.is_terminal());
    }

    #[test]
    fn test_status_roundtrip() {
        let status: PaymentStatus = serde_json::from_str("\"succeeded\"").unwrap();
        assert_eq!(status, PaymentStatus::Succeeded);

        // Unmodeled statuses degrade to Unknown instead of failing
        let status: PaymentStatus = serde_json::from_str("\"some_future_state\"").unwrap();
        assert_eq!(status, PaymentStatus::Unknown);
    }

    #[test]
    fn test_unexpanded_charge_is_an_id() {
        let json = r#"{
            "id": "pi_1",
            "amount": 1000,
            "currency": "chf",
            "status": "succeeded",
            "latest_charge": "ch_1"
        }"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.charge_id(), Some("ch_1"));
        assert!(intent.settlement().is_none());
    }

    #[test]
    fn test_expanded_settlement() {
        let json = r#"{
            "id": "pi_1",
            "amount": 1000,
            "currency": "chf",
            "status": "succeeded",
            "latest_charge": {
                "id": "ch_1",
                "created": 1700000000,
                "balance_transaction": {
                    "amount": 1000,
                    "fee": 59,
                    "net": 941,
                    "currency": "chf",
                    "available_on": 1700600000,
                    "status": "pending",
                    "fee_details": [
                        {"type": "stripe_fee", "amount": 59, "currency": "chf", "description": "Stripe processing fees"}
                    ]
                }
            }
        }"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        let bt = intent.settlement().expect("expanded settlement");
        assert_eq!(bt.amount, 1000);
        assert_eq!(bt.fee, 59);
        assert_eq!(bt.net, 941);
        assert_eq!(bt.fee_details.len(), 1);
        assert_eq!(intent.charge_id(), Some("ch_1"));
    }
}
