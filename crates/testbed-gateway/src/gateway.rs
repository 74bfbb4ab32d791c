//! Payment Gateway Trait
//!
//! Strategy trait over the remote payment API. Every operation the harness
//! performs goes through this interface, so the CLI, the dashboard's direct
//! backend and the tests all share one seam.

use async_trait::async_trait;

use testbed_core::model::{
    Balance, Customer, PaymentIntent, PaymentMethod, Refund,
};

use crate::error::{GatewayError, Result};

/// Request to create and immediately confirm a card payment.
#[derive(Clone, Debug)]
pub struct CreatePayment {
    /// Amount in integer minor units; must be positive
    pub amount: i64,

    /// Lowercase ISO currency code
    pub currency: String,
}

impl CreatePayment {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().to_lowercase(),
        }
    }
}

/// Request to create a customer record.
#[derive(Clone, Debug)]
pub struct CreateCustomer {
    pub email: String,
    pub name: String,
    pub description: Option<String>,
}

/// Client trait for the remote payment API (Strategy pattern)
///
/// Implement this per backend: the production HTTP client, a mock for
/// tests, a recording proxy, etc.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent configured for immediate confirmation
    async fn create_payment(&self, request: &CreatePayment) -> Result<PaymentIntent>;

    /// Re-fetch a payment intent; `expand_settlement` requests the
    /// `latest_charge.balance_transaction` view
    async fn retrieve_payment(&self, id: &str, expand_settlement: bool) -> Result<PaymentIntent>;

    /// Current account balance
    async fn balance(&self) -> Result<Balance>;

    /// Most recent payment intents, newest first
    async fn list_payments(&self, limit: u32) -> Result<Vec<PaymentIntent>>;

    /// Create a customer record
    async fn create_customer(&self, request: &CreateCustomer) -> Result<Customer>;

    /// Refund a settled charge in full
    async fn create_refund(&self, charge_id: &str) -> Result<Refund>;

    /// Stored card payment methods
    async fn list_payment_methods(&self, limit: u32) -> Result<Vec<PaymentMethod>>;

    /// Gateway name, for logs
    fn name(&self) -> &str;
}

/// Refund the charge behind a payment intent.
///
/// The API refunds charges, not intents, so this resolves the intent's
/// latest charge first and fails with [`GatewayError::MissingCharge`] when
/// the payment never produced one.
pub async fn refund_for_payment(
    gateway: &dyn PaymentGateway,
    payment_id: &str,
) -> Result<Refund> {
    let intent = gateway.retrieve_payment(payment_id, false).await?;
    let charge_id = intent
        .charge_id()
        .ok_or_else(|| GatewayError::MissingCharge(payment_id.to_string()))?;
    gateway.create_refund(charge_id).await
}
