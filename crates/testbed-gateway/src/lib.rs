//! # testbed-gateway
//!
//! Payment API client for the pay-testbed harness.
//!
//! The [`PaymentGateway`] trait is the single seam between this system and
//! the remote payment service. Two implementations ship with the crate:
//!
//! - [`StripeGateway`] - the real thing, form-encoded REST over `reqwest`
//! - [`MockGateway`] - scripted statuses for tests and offline demos
//!
//! On top of the trait sits [`confirm_payment`], the create -> poll ->
//! settle workflow with bounded retries and fixed sleep intervals.

mod error;
mod gateway;
mod mock;
mod poller;
mod stripe;

pub use error::{GatewayError, Result};
pub use gateway::{refund_for_payment, CreateCustomer, CreatePayment, PaymentGateway};
pub use mock::MockGateway;
pub use poller::{confirm_payment, PaymentOutcome};
pub use stripe::StripeGateway;
