//! # testbed-core
//!
//! Domain model and shared plumbing for the pay-testbed harness.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      pay-testbed                             │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │  CLI       │  │  Dashboard   │  │  PaymentGateway      │  │
//! │  │  binary    │──│  server      │──│  (testbed-gateway)   │  │
//! │  └────────────┘  └──────────────┘  └──────────────────────┘  │
//! │         └───────────────┴──── testbed-core (this crate) ────┘│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything that crosses the payment-API boundary carries amounts in
//! integer minor currency units; conversion to decimal major units lives in
//! [`money`] and happens only at the display edge.

pub mod config;
pub mod error;
pub mod model;
pub mod money;

pub use config::{Config, PollSettings};
pub use error::ConfigError;
pub use model::{
    Balance, BalanceFunds, BalanceTransaction, CardDetails, Charge, Customer, Expandable,
    FeeDetail, PaymentIntent, PaymentMethod, PaymentStatus, Refund,
};
pub use money::cents_to_units;
