//! Mock Payment Gateway
//!
//! For tests and offline demos. Statuses are scripted: each re-fetch pops
//! the next status from a queue, and the settlement record becomes visible
//! after a configurable number of expanded fetches.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use testbed_core::model::{
    Balance, BalanceFunds, BalanceTransaction, CardDetails, Charge, Customer, Expandable,
    FeeDetail, PaymentIntent, PaymentMethod, PaymentStatus, Refund,
};

use crate::error::Result;
use crate::gateway::{CreateCustomer, CreatePayment, PaymentGateway};

struct MockState {
    intent: Option<PaymentIntent>,
    scripted: VecDeque<PaymentStatus>,
    created: Vec<PaymentIntent>,
}

/// Scripted gateway double.
pub struct MockGateway {
    state: Mutex<MockState>,
    initial_status: PaymentStatus,
    /// Expanded fetches before the settlement record appears; `None` = never
    settle_after: Option<u32>,
    status_fetches: AtomicU32,
    expanded_fetches: AtomicU32,
    ids: AtomicU32,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// A gateway whose payments succeed immediately and settle on the first
    /// expanded fetch.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                intent: None,
                scripted: VecDeque::new(),
                created: Vec::new(),
            }),
            initial_status: PaymentStatus::Succeeded,
            settle_after: Some(1),
            status_fetches: AtomicU32::new(0),
            expanded_fetches: AtomicU32::new(0),
            ids: AtomicU32::new(0),
        }
    }

    /// Status returned by `create_payment`.
    pub fn with_initial_status(mut self, status: PaymentStatus) -> Self {
        self.initial_status = status;
        self
    }

    /// Statuses returned by successive re-fetches; the last one repeats.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = PaymentStatus>) -> Self {
        self.state.lock().unwrap().scripted = statuses.into_iter().collect();
        self
    }

    /// Number of expanded fetches before the settlement becomes visible.
    pub fn with_settlement_after(mut self, fetches: u32) -> Self {
        self.settle_after = Some(fetches);
        self
    }

    /// Never produce a settlement record.
    pub fn without_settlement(mut self) -> Self {
        self.settle_after = None;
        self
    }

    /// Plain (unexpanded) re-fetches observed so far.
    pub fn status_fetch_count(&self) -> u32 {
        self.status_fetches.load(Ordering::SeqCst)
    }

    /// Expanded re-fetches observed so far.
    pub fn expanded_fetch_count(&self) -> u32 {
        self.expanded_fetches.load(Ordering::SeqCst)
    }

    fn settlement_for(intent: &PaymentIntent) -> BalanceTransaction {
        let fee = intent.amount * 3 / 100 + 30;
        BalanceTransaction {
            amount: intent.amount,
            fee,
            net: intent.amount - fee,
            currency: intent.currency.clone(),
            available_on: intent.created + 7 * 24 * 3600,
            status: "pending".to_string(),
            fee_details: vec![FeeDetail {
                fee_type: "stripe_fee".to_string(),
                amount: fee,
                currency: intent.currency.clone(),
                description: Some("Processing fees".to_string()),
            }],
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment(&self, request: &CreatePayment) -> Result<PaymentIntent> {
        let id = self.ids.fetch_add(1, Ordering::SeqCst) + 1;
        let intent = PaymentIntent {
            id: format!("pi_mock_{}", id),
            amount: request.amount,
            currency: request.currency.clone(),
            status: self.initial_status.clone(),
            latest_charge: Some(Expandable::Id(format!("ch_mock_{}", id))),
            created: 1_700_000_000,
        };

        let mut state = self.state.lock().unwrap();
        state.intent = Some(intent.clone());
        state.created.push(intent.clone());
        Ok(intent)
    }

    async fn retrieve_payment(&self, id: &str, expand_settlement: bool) -> Result<PaymentIntent> {
        let mut state = self.state.lock().unwrap();
        let mut intent = state
            .intent
            .clone()
            .unwrap_or_else(|| PaymentIntent {
                id: id.to_string(),
                amount: 0,
                currency: "chf".to_string(),
                status: self.initial_status.clone(),
                latest_charge: None,
                created: 1_700_000_000,
            });

        if expand_settlement {
            let fetches = self.expanded_fetches.fetch_add(1, Ordering::SeqCst) + 1;
            let settled = self.settle_after.is_some_and(|after| fetches >= after);
            let balance_transaction = settled
                .then(|| Expandable::Object(Box::new(Self::settlement_for(&intent))));
            intent.latest_charge = Some(Expandable::Object(Box::new(Charge {
                id: format!("{}_charge", intent.id),
                created: intent.created,
                balance_transaction,
            })));
        } else {
            self.status_fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(next) = state.scripted.pop_front() {
                intent.status = next;
            }
        }

        state.intent = Some(intent.clone());
        Ok(intent)
    }

    async fn balance(&self) -> Result<Balance> {
        Ok(Balance {
            pending: vec![BalanceFunds {
                currency: "chf".to_string(),
                amount: 500,
            }],
            available: vec![BalanceFunds {
                currency: "chf".to_string(),
                amount: 0,
            }],
        })
    }

    async fn list_payments(&self, limit: u32) -> Result<Vec<PaymentIntent>> {
        let state = self.state.lock().unwrap();
        let mut payments: Vec<PaymentIntent> = state.created.iter().rev().cloned().collect();
        payments.truncate(limit as usize);
        Ok(payments)
    }

    async fn create_customer(&self, request: &CreateCustomer) -> Result<Customer> {
        Ok(Customer {
            id: "cus_mock_1".to_string(),
            name: Some(request.name.clone()),
            email: Some(request.email.clone()),
        })
    }

    async fn create_refund(&self, charge_id: &str) -> Result<Refund> {
        let state = self.state.lock().unwrap();
        let amount = state.intent.as_ref().map_or(0, |intent| intent.amount);
        Ok(Refund {
            id: format!("re_mock_{}", charge_id),
            amount,
            currency: "chf".to_string(),
            status: "succeeded".to_string(),
        })
    }

    async fn list_payment_methods(&self, _limit: u32) -> Result<Vec<PaymentMethod>> {
        Ok(vec![PaymentMethod {
            id: "pm_mock_visa".to_string(),
            method_type: "card".to_string(),
            card: Some(CardDetails {
                brand: "visa".to_string(),
                last4: "4242".to_string(),
            }),
        }])
    }

    fn name(&self) -> &str {
        "mock"
    }
}
