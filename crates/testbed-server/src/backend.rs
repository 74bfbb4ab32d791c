//! Operations Backend
//!
//! One trait, two adapters. The dashboard's handlers only ever see
//! [`OpsBackend`]; whether an operation runs as a direct gateway call or as
//! a CLI subprocess whose stdout gets scraped is picked once at startup via
//! `TESTBED_BACKEND`. Both adapters produce identical row structures.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use testbed_core::config::PollSettings;
use testbed_core::model::{BalanceFunds, PaymentIntent};
use testbed_core::money::cents_to_units;
use testbed_gateway::{confirm_payment, refund_for_payment, CreatePayment, PaymentGateway};

use crate::console::{ConsoleEntry, ConsoleStore};
use crate::error::{BackendError, Result};
use crate::parse::{
    parse_balance, parse_payment_creation, parse_payment_details, parse_payments,
    summarize_balance, title_case, BalanceRow, BalanceSummary, CreationSummary, PaymentDetail,
    PaymentRow,
};
use crate::runner::CliRunner;

/// Which adapter serves the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Shell out to the `pay-testbed` binary and parse its stdout
    Cli,
    /// Call the payment gateway in-process
    Direct,
}

impl BackendKind {
    pub fn from_env() -> Self {
        match std::env::var("TESTBED_BACKEND") {
            Ok(value) => Self::from_name(&value),
            Err(_) => BackendKind::Cli,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "direct" | "gateway" => BackendKind::Direct,
            _ => BackendKind::Cli,
        }
    }
}

/// Everything the dashboard needs from a payments backend.
///
/// `context`, where present, names the console slot the invocation should be
/// recorded under; adapters without console output ignore it.
#[async_trait]
pub trait OpsBackend: Send + Sync {
    async fn balance(&self, context: Option<&str>) -> Result<BalanceSummary>;

    async fn recent_payments(&self, limit: u32) -> Result<Vec<PaymentRow>>;

    async fn payment_detail(
        &self,
        payment_id: &str,
        context: Option<&str>,
    ) -> Result<Option<PaymentDetail>>;

    async fn create_payment(
        &self,
        amount_minor: i64,
        currency: &str,
        context: Option<&str>,
    ) -> Result<CreationSummary>;

    async fn create_refund(&self, payment_id: &str, context: Option<&str>) -> Result<()>;

    fn kind(&self) -> &'static str;
}

// ============================================================================
// CLI adapter
// ============================================================================

/// Backend that shells out to the CLI binary.
pub struct CliBackend {
    runner: CliRunner,
    console: Arc<ConsoleStore>,
}

impl CliBackend {
    pub fn new(runner: CliRunner, console: Arc<ConsoleStore>) -> Self {
        Self { runner, console }
    }

    /// Run one CLI operation, record it to the console store, and escalate
    /// the two failure classes the dashboard cares about: execution errors
    /// (not found, timeout) and non-zero exits.
    async fn execute(
        &self,
        operation: &str,
        extra: &[String],
        context: Option<&str>,
        label: &str,
    ) -> Result<crate::runner::CommandResult> {
        let result = self.runner.run(operation, extra).await;

        if let Some(context) = context {
            self.console
                .record(context, ConsoleEntry::from_result(label, &result));
        }

        if let Some(error) = &result.error {
            return Err(BackendError::Execution(error.clone()));
        }
        if result.returncode != 0 {
            let stderr = result.stderr.trim();
            let message = if stderr.is_empty() {
                format!("{} exited with code {}", operation, result.returncode)
            } else {
                stderr.to_string()
            };
            return Err(BackendError::CommandFailed(message));
        }

        Ok(result)
    }

    /// Fill per-payment metadata the list output does not carry.
    async fn hydrate(&self, payments: &mut [PaymentRow]) {
        for payment in payments.iter_mut() {
            let detail = self
                .payment_detail(&payment.payment_id, None)
                .await
                .ok()
                .flatten();
            if let Some(detail) = detail {
                if payment.created_at.is_empty() {
                    payment.created_at = detail.transaction_date.clone();
                }
                payment.fee_major = Some(detail.fee_major);
            }
        }
    }
}

#[async_trait]
impl OpsBackend for CliBackend {
    async fn balance(&self, context: Option<&str>) -> Result<BalanceSummary> {
        let result = self
            .execute("get", &[], context, "Refresh balance")
            .await?;
        Ok(parse_balance(&result.stdout))
    }

    async fn recent_payments(&self, limit: u32) -> Result<Vec<PaymentRow>> {
        let extra = ["--limit".to_string(), limit.to_string()];
        let result = self
            .execute("list-payments", &extra, None, "List payment intents")
            .await?;
        let mut payments = parse_payments(&result.stdout);
        self.hydrate(&mut payments).await;
        Ok(payments)
    }

    async fn payment_detail(
        &self,
        payment_id: &str,
        context: Option<&str>,
    ) -> Result<Option<PaymentDetail>> {
        let extra = ["--payment-id".to_string(), payment_id.to_string()];
        let label = format!("Payment details ({})", payment_id);
        let result = self
            .execute("payment-details", &extra, context, &label)
            .await?;
        Ok(parse_payment_details(&result.stdout))
    }

    async fn create_payment(
        &self,
        amount_minor: i64,
        currency: &str,
        context: Option<&str>,
    ) -> Result<CreationSummary> {
        let extra = [
            "--amount".to_string(),
            amount_minor.to_string(),
            "--currency".to_string(),
            currency.to_string(),
        ];
        let label = format!(
            "Create payment ({} {})",
            cents_to_units(amount_minor),
            currency.to_uppercase()
        );
        let result = self.execute("set", &extra, context, &label).await?;
        Ok(parse_payment_creation(&result.stdout))
    }

    async fn create_refund(&self, payment_id: &str, context: Option<&str>) -> Result<()> {
        let extra = ["--payment-id".to_string(), payment_id.to_string()];
        let label = format!("Create refund ({})", payment_id);
        self.execute("create-refund", &extra, context, &label)
            .await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "cli"
    }
}

// ============================================================================
// Direct adapter
// ============================================================================

/// Backend that calls the payment gateway in-process.
pub struct DirectBackend {
    gateway: Arc<dyn PaymentGateway>,
    settings: PollSettings,
}

impl DirectBackend {
    pub fn new(gateway: Arc<dyn PaymentGateway>, settings: PollSettings) -> Self {
        Self { gateway, settings }
    }
}

fn format_ts(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

fn funds_rows(funds: &[BalanceFunds]) -> Vec<BalanceRow> {
    funds
        .iter()
        .map(|f| BalanceRow::new(&f.currency, f.amount))
        .collect()
}

fn row_from_intent(intent: &PaymentIntent) -> PaymentRow {
    PaymentRow {
        payment_id: intent.id.clone(),
        amount_major: cents_to_units(intent.amount),
        currency: intent.currency.to_uppercase(),
        status: title_case(intent.status.as_str()),
        created_at: format_ts(intent.created),
        fee_major: None,
    }
}

/// Build the detail view from an expanded intent; `None` mirrors the CLI
/// path's "no charge found" outcome.
fn detail_from_intent(intent: &PaymentIntent) -> Option<PaymentDetail> {
    let charge = intent.latest_charge.as_ref()?.object()?;
    let bt = charge
        .balance_transaction
        .as_ref()
        .and_then(|bt| bt.object());

    Some(PaymentDetail {
        payment_id: intent.id.clone(),
        status: title_case(intent.status.as_str()),
        amount_major: cents_to_units(intent.amount),
        currency: intent.currency.to_uppercase(),
        transaction_date: format_ts(charge.created),
        available_on: bt.map(|bt| format_ts(bt.available_on)).unwrap_or_default(),
        balance_status: bt.map(|bt| title_case(&bt.status)).unwrap_or_default(),
        gross_major: cents_to_units(bt.map_or(0, |bt| bt.amount)),
        fee_major: cents_to_units(bt.map_or(0, |bt| bt.fee)),
        net_major: cents_to_units(bt.map_or(0, |bt| bt.net)),
    })
}

#[async_trait]
impl OpsBackend for DirectBackend {
    async fn balance(&self, _context: Option<&str>) -> Result<BalanceSummary> {
        let balance = self.gateway.balance().await?;
        Ok(summarize_balance(
            funds_rows(&balance.pending),
            funds_rows(&balance.available),
        ))
    }

    async fn recent_payments(&self, limit: u32) -> Result<Vec<PaymentRow>> {
        let intents = self.gateway.list_payments(limit).await?;
        let mut payments: Vec<PaymentRow> = intents.iter().map(row_from_intent).collect();

        for payment in payments.iter_mut() {
            let detail = match self.gateway.retrieve_payment(&payment.payment_id, true).await {
                Ok(expanded) => detail_from_intent(&expanded),
                Err(err) => {
                    tracing::debug!(id = %payment.payment_id, %err, "metadata hydration failed");
                    None
                }
            };
            if let Some(detail) = detail {
                payment.fee_major = Some(detail.fee_major);
            }
        }

        Ok(payments)
    }

    async fn payment_detail(
        &self,
        payment_id: &str,
        _context: Option<&str>,
    ) -> Result<Option<PaymentDetail>> {
        let intent = self.gateway.retrieve_payment(payment_id, true).await?;
        Ok(detail_from_intent(&intent))
    }

    async fn create_payment(
        &self,
        amount_minor: i64,
        currency: &str,
        _context: Option<&str>,
    ) -> Result<CreationSummary> {
        let request = CreatePayment::new(amount_minor, currency);
        let outcome = confirm_payment(self.gateway.as_ref(), &request, &self.settings).await?;
        Ok(CreationSummary {
            payment_id: Some(outcome.intent.id),
            final_status: Some(outcome.intent.status.to_string()),
        })
    }

    async fn create_refund(&self, payment_id: &str, _context: Option<&str>) -> Result<()> {
        refund_for_payment(self.gateway.as_ref(), payment_id).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "direct"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use testbed_gateway::MockGateway;

    fn fast_settings() -> PollSettings {
        PollSettings {
            check_interval: 0,
            max_attempts: 3,
        }
    }

    #[test]
    fn test_backend_kind_from_name() {
        assert_eq!(BackendKind::from_name("direct"), BackendKind::Direct);
        assert_eq!(BackendKind::from_name("GATEWAY"), BackendKind::Direct);
        assert_eq!(BackendKind::from_name("cli"), BackendKind::Cli);
        assert_eq!(BackendKind::from_name(""), BackendKind::Cli);
    }

    #[tokio::test]
    async fn test_direct_balance_summary() {
        let backend = DirectBackend::new(Arc::new(MockGateway::new()), fast_settings());
        let summary = backend.balance(None).await.unwrap();

        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].currency, "CHF");
        assert_eq!(summary.rows[0].pending, dec!(5.00));
        assert_eq!(summary.rows[0].available, dec!(0.00));
    }

    #[tokio::test]
    async fn test_direct_create_payment() {
        let backend = DirectBackend::new(Arc::new(MockGateway::new()), fast_settings());
        let summary = backend.create_payment(1000, "chf", None).await.unwrap();

        assert_eq!(summary.payment_id.as_deref(), Some("pi_mock_1"));
        assert_eq!(summary.final_status.as_deref(), Some("succeeded"));
    }

    #[tokio::test]
    async fn test_direct_recent_payments_hydrates_fees() {
        let gateway = Arc::new(MockGateway::new());
        let backend = DirectBackend::new(gateway.clone(), fast_settings());
        backend.create_payment(1000, "chf", None).await.unwrap();

        let payments = backend.recent_payments(5).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_major, dec!(10.00));
        assert_eq!(payments[0].currency, "CHF");
        assert!(payments[0].fee_major.is_some());
    }
}
