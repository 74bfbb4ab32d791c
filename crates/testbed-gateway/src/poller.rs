//! Payment Confirmation Poller
//!
//! Drives the create -> confirm -> settle workflow: one bounded loop waiting
//! for a terminal payment status, then (only on success) a second bounded
//! loop waiting for the settlement record to materialize. Both loops sleep a
//! fixed interval between re-fetches and give up after `max_attempts`.

use std::time::Duration;

use testbed_core::config::PollSettings;
use testbed_core::model::{BalanceTransaction, PaymentIntent, PaymentStatus};

use crate::error::Result;
use crate::gateway::{CreatePayment, PaymentGateway};

/// Final snapshot of a confirmation run.
///
/// `settlement` is `None` when the payment did not succeed, or when it
/// succeeded but the settlement record never appeared within the poll
/// bounds - a soft failure, not an error.
#[derive(Clone, Debug)]
pub struct PaymentOutcome {
    pub intent: PaymentIntent,
    pub settlement: Option<BalanceTransaction>,
}

/// Create a payment and poll it to completion.
///
/// Worst-case latency is `2 * max_attempts * check_interval` seconds when
/// both loops run to exhaustion.
pub async fn confirm_payment(
    gateway: &dyn PaymentGateway,
    request: &CreatePayment,
    settings: &PollSettings,
) -> Result<PaymentOutcome> {
    let mut intent = gateway.create_payment(request).await?;
    tracing::info!(id = %intent.id, status = %intent.status, "payment intent created");

    // Status-confirmation loop: at most max_attempts re-fetches, exiting on
    // the first terminal status.
    let mut attempts = 0u32;
    while attempts < settings.max_attempts && !intent.status.is_terminal() {
        tracing::info!(
            attempt = attempts + 1,
            max_attempts = settings.max_attempts,
            status = %intent.status,
            "waiting for payment confirmation"
        );
        tokio::time::sleep(Duration::from_secs(settings.check_interval)).await;
        attempts += 1;
        intent = gateway.retrieve_payment(&intent.id, false).await?;
    }

    tracing::info!(id = %intent.id, status = %intent.status, "confirmation finished");

    if intent.status != PaymentStatus::Succeeded {
        // Attempts exhausted and genuinely-stuck look the same here; either
        // way the settlement poll is skipped entirely.
        return Ok(PaymentOutcome {
            intent,
            settlement: None,
        });
    }

    // Settlement-availability loop: re-fetch with the expanded view until a
    // balance transaction appears.
    let mut attempts = 0u32;
    loop {
        let expanded = gateway.retrieve_payment(&intent.id, true).await?;
        if let Some(settlement) = expanded.settlement().cloned() {
            return Ok(PaymentOutcome {
                intent: expanded,
                settlement: Some(settlement),
            });
        }

        attempts += 1;
        if attempts >= settings.max_attempts {
            tracing::warn!(
                id = %expanded.id,
                attempts,
                "no balance transaction available after waiting"
            );
            return Ok(PaymentOutcome {
                intent: expanded,
                settlement: None,
            });
        }

        tracing::info!(
            attempt = attempts,
            max_attempts = settings.max_attempts,
            "waiting for balance transaction"
        );
        tokio::time::sleep(Duration::from_secs(settings.check_interval)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGateway;

    fn fast(max_attempts: u32) -> PollSettings {
        PollSettings {
            check_interval: 0,
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_status_loop_bounded_by_max_attempts() {
        // Never reaches a terminal status
        let gateway = MockGateway::new().with_initial_status(PaymentStatus::Processing);
        let outcome = confirm_payment(
            &gateway,
            &CreatePayment::new(1000, "chf"),
            &fast(4),
        )
        .await
        .unwrap();

        assert_eq!(gateway.status_fetch_count(), 4);
        assert_eq!(outcome.intent.status, PaymentStatus::Processing);
        assert!(outcome.settlement.is_none());
    }

    #[tokio::test]
    async fn test_status_loop_exits_on_first_terminal() {
        let gateway = MockGateway::new()
            .with_initial_status(PaymentStatus::Processing)
            .with_statuses([PaymentStatus::Processing, PaymentStatus::Succeeded])
            .with_settlement_after(1);
        let outcome = confirm_payment(
            &gateway,
            &CreatePayment::new(1000, "chf"),
            &fast(6),
        )
        .await
        .unwrap();

        // Two re-fetches, not six
        assert_eq!(gateway.status_fetch_count(), 2);
        assert_eq!(outcome.intent.status, PaymentStatus::Succeeded);
        assert!(outcome.settlement.is_some());
    }

    #[tokio::test]
    async fn test_settlement_loop_skipped_unless_succeeded() {
        for terminal in [PaymentStatus::Failed, PaymentStatus::Canceled] {
            let gateway = MockGateway::new()
                .with_initial_status(PaymentStatus::Processing)
                .with_statuses([terminal.clone()]);
            let outcome = confirm_payment(
                &gateway,
                &CreatePayment::new(1000, "chf"),
                &fast(6),
            )
            .await
            .unwrap();

            assert_eq!(outcome.intent.status, terminal);
            assert!(outcome.settlement.is_none());
            // Zero additional (expanded) re-fetches
            assert_eq!(gateway.expanded_fetch_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_settlement_exhaustion_is_a_soft_failure() {
        let gateway = MockGateway::new().without_settlement();
        let outcome = confirm_payment(
            &gateway,
            &CreatePayment::new(1000, "chf"),
            &fast(3),
        )
        .await
        .unwrap();

        assert_eq!(outcome.intent.status, PaymentStatus::Succeeded);
        assert!(outcome.settlement.is_none());
        assert_eq!(gateway.expanded_fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_settlement_appears_mid_poll() {
        let gateway = MockGateway::new().with_settlement_after(2);
        let outcome = confirm_payment(
            &gateway,
            &CreatePayment::new(2500, "usd"),
            &fast(6),
        )
        .await
        .unwrap();

        assert_eq!(gateway.expanded_fetch_count(), 2);
        let settlement = outcome.settlement.expect("settled");
        assert_eq!(settlement.amount, 2500);
    }
}
