//! HTTP Handlers
//!
//! JSON endpoints for the dashboard. Action handlers answer with
//! flash-style `{ level, message }` objects rather than failing the
//! request: operation errors are part of the page, not HTTP errors.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::console::ConsoleEntry;
use crate::parse::{BalanceSummary, PaymentDetail, PaymentRow};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
}

/// Flash-style status message for the presentation layer.
#[derive(Serialize)]
pub struct FlashMessage {
    pub level: &'static str,
    pub message: String,
}

impl FlashMessage {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: "success",
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: "error",
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub balance: Option<BalanceSummary>,
    pub balance_error: Option<String>,
    pub balance_timestamp: String,
    pub spotlight_payments: Vec<PaymentRow>,
    pub console: Option<ConsoleEntry>,
}

#[derive(Serialize)]
pub struct PaymentsResponse {
    pub payments: Vec<PaymentRow>,
    pub list_error: Option<String>,
    pub detail: Option<PaymentDetail>,
    pub detail_error: Option<String>,
    pub console: Option<ConsoleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentsQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,

    #[serde(default)]
    pub payment_id: Option<String>,
}

fn default_limit() -> u32 {
    8
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Major-unit amount as typed by the user; accepts `12.50` and `12,50`
    pub amount_major: String,

    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "chf".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreateRefundRequest {
    pub payment_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.backend.kind(),
    })
}

/// Dashboard data: balance card, spotlight payments, last console output
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let balance_timestamp = Utc::now().to_rfc3339();

    let (balance, balance_error) = match state.backend.balance(None).await {
        Ok(summary) => (Some(summary), None),
        Err(err) => (None, Some(err.to_string())),
    };

    // Spotlight list is best-effort; a failure leaves it empty
    let spotlight_payments = state.backend.recent_payments(3).await.unwrap_or_default();

    Json(DashboardResponse {
        balance,
        balance_error,
        balance_timestamp,
        spotlight_payments,
        console: state.console.get("dashboard"),
    })
}

/// Payments list with optional expanded detail
pub async fn payments_view(
    State(state): State<AppState>,
    Query(query): Query<PaymentsQuery>,
) -> Json<PaymentsResponse> {
    let (payments, list_error) = match state.backend.recent_payments(query.limit).await {
        Ok(rows) => (rows, None),
        Err(err) => (Vec::new(), Some(err.to_string())),
    };

    let mut detail = None;
    let mut detail_error = None;
    if let Some(payment_id) = query.payment_id.as_deref() {
        match state.backend.payment_detail(payment_id, Some("payments")).await {
            Ok(Some(found)) => detail = Some(found),
            Ok(None) => detail_error = Some("Unable to parse payment details.".to_string()),
            Err(err) => detail_error = Some(err.to_string()),
        }
    }

    Json(PaymentsResponse {
        payments,
        list_error,
        detail,
        detail_error,
        console: state.console.get("payments"),
    })
}

/// Convert a user-typed major amount into minor units.
///
/// Accepts a comma decimal separator; rejects non-numbers, zero and
/// negatives.
fn amount_to_minor(raw: &str) -> Option<i64> {
    let normalized = raw.replace(',', ".");
    let amount: Decimal = normalized.trim().parse().ok()?;
    if amount <= Decimal::ZERO {
        return None;
    }
    (amount * Decimal::from(100)).round().to_i64()
}

/// Create and confirm a payment
pub async fn create_payment_action(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Json<FlashMessage> {
    let Some(amount_minor) = amount_to_minor(&payload.amount_major) else {
        return Json(FlashMessage::error(
            "Enter a valid amount greater than zero (e.g. 12.50).",
        ));
    };

    match state
        .backend
        .create_payment(amount_minor, &payload.currency, Some("dashboard"))
        .await
    {
        Ok(summary) => match summary.payment_id {
            Some(payment_id) => Json(FlashMessage::success(format!(
                "Payment {} completed with status {}",
                payment_id,
                summary.final_status.as_deref().unwrap_or("unknown")
            ))),
            None => Json(FlashMessage::success("Payment created.")),
        },
        Err(err) => Json(FlashMessage::error(err.to_string())),
    }
}

/// Refund the charge behind a payment intent
pub async fn create_refund_action(
    State(state): State<AppState>,
    Json(payload): Json<CreateRefundRequest>,
) -> Json<FlashMessage> {
    let payment_id = payload.payment_id.trim();
    if payment_id.is_empty() {
        return Json(FlashMessage::error("Provide a payment intent id to refund."));
    }

    match state
        .backend
        .create_refund(payment_id, Some("payments"))
        .await
    {
        Ok(()) => Json(FlashMessage::success(format!(
            "Refund requested for {}.",
            payment_id
        ))),
        Err(err) => Json(FlashMessage::error(err.to_string())),
    }
}

/// Re-run the balance operation and record it to the dashboard console
pub async fn refresh_balance_action(State(state): State<AppState>) -> Json<FlashMessage> {
    match state.backend.balance(Some("dashboard")).await {
        Ok(_) => Json(FlashMessage::success("Balance refreshed.")),
        Err(err) => Json(FlashMessage::error(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_to_minor() {
        assert_eq!(amount_to_minor("12.50"), Some(1250));
        assert_eq!(amount_to_minor("12,50"), Some(1250));
        assert_eq!(amount_to_minor(" 10 "), Some(1000));
        assert_eq!(amount_to_minor("0"), None);
        assert_eq!(amount_to_minor("-5"), None);
        assert_eq!(amount_to_minor("abc"), None);
    }

    #[test]
    fn test_flash_message_shape() {
        let flash = FlashMessage::success("Balance refreshed.");
        let json = serde_json::to_value(&flash).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["message"], "Balance refreshed.");
    }
}
