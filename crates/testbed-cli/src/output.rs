//! Text Output Rendering
//!
//! The stdout of this binary is a contract: the dashboard server scrapes it
//! line by line, keyed on label prefixes like `ID:` and `Amount:`. Keep the
//! exact shapes here in sync with the server's parsers.
//!
//! Line formats:
//! - list records: `ID:` / `Amount: <minor> <ccy>` / `Status:` / `Created:`,
//!   records separated by a 40-dash rule
//! - creation: `Payment Intent ID: <id>` and `Final status: <status>`
//! - balance: `Pending:` / `Available:` followed by `(ccy, minor)` tuples

use chrono::{DateTime, TimeZone, Utc};

use testbed_core::model::{Balance, BalanceFunds, Customer, PaymentIntent, PaymentMethod, Refund};
use testbed_gateway::PaymentOutcome;

const RULE: &str = "----------------------------------------";

fn format_ts(secs: i64) -> String {
    let ts: DateTime<Utc> = Utc
        .timestamp_opt(secs, 0)
        .single()
        .unwrap_or_else(Utc::now);
    ts.to_rfc3339()
}

fn tuple_list(funds: &[BalanceFunds]) -> String {
    let pairs: Vec<String> = funds
        .iter()
        .map(|f| format!("({}, {})", f.currency, f.amount))
        .collect();
    format!("[{}]", pairs.join(", "))
}

/// Output of the `set` operation: creation summary, transaction details when
/// the settlement arrived, and the two machine-read trailer lines.
pub fn render_creation(outcome: &PaymentOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Payment Intent created: {}\n",
        outcome.intent.id
    ));

    if let Some(bt) = &outcome.settlement {
        out.push_str("\nTransaction Details:\n");
        out.push_str(&format!("Gross amount: {} {}\n", bt.amount, bt.currency));
        out.push_str(&format!("Fee: {} {}\n", bt.fee, bt.currency));
        out.push_str(&format!("Net amount: {} {}\n", bt.net, bt.currency));
        if !bt.fee_details.is_empty() {
            out.push_str("\nFee details:\n");
            for fee in &bt.fee_details {
                out.push_str(&format!(
                    " - {:>12}  {:>5} {}  {}\n",
                    fee.fee_type,
                    fee.amount,
                    fee.currency,
                    fee.description.as_deref().unwrap_or("")
                ));
            }
        }
    } else if outcome.intent.status == testbed_core::model::PaymentStatus::Succeeded {
        out.push_str("No balance transaction available after waiting\n");
    }

    out.push_str(&format!("\nPayment Intent ID: {}\n", outcome.intent.id));
    out.push_str(&format!("Final status: {}\n", outcome.intent.status));
    out
}

pub fn render_balance(balance: &Balance) -> String {
    format!(
        "Current Balance:\nPending: {}\nAvailable: {}\n",
        tuple_list(&balance.pending),
        tuple_list(&balance.available)
    )
}

pub fn render_payments(payments: &[PaymentIntent]) -> String {
    let mut out = String::from("Recent Payments:\n");
    for payment in payments {
        out.push_str(&format!("ID: {}\n", payment.id));
        out.push_str(&format!(
            "Amount: {} {}\n",
            payment.amount, payment.currency
        ));
        out.push_str(&format!("Status: {}\n", payment.status));
        out.push_str(&format!("Created: {}\n", format_ts(payment.created)));
        out.push_str(RULE);
        out.push('\n');
    }
    out
}

pub fn render_payment_details(intent: &PaymentIntent) -> String {
    let Some(charge) = intent.latest_charge.as_ref().and_then(|c| c.object()) else {
        return "No charge found for this payment intent\n".to_string();
    };
    let bt = charge
        .balance_transaction
        .as_ref()
        .and_then(|bt| bt.object());

    let mut out = String::from("Payment Details:\n");
    out.push_str(&format!("Payment ID: {}\n", intent.id));
    out.push_str(&format!("Status: {}\n", intent.status));
    out.push_str(&format!("Amount: {} {}\n", intent.amount, intent.currency));
    out.push_str(&format!(
        "Transaction Date: {} (UTC)\n",
        format_ts(charge.created)
    ));

    if let Some(bt) = bt {
        out.push_str(&format!(
            "Available on: {} (UTC)\n",
            format_ts(bt.available_on)
        ));
        out.push_str(&format!("Balance Transaction Status: {}\n", bt.status));
        out.push_str(&format!("Gross amount: {} {}\n", bt.amount, bt.currency));
        out.push_str(&format!("Fee: {} {}\n", bt.fee, bt.currency));
        out.push_str(&format!("Net amount: {} {}\n", bt.net, bt.currency));
        if !bt.fee_details.is_empty() {
            let details: Vec<String> = bt
                .fee_details
                .iter()
                .map(|fee| {
                    format!(
                        "{} {} {} ({})",
                        fee.fee_type,
                        fee.amount,
                        fee.currency,
                        fee.description.as_deref().unwrap_or("")
                    )
                })
                .collect();
            out.push_str(&format!("Fee details: {}\n", details.join(", ")));
        }
    }
    out
}

pub fn render_customer(customer: &Customer) -> String {
    format!(
        "Customer Created:\nID: {}\nName: {}\nEmail: {}\n",
        customer.id,
        customer.name.as_deref().unwrap_or(""),
        customer.email.as_deref().unwrap_or("")
    )
}

pub fn render_refund(refund: &Refund) -> String {
    format!(
        "Refund Created:\nID: {}\nAmount: {} {}\nStatus: {}\n",
        refund.id, refund.amount, refund.currency, refund.status
    )
}

pub fn render_methods(methods: &[PaymentMethod]) -> String {
    let mut out = String::from("Available Payment Methods:\n");
    for method in methods {
        out.push_str(&format!("ID: {}\n", method.id));
        out.push_str(&format!("Type: {}\n", method.method_type));
        if let Some(card) = &method.card {
            out.push_str(&format!("Brand: {}\n", card.brand));
            out.push_str(&format!("Last 4: {}\n", card.last4));
        }
        out.push_str(RULE);
        out.push('\n');
    }
    out
}
