//! Text Output Parsers
//!
//! Reconstructs display rows from the CLI's captured stdout. The upstream
//! text format is not contractually guaranteed, so nothing here errors:
//! unrecognized lines are skipped and missing fields fall back to
//! zero/empty/"unknown" defaults.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use testbed_core::money::cents_to_units;

/// Funds in one currency as parsed from a balance line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub currency: String,
    pub amount_minor: i64,
    pub amount_major: Decimal,
}

impl BalanceRow {
    pub fn new(currency: &str, amount_minor: i64) -> Self {
        Self {
            currency: currency.to_uppercase(),
            amount_minor,
            amount_major: cents_to_units(amount_minor),
        }
    }
}

/// Pending and available funds merged per currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CombinedBalanceRow {
    pub currency: String,
    pub pending: Decimal,
    pub available: Decimal,
}

/// Everything the dashboard needs to render the balance card.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BalanceSummary {
    pub pending: Vec<BalanceRow>,
    pub available: Vec<BalanceRow>,
    pub rows: Vec<CombinedBalanceRow>,
    pub pending_total: Decimal,
    pub available_total: Decimal,
}

/// One payment in the list view.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentRow {
    pub payment_id: String,
    pub amount_major: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: String,
    pub fee_major: Option<Decimal>,
}

/// Expanded view of a single payment.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentDetail {
    pub payment_id: String,
    pub status: String,
    pub amount_major: Decimal,
    pub currency: String,
    pub transaction_date: String,
    pub available_on: String,
    pub balance_status: String,
    pub gross_major: Decimal,
    pub fee_major: Decimal,
    pub net_major: Decimal,
}

/// Identifiers scraped from the `set` operation's output.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CreationSummary {
    pub payment_id: Option<String>,
    pub final_status: Option<String>,
}

/// Stage 1 of the balance-list parse: a literal bracketed structure of
/// quoted tuples, e.g. `[('chf', 500), ('usd', 0)]`.
///
/// Strict by design: any malformed entry rejects the whole input so the
/// regex stage gets a chance at it.
pub fn parse_quoted_pairs(raw: &str) -> Vec<BalanceRow> {
    let raw = raw.trim();
    let Some(inner) = raw
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return Vec::new();
    };
    let inner = inner.trim();
    if inner.is_empty() {
        return Vec::new();
    }

    let mut rows = Vec::new();
    for segment in inner.split("),") {
        let segment = segment
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let Some((currency_part, amount_part)) = segment.split_once(',') else {
            return Vec::new();
        };
        let currency_part = currency_part.trim();
        if !is_quoted(currency_part) {
            return Vec::new();
        }
        let currency = currency_part.trim_matches(|c| c == '\'' || c == '"');
        let Ok(amount) = amount_part.trim().parse::<i64>() else {
            return Vec::new();
        };
        rows.push(BalanceRow::new(currency, amount));
    }
    rows
}

fn is_quoted(token: &str) -> bool {
    (token.len() >= 2)
        && ((token.starts_with('\'') && token.ends_with('\''))
            || (token.starts_with('"') && token.ends_with('"')))
}

static BARE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([A-Za-z0-9_]+)\s*,\s*(-?\d+)\)").expect("hard-coded pattern")
});

/// Stage 2 of the balance-list parse: unquoted `(chf,123)` tuples anywhere
/// in the text.
pub fn parse_bare_pairs(raw: &str) -> Vec<BalanceRow> {
    BARE_PAIR
        .captures_iter(raw)
        .filter_map(|caps| {
            let currency = caps.get(1)?.as_str();
            let amount = caps.get(2)?.as_str().parse::<i64>().ok()?;
            Some(BalanceRow::new(currency, amount))
        })
        .collect()
}

/// Two-stage balance list parse: literal structure first, regex fallback
/// when that yields nothing.
pub fn parse_amount_list(raw: &str) -> Vec<BalanceRow> {
    let rows = parse_quoted_pairs(raw);
    if !rows.is_empty() {
        return rows;
    }
    parse_bare_pairs(raw)
}

/// Merge pending/available rows into the dashboard summary. Shared between
/// the text path and the direct-gateway path so both render identically.
pub fn summarize_balance(pending: Vec<BalanceRow>, available: Vec<BalanceRow>) -> BalanceSummary {
    let mut combined: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for row in &pending {
        combined.entry(row.currency.clone()).or_default().0 = row.amount_major;
    }
    for row in &available {
        combined.entry(row.currency.clone()).or_default().1 = row.amount_major;
    }

    let rows = combined
        .into_iter()
        .map(|(currency, (pending, available))| CombinedBalanceRow {
            currency,
            pending,
            available,
        })
        .collect();

    let pending_total = pending.iter().map(|row| row.amount_major).sum();
    let available_total = available.iter().map(|row| row.amount_major).sum();

    BalanceSummary {
        pending,
        available,
        rows,
        pending_total,
        available_total,
    }
}

/// Parse the `get` operation's stdout into a balance summary.
pub fn parse_balance(stdout: &str) -> BalanceSummary {
    let mut pending = Vec::new();
    let mut available = Vec::new();

    for line in stdout.lines() {
        if line.starts_with("Pending") {
            if let Some((_, rest)) = line.split_once(':') {
                pending = parse_amount_list(rest);
            }
        } else if line.starts_with("Available") {
            if let Some((_, rest)) = line.split_once(':') {
                available = parse_amount_list(rest);
            }
        }
    }

    summarize_balance(pending, available)
}

#[derive(Default)]
struct PartialPayment {
    payment_id: Option<String>,
    amount_minor: Option<i64>,
    currency: Option<String>,
    status: Option<String>,
    created_at: Option<String>,
}

impl PartialPayment {
    fn into_row(self) -> PaymentRow {
        PaymentRow {
            payment_id: self.payment_id.unwrap_or_default(),
            amount_major: cents_to_units(self.amount_minor.unwrap_or(0)),
            currency: self
                .currency
                .map_or_else(|| "CHF".to_string(), |c| c.to_uppercase()),
            status: title_case(self.status.as_deref().unwrap_or("unknown")),
            created_at: self.created_at.unwrap_or_default(),
            fee_major: None,
        }
    }
}

/// Parse the `list-payments` stdout. Each `ID:` line starts a new record; a
/// record is finalized at the next `ID:` line or end of input.
pub fn parse_payments(stdout: &str) -> Vec<PaymentRow> {
    let mut payments: Vec<PaymentRow> = Vec::new();
    let mut current: Option<PartialPayment> = None;

    for line in stdout.lines() {
        let stripped = line.trim();
        if let Some(rest) = stripped.strip_prefix("ID:") {
            if let Some(done) = current.take() {
                payments.push(done.into_row());
            }
            current = Some(PartialPayment {
                payment_id: Some(rest.trim().to_string()),
                ..PartialPayment::default()
            });
        } else if let Some(rest) = stripped.strip_prefix("Amount:") {
            if let Some(partial) = current.as_mut() {
                let mut parts = rest.split_whitespace();
                if let (Some(minor), Some(currency)) = (parts.next(), parts.next()) {
                    partial.amount_minor = minor.parse().ok();
                    partial.currency = Some(currency.to_string());
                }
            }
        } else if let Some(rest) = stripped.strip_prefix("Status:") {
            if let Some(partial) = current.as_mut() {
                partial.status = Some(rest.trim().to_string());
            }
        } else if stripped.to_lowercase().starts_with("created:") {
            if let (Some(partial), Some((_, rest))) = (current.as_mut(), stripped.split_once(':'))
            {
                partial.created_at = Some(rest.trim().to_string());
            }
        }
    }
    if let Some(done) = current.take() {
        payments.push(done.into_row());
    }

    payments.retain(|row| !row.payment_id.is_empty());
    payments
}

/// Parse the `payment-details` stdout. Returns `None` when the output never
/// names a payment id.
pub fn parse_payment_details(stdout: &str) -> Option<PaymentDetail> {
    let mut values: HashMap<String, String> = HashMap::new();
    for line in stdout.lines() {
        let stripped = line.trim();
        if let Some((key, value)) = stripped.split_once(':') {
            values.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let payment_id = values.get("payment id")?.clone();

    Some(PaymentDetail {
        payment_id,
        status: title_case(values.get("status").map_or("", String::as_str)),
        amount_major: cents_to_units(extract_minor(values.get("amount"))),
        currency: extract_currency(values.get("amount"), "CHF"),
        transaction_date: clean_timestamp(values.get("transaction date")),
        available_on: clean_timestamp(values.get("available on")),
        balance_status: title_case(
            values
                .get("balance transaction status")
                .map_or("", String::as_str),
        ),
        gross_major: cents_to_units(extract_minor(values.get("gross amount"))),
        fee_major: cents_to_units(extract_minor(values.get("fee"))),
        net_major: cents_to_units(extract_minor(values.get("net amount"))),
    })
}

/// Parse the `set` stdout for the creation trailer lines.
pub fn parse_payment_creation(stdout: &str) -> CreationSummary {
    let mut summary = CreationSummary::default();
    for line in stdout.lines() {
        let stripped = line.trim();
        let lower = stripped.to_lowercase();
        if lower.starts_with("payment intent id") {
            summary.payment_id = after_colon(stripped);
        } else if lower.starts_with("final status") {
            summary.final_status = after_colon(stripped);
        }
    }
    summary
}

fn after_colon(line: &str) -> Option<String> {
    line.split_once(':')
        .map(|(_, value)| value.trim().to_string())
}

/// First whitespace token as a minor-unit amount, defaulting to zero.
fn extract_minor(raw: Option<&String>) -> i64 {
    raw.and_then(|value| value.split_whitespace().next())
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}

/// Currency code following the amount token, uppercased.
fn extract_currency(raw: Option<&String>, default: &str) -> String {
    let Some(raw) = raw else {
        return default.to_string();
    };
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() >= 2 {
        parts[parts.len() - 1].to_uppercase()
    } else {
        default.to_string()
    }
}

fn clean_timestamp(raw: Option<&String>) -> String {
    raw.map(|ts| ts.replace("+00:00", "").replace("(UTC)", "").trim().to_string())
        .unwrap_or_default()
}

/// Uppercase the first letter of each alphabetic run, lowercase the rest.
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quoted_stage_parses_literal_tuples() {
        let rows = parse_quoted_pairs("[('chf', 500), ('usd', 0)]");
        assert_eq!(
            rows,
            vec![BalanceRow::new("chf", 500), BalanceRow::new("usd", 0)]
        );
    }

    #[test]
    fn test_quoted_stage_rejects_unquoted_input() {
        assert!(parse_quoted_pairs("(chf,123), (usd,0)").is_empty());
        assert!(parse_quoted_pairs("[(chf, 500)]").is_empty());
    }

    #[test]
    fn test_bare_stage_ignores_quoted_tuples() {
        assert_eq!(
            parse_bare_pairs("(chf,123), (usd,0)"),
            vec![BalanceRow::new("chf", 123), BalanceRow::new("usd", 0)]
        );
        assert!(parse_bare_pairs("[('chf', 500)]").is_empty());
    }

    #[test]
    fn test_amount_list_falls_back_to_regex() {
        let rows = parse_amount_list("(chf, 500)");
        assert_eq!(rows, vec![BalanceRow::new("chf", 500)]);
    }

    #[test]
    fn test_balance_summary_from_quoted_output() {
        let summary = parse_balance("Pending: [('chf', 500)]\nAvailable: [('chf', 0)]\n");

        assert_eq!(summary.pending, vec![BalanceRow::new("chf", 500)]);
        assert_eq!(summary.available, vec![BalanceRow::new("chf", 0)]);
        assert_eq!(
            summary.rows,
            vec![CombinedBalanceRow {
                currency: "CHF".to_string(),
                pending: dec!(5.00),
                available: dec!(0.00),
            }]
        );
        assert_eq!(summary.pending_total, dec!(5.00));
        assert_eq!(summary.available_total, dec!(0.00));
    }

    #[test]
    fn test_balance_rows_sorted_by_currency() {
        let summary =
            parse_balance("Pending: [(usd, 100), (chf, 200)]\nAvailable: [(eur, 50)]\n");
        let currencies: Vec<&str> =
            summary.rows.iter().map(|row| row.currency.as_str()).collect();
        assert_eq!(currencies, vec!["CHF", "EUR", "USD"]);
    }

    #[test]
    fn test_single_payment_record() {
        let rows = parse_payments("ID: pi_1\nAmount: 1000 usd\nStatus: succeeded\n");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payment_id, "pi_1");
        assert_eq!(rows[0].amount_major, dec!(10.00));
        assert_eq!(rows[0].currency, "USD");
        assert_eq!(rows[0].status, "Succeeded");
    }

    #[test]
    fn test_records_split_on_id_lines() {
        let stdout = "Recent Payments:\n\
                      ID: pi_1\nAmount: 1000 chf\nStatus: succeeded\nCreated: 2024-05-01\n\
                      ----------------------------------------\n\
                      ID: pi_2\nAmount: 2500 usd\nStatus: processing\n";
        let rows = parse_payments(stdout);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].payment_id, "pi_1");
        assert_eq!(rows[0].created_at, "2024-05-01");
        assert_eq!(rows[1].payment_id, "pi_2");
        assert_eq!(rows[1].status, "Processing");
    }

    #[test]
    fn test_missing_fields_default() {
        let rows = parse_payments("ID: pi_9\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_major, dec!(0.00));
        assert_eq!(rows[0].currency, "CHF");
        assert_eq!(rows[0].status, "Unknown");
        assert_eq!(rows[0].created_at, "");
    }

    #[test]
    fn test_malformed_stdout_yields_empty_list() {
        assert!(parse_payments("").is_empty());
        assert!(parse_payments("complete garbage\nno labels here\n").is_empty());
        // Records without an id are discarded
        assert!(parse_payments("Amount: 1000 chf\nStatus: succeeded\n").is_empty());
    }

    #[test]
    fn test_payment_details_roundtrip() {
        let stdout = "Payment Details:\n\
                      Payment ID: pi_1\n\
                      Status: succeeded\n\
                      Amount: 1000 chf\n\
                      Transaction Date: 2024-05-01T10:00:00+00:00 (UTC)\n\
                      Available on: 2024-05-08T10:00:00+00:00 (UTC)\n\
                      Balance Transaction Status: pending\n\
                      Gross amount: 1000 chf\n\
                      Fee: 59 chf\n\
                      Net amount: 941 chf\n";
        let detail = parse_payment_details(stdout).expect("detail parsed");

        assert_eq!(detail.payment_id, "pi_1");
        assert_eq!(detail.status, "Succeeded");
        assert_eq!(detail.amount_major, dec!(10.00));
        assert_eq!(detail.currency, "CHF");
        assert_eq!(detail.transaction_date, "2024-05-01T10:00:00");
        assert_eq!(detail.available_on, "2024-05-08T10:00:00");
        assert_eq!(detail.balance_status, "Pending");
        assert_eq!(detail.gross_major, dec!(10.00));
        assert_eq!(detail.fee_major, dec!(0.59));
        assert_eq!(detail.net_major, dec!(9.41));
    }

    #[test]
    fn test_payment_details_requires_id() {
        assert!(parse_payment_details("Status: succeeded\n").is_none());
        assert!(parse_payment_details("").is_none());
    }

    #[test]
    fn test_creation_summary() {
        let stdout = "Payment Intent created: pi_1\n\
                      Payment Intent ID: pi_1\n\
                      Final status: succeeded\n";
        let summary = parse_payment_creation(stdout);

        assert_eq!(summary.payment_id.as_deref(), Some("pi_1"));
        assert_eq!(summary.final_status.as_deref(), Some("succeeded"));
    }

    #[test]
    fn test_creation_summary_empty_output() {
        let summary = parse_payment_creation("");
        assert!(summary.payment_id.is_none());
        assert!(summary.final_status.is_none());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("succeeded"), "Succeeded");
        assert_eq!(title_case("requires_action"), "Requires_Action");
        assert_eq!(title_case(""), "");
    }
}
