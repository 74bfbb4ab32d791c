//! Stripe HTTP Gateway
//!
//! `PaymentGateway` implementation over the form-encoded REST API: POST
//! bodies are `application/x-www-form-urlencoded`, reads use query strings,
//! authentication is basic auth with the secret key as username.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use testbed_core::config::{Config, DEFAULT_API_BASE};
use testbed_core::model::{
    Balance, Customer, List, PaymentIntent, PaymentMethod, Refund,
};

use crate::error::{GatewayError, Result};
use crate::gateway::{CreateCustomer, CreatePayment, PaymentGateway};

/// Test card payment method usable on any sandbox account.
const TEST_CARD: &str = "pm_card_visa";

const SETTLEMENT_EXPAND: &str = "latest_charge.balance_transaction";

/// HTTP client for the payment API.
pub struct StripeGateway {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// Error envelope returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl StripeGateway {
    /// Create a gateway against the public API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_BASE)
    }

    /// Create a gateway against a custom base URL (stubs, sandboxes).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pay-testbed/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create from the shared configuration file.
    pub fn from_config(config: &Config) -> Self {
        Self::with_base_url(config.stripe_api_key.clone(), config.api_base())
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.api_key, Some(""))
            .form(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.api_key, Some(""))
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Prefer the API's own message over the raw body
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or(text);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment(&self, request: &CreatePayment) -> Result<PaymentIntent> {
        let form = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("confirm", "true".to_string()),
            ("payment_method", TEST_CARD.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];
        self.post_form("/payment_intents", &form).await
    }

    async fn retrieve_payment(&self, id: &str, expand_settlement: bool) -> Result<PaymentIntent> {
        let path = format!("/payment_intents/{}", id);
        let mut query: Vec<(&str, String)> = Vec::new();
        if expand_settlement {
            query.push(("expand[]", SETTLEMENT_EXPAND.to_string()));
        }
        self.get_query(&path, &query).await
    }

    async fn balance(&self) -> Result<Balance> {
        self.get_query("/balance", &[]).await
    }

    async fn list_payments(&self, limit: u32) -> Result<Vec<PaymentIntent>> {
        let list: List<PaymentIntent> = self
            .get_query("/payment_intents", &[("limit", limit.to_string())])
            .await?;
        Ok(list.data)
    }

    async fn create_customer(&self, request: &CreateCustomer) -> Result<Customer> {
        let mut form = vec![
            ("email", request.email.clone()),
            ("name", request.name.clone()),
        ];
        if let Some(description) = &request.description {
            form.push(("description", description.clone()));
        }
        self.post_form("/customers", &form).await
    }

    async fn create_refund(&self, charge_id: &str) -> Result<Refund> {
        let form = [
            ("charge", charge_id.to_string()),
            ("reason", "requested_by_customer".to_string()),
        ];
        self.post_form("/refunds", &form).await
    }

    async fn list_payment_methods(&self, limit: u32) -> Result<Vec<PaymentMethod>> {
        let list: List<PaymentMethod> = self
            .get_query(
                "/payment_methods",
                &[
                    ("type", "card".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(list.data)
    }

    fn name(&self) -> &str {
        "stripe"
    }
}
