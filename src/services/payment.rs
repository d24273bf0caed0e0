//! Payment link generation.
//!
//! One payment is created at start-up and its confirmation URL is shown
//! behind the pay button for the lifetime of the process.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::core::config::PaymentConfig;
use crate::core::error::{AppError, AppResult};

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Creates a payment and returns the URL where the user confirms it.
    async fn create_payment(&self) -> AppResult<String>;
}

#[derive(Deserialize)]
struct PaymentResponse {
    confirmation: Option<Confirmation>,
}

#[derive(Deserialize)]
struct Confirmation {
    confirmation_url: Option<String>,
}

/// YooKassa `POST /v3/payments` client.
pub struct YooKassaClient {
    client: reqwest::Client,
    endpoint: Url,
    shop_id: String,
    secret_key: SecretString,
    payload: serde_json::Value,
}

impl YooKassaClient {
    pub fn new(client: reqwest::Client, config: &PaymentConfig) -> AppResult<Self> {
        let endpoint = Url::parse(&config.base_url)?.join("/v3/payments")?;
        Ok(Self {
            client,
            endpoint,
            shop_id: config.client_id.clone(),
            secret_key: config.client_secret.clone(),
            payload: config.payload.clone(),
        })
    }
}

#[async_trait]
impl PaymentService for YooKassaClient {
    async fn create_payment(&self) -> AppResult<String> {
        let idempotence_key = Uuid::new_v4().to_string();
        log::debug!("Creating payment, idempotence key {}", idempotence_key);

        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.shop_id, Some(self.secret_key.expose_secret()))
            .header("Idempotence-Key", idempotence_key)
            .json(&self.payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!("{}: {}", status, body.trim())));
        }

        let body: PaymentResponse = response.json().await?;
        body.confirmation
            .and_then(|c| c.confirmation_url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::Payment("response has no confirmation_url".to_string()))
    }
}

/// Generates the payment URL, degrading to an empty string on any failure.
pub async fn payment_url_or_empty(service: &dyn PaymentService) -> String {
    log::info!("Generating payment URL");
    match service.create_payment().await {
        Ok(url) => {
            log::info!("Got payment URL: {}", url);
            url
        }
        Err(e) => {
            log::error!("Can't generate payment URL: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl PaymentService for Failing {
        async fn create_payment(&self) -> AppResult<String> {
            Err(AppError::Payment("gateway down".into()))
        }
    }

    struct Fixed;

    #[async_trait]
    impl PaymentService for Fixed {
        async fn create_payment(&self) -> AppResult<String> {
            Ok("https://pay.example.com/c/1".into())
        }
    }

    #[tokio::test]
    async fn failure_yields_empty_url() {
        assert_eq!(payment_url_or_empty(&Failing).await, "");
        assert_eq!(payment_url_or_empty(&Fixed).await, "https://pay.example.com/c/1");
    }
}
