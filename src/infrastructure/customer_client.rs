use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::CustomerRegistryConfig;
use crate::domain::customer::{Customer, CustomerLookupError};
use crate::domain::ports::CustomerDirectory;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
}

/// Customer registry reached over HTTP with the shared service token.
///
/// Timeouts and refused connections come back as
/// [`CustomerLookupError::Unavailable`].
#[derive(Debug, Clone)]
pub struct HttpCustomerDirectory {
    client: Client,
    base_url: String,
    service_token: String,
}

impl HttpCustomerDirectory {
    pub fn new(config: &CustomerRegistryConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_token: config.service_token.clone(),
        })
    }
}

#[async_trait]
impl CustomerDirectory for HttpCustomerDirectory {
    async fn get_customer(&self, id: i64) -> Result<Customer, CustomerLookupError> {
        let url = format!("{}/internal/customers/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.service_token)
            .send()
            .await
            .map_err(|e| CustomerLookupError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(CustomerLookupError::NotFound(id)),
            status if !status.is_success() => {
                return Err(CustomerLookupError::Unavailable(format!(
                    "customer registry answered {status}"
                )))
            }
            _ => {}
        }

        let envelope: Envelope<Customer> = response
            .json()
            .await
            .map_err(|e| CustomerLookupError::Unavailable(e.to_string()))?;
        match envelope {
            Envelope {
                success: true,
                data: Some(customer),
            } => Ok(customer),
            _ => Err(CustomerLookupError::NotFound(id)),
        }
    }
}
