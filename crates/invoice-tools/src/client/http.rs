//! HTTP Invoice Client
//!
//! Talks to the invoice REST API rooted at `{base}` (for example
//! `http://localhost:5000/api/invoices`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use super::InvoiceService;
use crate::error::{InvoiceError, Result};
use crate::model::{CreateInvoiceRequest, Invoice, InvoiceStatus, StatusUpdate};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/invoices";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_ERROR_BODY: usize = 256;

/// reqwest-backed invoice client
#[derive(Clone, Debug)]
pub struct HttpInvoiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInvoiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(InvoiceError::Config(format!("invoice API URL must be http(s): {base_url}")));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InvoiceError::Config(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        tracing::warn!(%status, "Invoice API returned an error status");
        Err(InvoiceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = Self::check(response).await?.text().await?;
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

#[async_trait]
impl InvoiceService for HttpInvoiceClient {
    async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let response = self.client.get(&self.base_url).send().await?;
        // Empty or `null` bodies mean no invoices
        let invoices: Option<Vec<Invoice>> = Self::decode(response).await?;
        Ok(invoices.unwrap_or_default())
    }

    async fn find_invoice_by_description(&self, description: &str) -> Result<Option<Invoice>> {
        let response = self
            .client
            .get(format!("{}/by-description", self.base_url))
            .query(&[("description", description)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(description, "No invoice matched");
            return Ok(None);
        }
        Self::decode(response).await
    }

    async fn create_invoice(&self, request: &CreateInvoiceRequest) -> Result<Invoice> {
        request.validate()?;
        let draft = Invoice::draft(request, Utc::now());

        let response = self.client.post(&self.base_url).json(&draft).send().await?;
        let created: Invoice = Self::decode(response).await?;
        tracing::info!(id = created.id, "Invoice created");
        Ok(created)
    }

    async fn mark_as_paid(&self, id: i64) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/{id}/status", self.base_url))
            .json(&StatusUpdate {
                status: InvoiceStatus::Paid,
            })
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(InvoiceError::NotFound(id.to_string()));
        }
        Self::check(response).await?;
        tracing::info!(id, "Invoice marked as paid");
        Ok(())
    }

    fn name(&self) -> &str {
        "InvoiceApi"
    }
}
