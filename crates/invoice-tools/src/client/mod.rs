//! Invoice API Integration
//!
//! Abstractions and implementations for the invoice backend.

mod http;
mod mock;

pub use http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpInvoiceClient};
pub use mock::InMemoryInvoiceService;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{CreateInvoiceRequest, Invoice};

/// Invoice service trait (Strategy pattern)
///
/// Retries, if any, belong to the implementation.
#[async_trait]
pub trait InvoiceService: Send + Sync {
    /// All invoices known to the system
    async fn list_invoices(&self) -> Result<Vec<Invoice>>;

    /// Invoice whose description matches, if any
    async fn find_invoice_by_description(&self, description: &str) -> Result<Option<Invoice>>;

    /// Create a new pending invoice; the server assigns the id
    async fn create_invoice(&self, request: &CreateInvoiceRequest) -> Result<Invoice>;

    /// Flag an invoice as paid
    async fn mark_as_paid(&self, id: i64) -> Result<()>;

    /// Service name for logs
    fn name(&self) -> &str;
}
