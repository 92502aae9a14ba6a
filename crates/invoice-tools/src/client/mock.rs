//! In-Memory Invoice Service
//!
//! For testing and demo purposes. Holds invoices in process memory.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use tokio::sync::RwLock;

use super::InvoiceService;
use crate::error::{InvoiceError, Result};
use crate::model::{CreateInvoiceRequest, Invoice, InvoiceStatus};

/// Invoice service backed by a `Vec`
pub struct InMemoryInvoiceService {
    invoices: RwLock<Vec<Invoice>>,
    available: AtomicBool,
}

impl Default for InMemoryInvoiceService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInvoiceService {
    pub fn new() -> Self {
        Self::with_invoices(Vec::new())
    }

    pub fn with_invoices(invoices: Vec<Invoice>) -> Self {
        Self {
            invoices: RwLock::new(invoices),
            available: AtomicBool::new(true),
        }
    }

    /// A small fixed book of invoices for demos
    pub fn seeded() -> Self {
        let at = |m, d| Utc.with_ymd_and_hms(2025, m, d, 0, 0, 0).single().unwrap_or_default();
        Self::with_invoices(vec![
            Invoice {
                id: 1,
                description: "Acme Corp website redesign".into(),
                amount: dec!(4800.00),
                date: at(1, 15),
                status: InvoiceStatus::Paid,
                due: at(2, 14),
            },
            Invoice {
                id: 2,
                description: "Globex quarterly support".into(),
                amount: dec!(1250.50),
                date: at(2, 1),
                status: InvoiceStatus::Unpaid,
                due: at(3, 3),
            },
            Invoice {
                id: 3,
                description: "Initech hosting".into(),
                amount: dec!(89.99),
                date: at(3, 1),
                status: InvoiceStatus::Pending,
                due: at(3, 31),
            },
        ])
    }

    /// Toggle a simulated outage
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(InvoiceError::Network("in-memory invoice service is offline".into()))
        }
    }
}

#[async_trait]
impl InvoiceService for InMemoryInvoiceService {
    async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        self.ensure_available()?;
        Ok(self.invoices.read().await.clone())
    }

    async fn find_invoice_by_description(&self, description: &str) -> Result<Option<Invoice>> {
        self.ensure_available()?;
        let needle = description.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let invoices = self.invoices.read().await;
        let exact = invoices
            .iter()
            .find(|i| i.description.to_lowercase() == needle);
        let found = exact.or_else(|| {
            invoices
                .iter()
                .find(|i| i.description.to_lowercase().contains(&needle))
        });
        Ok(found.cloned())
    }

    async fn create_invoice(&self, request: &CreateInvoiceRequest) -> Result<Invoice> {
        request.validate()?;
        self.ensure_available()?;

        let mut invoices = self.invoices.write().await;
        let mut invoice = Invoice::draft(request, Utc::now());
        invoice.id = invoices.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn mark_as_paid(&self, id: i64) -> Result<()> {
        self.ensure_available()?;
        let mut invoices = self.invoices.write().await;
        let invoice = invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| InvoiceError::NotFound(id.to_string()))?;
        invoice.status = InvoiceStatus::Paid;
        Ok(())
    }

    fn name(&self) -> &str {
        "InMemoryInvoices"
    }
}
